//! # logdiff
//!
//! Schema-driven extraction of structured records from text logs, and
//! field-by-field comparison of golden and observed record sets for
//! regression testing of log-producing systems.

pub mod cli;
pub mod commands;
pub mod comparator;
pub mod config;
pub mod diff;
pub mod driver;
pub mod error;
pub mod extract;
pub mod hooks;
pub mod output;
pub mod record;
pub mod resolver;
pub mod sanitize;
pub mod schema;
pub mod snapshot;
pub mod value;

pub use diff::{DiffReport, DiffStatus};
pub use driver::{DriverOptions, ParseDriver};
pub use error::{LogdiffError, Result};
pub use record::{Record, RecordSet, RecordStore};
pub use value::Value;

/// Highest exit status used to report failing entries; 255 means a fatal error
pub const MAX_FAILURE_EXIT_CODE: i32 = 254;
