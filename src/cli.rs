//! Command-line interface for logdiff

use crate::driver::DriverOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "logdiff")]
#[command(about = "Schema-driven log extraction and golden/observed comparison")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Schema file driving the parser (repeatable, at least one)
    #[arg(short = 'C', long = "conf", value_name = "FILE", global = true)]
    pub conf: Vec<PathBuf>,

    /// Function library to import on top of `std` (repeatable)
    #[arg(long = "import", value_name = "LIBRARY", global = true)]
    pub imports: Vec<String>,

    /// Preprocess hook run over every input log (repeatable)
    #[arg(long, value_name = "NAME", global = true)]
    pub preprocess: Vec<String>,

    /// Inline hook run over every log line (repeatable)
    #[arg(long, value_name = "NAME", global = true)]
    pub process: Vec<String>,

    /// Postprocess hook run over every extracted record (repeatable)
    #[arg(long, value_name = "NAME", global = true)]
    pub postprocess: Vec<String>,

    /// Colon-delimited directories searched for `#include` targets
    #[arg(long, value_name = "PATHS", env = "LOGDIFF_SEARCH_PATH", global = true)]
    pub search_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Driver options carried by the global flags
    pub fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            schema_files: self.conf.clone(),
            imports: self.imports.clone(),
            preprocess: self.preprocess.clone(),
            process: self.process.clone(),
            postprocess: self.postprocess.clone(),
            search_path: self.search_path.clone(),
        }
    }

    /// Level handed to the logger; `--verbose` turns on debug output
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract records from logs and snapshots and print one merged snapshot
    #[command(visible_aliases = ["display", "join"])]
    Parse {
        /// Logs, JSON snapshots or CSV tables, merged in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output as a CSV table rather than JSON
        #[arg(long)]
        csv: bool,

        /// Write the snapshot to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare observed results against a golden reference
    Compare {
        /// Golden reference: log, JSON snapshot or CSV table
        golden: PathBuf,

        /// Observed results: log, JSON snapshot or CSV table
        observed: PathBuf,

        /// Where to write the accepted records
        diff: PathBuf,

        /// Write the diff file as a CSV table rather than JSON
        #[arg(long)]
        csv: bool,

        /// Tolerate golden entries missing from the observed results
        #[arg(long)]
        subset: bool,

        /// Report format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

/// Parse output format string
#[derive(Debug, Clone, PartialEq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}
