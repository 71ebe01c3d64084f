//! Error types for logdiff operations

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogdiffError>;

/// Exit status used for every fatal configuration or validation failure
pub const FATAL_EXIT_CODE: i32 = 255;

#[derive(Error, Debug)]
pub enum LogdiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration parse error in {origin}: {message}")]
    ConfigParse { origin: String, message: String },

    #[error("Invalid entry in [\"{field}\"]: {message}")]
    SchemaValidation { field: String, message: String },

    #[error("Unable to find comparator: {name}")]
    ComparatorLookup { name: String },

    #[error("Unable to find {kind} function: {name}")]
    HookLookup { kind: String, name: String },

    #[error("Hook '{name}' failed: {source}")]
    Hook {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unable to key a record from {source_name}: no key field yielded a value")]
    UnkeyableRecord { source_name: String },

    #[error("Input not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl LogdiffError {
    pub fn config_parse(origin: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ConfigParse {
            origin: origin.into(),
            message: msg.into(),
        }
    }

    pub fn schema(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::SchemaValidation {
            field: field.into(),
            message: msg.into(),
        }
    }

    pub fn comparator_lookup(name: impl Into<String>) -> Self {
        Self::ComparatorLookup { name: name.into() }
    }

    pub fn hook_lookup(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::HookLookup {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn hook(name: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Hook {
            name: name.into(),
            source,
        }
    }

    pub fn unkeyable(source_name: impl Into<String>) -> Self {
        Self::UnkeyableRecord {
            source_name: source_name.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Process exit status for this error; every variant aborts the run
    pub fn exit_code(&self) -> i32 {
        FATAL_EXIT_CODE
    }
}
