//! Field extraction from log lines

use crate::error::{LogdiffError, Result};
use crate::hooks::Hooks;
use crate::record::{self, Record};
use crate::sanitize::sanitize;
use crate::schema::{FieldSpec, Schema};
use crate::value::Value;
use std::io::BufRead;
use std::path::Path;

/// Extract `field` from one line.
///
/// The first regex that matches decides the outcome: its non-null groups are
/// joined with single spaces and sanitized. No match, no captured group, or
/// an empty result all give `None`.
pub fn regex_line(field: &FieldSpec, line: &str) -> Option<Value> {
    let captures = field.regexes().iter().find_map(|regex| regex.captures(line))?;

    let joined = captures
        .iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    match sanitize(Value::Str(joined)) {
        Value::Str(s) if s.is_empty() => None,
        value => Some(value),
    }
}

/// Turns one log file into one record
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    schema: &'a Schema,
    hooks: &'a Hooks,
}

impl<'a> Extractor<'a> {
    pub fn new(schema: &'a Schema, hooks: &'a Hooks) -> Self {
        Self { schema, hooks }
    }

    /// Preprocess, scan and finalize the log at `path`
    pub fn load_log(&self, path: &Path) -> Result<Record> {
        if !path.is_file() {
            return Err(LogdiffError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let staged = self.hooks.preprocess(path)?;
        let mut record = Record::new();
        let lines = self.scan(staged.open()?, &mut record)?;
        log::debug!("Scanned {} lines from {}", lines, path.display());

        self.finalize(record)
    }

    /// Feed every line of `reader` through the inline hooks and the field
    /// regexes, accumulating into `record`. Returns the number of lines read.
    pub fn scan<R: BufRead>(&self, mut reader: R, record: &mut Record) -> Result<usize> {
        let mut buf = Vec::new();
        let mut count = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            count += 1;

            let mut line = String::from_utf8_lossy(&buf).into_owned();
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }

            let line = self.hooks.process_line(line);
            for field in self.schema.fields() {
                if let Some(value) = regex_line(field, &line) {
                    record::insert_value(self.schema, record, &field.name, value);
                }
            }
        }

        Ok(count)
    }

    /// Defaults, postprocess hooks, defaults again, then auto-hide
    pub fn finalize(&self, mut record: Record) -> Result<Record> {
        record::set_default(self.schema, &mut record);
        let mut record = self.hooks.postprocess(record)?;
        record::set_default(self.schema, &mut record);
        record::auto_hide_values(self.schema, &mut record);
        Ok(record)
    }
}
