//! JSON and CSV snapshots of record sets
//!
//! JSON snapshots store auto-hidden values once, in a synthetic `DEFAULT`
//! record, and get them back on load. CSV snapshots are one row per record
//! with listing fields left out.

use crate::error::{LogdiffError, Result};
use crate::record::{self, Record, RecordSet};
use crate::sanitize::{collapse_whitespace, sanitize};
use crate::schema::Schema;
use crate::value::Value;
use std::io::{BufRead, Read, Write};

/// Pseudo-key of the record holding the hide-if values
pub const DEFAULT_RECORD_KEY: &str = "DEFAULT";

const CELL_SEPARATOR: &str = ", ";

/// Apply auto-hide to a copy of every record and append the `DEFAULT` record
pub fn compact(schema: &Schema, records: &RecordSet) -> RecordSet {
    let mut compacted: RecordSet = records
        .iter()
        .map(|(key, record)| {
            let mut record = record.clone();
            record::auto_hide_values(schema, &mut record);
            (key.clone(), record)
        })
        .collect();
    compacted.insert(DEFAULT_RECORD_KEY.to_string(), record::hidden_record(schema));
    compacted
}

/// Backfill absent fields from the `DEFAULT` record, then drop it
pub fn decompact(mut snapshot: RecordSet) -> RecordSet {
    let Some(defaults) = snapshot.shift_remove(DEFAULT_RECORD_KEY) else {
        return snapshot;
    };

    for record in snapshot.values_mut() {
        for (field, value) in &defaults {
            if !record.contains_key(field) {
                record.insert(field.clone(), value.clone());
            }
        }
    }
    snapshot
}

/// Pretty-printed, compacted JSON snapshot
pub fn write_json<W: Write>(schema: &Schema, records: &RecordSet, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &compact(schema, records))?;
    writeln!(writer)?;
    Ok(())
}

/// Read and decompact a JSON snapshot; values are sanitized
pub fn read_json<R: Read>(reader: R) -> Result<RecordSet> {
    let raw: RecordSet = serde_json::from_reader(reader)?;
    let snapshot = raw
        .into_iter()
        .map(|(key, record)| {
            let record: Record = record.into_iter().map(|(k, v)| (k, sanitize(v))).collect();
            (key, record)
        })
        .collect();
    Ok(decompact(snapshot))
}

/// CSV snapshot: header row, then one padded row per record
pub fn write_table<W: Write>(schema: &Schema, records: &RecordSet, mut writer: W) -> Result<()> {
    let columns: Vec<&str> = schema
        .fields()
        .filter(|f| !f.list_mode)
        .map(|f| f.name.as_str())
        .collect();

    let cells: Vec<Vec<String>> = records
        .values()
        .map(|record| {
            columns
                .iter()
                .map(|name| record.get(*name).map(table_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .fold(name.chars().count(), usize::max)
        })
        .collect();

    let pad_row = |row: Vec<String>| -> String {
        row.iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(CELL_SEPARATOR)
            .trim_end()
            .to_string()
    };

    writeln!(writer, "{}", pad_row(columns.iter().map(|c| c.to_string()).collect()))?;
    for row in cells {
        writeln!(writer, "{}", pad_row(row))?;
    }
    Ok(())
}

/// Read a CSV snapshot into unkeyed records.
///
/// Cells are whitespace-collapsed and sanitized; an empty cell reads as
/// null. Blank lines are skipped.
pub fn read_table<R: BufRead>(reader: R) -> Result<Vec<Record>> {
    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_cells(&line)
            .ok_or_else(|| LogdiffError::invalid_input(format!("line {}: unterminated quote", index + 1)))?;

        if headers.is_empty() {
            headers = cells;
            continue;
        }

        if cells.len() > headers.len() {
            return Err(LogdiffError::invalid_input(format!(
                "line {}: {} cells for {} columns",
                index + 1,
                cells.len(),
                headers.len()
            )));
        }

        let row: Record = headers
            .iter()
            .zip(cells)
            .map(|(header, cell)| {
                let value = if cell.is_empty() { Value::Null } else { sanitize(Value::Str(cell)) };
                (header.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn table_cell(value: &Value) -> String {
    let text = match value {
        Value::Null => return String::new(),
        other => other.to_string(),
    };
    if text.contains(',') || text.contains('"') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

/// Split one CSV line; `None` when a quoted cell never closes
fn split_cells(line: &str) -> Option<Vec<String>> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                chars.next();
                cell.push('"');
            }
            '"' if quoted => quoted = false,
            // padding before an opening quote is dropped
            '"' if cell.trim().is_empty() => {
                cell.clear();
                quoted = true;
            }
            ',' if !quoted => cells.push(collapse_whitespace(&std::mem::take(&mut cell))),
            c => cell.push(c),
        }
    }

    if quoted {
        return None;
    }
    cells.push(collapse_whitespace(&cell));
    Some(cells)
}
