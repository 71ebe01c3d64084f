//! Records, keyed record sets and the per-field record operations

use crate::error::{LogdiffError, Result};
use crate::schema::Schema;
use crate::value::Value;
use indexmap::IndexMap;

/// One record: field name to value, in insertion order
pub type Record = IndexMap<String, Value>;

/// Records by key, in insertion order
pub type RecordSet = IndexMap<String, Record>;

/// Add `value` to `header`: appended in list mode, overwritten otherwise
pub fn insert_value(schema: &Schema, record: &mut Record, header: &str, value: Value) {
    let list_mode = schema.field(header).map(|f| f.list_mode).unwrap_or(false);

    if !list_mode {
        record.insert(header.to_string(), value);
        return;
    }

    match record.get_mut(header) {
        Some(Value::List(items)) => items.push(value),
        Some(existing) => {
            let previous = std::mem::take(existing);
            *existing = Value::List(vec![previous, value]);
        }
        None => {
            record.insert(header.to_string(), Value::List(vec![value]));
        }
    }
}

/// Fill every absent non-key field with its default
pub fn set_default(schema: &Schema, record: &mut Record) {
    for field in schema.fields().filter(|f| !f.is_key) {
        if !record.contains_key(&field.name) {
            record.insert(field.name.clone(), field.default.clone());
        }
    }
}

/// Drop auto-hide fields whose value equals their `hide-if` value
pub fn auto_hide_values(schema: &Schema, record: &mut Record) {
    for field in schema.fields().filter(|f| f.auto_hide) {
        if record.get(&field.name) == Some(&field.hide_if) {
            record.shift_remove(&field.name);
        }
    }
}

/// Put back the `hide-if` value of every auto-hide field the record lacks
pub fn restore_hidden(schema: &Schema, record: &mut Record) {
    for field in schema.fields().filter(|f| f.auto_hide) {
        if !record.contains_key(&field.name) {
            record.insert(field.name.clone(), field.hide_if.clone());
        }
    }
}

/// Build the record key from the key fields, in schema order.
///
/// List values are flattened, nulls are skipped and every part is
/// stringified; the parts are joined with single spaces.
pub fn generate_key(schema: &Schema, record: &Record, source_name: &str) -> Result<String> {
    let mut parts = Vec::new();

    for field in schema.key_fields() {
        match record.get(&field.name) {
            None | Some(Value::Null) => {}
            Some(Value::List(items)) => parts.extend(items.iter().filter(|v| !v.is_null()).map(Value::to_string)),
            Some(value) => parts.push(value.to_string()),
        }
    }

    if parts.is_empty() {
        return Err(LogdiffError::unkeyable(source_name));
    }
    Ok(parts.join(" "))
}

/// Every non-key field mapped to its `hide-if` value
pub fn hidden_record(schema: &Schema) -> Record {
    schema
        .fields()
        .filter(|f| !f.is_key)
        .map(|f| (f.name.clone(), f.hide_if.clone()))
        .collect()
}

/// A named collection of keyed records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    pub name: String,
    records: RecordSet,
}

impl RecordStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RecordSet::new(),
        }
    }

    pub fn from_records(name: impl Into<String>, records: RecordSet) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Key `record` and store it, replacing any record with the same key
    pub fn insert(&mut self, schema: &Schema, record: Record) -> Result<String> {
        let key = generate_key(schema, &record, &self.name)?;
        if self.records.insert(key.clone(), record).is_some() {
            log::debug!("{}: record {} replaced by a later one", self.name, key);
        }
        Ok(key)
    }

    /// Merge another store in; its records win on key collisions
    pub fn extend(&mut self, other: RecordStore) {
        for (key, record) in other.records {
            if self.records.insert(key.clone(), record).is_some() {
                log::debug!("{}: record {} replaced by {}", self.name, key, other.name);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }
}
