//! Golden/observed record set classification

use crate::comparator::Comparator;
use crate::error::Result;
use crate::record::{Record, RecordSet};
use crate::schema::{FieldSpec, Schema};
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Outcome for a record or one of its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiffStatus {
    Ok,
    New,
    Missing,
    Failed,
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiffStatus::Ok => "Ok",
            DiffStatus::New => "New",
            DiffStatus::Missing => "Missing",
            DiffStatus::Failed => "Failed",
        };
        write!(f, "{}", name)
    }
}

/// Expected and observed value of one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    pub expected: Value,
    pub got: Value,
    pub status: DiffStatus,
}

/// Classification of one record key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub status: DiffStatus,
    pub fields: IndexMap<String, FieldDiff>,
}

impl DiffEntry {
    /// Fields that did not compare Ok
    pub fn mismatches(&self) -> impl Iterator<Item = (&String, &FieldDiff)> {
        self.fields.iter().filter(|(_, d)| d.status != DiffStatus::Ok)
    }
}

/// Diff entries by key: expected keys first, then keys only observed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffReport {
    entries: IndexMap<String, DiffEntry>,
}

impl DiffReport {
    pub fn get(&self, key: &str) -> Option<&DiffEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DiffEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that are not Ok; Missing ones are tolerated in subset mode
    pub fn failure_count(&self, subset: bool) -> usize {
        self.entries
            .values()
            .filter(|e| match e.status {
                DiffStatus::Ok => false,
                DiffStatus::Missing => !subset,
                DiffStatus::New | DiffStatus::Failed => true,
            })
            .count()
    }

    /// Records to store as the new reference after this comparison
    pub fn accepted_records(&self, subset: bool) -> RecordSet {
        let mut accepted = RecordSet::new();

        for (key, entry) in &self.entries {
            let record: Record = match entry.status {
                DiffStatus::Missing if !subset => continue,
                DiffStatus::Ok | DiffStatus::Missing => entry
                    .fields
                    .iter()
                    .map(|(name, d)| (name.clone(), d.expected.clone()))
                    .collect(),
                DiffStatus::New => entry
                    .fields
                    .iter()
                    .map(|(name, d)| (name.clone(), d.got.clone()))
                    .collect(),
                DiffStatus::Failed => entry
                    .fields
                    .iter()
                    .map(|(name, d)| {
                        let value = if d.status == DiffStatus::Ok { &d.expected } else { &d.got };
                        (name.clone(), value.clone())
                    })
                    .collect(),
            };
            accepted.insert(key.clone(), record);
        }

        accepted
    }
}

/// Compares two record sets field by field
#[derive(Debug, Clone, Copy)]
pub struct DiffEngine<'a> {
    schema: &'a Schema,
    comparator: &'a Comparator,
}

impl<'a> DiffEngine<'a> {
    pub fn new(schema: &'a Schema, comparator: &'a Comparator) -> Self {
        Self { schema, comparator }
    }

    /// Run the field's compare policy; fields without one always match
    pub fn compare_field(&self, field: &FieldSpec, expected: &Value, got: &Value) -> Result<bool> {
        match &field.compare {
            None => Ok(true),
            Some(spec) => self.comparator.compare(&spec.name, &spec.args, expected, got),
        }
    }

    pub fn diff(&self, expected: &RecordSet, got: &RecordSet) -> Result<DiffReport> {
        let keys = expected
            .keys()
            .chain(got.keys().filter(|k| !expected.contains_key(*k)));

        let mut entries = IndexMap::new();
        for key in keys {
            let entry = self.diff_entry(expected.get(key), got.get(key))?;
            entries.insert(key.clone(), entry);
        }

        let report = DiffReport { entries };
        log::debug!(
            "Compared {} expected and {} observed records: {} not Ok",
            expected.len(),
            got.len(),
            report.failure_count(false)
        );
        Ok(report)
    }

    fn diff_entry(&self, expected: Option<&Record>, got: Option<&Record>) -> Result<DiffEntry> {
        let mut status = DiffStatus::Ok;
        let mut fields = IndexMap::new();

        for field in self.schema.fields() {
            let mut diff = FieldDiff {
                expected: Value::Null,
                got: Value::Null,
                status: DiffStatus::Ok,
            };

            match expected {
                None => {
                    status = DiffStatus::New;
                    diff.status = DiffStatus::New;
                }
                Some(record) => {
                    if let Some(value) = record.get(&field.name) {
                        diff.expected = value.clone();
                    }
                }
            }

            match got {
                None => {
                    status = DiffStatus::Missing;
                    diff.status = DiffStatus::Missing;
                }
                Some(record) => {
                    if let Some(value) = record.get(&field.name) {
                        diff.got = value.clone();
                    }
                }
            }

            if expected.is_some()
                && got.is_some()
                && !self.compare_field(field, &diff.expected, &diff.got)?
            {
                status = DiffStatus::Failed;
                diff.status = DiffStatus::Failed;
            }

            fields.insert(field.name.clone(), diff);
        }

        Ok(DiffEntry { status, fields })
    }
}
