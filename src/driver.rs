//! Per-run parse driver
//!
//! A [`ParseDriver`] owns the schema, resolved hooks and comparator for one
//! run and exposes the record operations the commands are built from.

use crate::comparator::Comparator;
use crate::config::ConfigLoader;
use crate::diff::{DiffEngine, DiffReport};
use crate::error::{LogdiffError, Result};
use crate::extract::{self, Extractor};
use crate::hooks::{HookSelection, Hooks, PluginCatalog};
use crate::record::{self, Record, RecordSet, RecordStore};
use crate::resolver::SourceRef;
use crate::schema::{DriverDirectives, Schema, SchemaBuilder};
use crate::snapshot;
use crate::value::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Everything needed to build a [`ParseDriver`]
#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    pub schema_files: Vec<PathBuf>,
    /// Function libraries to import on top of `std`
    pub imports: Vec<String>,
    pub preprocess: Vec<String>,
    pub process: Vec<String>,
    pub postprocess: Vec<String>,
    /// Colon-delimited include directories
    pub search_path: Option<String>,
}

#[derive(Debug)]
pub struct ParseDriver {
    schema: Schema,
    hooks: Hooks,
    comparator: Comparator,
}

impl ParseDriver {
    pub fn new(options: DriverOptions) -> Result<Self> {
        Self::with_catalog(options, &PluginCatalog::with_builtins())
    }

    /// Build a driver whose imports resolve against `catalog`
    pub fn with_catalog(options: DriverOptions, catalog: &PluginCatalog) -> Result<Self> {
        if options.schema_files.is_empty() {
            return Err(LogdiffError::invalid_input(
                "Expected at least one configuration file to drive the parser",
            ));
        }

        let mut loader = ConfigLoader::new();
        if let Some(search_path) = &options.search_path {
            loader = loader.with_search_path(search_path);
        }

        let mut sections = loader.load(&options.schema_files)?;
        let directives = DriverDirectives::unload(&mut sections)?;
        let schema = SchemaBuilder::new(sections).build()?;

        // schema directives extend the caller's lists
        let mut options = options;
        options.imports.extend(directives.import);
        options.preprocess.extend(directives.preprocess);
        options.process.extend(directives.process);
        options.postprocess.extend(directives.postprocess);

        let registry = catalog.load(&options.imports)?;
        let hooks = Hooks::resolve(
            &registry,
            &HookSelection {
                preprocess: options.preprocess,
                process: options.process,
                postprocess: options.postprocess,
            },
        )?;
        let comparator = Comparator::new(&registry);

        for field in schema.fields() {
            if let Some(spec) = &field.compare {
                if !comparator.is_registered(&spec.name) {
                    return Err(LogdiffError::comparator_lookup(spec.name.as_str()));
                }
            }
        }

        log::debug!("Driver ready: {} fields, hooks {:?}", schema.len(), hooks);
        Ok(Self {
            schema,
            hooks,
            comparator,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }

    pub fn header_list(&self) -> Vec<&str> {
        self.schema.headers().collect()
    }

    pub fn is_multivalued(&self, header: &str) -> bool {
        self.schema.field(header).is_some_and(|f| f.list_mode)
    }

    pub fn generate_key(&self, record: &Record) -> Result<String> {
        record::generate_key(&self.schema, record, "record")
    }

    pub fn insert_value(&self, record: &mut Record, header: &str, value: Value) {
        record::insert_value(&self.schema, record, header, value)
    }

    pub fn set_default(&self, record: &mut Record) {
        record::set_default(&self.schema, record)
    }

    /// Extract `header` from `line`; unknown headers never match
    pub fn regex_line(&self, header: &str, line: &str) -> Option<Value> {
        self.schema.field(header).and_then(|field| extract::regex_line(field, line))
    }

    pub fn auto_hide_values(&self, record: &mut Record) {
        record::auto_hide_values(&self.schema, record)
    }

    /// Apply the field's compare policy; fields without one always match
    pub fn compare(&self, header: &str, expected: &Value, got: &Value) -> Result<bool> {
        match self.schema.field(header) {
            Some(field) => self.diff_engine().compare_field(field, expected, got),
            None => Ok(true),
        }
    }

    pub fn do_diff(&self, expected: &RecordSet, got: &RecordSet) -> Result<DiffReport> {
        self.diff_engine().diff(expected, got)
    }

    /// Scan one log file into a store holding its single record.
    ///
    /// Auto-hidden values are put back so that logs and decompacted
    /// snapshots compare alike.
    pub fn load_log(&self, path: &Path) -> Result<RecordStore> {
        let source = SourceRef::Log(path.to_path_buf());
        let mut record = Extractor::new(&self.schema, &self.hooks).load_log(path)?;
        record::restore_hidden(&self.schema, &mut record);

        let mut store = RecordStore::new(source.display_name());
        store.insert(&self.schema, record)?;
        Ok(store)
    }

    /// Read one source according to its kind
    pub fn load_source(&self, source: &SourceRef) -> Result<RecordStore> {
        let store = match source {
            SourceRef::Snapshot(path) => {
                let records = snapshot::read_json(BufReader::new(File::open(path)?))?;
                RecordStore::from_records(source.display_name(), records)
            }
            SourceRef::Table(path) => {
                let mut store = RecordStore::new(source.display_name());
                for row in snapshot::read_table(BufReader::new(File::open(path)?))? {
                    store.insert(&self.schema, row)?;
                }
                store
            }
            SourceRef::Log(path) => self.load_log(path)?,
        };

        log::info!("Loaded {} records from {}", store.len(), source.path().display());
        Ok(store)
    }

    /// Read every source in order into one store; later sources win on key
    /// collisions
    pub fn load_sources<P: AsRef<Path>>(&self, paths: &[P]) -> Result<RecordStore> {
        let names: Vec<String> = paths
            .iter()
            .map(|p| SourceRef::from_path(p.as_ref()).display_name())
            .collect();
        let mut merged = RecordStore::new(names.join("+"));

        for path in paths {
            let source = SourceRef::resolve(path.as_ref())?;
            merged.extend(self.load_source(&source)?);
        }
        Ok(merged)
    }

    fn diff_engine(&self) -> DiffEngine<'_> {
        DiffEngine::new(&self.schema, &self.comparator)
    }
}
