//! Named hook and comparator functions, and the per-run hook pipeline
//!
//! Functions are looked up by name in a [`FunctionRegistry`]. Registries are
//! assembled from named libraries held by a [`PluginCatalog`]; the `std`
//! library is always installed. The hooks selected for a run are resolved
//! once into an immutable [`Hooks`] value.

use crate::comparator;
use crate::error::{LogdiffError, Result};
use crate::record::Record;
use crate::value::Value;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tempfile::NamedTempFile;

/// Rewrites a whole input file before it is scanned
pub type PreprocessFn =
    Arc<dyn Fn(&mut dyn BufRead, &mut dyn Write) -> anyhow::Result<()> + Send + Sync>;

/// Rewrites one line before field extraction
pub type InlineFn = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Rewrites a finished record
pub type PostprocessFn = Arc<dyn Fn(Record) -> anyhow::Result<Record> + Send + Sync>;

/// Decides whether `(args, expected, got)` are equal
pub type ComparatorFn = Arc<dyn Fn(&Value, &Value, &Value) -> bool + Send + Sync>;

/// Installs a library's functions into a registry
pub type LibraryInstaller = fn(&mut FunctionRegistry);

/// Name of the built-in library
pub const STD_LIBRARY: &str = "std";

const ANSI_ESCAPE: &str = r"\x1b\[[0-9;?]*[ -/]*[@-~]";

/// Name to function lookup for every hook kind
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    preprocess: HashMap<String, PreprocessFn>,
    inline: HashMap<String, InlineFn>,
    postprocess: HashMap<String, PostprocessFn>,
    comparators: HashMap<String, ComparatorFn>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_preprocess<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut dyn BufRead, &mut dyn Write) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.preprocess.insert(name.into(), Arc::new(f));
        self
    }

    pub fn register_inline<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        self.inline.insert(name.into(), Arc::new(f));
        self
    }

    pub fn register_postprocess<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Record) -> anyhow::Result<Record> + Send + Sync + 'static,
    {
        self.postprocess.insert(name.into(), Arc::new(f));
        self
    }

    pub fn register_comparator<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Value, &Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.comparators.insert(name.into(), Arc::new(f));
        self
    }

    pub fn comparator(&self, name: &str) -> Option<&ComparatorFn> {
        self.comparators.get(name)
    }

    pub fn comparators(&self) -> &HashMap<String, ComparatorFn> {
        &self.comparators
    }

    fn lookup<T: Clone>(table: &HashMap<String, T>, kind: &str, name: &str) -> Result<(String, T)> {
        table
            .get(name)
            .map(|f| (name.to_string(), f.clone()))
            .ok_or_else(|| LogdiffError::hook_lookup(kind, name))
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |table: Vec<&String>| {
            let mut sorted: Vec<String> = table.into_iter().cloned().collect();
            sorted.sort();
            sorted
        };
        f.debug_struct("FunctionRegistry")
            .field("preprocess", &names(self.preprocess.keys().collect()))
            .field("inline", &names(self.inline.keys().collect()))
            .field("postprocess", &names(self.postprocess.keys().collect()))
            .field("comparators", &names(self.comparators.keys().collect()))
            .finish()
    }
}

/// Libraries of functions that a schema can import by name
#[derive(Clone)]
pub struct PluginCatalog {
    libraries: IndexMap<String, LibraryInstaller>,
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.libraries.keys()).finish()
    }
}

impl Default for PluginCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl PluginCatalog {
    /// Catalog without any library, not even `std`
    pub fn empty() -> Self {
        Self {
            libraries: IndexMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut catalog = Self::empty();
        catalog.register(STD_LIBRARY, install_std);
        catalog
    }

    pub fn register(&mut self, name: impl Into<String>, installer: LibraryInstaller) -> &mut Self {
        self.libraries.insert(name.into(), installer);
        self
    }

    pub fn libraries(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    /// Build a registry from `std` plus every imported library, in order.
    /// A later library overrides same-named functions of an earlier one.
    pub fn load(&self, imports: &[String]) -> Result<FunctionRegistry> {
        let mut registry = FunctionRegistry::new();

        if let Some(install) = self.libraries.get(STD_LIBRARY) {
            install(&mut registry);
        }

        for name in imports.iter().filter(|name| name.as_str() != STD_LIBRARY) {
            let install = self
                .libraries
                .get(name)
                .ok_or_else(|| LogdiffError::hook_lookup("import", name.as_str()))?;
            log::debug!("Importing function library {}", name);
            install(&mut registry);
        }

        Ok(registry)
    }
}

fn install_std(registry: &mut FunctionRegistry) {
    registry
        .register_comparator("compare_equals", comparator::compare_equals)
        .register_comparator("compare_exact", comparator::compare_exact)
        .register_comparator("compare_tolerance", comparator::compare_tolerance)
        .register_preprocess("drop_blank_lines", drop_blank_lines);

    registry.register_inline("strip_ansi", strip_ansi);
}

fn strip_ansi(line: String) -> String {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    let ansi = ANSI.get_or_init(|| Regex::new(ANSI_ESCAPE).expect("ANSI escape pattern is valid"));
    ansi.replace_all(&line, "").into_owned()
}

fn drop_blank_lines(input: &mut dyn BufRead, output: &mut dyn Write) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            writeln!(output, "{}", line)?;
        }
    }
    Ok(())
}

/// Hook names chosen for a run, before lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookSelection {
    pub preprocess: Vec<String>,
    pub process: Vec<String>,
    pub postprocess: Vec<String>,
}

/// Resolved hooks for one run, applied in declaration order
#[derive(Clone, Default)]
pub struct Hooks {
    preprocess: Vec<(String, PreprocessFn)>,
    inline: Vec<(String, InlineFn)>,
    postprocess: Vec<(String, PostprocessFn)>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("preprocess", &self.preprocess.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("inline", &self.inline.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("postprocess", &self.postprocess.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

impl Hooks {
    /// Look up every selected name, failing on the first unknown one
    pub fn resolve(registry: &FunctionRegistry, selection: &HookSelection) -> Result<Self> {
        Ok(Self {
            preprocess: selection
                .preprocess
                .iter()
                .map(|name| FunctionRegistry::lookup(&registry.preprocess, "preprocess", name))
                .collect::<Result<_>>()?,
            inline: selection
                .process
                .iter()
                .map(|name| FunctionRegistry::lookup(&registry.inline, "process", name))
                .collect::<Result<_>>()?,
            postprocess: selection
                .postprocess
                .iter()
                .map(|name| FunctionRegistry::lookup(&registry.postprocess, "postprocess", name))
                .collect::<Result<_>>()?,
        })
    }

    /// Run the preprocess stages over `path`.
    ///
    /// Each stage reads the previous stage's artifact and writes a fresh
    /// temporary file; the previous artifact is closed and deleted before the
    /// next stage starts. Without stages the original file is used as is.
    pub fn preprocess(&self, path: &Path) -> Result<StagedInput> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        let mut artifact: Option<NamedTempFile> = None;

        for (index, (name, hook)) in self.preprocess.iter().enumerate() {
            let source = match artifact.take() {
                Some(previous) => {
                    // the reopened handle outlives the unlinked path
                    let file = previous.reopen()?;
                    drop(previous);
                    file
                }
                None => File::open(path)?,
            };
            let mut input = BufReader::new(source);
            let mut output = tempfile::Builder::new()
                .prefix(&format!("{}.preproc_{}.", file_name, index + 1))
                .tempfile()?;

            {
                let mut writer = BufWriter::new(output.as_file_mut());
                let reader: &mut dyn BufRead = &mut input;
                hook(reader, &mut writer).map_err(|e| LogdiffError::hook(name.as_str(), e))?;
                writer.flush()?;
            }

            log::debug!("Preprocess stage {} ({}) wrote {}", index + 1, name, output.path().display());
            drop(input);
            artifact = Some(output);
        }

        let staged = artifact
            .as_ref()
            .map(|file| file.path().to_path_buf())
            .unwrap_or_else(|| path.to_path_buf());

        Ok(StagedInput {
            path: staged,
            _artifact: artifact,
        })
    }

    pub fn process_line(&self, line: String) -> String {
        self.inline.iter().fold(line, |line, (_, hook)| hook(line))
    }

    pub fn postprocess(&self, mut record: Record) -> Result<Record> {
        for (name, hook) in &self.postprocess {
            record = hook(record).map_err(|e| LogdiffError::hook(name.as_str(), e))?;
        }
        Ok(record)
    }
}

/// The input to scan after preprocessing; a staged artifact is deleted on drop
#[derive(Debug)]
pub struct StagedInput {
    path: PathBuf,
    _artifact: Option<NamedTempFile>,
}

impl StagedInput {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(&self.path)?))
    }
}
