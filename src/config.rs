//! Loader for the extended INI schema dialect
//!
//! A schema file is an INI document whose values are literal fragments
//! (numbers, quoted strings, arrays, objects, booleans, null). On top of
//! plain INI it supports `#include <file>` directives, resolved through a
//! stack of directories, and `${key}` / `${section:key}` interpolation.

use crate::error::{LogdiffError, Result};
use crate::sanitize::sanitize;
use crate::value::Value;
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Decoded `key = value` pairs of one section
pub type Section = IndexMap<String, Value>;

/// Decoded sections in declaration order
pub type SectionMap = IndexMap<String, Section>;

/// Name of the fallback section whose keys every section inherits
pub const DEFAULT_SECTION: &str = "DEFAULT";

const INCLUDE_DIRECTIVE: &str = "#include";
const COMMENT_PREFIX: char = '#';
const MAX_INTERPOLATION_DEPTH: usize = 10;

/// Reads schema files into a [`SectionMap`]
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    default_section: String,
    search_path: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            default_section: DEFAULT_SECTION.to_string(),
            search_path: Vec::new(),
        }
    }

    /// Add a colon-delimited list of directories searched for includes
    pub fn with_search_path(mut self, paths: &str) -> Self {
        self.search_path.extend(
            paths.split(':')
                .filter(|entry| !entry.trim().is_empty())
                .map(|entry| PathBuf::from(entry.trim())),
        );
        self
    }

    pub fn with_default_section(mut self, name: impl Into<String>) -> Self {
        self.default_section = name.into();
        self
    }

    /// Load every file in order. A section defined by a later file replaces
    /// the same-named section of an earlier one.
    pub fn load<P: AsRef<Path>>(&self, files: &[P]) -> Result<SectionMap> {
        let mut dest = SectionMap::new();
        for file in files {
            self.load_into(file.as_ref(), &mut dest)?;
        }
        Ok(dest)
    }

    /// Load a single file, merging its sections into `dest`
    pub fn load_into(&self, file: &Path, dest: &mut SectionMap) -> Result<()> {
        let mut chain = Vec::new();
        let path = self.resolve(file, &chain)?;
        log::debug!("Loading schema file {}", path.display());

        let flattened = self.flatten_file(&path, &mut chain)?;
        self.merge(&flattened, &path.display().to_string(), dest)
    }

    /// Load schema text held in memory; includes resolve from the search path
    pub fn loads(&self, content: &str, dest: &mut SectionMap) -> Result<()> {
        let mut chain = Vec::new();
        let flattened = self.flatten_str(content, &mut chain)?;
        self.merge(&flattened, "<string>", dest)
    }

    fn merge(&self, flattened: &str, origin: &str, dest: &mut SectionMap) -> Result<()> {
        for (name, section) in self.decode(flattened, origin)? {
            dest.insert(name, section);
        }
        Ok(())
    }

    /// Expand a file's includes in place. `chain` holds the files currently
    /// being flattened; their directories form the include search stack.
    fn flatten_file(&self, path: &Path, chain: &mut Vec<PathBuf>) -> Result<String> {
        let canonical = fs::canonicalize(path).map_err(|e| {
            LogdiffError::config_parse(path.display().to_string(), format!("unable to open: {}", e))
        })?;

        if chain.contains(&canonical) {
            return Err(LogdiffError::config_parse(
                origin_of(chain),
                format!("include cycle through {}", canonical.display()),
            ));
        }

        let content = fs::read_to_string(&canonical).map_err(|e| {
            LogdiffError::config_parse(canonical.display().to_string(), format!("unable to read: {}", e))
        })?;

        chain.push(canonical);
        let flattened = self.flatten_str(&content, chain);
        chain.pop();
        flattened
    }

    fn flatten_str(&self, content: &str, chain: &mut Vec<PathBuf>) -> Result<String> {
        let mut output = String::new();

        for line in content.lines() {
            if let Some(target) = include_target(line) {
                let path = self.resolve(Path::new(target), chain)?;
                log::debug!("Including {} from {}", path.display(), origin_of(chain));
                output.push_str(&self.flatten_file(&path, chain)?);
            } else {
                let clean = line.split(COMMENT_PREFIX).next().unwrap_or("");
                output.push_str(clean.trim_end());
                output.push('\n');
            }
        }

        Ok(output)
    }

    /// Locate `target`: the including files' directories from the innermost
    /// outwards, then the working directory, then the search path.
    fn resolve(&self, target: &Path, chain: &[PathBuf]) -> Result<PathBuf> {
        let not_found = || {
            LogdiffError::config_parse(
                origin_of(chain),
                format!("unable to resolve include target '{}'", target.display()),
            )
        };

        if target.as_os_str().is_empty() {
            return Err(not_found());
        }

        if target.is_absolute() {
            return if target.is_file() {
                Ok(target.to_path_buf())
            } else {
                Err(not_found())
            };
        }

        let stack = chain.iter().rev().filter_map(|file| file.parent());
        let candidates = stack
            .map(|dir| dir.join(target))
            .chain(std::iter::once(target.to_path_buf()))
            .chain(self.search_path.iter().map(|dir| dir.join(target)));

        for candidate in candidates {
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(not_found())
    }

    fn decode(&self, flattened: &str, origin: &str) -> Result<SectionMap> {
        let document = self.parse_ini(flattened, origin)?;
        let mut sections = SectionMap::new();

        for name in document.sections.keys() {
            let mut section = Section::new();
            for key in document.option_names(name) {
                let raw = document.lookup(name, &key).unwrap_or_default();
                let text = document.interpolate(name, raw, origin, 0)?;
                let value = decode_literal(&text).map_err(|e| {
                    LogdiffError::config_parse(
                        origin,
                        format!("[{}] {}: malformed literal {:?}: {}", name, key, text.trim(), e),
                    )
                })?;
                section.insert(key, sanitize(value));
            }
            sections.insert(name.clone(), section);
        }

        Ok(sections)
    }

    fn parse_ini(&self, text: &str, origin: &str) -> Result<IniDocument> {
        let mut document = IniDocument {
            default_section: self.default_section.clone(),
            ..Default::default()
        };
        let mut current: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let trimmed = line.trim();

            if line.starts_with(char::is_whitespace) {
                if let (Some(section), Some(key)) = (&current, &last_key) {
                    if let Some(value) = document.entries_mut(section).get_mut(key) {
                        value.push('\n');
                        value.push_str(trimmed);
                    }
                    continue;
                }
            }

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                let name = strip_quotes(&trimmed[1..trimmed.len() - 1]);
                if name != self.default_section {
                    document.sections.entry(name.clone()).or_default();
                }
                current = Some(name);
                last_key = None;
                continue;
            }

            let Some(section) = &current else {
                return Err(LogdiffError::config_parse(
                    origin,
                    format!("line {}: entry outside of any section: {:?}", index + 1, trimmed),
                ));
            };

            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(LogdiffError::config_parse(
                    origin,
                    format!("line {}: expected 'key = value', found {:?}", index + 1, trimmed),
                ));
            };

            let key = strip_quotes(key).to_lowercase();
            if key.is_empty() {
                return Err(LogdiffError::config_parse(
                    origin,
                    format!("line {}: empty key in [{}]", index + 1, section),
                ));
            }

            document
                .entries_mut(section)
                .insert(key.clone(), value.trim().to_string());
            last_key = Some(key);
        }

        Ok(document)
    }
}

/// Raw string entries of a flattened document, before interpolation
#[derive(Debug, Default)]
struct IniDocument {
    default_section: String,
    defaults: IndexMap<String, String>,
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl IniDocument {
    fn entries_mut(&mut self, section: &str) -> &mut IndexMap<String, String> {
        if section == self.default_section {
            &mut self.defaults
        } else {
            self.sections.entry(section.to_string()).or_default()
        }
    }

    fn lookup(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .or_else(|| self.defaults.get(key))
            .map(String::as_str)
    }

    /// Own keys first, then inherited defaults not overridden
    fn option_names(&self, section: &str) -> Vec<String> {
        let own = self.sections.get(section);
        let mut names: Vec<String> = own.map(|e| e.keys().cloned().collect()).unwrap_or_default();
        for key in self.defaults.keys() {
            if own.map_or(true, |e| !e.contains_key(key)) {
                names.push(key.clone());
            }
        }
        names
    }

    fn interpolate(&self, section: &str, raw: &str, origin: &str, depth: usize) -> Result<String> {
        if depth > MAX_INTERPOLATION_DEPTH {
            return Err(LogdiffError::config_parse(
                origin,
                format!("[{}] interpolation nested deeper than {} levels", section, MAX_INTERPOLATION_DEPTH),
            ));
        }

        let mut output = String::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(pos) = rest.find('$') {
            output.push_str(&rest[..pos]);
            let tail = &rest[pos + 1..];

            if let Some(after) = tail.strip_prefix('$') {
                output.push('$');
                rest = after;
            } else if let Some(after) = tail.strip_prefix('{') {
                let end = after.find('}').ok_or_else(|| {
                    LogdiffError::config_parse(origin, format!("[{}] unterminated reference in {:?}", section, raw))
                })?;
                let reference = &after[..end];
                let (target, key) = match reference.split_once(':') {
                    Some((target, key)) => (target.trim(), key),
                    None => (section, reference),
                };
                let key = key.trim().to_lowercase();

                let value = self.lookup(target, &key).ok_or_else(|| {
                    LogdiffError::config_parse(
                        origin,
                        format!("[{}] unresolved reference ${{{}}}", section, reference),
                    )
                })?;
                output.push_str(&self.interpolate(target, value, origin, depth + 1)?);
                rest = &after[end + 1..];
            } else {
                // a bare '$' is literal, regex anchors rely on it
                output.push('$');
                rest = tail;
            }
        }

        output.push_str(rest);
        Ok(output)
    }
}

fn origin_of(chain: &[PathBuf]) -> String {
    chain
        .last()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<command line>".to_string())
}

/// `#include path`, `#include "path"` and `#include <path>`
fn include_target(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(INCLUDE_DIRECTIVE)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let target = rest.trim();
    let target = target
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .or_else(|| target.strip_prefix('"').and_then(|t| t.strip_suffix('"')))
        .unwrap_or(target);
    Some(target.trim())
}

/// Strip whitespace and any number of matching surrounding quote pairs
fn strip_quotes(raw: &str) -> String {
    let mut value = raw.trim();
    while value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = value[1..value.len() - 1].trim();
    }
    value.to_string()
}

/// Decode a literal fragment. Backslashes are taken literally so that
/// regexes can be written without JSON escaping.
fn decode_literal(text: &str) -> serde_json::Result<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&trimmed.replace('\\', "\\\\"))
}
