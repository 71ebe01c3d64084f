//! Field schema construction and validation

use crate::config::{Section, SectionMap};
use crate::error::{LogdiffError, Result};
use crate::value::Value;
use indexmap::IndexMap;
use regex::Regex;

/// Reserved section holding run-level directives rather than a field
pub const DRIVER_SECTION: &str = "DRIVER";

pub const K_DEFAULT: &str = "default";
pub const K_KEY: &str = "key";
pub const K_REGEX: &str = "regex";
pub const K_HIDE_IF: &str = "hide-if";
pub const K_AUTO_HIDE: &str = "auto-hide";
pub const K_LIST: &str = "listing";
pub const K_COMPARE: &str = "compare";

const ATTRIBUTES: &[&str] = &[K_DEFAULT, K_KEY, K_REGEX, K_HIDE_IF, K_AUTO_HIDE, K_LIST, K_COMPARE];

/// Named comparator and the arguments handed to it
#[derive(Debug, Clone, PartialEq)]
pub struct CompareSpec {
    pub name: String,
    pub args: Value,
}

/// One extracted field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    /// Patterns as written in the schema
    pub patterns: Vec<String>,
    regexes: Vec<Regex>,
    pub is_key: bool,
    pub default: Value,
    pub list_mode: bool,
    pub auto_hide: bool,
    pub hide_if: Value,
    pub compare: Option<CompareSpec>,
}

impl FieldSpec {
    /// Compiled patterns, each anchored at the start of a line
    pub fn regexes(&self) -> &[Regex] {
        &self.regexes
    }
}

/// Validated fields in declaration order
#[derive(Debug, Clone)]
pub struct Schema {
    fields: IndexMap<String, FieldSpec>,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values().filter(|f| f.is_key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Hook and import names declared in the `DRIVER` section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverDirectives {
    pub import: Vec<String>,
    pub preprocess: Vec<String>,
    pub process: Vec<String>,
    pub postprocess: Vec<String>,
}

impl DriverDirectives {
    /// Remove the `DRIVER` section from `sections` and read its name lists
    pub fn unload(sections: &mut SectionMap) -> Result<Self> {
        let Some(mut driver) = sections.shift_remove(DRIVER_SECTION) else {
            return Ok(Self::default());
        };

        Ok(Self {
            import: unload_list(&mut driver, "import")?,
            preprocess: unload_list(&mut driver, "preprocess")?,
            process: unload_list(&mut driver, "process")?,
            postprocess: unload_list(&mut driver, "postprocess")?,
        })
    }
}

fn unload_list(section: &mut Section, entry: &str) -> Result<Vec<String>> {
    let invalid = || LogdiffError::schema(DRIVER_SECTION, format!("{} must be a string or a list of strings", entry));

    match section.shift_remove(entry) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Str(name)) => Ok(vec![name]),
        Some(Value::List(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Str(name) => Ok(name),
                _ => Err(invalid()),
            })
            .collect(),
        Some(_) => Err(invalid()),
    }
}

/// Turns loaded sections into a [`Schema`]
pub struct SchemaBuilder {
    sections: SectionMap,
}

impl SchemaBuilder {
    pub fn new(sections: SectionMap) -> Self {
        Self { sections }
    }

    pub fn build(self) -> Result<Schema> {
        let mut fields = IndexMap::new();

        for (name, section) in self.sections {
            if name == DRIVER_SECTION {
                continue;
            }
            let field = build_field(&name, section)?;
            fields.insert(name, field);
        }

        if !fields.values().any(|f| f.is_key) {
            return Err(LogdiffError::schema(
                "<schema>",
                "no key field; add `key = true` to at least one field so records can be sorted",
            ));
        }

        log::debug!("Built schema with {} fields", fields.len());
        Ok(Schema { fields })
    }
}

fn build_field(name: &str, mut section: Section) -> Result<FieldSpec> {
    section.retain(|key, _| {
        let known = ATTRIBUTES.contains(&key.as_str());
        if !known {
            log::warn!("invalid option: {} passed into the entry [{}], removing", key, name);
        }
        known
    });

    let patterns = regex_attr(name, section.get(K_REGEX))?;
    let regexes = patterns
        .iter()
        .map(|p| {
            Regex::new(&format!("^(?:{})", p))
                .map_err(|e| LogdiffError::schema(name, format!("invalid regex {:?}: {}", p, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let is_key = bool_attr(name, &section, K_KEY)?.unwrap_or(false);
    let mut list_mode = bool_attr(name, &section, K_LIST)?.unwrap_or(false);
    let auto_hide_attr = bool_attr(name, &section, K_AUTO_HIDE)?;
    let compare = compare_attr(name, section.get(K_COMPARE))?;

    let mut default = section.shift_remove(K_DEFAULT).unwrap_or_default();
    let mut hide_if = section.shift_remove(K_HIDE_IF).unwrap_or_default();

    // keys identify records, they never take defaults or get hidden
    if is_key {
        default = Value::Null;
        hide_if = Value::Null;
    }

    let auto_hide = !is_key && auto_hide_attr == Some(true) && !hide_if.is_null();

    if default.is_list() {
        list_mode = true;
    }

    if list_mode {
        if !is_key {
            default = match default {
                Value::Null => Value::List(Vec::new()),
                Value::List(items) => Value::List(items),
                other => Value::List(vec![other]),
            };
        }
        if !hide_if.is_null() && !hide_if.is_list() {
            hide_if = Value::List(vec![hide_if]);
        }
    }

    Ok(FieldSpec {
        name: name.to_string(),
        patterns,
        regexes,
        is_key,
        default,
        list_mode,
        auto_hide,
        hide_if,
        compare,
    })
}

fn regex_attr(name: &str, value: Option<&Value>) -> Result<Vec<String>> {
    match value {
        None | Some(Value::Null) => Err(LogdiffError::schema(
            name,
            "regex is required for the configuration to work",
        )),
        Some(Value::Str(pattern)) => Ok(vec![pattern.clone()]),
        Some(Value::List(items)) => items
            .iter()
            .map(|item| match item {
                Value::Str(pattern) => Ok(pattern.clone()),
                other => Err(LogdiffError::schema(
                    name,
                    format!("regex is expected to be a list of string, found {}", other.type_name()),
                )),
            })
            .collect(),
        Some(other) => Err(LogdiffError::schema(
            name,
            format!("regex is not of type (string, list), found {}", other.type_name()),
        )),
    }
}

fn bool_attr(name: &str, section: &Section, key: &str) -> Result<Option<bool>> {
    match section.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(LogdiffError::schema(
            name,
            format!("{} is not of type (bool), found {}", key, other.type_name()),
        )),
    }
}

fn compare_attr(name: &str, value: Option<&Value>) -> Result<Option<CompareSpec>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Map(map)) if map.len() == 1 => {
            let (comparator, args) = map.iter().next().map(|(k, v)| (k.clone(), v.clone())).unwrap_or_default();
            Ok(Some(CompareSpec { name: comparator, args }))
        }
        Some(Value::Map(_)) => Err(LogdiffError::schema(
            name,
            "compare must be of format 'function: struct', with only one function",
        )),
        Some(other) => Err(LogdiffError::schema(
            name,
            format!("compare is not of type (map), found {}", other.type_name()),
        )),
    }
}
