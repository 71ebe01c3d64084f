//! Unit tests for plugin libraries and hook resolution through the driver

use crate::common::{sample_data, TestFixture};
use logdiff::hooks::{FunctionRegistry, PluginCatalog};
use logdiff::{DriverOptions, LogdiffError, ParseDriver, Record, Value};

fn install_extras(registry: &mut FunctionRegistry) {
    registry
        .register_inline("lowercase", |line: String| line.to_lowercase())
        .register_postprocess("tag_record", |mut record: Record| {
            record.insert("warnings".to_string(), Value::List(vec![Value::from("tagged")]));
            Ok(record)
        })
        .register_comparator("compare_prefix", |args: &Value, expected: &Value, got: &Value| {
            let width = args.as_f64().unwrap_or(1.0) as usize;
            let head = |v: &Value| v.to_string().chars().take(width).collect::<String>();
            head(expected) == head(got)
        });
}

fn catalog() -> PluginCatalog {
    let mut catalog = PluginCatalog::with_builtins();
    catalog.register("extras", install_extras);
    catalog
}

#[test]
fn test_imported_library_hooks_run() {
    let fixture = TestFixture::new().unwrap();
    let schema = fixture.create_schema("schema.ini").unwrap();
    let log = fixture.create_log("run.log", &sample_data::log("Alpha", "3")).unwrap();

    let options = DriverOptions {
        schema_files: vec![schema],
        imports: vec!["extras".to_string()],
        postprocess: vec!["tag_record".to_string()],
        ..Default::default()
    };
    let driver = ParseDriver::with_catalog(options, &catalog()).unwrap();

    let store = driver.load_log(&log).unwrap();
    let record = store.get("Alpha").unwrap();
    assert_eq!(record["warnings"], Value::List(vec![Value::from("tagged")]));
}

#[test]
fn test_inline_hooks_apply_before_extraction() {
    let fixture = TestFixture::new().unwrap();
    let schema = fixture
        .create_file(
            "schema.ini",
            "[DRIVER]\nimport = \"extras\"\nprocess = \"lowercase\"\n[name]\nregex = \"name=(\\w+)\"\nkey = true\n",
        )
        .unwrap();
    let log = fixture.create_log("run.log", "NAME=Widget\n").unwrap();

    let options = DriverOptions {
        schema_files: vec![schema],
        ..Default::default()
    };
    let driver = ParseDriver::with_catalog(options, &catalog()).unwrap();
    assert!(driver.load_log(&log).unwrap().get("widget").is_some());
}

#[test]
fn test_custom_comparator_arguments() {
    let fixture = TestFixture::new().unwrap();
    let schema = fixture
        .create_file(
            "schema.ini",
            "[DRIVER]\nimport = \"extras\"\n[id]\nregex = \"id=(\\d+)\"\nkey = true\n\
             [build]\nregex = \"build=(\\S+)\"\ncompare = {\"compare_prefix\": 3}\n",
        )
        .unwrap();
    let options = DriverOptions {
        schema_files: vec![schema],
        ..Default::default()
    };
    let driver = ParseDriver::with_catalog(options, &catalog()).unwrap();

    assert!(driver.compare("build", &Value::from("abc123"), &Value::from("abc999")).unwrap());
    assert!(!driver.compare("build", &Value::from("abc123"), &Value::from("abd123")).unwrap());
}

#[test]
fn test_unknown_hook_name_fails_fast() {
    let fixture = TestFixture::new().unwrap();
    let schema = fixture.create_schema("schema.ini").unwrap();
    let options = DriverOptions {
        schema_files: vec![schema],
        preprocess: vec!["no_such_stage".to_string()],
        ..Default::default()
    };

    let err = ParseDriver::new(options).unwrap_err();
    assert!(matches!(
        err,
        LogdiffError::HookLookup { ref kind, ref name } if kind == "preprocess" && name == "no_such_stage"
    ));
    assert_eq!(err.exit_code(), 255);
}

#[test]
fn test_unknown_library_fails_fast() {
    let fixture = TestFixture::new().unwrap();
    let schema = fixture.create_schema("schema.ini").unwrap();
    let options = DriverOptions {
        schema_files: vec![schema],
        imports: vec!["extras".to_string()],
        ..Default::default()
    };

    // only registered with the custom catalog
    let err = ParseDriver::new(options).unwrap_err();
    assert!(matches!(err, LogdiffError::HookLookup { .. }));
}

#[test]
fn test_empty_catalog_has_no_builtins() {
    let registry = PluginCatalog::empty().load(&[]).unwrap();
    assert!(registry.comparator("compare_equals").is_none());
}
