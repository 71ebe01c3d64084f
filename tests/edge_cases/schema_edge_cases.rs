//! Edge cases in schema files; every one of these aborts the run

use crate::common::{sample_data, TestFixture};
use logdiff::{LogdiffError, Value};

fn load(content: &str) -> logdiff::Result<logdiff::ParseDriver> {
    let fixture = TestFixture::new()?;
    let schema = fixture.create_file("schema.ini", content)?;
    fixture.driver(&schema)
}

#[test]
fn test_schema_without_key_field() {
    let err = load("[count]\nregex = \"count=(\\d+)\"\n").unwrap_err();
    assert!(matches!(err, LogdiffError::SchemaValidation { .. }));
    assert!(err.to_string().contains("key = true"));
    assert_eq!(err.exit_code(), 255);
}

#[test]
fn test_field_without_regex() {
    let err = load("[id]\nregex = \"id=(\\d+)\"\nkey = true\n[count]\ndefault = 0\n").unwrap_err();
    assert!(matches!(err, LogdiffError::SchemaValidation { ref field, .. } if field == "count"));
}

#[test]
fn test_invalid_regex() {
    let err = load("[id]\nregex = \"id=([0-9\"\nkey = true\n").unwrap_err();
    assert!(matches!(err, LogdiffError::SchemaValidation { .. }));
    assert!(err.to_string().contains("invalid regex"));
}

#[test]
fn test_compare_with_two_functions() {
    let err = load(
        "[id]\nregex = \"id=(\\d+)\"\nkey = true\ncompare = {\"compare_equals\": null, \"compare_exact\": null}\n",
    )
    .unwrap_err();
    assert!(matches!(err, LogdiffError::SchemaValidation { .. }));
}

#[test]
fn test_compare_not_a_map() {
    let err = load("[id]\nregex = \"id=(\\d+)\"\nkey = true\ncompare = \"compare_equals\"\n").unwrap_err();
    assert!(err.to_string().contains("compare is not of type (map)"));
}

#[test]
fn test_unknown_comparator() {
    let err = load("[id]\nregex = \"id=(\\d+)\"\nkey = true\ncompare = {\"compare_fuzzy\": null}\n").unwrap_err();
    assert!(matches!(err, LogdiffError::ComparatorLookup { ref name } if name == "compare_fuzzy"));
}

#[test]
fn test_non_bool_flag() {
    let err = load("[id]\nregex = \"id=(\\d+)\"\nkey = \"yes\"\n").unwrap_err();
    assert!(matches!(err, LogdiffError::SchemaValidation { .. }));
}

#[test]
fn test_malformed_literal() {
    let err = load("[id]\nregex = \"id=(\\d+)\nkey = true\n").unwrap_err();
    assert!(matches!(err, LogdiffError::ConfigParse { .. }));
}

#[test]
fn test_include_cycle() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_file("a.ini", "#include b.ini\n[id]\nregex = \"id=(\\d+)\"\nkey = true\n").unwrap();
    let b = fixture.create_file("b.ini", "#include a.ini\n").unwrap();

    let err = fixture.driver(&b).unwrap_err();
    assert!(matches!(err, LogdiffError::ConfigParse { .. }));
    assert!(err.to_string().contains("include cycle"));
}

#[test]
fn test_missing_schema_file() {
    let fixture = TestFixture::new().unwrap();
    let err = fixture.driver(&fixture.root().join("absent.ini")).unwrap_err();
    assert!(matches!(err, LogdiffError::ConfigParse { .. }));
}

#[test]
fn test_unknown_attributes_are_dropped() {
    let driver = load("[id]\nregex = \"id=(\\d+)\"\nkey = true\ncolour = \"blue\"\n").unwrap();
    assert_eq!(driver.header_list(), vec!["id"]);
}

#[test]
fn test_key_fields_ignore_default_and_hiding() {
    let driver = load("[id]\nregex = \"id=(\\d+)\"\nkey = true\ndefault = 5\nhide-if = 5\nauto-hide = true\n").unwrap();
    let field = driver.schema().field("id").unwrap();
    assert!(field.default.is_null());
    assert!(!field.auto_hide);
}

#[test]
fn test_list_default_turns_on_listing() {
    let driver = load("[id]\nregex = \"id=(\\d+)\"\nkey = true\n[tags]\nregex = \"tag=(\\w+)\"\ndefault = [\"none\"]\n")
        .unwrap();
    assert!(driver.is_multivalued("tags"));

    let mut record = logdiff::Record::new();
    driver.set_default(&mut record);
    assert_eq!(record["tags"], Value::List(vec![Value::from("none")]));
}

#[test]
fn test_auto_hide_without_hide_if_value() {
    let driver = load(sample_data::SCHEMA).unwrap();
    assert!(driver.schema().field("status").unwrap().auto_hide);

    let driver = load("[id]\nregex = \"id=(\\d+)\"\nkey = true\n[note]\nregex = \"note=(.*)\"\nauto-hide = true\n").unwrap();
    assert!(!driver.schema().field("note").unwrap().auto_hide);
}
