#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{order, person};
use deepcmp_core::config::PolicyConfig;
use deepcmp_core::diff::compare;
use deepcmp_core::errors::{DeepCmpError, ExError, ExErrorKind};
use deepcmp_core::model::Value;
use deepcmp_core::policy::ComparisonPolicy;

#[test]
fn test_policy_from_toml_drives_comparison() {
    let source = r#"
        ignored_fields = ["address"]

        [[field_comparators]]
        path = "name"
        comparator = "case_insensitive"

        [[type_comparators]]
        type_name = "float"
        comparator = "approx"
        epsilon = 0.1
    "#;
    let policy = ComparisonPolicy::from_toml_str(source).unwrap();

    let c = compare(&person("Jack", 40, "Paris"), &person("JACK", 40, "Rome"), &policy).unwrap();
    assert!(c.is_equal());

    let c = compare(&Value::from(1.0), &Value::from(1.05), &policy).unwrap();
    assert!(c.is_equal());
}

#[test]
fn test_collection_order_flag_from_toml() {
    let policy = ComparisonPolicy::from_toml_str("ignore_collection_order = true").unwrap();
    let c = compare(&order("o1", &["A", "B"]), &order("o1", &["B", "A"]), &policy).unwrap();
    assert!(c.is_equal());
}

#[test]
fn test_null_versus_empty_flag_from_toml() {
    let policy =
        ComparisonPolicy::from_toml_str("treat_null_as_distinct_from_empty = false").unwrap();
    let c = compare(&Value::Null, &Value::map(Vec::<(&str, Value)>::new()), &policy).unwrap();
    assert!(c.is_equal());
}

#[test]
fn test_malformed_toml_is_invalid_config() {
    let err = PolicyConfig::from_toml_str("ignored_fields = [").unwrap_err();
    assert!(matches!(err, DeepCmpError::InvalidConfig { .. }));

    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::InvalidConfig);
    assert_eq!(ex.op(), Some("load_policy_config"));
}

#[test]
fn test_rule_errors_surface_at_compare_time() {
    // Loading succeeds; the bad rule path is rejected when the policy is resolved
    let policy = ComparisonPolicy::from_toml_str(r#"ignored_fields = ["items[0]"]"#).unwrap();
    let err = compare(&Value::from(1), &Value::from(2), &policy).unwrap_err();
    assert!(matches!(err, DeepCmpError::InvalidRulePath { .. }));
}

#[test]
fn test_missing_epsilon() {
    let source = r#"
        [[type_comparators]]
        type_name = "float"
        comparator = "approx"
    "#;
    let err = ComparisonPolicy::from_toml_str(source).unwrap_err();
    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::MissingParameter);
    assert_eq!(ex.code(), "ERR_MISSING_PARAMETER");
}
