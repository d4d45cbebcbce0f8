//! File-based comparison policies.
//!
//! A [`PolicyConfig`] is the serialisable subset of a [`ComparisonPolicy`]:
//! every flag, the ignore lists, and comparators chosen by name from the
//! built-in set. Closures cannot be expressed in a file; callers needing one
//! add it to the policy after loading.
//!
//! ```toml
//! strict_type_checking = true
//! ignored_fields = ["id", "audit.created_at"]
//! ignored_field_regexes = ["meta\\..*"]
//!
//! [[field_comparators]]
//! path = "price"
//! comparator = "approx"
//! epsilon = 0.01
//!
//! [[type_comparators]]
//! type_name = "str"
//! comparator = "case_insensitive"
//! ```

use crate::errors::{DeepCmpError, Result};
use crate::policy::{
    AlwaysEqualComparator, ApproxComparator, CaseInsensitiveComparator, ComparisonPolicy,
    ValueComparator,
};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

pub const COMPARATOR_APPROX: &str = "approx";
pub const COMPARATOR_CASE_INSENSITIVE: &str = "case_insensitive";
pub const COMPARATOR_ALWAYS_EQUAL: &str = "always_equal";

/// Serialisable comparison policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    pub strict_type_checking: bool,
    pub treat_null_as_distinct_from_empty: bool,
    pub ignore_collection_order: bool,
    pub ignore_actual_null_fields: bool,
    pub ignore_expected_null_fields: bool,
    pub ignored_fields: Vec<String>,
    pub ignored_field_regexes: Vec<String>,
    pub ignored_types: Vec<String>,
    // Tables last so the document serialises in valid TOML order.
    pub field_comparators: Vec<FieldComparatorConfig>,
    pub type_comparators: Vec<TypeComparatorConfig>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            strict_type_checking: false,
            treat_null_as_distinct_from_empty: true,
            ignore_collection_order: false,
            ignore_actual_null_fields: false,
            ignore_expected_null_fields: false,
            ignored_fields: Vec::new(),
            ignored_field_regexes: Vec::new(),
            ignored_types: Vec::new(),
            field_comparators: Vec::new(),
            type_comparators: Vec::new(),
        }
    }
}

/// Named comparator bound to a rule path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldComparatorConfig {
    pub path: String,
    pub comparator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,
}

/// Named comparator bound to a type name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeComparatorConfig {
    pub type_name: String,
    pub comparator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,
}

impl PolicyConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the document is not valid TOML or has
    /// unknown keys.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Render as a TOML document
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if serialisation fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| DeepCmpError::InvalidConfig {
            reason: e.to_string(),
        })
    }
}

/// Instantiate a built-in comparator by name
///
/// # Errors
///
/// - `UnknownComparator`: `name` is not a built-in comparator
/// - `MissingComparatorParameter`: `approx` without `epsilon`
pub fn builtin_comparator(name: &str, epsilon: Option<f64>) -> Result<Rc<dyn ValueComparator>> {
    match name {
        COMPARATOR_APPROX => {
            let epsilon = epsilon.ok_or_else(|| DeepCmpError::MissingComparatorParameter {
                name: name.to_string(),
                parameter: "epsilon".to_string(),
            })?;
            if !epsilon.is_finite() || epsilon < 0.0 {
                return Err(DeepCmpError::InvalidConfig {
                    reason: format!("epsilon must be a non-negative number, got {}", epsilon),
                });
            }
            Ok(Rc::new(ApproxComparator { epsilon }))
        }
        COMPARATOR_CASE_INSENSITIVE => Ok(Rc::new(CaseInsensitiveComparator)),
        COMPARATOR_ALWAYS_EQUAL => Ok(Rc::new(AlwaysEqualComparator)),
        _ => Err(DeepCmpError::UnknownComparator {
            name: name.to_string(),
        }),
    }
}

impl ComparisonPolicy {
    /// Build a policy from a parsed configuration. Rule validation still
    /// happens in [`ComparisonPolicy::resolve`].
    ///
    /// # Errors
    ///
    /// Returns an error if a comparator name is unknown or misses a parameter.
    pub fn from_config(config: &PolicyConfig) -> Result<Self> {
        let mut policy = ComparisonPolicy::new()
            .ignoring_fields(config.ignored_fields.iter().cloned())
            .ignoring_fields_matching(config.ignored_field_regexes.iter().cloned())
            .ignoring_types(config.ignored_types.iter().cloned())
            .with_strict_type_checking(config.strict_type_checking)
            .with_null_distinct_from_empty(config.treat_null_as_distinct_from_empty)
            .ignoring_collection_order(config.ignore_collection_order)
            .ignoring_actual_null_fields(config.ignore_actual_null_fields)
            .ignoring_expected_null_fields(config.ignore_expected_null_fields);

        for entry in &config.field_comparators {
            let comparator = builtin_comparator(&entry.comparator, entry.epsilon)?;
            policy = policy.with_shared_field_comparator(entry.path.clone(), comparator);
        }
        for entry in &config.type_comparators {
            let comparator = builtin_comparator(&entry.comparator, entry.epsilon)?;
            policy = policy.with_shared_type_comparator(entry.type_name.clone(), comparator);
        }
        Ok(policy)
    }

    /// Parse a TOML document straight into a policy
    ///
    /// # Errors
    ///
    /// See [`PolicyConfig::from_toml_str`] and [`ComparisonPolicy::from_config`].
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Self::from_config(&PolicyConfig::from_toml_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = PolicyConfig::from_toml_str("").unwrap();
        assert_eq!(config, PolicyConfig::default());
        assert!(config.treat_null_as_distinct_from_empty);
    }

    #[test]
    fn test_full_document() {
        let source = r#"
            strict_type_checking = true
            ignore_collection_order = true
            ignored_fields = ["id"]
            ignored_types = ["Secret"]

            [[field_comparators]]
            path = "price"
            comparator = "approx"
            epsilon = 0.5

            [[type_comparators]]
            type_name = "str"
            comparator = "case_insensitive"
        "#;
        let config = PolicyConfig::from_toml_str(source).unwrap();
        assert!(config.strict_type_checking);
        assert_eq!(config.field_comparators[0].epsilon, Some(0.5));

        let policy = ComparisonPolicy::from_config(&config).unwrap();
        assert!(policy.strict_type_checking());
        assert!(policy.ignore_collection_order());
        assert!(policy.resolve().is_ok());
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let err = PolicyConfig::from_toml_str("strict = true").unwrap_err();
        assert!(matches!(err, DeepCmpError::InvalidConfig { .. }));
    }

    #[test]
    fn test_unknown_comparator() {
        let source = r#"
            [[field_comparators]]
            path = "name"
            comparator = "soundex"
        "#;
        let err = ComparisonPolicy::from_toml_str(source).unwrap_err();
        assert_eq!(
            err,
            DeepCmpError::UnknownComparator {
                name: "soundex".to_string()
            }
        );
    }

    #[test]
    fn test_approx_requires_epsilon() {
        let err = builtin_comparator(COMPARATOR_APPROX, None).err().expect("expected an error");
        assert!(matches!(
            err,
            DeepCmpError::MissingComparatorParameter { ref parameter, .. } if parameter == "epsilon"
        ));
        assert!(builtin_comparator(COMPARATOR_APPROX, Some(-1.0)).is_err());
    }

    #[test]
    fn test_builtin_comparator_behaviour() {
        let approx = builtin_comparator(COMPARATOR_APPROX, Some(0.1)).unwrap();
        assert!(approx.equals(&Value::from(1.0), &Value::from(1.05)));

        let always = builtin_comparator(COMPARATOR_ALWAYS_EQUAL, None).unwrap();
        assert!(always.equals(&Value::from("a"), &Value::Null));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = PolicyConfig {
            ignored_fields: vec!["id".to_string()],
            field_comparators: vec![FieldComparatorConfig {
                path: "price".to_string(),
                comparator: COMPARATOR_APPROX.to_string(),
                epsilon: Some(0.25),
            }],
            ..PolicyConfig::default()
        };
        let rendered = config.to_toml_string().unwrap();
        assert_eq!(PolicyConfig::from_toml_str(&rendered).unwrap(), config);
    }
}
