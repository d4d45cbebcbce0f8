//! Structural comparison engine.
//!
//! Compares two value graphs and produces an ordered list of differences.
//!
//! ## Entry point
//!
//! ```
//! use deepcmp_core::diff::{compare, DifferenceKind};
//! use deepcmp_core::model::Value;
//! use deepcmp_core::policy::ComparisonPolicy;
//!
//! let actual = Value::object("Person", [("name", "Jack"), ("city", "Paris")]);
//! let expected = Value::object("Person", [("name", "Jack"), ("city", "Rome")]);
//!
//! let comparison = compare(&actual, &expected, &ComparisonPolicy::default())?;
//! assert_eq!(comparison.paths(), vec!["city"]);
//! assert_eq!(comparison.differences[0].kind, DifferenceKind::ValueMismatch);
//! # Ok::<(), deepcmp_core::errors::DeepCmpError>(())
//! ```
//!
//! ## Guarantees
//!
//! - **Termination**: cyclic graphs terminate; a pair of objects is entered at
//!   most once per invocation.
//! - **Determinism**: identical inputs and policy produce the same differences
//!   in the same order.
//! - **No partial failure**: the only error is an invalid policy, reported
//!   before traversal starts.

pub mod engine;
pub mod model;

pub use engine::{compare, compare_default};
pub use model::{Comparison, Difference, DifferenceKind, DifferenceSummary};
