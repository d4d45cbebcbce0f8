//! deepcmp core - recursive structural comparison of value graphs
//!
//! This crate provides:
//! - A dynamic value model with identity-carrying composites ([`model`])
//! - Classification of values into recursion shapes ([`classify`])
//! - A breadth-first, cycle-safe comparison engine ([`diff`])
//! - Comparison policies with ignore rules and custom comparators
//!   ([`policy`], [`config`])
//! - Structured errors and logging ([`errors`], [`logging_facility`])

pub mod classify;
pub mod config;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod node;
pub mod path;
pub mod policy;

// Used by the exported logging macros.
#[doc(hidden)]
pub use deepcmp_core_types as core_types;

// Re-export commonly used types
pub use classify::{classify, Kind, Shape, TypeClass};
pub use config::PolicyConfig;
pub use diff::{compare, compare_default, Comparison, Difference, DifferenceKind};
pub use errors::{DeepCmpError, ExError, ExErrorKind, Result};
pub use model::{ToValue, Value};
pub use node::ComparisonNode;
pub use path::{Path, Segment};
pub use policy::{ComparisonPolicy, ResolvedPolicy, ValueComparator};
