//! Core types shared across deepcmp facilities
//!
//! This crate provides foundational types used by both the error
//! facility and the logging facility:
//!
//! - **Correlation types**: RunId for tagging one comparison invocation
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::RunId;
