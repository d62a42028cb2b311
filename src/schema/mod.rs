//! Schema catalog subsystem
//!
//! The catalog describes every queryable field, its type, and the
//! operators legal for each type. It is fetched once and treated as
//! immutable for the rest of the process.
//!
//! # Design Principles
//!
//! - Loaded at most once; a failed load may be retried
//! - Operator sets come from the catalog, never from the caller
//! - Rules that no longer match the catalog are classified, not rejected

mod catalog;
mod errors;
mod operator;
mod types;
mod validator;

pub use catalog::SchemaCatalog;
pub use errors::{SchemaError, SchemaResult};
pub use operator::{standard_operators, DatePreset, Operator, OperatorChoice, ValueShape};
pub use types::{FieldDefinition, FieldSource, FieldType, VisualizerSchema};
pub use validator::{MalformedReason, RuleStatus, RuleValidator};
