//! Workflow documents: models, stored-file normalization, validation,
//! dependency ordering and the in-memory store.

pub mod file;
pub mod models;
pub mod store;
pub mod validation;

pub use file::{WorkflowFile, WorkflowOrFile};
pub use models::*;
pub use store::WorkflowStore;
pub use validation::{execution_order, resolve_parameters, validate, ValidationReport};

use thiserror::Error;

/// Errors raised while handling workflow documents
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error("Workflow already exists: {0}")]
    AlreadyExists(String),

    #[error("Cannot parse workflow file '{filename}': {reason}")]
    Unparseable { filename: String, reason: String },

    #[error("Dependency cycle between steps: {}", steps.join(", "))]
    CycleDetected { steps: Vec<String> },

    #[error("Missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("Invalid value for parameter '{name}' (expected {expected}): {reason}")]
    InvalidParameter {
        name: String,
        expected: ParameterType,
        reason: String,
    },

    #[error("Workflow is invalid: {}", .0.join("; "))]
    Invalid(Vec<String>),
}
