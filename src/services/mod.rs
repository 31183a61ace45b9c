//! Google Workspace service descriptors and the service catalog

pub mod catalog;
pub mod models;

pub use catalog::ServiceCatalog;
pub use models::{GoogleWorkspaceService, ServiceStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unknown service: {0}")]
    Unknown(String),
}
