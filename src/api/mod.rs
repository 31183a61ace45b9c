//! HTTP API

pub mod discovery_handlers;
pub mod handlers;
pub mod response;
pub mod routes;

pub use response::ApiResponse;
pub use routes::create_router;
