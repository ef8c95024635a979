pub mod error;
pub mod lifecycle;
pub mod models;
pub mod routes;

pub use error::ApiError;
pub use lifecycle::SessionLifecycle;
