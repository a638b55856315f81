//! HTTP API: routes, handlers, error mapping and OpenAPI docs.

pub mod auth;
pub mod docs;
pub mod doorloop;
pub mod error;
pub mod guesty;
pub mod handlers;
pub mod records;
pub mod routes;

pub use error::{ErrorBody, ErrorKind};
pub use handlers::AppState;
pub use routes::create_router;
