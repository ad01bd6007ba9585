//! Axum extractors for request handling

mod auth;
mod request_id;
mod validated;

pub use auth::AuthUser;
pub use request_id::RequestId;
pub use validated::ValidatedJson;

pub(crate) use validated::json_rejection;
