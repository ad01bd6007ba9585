//! Authentication utilities

mod bearer;
mod jwt;

pub use bearer::extract_bearer_token;
pub use jwt::{Claims, JwtService};
