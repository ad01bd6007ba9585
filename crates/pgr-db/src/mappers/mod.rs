//! Entity to model mappers
//!
//! Conversions from database rows (`*Model`) to domain entities (pgr-core).
//! Writes bind entity fields directly in the repositories.

mod audit_log;
mod subscription;
mod user;
