//! Integration test utilities for the PGR backend
//!
//! Spawns the real API against PostgreSQL, with Stripe and Discord replaced
//! by a local mock server.

pub mod helpers;
pub mod mock_providers;

pub use fixtures::*;
pub use helpers::*;
pub use mock_providers::MockProviders;
