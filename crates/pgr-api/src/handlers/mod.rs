//! Route handlers, one module per area

pub mod access;
pub mod auth;
pub mod discord;
pub mod health;
pub mod stripe;
