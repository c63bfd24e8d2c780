//! Database layer for Taskflow
//!
//! - `pool`: PostgreSQL connection pool with a startup health check
//! - `migrations`: embedded schema migrations
//!
//! Table access lives with the models in [`crate::models`].

pub mod migrations;
pub mod pool;
