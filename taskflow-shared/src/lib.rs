//! # Taskflow Shared Library
//!
//! Types, store access and business logic behind the Taskflow API server.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and embedded migrations
//! - `models`: users, tasks and notifications with their queries
//! - `auth`: password hashing, session tokens, request authentication, role checks
//! - `mail`: outbound email backends
//! - `services`: task, notification and analytics operations

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;
pub mod services;

/// Current version of the Taskflow shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
