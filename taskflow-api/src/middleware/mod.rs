//! Middleware for the API server
//!
//! Authentication is applied per route group in [`crate::app`]; this module
//! holds the response hardening applied to every route.

pub mod security;
