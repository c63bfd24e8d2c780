//! # Taskflow API Server Library
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from the environment
//! - `error`: error type and HTTP response mapping
//! - `middleware`: response hardening
//! - `routes`: request handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
