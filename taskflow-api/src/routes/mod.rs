//! API route handlers, one module per resource
//!
//! - `health`: liveness and database check
//! - `auth`: login, registration and user administration
//! - `tasks`: task CRUD and status changes
//! - `notifications`: notification feed and acknowledgement
//! - `analytics`: dashboard

pub mod analytics;
pub mod auth;
pub mod health;
pub mod notifications;
pub mod tasks;
