//! Store models and their table operations
//!
//! - `user`: accounts and roles
//! - `task`: tasks, status and priority
//! - `notification`: per-user event records
//!
//! The three tables carry no foreign keys between each other, so a deleted
//! user or task leaves dangling ids behind; expanded views render those as
//! `null`.

pub mod notification;
pub mod task;
pub mod user;
