//! Business operations on top of the models
//!
//! - [`tasks`]: task CRUD and the notification + email fan-out
//! - [`notifications`]: notification reads and mark-seen
//! - [`analytics`]: dashboard aggregation
//!
//! Services hold a pool handle and, where they send email, a mailer. Both are
//! cheap to clone, so handlers build a service per request.

pub mod analytics;
pub mod error;
pub mod notifications;
pub mod tasks;

pub use error::{ServiceError, ServiceResult};
