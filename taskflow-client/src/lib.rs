//! # Taskflow Client
//!
//! Typed async client for the Taskflow REST API.
//!
//! Authentication state lives in an explicit [`Session`] owned by the
//! client; there is no process-wide token store.
//!
//! ```no_run
//! use taskflow_client::TaskflowClient;
//!
//! # async fn example() -> Result<(), taskflow_client::ClientError> {
//! let mut client = TaskflowClient::new("http://localhost:8080")?;
//! client.login("ana@example.com", "secret123").await?;
//!
//! for task in client.list_tasks().await? {
//!     println!("{} [{}]", task.title, task.status);
//! }
//!
//! let dashboard = client.dashboard().await?;
//! println!("{} unseen", dashboard.unseen_notification_count);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use client::TaskflowClient;
pub use error::{ClientError, ClientResult};
pub use session::Session;
