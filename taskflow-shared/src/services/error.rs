use crate::mail::MailError;

/// Error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input rejected before touching the store
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Email delivery failed, possibly after the mutation was committed
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
