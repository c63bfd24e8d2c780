//! Notification reads and acknowledgement

use sqlx::PgPool;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::models::notification::{Notification, NotificationDetail};

pub const NOTIFICATION_NOT_FOUND: &str = "Notification not found";

#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// A user's notifications, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> ServiceResult<Vec<NotificationDetail>> {
        Ok(Notification::list_for_user(&self.db, user_id).await?)
    }

    /// Sets `seen`. Calling it again on a seen notification succeeds.
    pub async fn mark_seen(&self, id: Uuid) -> ServiceResult<Notification> {
        let notification = Notification::mark_seen(&self.db, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOTIFICATION_NOT_FOUND.to_string()))?;

        tracing::debug!(notification_id = %id, user_id = %notification.user_id, "Notification seen");
        Ok(notification)
    }

    /// Every notification across all users, newest first
    pub async fn list_all(&self) -> ServiceResult<Vec<NotificationDetail>> {
        Ok(Notification::list_all(&self.db).await?)
    }
}
