//! Notification model and database operations
//!
//! A notification records one event directed at one user. Rows are created
//! as a side effect of task mutations, only ever have `seen` flipped to true,
//! and are never deleted by the application.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE notifications (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL,
//!     message TEXT NOT NULL,
//!     kind notification_kind NOT NULL,
//!     task_id UUID,
//!     assigned_by UUID,
//!     seen BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::task::{TaskStatus, UserRef};

/// Event that produced a notification. Recorded at creation time so that
/// consumers never have to infer it from the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskAssigned,
    TaskUpdated,
    TaskStatusChanged,
    TaskCompleted,
    TaskDeleted,
}

impl NotificationKind {
    /// Kind for a status change to `status`
    pub fn for_status(status: TaskStatus) -> Self {
        if status == TaskStatus::Completed {
            NotificationKind::TaskCompleted
        } else {
            NotificationKind::TaskStatusChanged
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TaskAssigned => "task_assigned",
            NotificationKind::TaskUpdated => "task_updated",
            NotificationKind::TaskStatusChanged => "task_status_changed",
            NotificationKind::TaskCompleted => "task_completed",
            NotificationKind::TaskDeleted => "task_deleted",
        }
    }
}

/// Notification row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,

    /// Recipient
    #[serde(rename = "user")]
    pub user_id: Uuid,

    pub message: String,

    pub kind: NotificationKind,

    /// Related task; absent for deletions
    #[serde(rename = "task")]
    pub task_id: Option<Uuid>,

    /// Acting user
    pub assigned_by: Option<Uuid>,

    pub seen: bool,

    pub created_at: DateTime<Utc>,
}

/// Embedded task reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: Uuid,
    pub title: String,
}

/// Notification with recipient, task and actor expanded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDetail {
    pub id: Uuid,
    pub user: Option<UserRef>,
    pub message: String,
    pub kind: NotificationKind,
    pub task: Option<TaskRef>,
    pub assigned_by: Option<UserRef>,
    pub seen: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationDetailRow {
    id: Uuid,
    user_id: Uuid,
    recipient_username: Option<String>,
    recipient_email: Option<String>,
    message: String,
    kind: NotificationKind,
    task_id: Option<Uuid>,
    task_title: Option<String>,
    assigned_by: Option<Uuid>,
    actor_username: Option<String>,
    actor_email: Option<String>,
    seen: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationDetailRow> for NotificationDetail {
    fn from(row: NotificationDetailRow) -> Self {
        let user = match (row.recipient_username, row.recipient_email) {
            (Some(username), Some(email)) => Some(UserRef {
                id: row.user_id,
                username,
                email,
            }),
            _ => None,
        };
        let task = match (row.task_id, row.task_title) {
            (Some(id), Some(title)) => Some(TaskRef { id, title }),
            _ => None,
        };
        let assigned_by = match (row.assigned_by, row.actor_username, row.actor_email) {
            (Some(id), Some(username), Some(email)) => Some(UserRef { id, username, email }),
            _ => None,
        };

        Self {
            id: row.id,
            user,
            message: row.message,
            kind: row.kind,
            task,
            assigned_by,
            seen: row.seen,
            created_at: row.created_at,
        }
    }
}

/// Input for creating a notification
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub task_id: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, message, kind, task_id, assigned_by, seen, created_at";

const NOTIFICATION_DETAIL_SELECT: &str = r#"
    SELECT n.id, n.user_id, r.username AS recipient_username, r.email AS recipient_email,
           n.message, n.kind, n.task_id, t.title AS task_title,
           n.assigned_by, a.username AS actor_username, a.email AS actor_email,
           n.seen, n.created_at
    FROM notifications n
    LEFT JOIN users r ON r.id = n.user_id
    LEFT JOIN tasks t ON t.id = n.task_id
    LEFT JOIN users a ON a.id = n.assigned_by
"#;

impl Notification {
    pub async fn create(pool: &PgPool, data: CreateNotification) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, message, kind, task_id, assigned_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            NOTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, Notification>(&query)
            .bind(data.user_id)
            .bind(data.message)
            .bind(data.kind)
            .bind(data.task_id)
            .bind(data.assigned_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM notifications WHERE id = $1", NOTIFICATION_COLUMNS);

        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Sets `seen = true`. Idempotent; returns `None` only when the row does
    /// not exist.
    pub async fn mark_seen(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications SET seen = TRUE WHERE id = $1 RETURNING {}",
            NOTIFICATION_COLUMNS
        );

        sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A user's notifications, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<NotificationDetail>, sqlx::Error> {
        let query = format!(
            "{} WHERE n.user_id = $1 ORDER BY n.created_at DESC",
            NOTIFICATION_DETAIL_SELECT
        );

        let rows = sqlx::query_as::<_, NotificationDetailRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(NotificationDetail::from).collect())
    }

    /// Every notification across all users, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<NotificationDetail>, sqlx::Error> {
        let query = format!("{} ORDER BY n.created_at DESC", NOTIFICATION_DETAIL_SELECT);

        let rows = sqlx::query_as::<_, NotificationDetailRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(NotificationDetail::from).collect())
    }

    pub async fn count_for_task(pool: &PgPool, task_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_status() {
        assert_eq!(
            NotificationKind::for_status(TaskStatus::Completed),
            NotificationKind::TaskCompleted
        );
        assert_eq!(
            NotificationKind::for_status(TaskStatus::OnHold),
            NotificationKind::TaskStatusChanged
        );
    }

    #[test]
    fn test_notification_wire_names() {
        let task_id = Uuid::new_v4();
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            message: "You have been assigned a new task: \"Write report\"".to_string(),
            kind: NotificationKind::TaskAssigned,
            task_id: Some(task_id),
            assigned_by: None,
            seen: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["task"], task_id.to_string());
        assert!(json.get("user").is_some());
        assert!(json["assignedBy"].is_null());
        assert_eq!(json["kind"], "task_assigned");
        assert_eq!(json["seen"], false);
    }

    #[test]
    fn test_detail_row_with_deleted_task() {
        let row = NotificationDetailRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            recipient_username: Some("ana".to_string()),
            recipient_email: Some("ana@example.com".to_string()),
            message: "The task \"Old\" has been deleted.".to_string(),
            kind: NotificationKind::TaskDeleted,
            task_id: None,
            task_title: None,
            assigned_by: Some(Uuid::new_v4()),
            actor_username: None,
            actor_email: None,
            seen: true,
            created_at: Utc::now(),
        };

        let detail = NotificationDetail::from(row);
        assert_eq!(detail.user.unwrap().username, "ana");
        assert!(detail.task.is_none());
        assert!(detail.assigned_by.is_none());
    }
}
