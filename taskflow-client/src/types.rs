//! Request and response bodies that exist only on the wire

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskflow_shared::models::{
    notification::Notification,
    task::{Task, TaskPriority, TaskStatus},
    user::Role,
};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Fields left `None` are not sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
}

/// Partial task update. `Some(None)` sends `null` and clears the field.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<Uuid>>,
}

/// Answer to task mutations; `message` lists who was notified.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskOutcome {
    pub message: String,
    pub task: Task,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeenOutcome {
    pub message: String,
    pub notification: Notification,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageBody {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_changes_null_and_absent() {
        let changes = TaskChanges {
            assigned_to: Some(None),
            priority: Some(TaskPriority::Low),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            json!({ "assignedTo": null, "priority": "low" })
        );
    }

    #[test]
    fn test_new_task_request_camel_case() {
        let assignee = Uuid::new_v4();
        let req = NewTaskRequest {
            title: "Ship it".to_string(),
            assigned_to: Some(assignee),
            status: Some(TaskStatus::OnHold),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "title": "Ship it", "assignedTo": assignee, "status": "on-hold" })
        );
    }
}
