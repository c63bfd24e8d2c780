//! Task endpoints
//!
//! Mutations answer with the usernames that were notified, e.g.
//! `Task updated successfully. Notifications sent to: bo, ana`.

use crate::{
    app::AppState,
    error::ApiResult,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use taskflow_shared::{
    auth::{authorization::require_role, middleware::AuthContext},
    models::{
        task::{Task, TaskDetail, TaskPriority, TaskStatus, UpdateTask},
        user::Role,
    },
    services::tasks::{notification_summary, NewTask},
};
use uuid::Uuid;
use validator::Validate;

/// Maps an absent field to `None` and an explicit `null` to `Some(None)`
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,

    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub priority: Option<TaskPriority>,

    pub status: Option<TaskStatus>,

    /// Defaults to the caller
    pub created_by: Option<Uuid>,

    pub assigned_to: Option<Uuid>,
}

/// Partial update. `null` clears `description`, `dueDate` or `assignedTo`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub priority: Option<TaskPriority>,

    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "nullable")]
    pub assigned_to: Option<Option<Uuid>>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
            status: req.status,
            assigned_to: req.assigned_to,
        }
    }
}

/// The status is taken raw so that an empty string gets its own message.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: Task,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Managers and admins only.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    require_role(&auth, Role::Manager)?;

    let Json(req) = payload?;
    req.validate()?;

    let task = state
        .tasks()
        .create(NewTask {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
            status: req.status,
            created_by: req.created_by.unwrap_or(auth.user_id),
            assigned_to: req.assigned_to,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created successfully".to_string(),
            task,
        }),
    ))
}

pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<TaskDetail>>> {
    Ok(Json(state.tasks().list().await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(state.tasks().get(id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let outcome = state.tasks().update(id, req.into()).await?;
    tracing::debug!(task_id = %id, user_id = %auth.user_id, "Update handled");

    Ok(Json(TaskResponse {
        message: notification_summary("Task updated successfully.", &outcome.notified),
        task: outcome.task,
    }))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let Json(req) = payload?;
    let status = req.status.unwrap_or_default();

    let outcome = state.tasks().update_status(task_id, &status).await?;
    tracing::debug!(%task_id, user_id = %auth.user_id, "Status change handled");

    Ok(Json(TaskResponse {
        message: notification_summary(
            "Task status updated successfully.",
            &outcome.notified,
        ),
        task: outcome.task,
    }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let outcome = state.tasks().delete(id).await?;
    tracing::debug!(task_id = %id, user_id = %auth.user_id, "Delete handled");

    Ok(Json(MessageResponse {
        message: notification_summary("Task deleted.", &outcome.notified),
    }))
}
