//! Task operations and their side effects
//!
//! Every mutation that concerns other people is followed by a fan-out: for
//! each stakeholder that still resolves to a user, one notification row is
//! written and one email is sent, in that order. Stakeholders are the
//! assignee and, when different, the creator. References to deleted users
//! are skipped.
//!
//! The fan-out runs after the mutation has been written and is not
//! transactional with it. The first store or mail error aborts the rest of
//! the fan-out and is returned to the caller; nothing is rolled back.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::mail::{templates, EmailMessage, Mailer};
use crate::models::notification::{CreateNotification, Notification, NotificationKind};
use crate::models::task::{CreateTask, Task, TaskDetail, TaskPriority, TaskStatus, UpdateTask};
use crate::models::user::User;

pub const TASK_NOT_FOUND: &str = "Task not found";

/// Which side of a task a stakeholder is on. Decides the message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Assignee,
    Creator,
}

/// Something that happened to a task and is worth telling people about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Assigned,
    Updated,
    Deleted,
    StatusChanged(TaskStatus),
}

impl TaskEvent {
    pub fn kind(&self) -> NotificationKind {
        match self {
            TaskEvent::Assigned => NotificationKind::TaskAssigned,
            TaskEvent::Updated => NotificationKind::TaskUpdated,
            TaskEvent::Deleted => NotificationKind::TaskDeleted,
            TaskEvent::StatusChanged(status) => NotificationKind::for_status(*status),
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            TaskEvent::Assigned => "New Task Assigned",
            TaskEvent::Updated => "Task Updated",
            TaskEvent::Deleted => "Task Deleted",
            TaskEvent::StatusChanged(_) => "Task Status Updated",
        }
    }

    /// Deleted tasks are not linked from their notifications
    fn links_task(&self) -> bool {
        !matches!(self, TaskEvent::Deleted)
    }

    /// In-app notification text
    pub fn notification_message(&self, audience: Audience, title: &str) -> String {
        match (self, audience) {
            (TaskEvent::Assigned, _) => {
                format!("You have been assigned a new task: \"{}\"", title)
            }
            (TaskEvent::Updated, Audience::Assignee) => {
                format!("The task \"{}\" has been updated.", title)
            }
            (TaskEvent::Updated, Audience::Creator) => {
                format!("Your task \"{}\" has been updated.", title)
            }
            (TaskEvent::Deleted, Audience::Assignee) => {
                format!("The task \"{}\" has been deleted.", title)
            }
            (TaskEvent::Deleted, Audience::Creator) => {
                format!("Your task \"{}\" has been deleted.", title)
            }
            (TaskEvent::StatusChanged(status), Audience::Assignee) => format!(
                "The status of task \"{}\" has been changed to \"{}\".",
                title, status
            ),
            (TaskEvent::StatusChanged(status), Audience::Creator) => format!(
                "The status of your task \"{}\" has been changed to \"{}\".",
                title, status
            ),
        }
    }

    /// Email body for `username`
    pub fn email_body(&self, audience: Audience, username: &str, task: &Task) -> String {
        let title = task.title.as_str();

        match (self, audience) {
            (TaskEvent::Assigned, _) => {
                let headline = format!("You have been assigned a new task: \"{}\".", title);
                let details = format!(
                    "Description: {}\nDue Date: {}",
                    templates::or_unspecified(task.description.as_deref()),
                    templates::or_unspecified(task.due_date.map(|d| d.to_rfc3339())),
                );
                templates::letter(username, &[&headline, &details])
            }
            (TaskEvent::Updated, _) => {
                let headline = self.notification_message(audience, title);
                templates::letter(username, &[&headline, "Check your dashboard for details."])
            }
            (TaskEvent::Deleted, _) => {
                templates::letter(username, &[&self.notification_message(audience, title)])
            }
            (TaskEvent::StatusChanged(status), Audience::Assignee) => {
                let headline = format!(
                    "The status of task \"{}\" has been updated to \"{}\".",
                    title, status
                );
                templates::letter(username, &[&headline])
            }
            (TaskEvent::StatusChanged(status), Audience::Creator) => {
                let headline = format!(
                    "The status of your task \"{}\" has been updated to \"{}\".",
                    title, status
                );
                templates::letter(username, &[&headline])
            }
        }
    }
}

/// Who hears about a change to `task`: the assignee first, then the creator
/// unless the creator is also the assignee.
pub fn stakeholders(task: &Task) -> Vec<(Uuid, Audience)> {
    let mut recipients = Vec::with_capacity(2);

    if let Some(assignee) = task.assigned_to {
        recipients.push((assignee, Audience::Assignee));
    }
    if task.creator_is_distinct() {
        recipients.push((task.created_by, Audience::Creator));
    }

    recipients
}

/// `"<prefix> Notifications sent to: a, b"`
pub fn notification_summary(prefix: &str, notified: &[String]) -> String {
    format!("{} Notifications sent to: {}", prefix, notified.join(", "))
}

/// Input for [`TaskService::create`]
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub created_by: Uuid,
    pub assigned_to: Option<Uuid>,
}

/// Outcome of a mutation: the row and the usernames that were notified
#[derive(Debug, Clone)]
pub struct TaskMutation {
    pub task: Task,
    pub notified: Vec<String>,
}

/// Title must be non-empty after trimming
fn clean_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::Validation("Title is required".to_string()));
    }
    Ok(title.to_string())
}

/// Trims; an all-whitespace description is stored as absent
fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Parses a raw status value; empty input is its own error.
pub fn parse_status(raw: &str) -> ServiceResult<TaskStatus> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ServiceError::Validation("Status is required".to_string()));
    }
    raw.parse::<TaskStatus>().map_err(ServiceError::Validation)
}

#[derive(Clone)]
pub struct TaskService {
    db: PgPool,
    mailer: Arc<dyn Mailer>,
}

impl TaskService {
    pub fn new(db: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, mailer }
    }

    /// Persists a task and, if it has an assignee that resolves to a user,
    /// notifies and emails the assignee.
    pub async fn create(&self, input: NewTask) -> ServiceResult<Task> {
        let title = clean_title(&input.title)?;

        let task = Task::create(
            &self.db,
            CreateTask {
                title,
                description: clean_description(input.description),
                due_date: input.due_date,
                priority: input.priority.unwrap_or_default(),
                status: input.status.unwrap_or_default(),
                created_by: input.created_by,
                assigned_to: input.assigned_to,
            },
        )
        .await?;

        tracing::info!(task_id = %task.id, created_by = %task.created_by, "Task created");

        if let Some(assignee) = task.assigned_to {
            self.notify(&task, TaskEvent::Assigned, &[(assignee, Audience::Assignee)])
                .await?;
        }

        Ok(task)
    }

    pub async fn list(&self) -> ServiceResult<Vec<TaskDetail>> {
        Ok(Task::list_details(&self.db).await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<TaskDetail> {
        Task::find_detail(&self.db, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(TASK_NOT_FOUND.to_string()))
    }

    /// Merges `changes` into the task and notifies its stakeholders.
    pub async fn update(&self, id: Uuid, mut changes: UpdateTask) -> ServiceResult<TaskMutation> {
        if let Some(title) = changes.title.take() {
            changes.title = Some(clean_title(&title)?);
        }
        if let Some(description) = changes.description.take() {
            changes.description = Some(clean_description(description));
        }

        let task = Task::update(&self.db, id, changes)
            .await?
            .ok_or_else(|| ServiceError::NotFound(TASK_NOT_FOUND.to_string()))?;

        tracing::info!(task_id = %task.id, "Task updated");

        let notified = self.notify(&task, TaskEvent::Updated, &stakeholders(&task)).await?;
        Ok(TaskMutation { task, notified })
    }

    /// Removes the task, then notifies the stakeholders of the removed row.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<TaskMutation> {
        let task = Task::delete(&self.db, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(TASK_NOT_FOUND.to_string()))?;

        tracing::info!(task_id = %task.id, "Task deleted");

        let notified = self.notify(&task, TaskEvent::Deleted, &stakeholders(&task)).await?;
        Ok(TaskMutation { task, notified })
    }

    /// Sets only the status. An empty or unknown status is rejected before
    /// the store is touched.
    pub async fn update_status(&self, id: Uuid, raw_status: &str) -> ServiceResult<TaskMutation> {
        let status = parse_status(raw_status)?;

        let task = Task::update_status(&self.db, id, status)
            .await?
            .ok_or_else(|| ServiceError::NotFound(TASK_NOT_FOUND.to_string()))?;

        tracing::info!(task_id = %task.id, status = %status, "Task status changed");

        let notified = self
            .notify(&task, TaskEvent::StatusChanged(status), &stakeholders(&task))
            .await?;
        Ok(TaskMutation { task, notified })
    }

    /// Writes a notification and sends an email to every recipient that
    /// resolves to a user. Returns the usernames reached, in order.
    async fn notify(
        &self,
        task: &Task,
        event: TaskEvent,
        recipients: &[(Uuid, Audience)],
    ) -> ServiceResult<Vec<String>> {
        let mut notified = Vec::with_capacity(recipients.len());

        for &(user_id, audience) in recipients {
            let Some(user) = User::find_by_id(&self.db, user_id).await? else {
                tracing::debug!(task_id = %task.id, %user_id, "Skipping unknown stakeholder");
                continue;
            };

            Notification::create(
                &self.db,
                CreateNotification {
                    user_id: user.id,
                    message: event.notification_message(audience, &task.title),
                    kind: event.kind(),
                    task_id: event.links_task().then_some(task.id),
                    assigned_by: Some(task.created_by),
                },
            )
            .await?;

            let email = EmailMessage::new(
                user.email.clone(),
                event.subject(),
                event.email_body(audience, &user.username, task),
            );
            if let Err(e) = self.mailer.send(email).await {
                tracing::error!(
                    task_id = %task.id,
                    to = %user.email,
                    mailer = self.mailer.name(),
                    error = %e,
                    "Failed to send task email"
                );
                return Err(e.into());
            }

            notified.push(user.username);
        }

        Ok(notified)
    }
}
