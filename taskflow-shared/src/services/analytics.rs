//! Dashboard analytics
//!
//! A dashboard is recomputed from scratch on every request. Each metric is
//! its own query; nothing is cached and no intermediate state is shared.
//!
//! The *scope* of a user is the set of tasks they created or are assigned
//! to. Dates are bucketed by UTC calendar day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::error::ServiceResult;
use crate::models::notification::NotificationKind;
use crate::models::task::{TaskPriority, TaskStatus};
use crate::models::user::Role;

/// Number of daily buckets in the completion trend
pub const TREND_DAYS: i64 = 15;

/// Number of notifications in the recent activity feed
pub const RECENT_ACTIVITY_LIMIT: i64 = 10;

const SCOPE: &str = "(created_by = $1 OR assigned_to = $1)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PriorityCount {
    pub priority: TaskPriority,
    pub count: i64,
}

/// Tasks created on `date`, and how many of those are now completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub created: i64,
    pub completed: i64,
}

/// Open tasks whose due date fell on `date`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OverduePoint {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserPerformance {
    pub user_id: Uuid,
    pub username: String,
    pub completed_count: i64,
}

/// Coarse activity classification shown in the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    TaskCompleted,
    TaskCreated,
    TaskUpdated,
}

impl From<NotificationKind> for ActivityType {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::TaskCompleted => ActivityType::TaskCompleted,
            NotificationKind::TaskAssigned => ActivityType::TaskCreated,
            NotificationKind::TaskUpdated
            | NotificationKind::TaskStatusChanged
            | NotificationKind::TaskDeleted => ActivityType::TaskUpdated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    /// Acting user, or `System` when unknown
    pub user: String,

    /// Task title, or `Task` when the task is gone
    pub task: String,

    pub time: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    kind: NotificationKind,
    actor_username: Option<String>,
    task_title: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Self {
            activity_type: row.kind.into(),
            user: row.actor_username.unwrap_or_else(|| "System".to_string()),
            task: row.task_title.unwrap_or_else(|| "Task".to_string()),
            time: row.created_at,
        }
    }
}

/// Everything on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub unseen_notification_count: i64,
    pub assigned_tasks_count: i64,
    pub created_tasks_count: i64,
    pub task_status_breakdown: Vec<StatusCount>,
    pub task_completion_trend: Vec<TrendPoint>,
    pub priority_breakdown: Vec<PriorityCount>,
    pub overdue_trends: Vec<OverduePoint>,
    pub completion_rate: f64,
    /// Empty unless the requested role is admin or manager
    pub completed_tasks_per_user: Vec<UserPerformance>,
    pub recent_activity: Vec<Activity>,
}

/// Percentage of `completed` over `total`, rounded to two decimals. Zero
/// when there is nothing in scope.
pub fn completion_rate(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = completed as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Keeps the `limit` most recent buckets and returns them oldest first.
pub fn latest_buckets(mut points: Vec<TrendPoint>, limit: usize) -> Vec<TrendPoint> {
    points.sort_by(|a, b| b.date.cmp(&a.date));
    points.truncate(limit);
    points.reverse();
    points
}

#[derive(Clone)]
pub struct AnalyticsService {
    db: PgPool,
}

impl AnalyticsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Builds the dashboard for `user_id`. `role` only decides whether the
    /// team performance table is included.
    pub async fn dashboard(&self, user_id: Uuid, role: Role) -> ServiceResult<DashboardSummary> {
        let unseen_notification_count = self.unseen_notification_count(user_id).await?;
        let assigned_tasks_count = self.count_tasks("assigned_to = $1", user_id).await?;
        let created_tasks_count = self.count_tasks("created_by = $1", user_id).await?;
        let task_status_breakdown = self.status_breakdown(user_id).await?;
        let task_completion_trend = self.completion_trend(user_id).await?;
        let priority_breakdown = self.priority_breakdown(user_id).await?;
        let overdue_trends = self.overdue_trends(user_id).await?;

        let total = self.count_tasks(SCOPE, user_id).await?;
        let completed = self
            .count_tasks(&format!("status = 'completed' AND {}", SCOPE), user_id)
            .await?;

        let completed_tasks_per_user = if role.is_supervisor() {
            self.completed_tasks_per_user().await?
        } else {
            Vec::new()
        };

        let recent_activity = self.recent_activity(user_id).await?;

        tracing::debug!(%user_id, role = %role, total, completed, "Dashboard computed");

        Ok(DashboardSummary {
            unseen_notification_count,
            assigned_tasks_count,
            created_tasks_count,
            task_status_breakdown,
            task_completion_trend,
            priority_breakdown,
            overdue_trends,
            completion_rate: completion_rate(completed, total),
            completed_tasks_per_user,
            recent_activity,
        })
    }

    async fn unseen_notification_count(&self, user_id: Uuid) -> ServiceResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND seen = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// `filter` is a fixed predicate over `$1`, never caller input
    async fn count_tasks(&self, filter: &str, user_id: Uuid) -> ServiceResult<i64> {
        let query = format!("SELECT COUNT(*) FROM tasks WHERE {}", filter);

        let count = sqlx::query_scalar(&query)
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }

    async fn status_breakdown(&self, user_id: Uuid) -> ServiceResult<Vec<StatusCount>> {
        let query = format!(
            "SELECT status, COUNT(*) AS count FROM tasks WHERE {} GROUP BY status ORDER BY status",
            SCOPE
        );

        let rows = sqlx::query_as::<_, StatusCount>(&query)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;

        Ok(rows)
    }

    async fn completion_trend(&self, user_id: Uuid) -> ServiceResult<Vec<TrendPoint>> {
        let query = format!(
            "SELECT DATE(created_at AT TIME ZONE 'UTC') AS date, \
                    COUNT(*) AS created, \
                    COUNT(*) FILTER (WHERE status = 'completed') AS completed \
             FROM tasks WHERE {} \
             GROUP BY 1 ORDER BY 1 DESC LIMIT $2",
            SCOPE
        );

        let rows = sqlx::query_as::<_, TrendPoint>(&query)
            .bind(user_id)
            .bind(TREND_DAYS)
            .fetch_all(&self.db)
            .await?;

        Ok(latest_buckets(rows, TREND_DAYS as usize))
    }

    async fn priority_breakdown(&self, user_id: Uuid) -> ServiceResult<Vec<PriorityCount>> {
        let query = format!(
            "SELECT priority, COUNT(*) AS count FROM tasks WHERE {} GROUP BY priority ORDER BY priority",
            SCOPE
        );

        let rows = sqlx::query_as::<_, PriorityCount>(&query)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;

        Ok(rows)
    }

    async fn overdue_trends(&self, user_id: Uuid) -> ServiceResult<Vec<OverduePoint>> {
        let query = format!(
            "SELECT DATE(due_date AT TIME ZONE 'UTC') AS date, COUNT(*) AS count \
             FROM tasks \
             WHERE due_date < NOW() AND status <> 'completed' AND {} \
             GROUP BY 1 ORDER BY 1",
            SCOPE
        );

        let rows = sqlx::query_as::<_, OverduePoint>(&query)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;

        Ok(rows)
    }

    /// Completed tasks per assignee. Assignees that no longer exist are
    /// dropped by the join.
    async fn completed_tasks_per_user(&self) -> ServiceResult<Vec<UserPerformance>> {
        let rows = sqlx::query_as::<_, UserPerformance>(
            r#"
            SELECT u.id AS user_id, u.username, COUNT(*) AS completed_count
            FROM tasks t
            JOIN users u ON u.id = t.assigned_to
            WHERE t.status = 'completed'
            GROUP BY u.id, u.username
            ORDER BY completed_count DESC, u.username ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn recent_activity(&self, user_id: Uuid) -> ServiceResult<Vec<Activity>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT n.kind, a.username AS actor_username, t.title AS task_title, n.created_at
            FROM notifications n
            LEFT JOIN users a ON a.id = n.assigned_by
            LEFT JOIN tasks t ON t.id = n.task_id
            WHERE n.user_id = $1
            ORDER BY n.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(RECENT_ACTIVITY_LIMIT)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Activity::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, created: i64) -> TrendPoint {
        TrendPoint {
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            created,
            completed: 0,
        }
    }

    #[test]
    fn test_completion_rate() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(3, 0), 0.0);
        assert_eq!(completion_rate(1, 3), 33.33);
        assert_eq!(completion_rate(2, 3), 66.67);
        assert_eq!(completion_rate(4, 4), 100.0);
        assert_eq!(completion_rate(1, 8), 12.5);
    }

    #[test]
    fn test_latest_buckets_keeps_most_recent_ascending() {
        let points: Vec<TrendPoint> = (1..=20).rev().map(|d| point(d, d as i64)).collect();
        let kept = latest_buckets(points, 15);

        assert_eq!(kept.len(), 15);
        assert_eq!(kept.first().unwrap().date.to_string(), "2025-03-06");
        assert_eq!(kept.last().unwrap().date.to_string(), "2025-03-20");
        assert!(kept.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_latest_buckets_short_series() {
        let kept = latest_buckets(vec![point(2, 1), point(1, 1)], 15);
        assert_eq!(kept, vec![point(1, 1), point(2, 1)]);
    }

    #[test]
    fn test_activity_type_from_kind() {
        assert_eq!(
            ActivityType::from(NotificationKind::TaskCompleted),
            ActivityType::TaskCompleted
        );
        assert_eq!(
            ActivityType::from(NotificationKind::TaskAssigned),
            ActivityType::TaskCreated
        );
        for kind in [
            NotificationKind::TaskUpdated,
            NotificationKind::TaskStatusChanged,
            NotificationKind::TaskDeleted,
        ] {
            assert_eq!(ActivityType::from(kind), ActivityType::TaskUpdated);
        }
    }

    #[test]
    fn test_activity_fallbacks() {
        let activity = Activity::from(ActivityRow {
            kind: NotificationKind::TaskDeleted,
            actor_username: None,
            task_title: None,
            created_at: Utc::now(),
        });

        assert_eq!(activity.user, "System");
        assert_eq!(activity.task, "Task");

        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "task_updated");
    }

    #[test]
    fn test_summary_wire_names() {
        let summary = DashboardSummary {
            unseen_notification_count: 2,
            assigned_tasks_count: 1,
            created_tasks_count: 0,
            task_status_breakdown: vec![StatusCount {
                status: TaskStatus::InProgress,
                count: 1,
            }],
            task_completion_trend: vec![point(1, 1)],
            priority_breakdown: vec![],
            overdue_trends: vec![],
            completion_rate: 0.0,
            completed_tasks_per_user: vec![],
            recent_activity: vec![],
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["unseenNotificationCount"], 2);
        assert_eq!(json["taskStatusBreakdown"][0]["status"], "in-progress");
        assert_eq!(json["taskCompletionTrend"][0]["date"], "2025-03-01");
        assert!(json["completedTasksPerUser"].as_array().unwrap().is_empty());
        assert_eq!(json["completionRate"], 0.0);
    }
}
