//! Client behavior against an in-process stub server

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use taskflow_client::{ClientError, TaskflowClient};
use taskflow_shared::models::user::Role;
use uuid::Uuid;

const TOKEN: &str = "tok-123";
const USER_ID: &str = "6f1c2d3e-0000-4000-8000-000000000001";
const FAILING_ID: &str = "6f1c2d3e-0000-4000-8000-0000000000ff";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "unauthorized", "message": "Missing credentials" })),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> axum::response::Response {
    if body["password"] != "secret123" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "bad_request", "message": "Invalid credentials" })),
        )
            .into_response();
    }

    Json(json!({
        "id": USER_ID,
        "username": "ana",
        "email": body["email"],
        "role": "manager",
        "token": TOKEN,
    }))
    .into_response()
}

async fn list_tasks(headers: HeaderMap) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    Json(json!([{
        "id": Uuid::new_v4(),
        "title": "Write report",
        "description": null,
        "dueDate": null,
        "priority": "medium",
        "status": "pending",
        "createdBy": { "id": USER_ID, "username": "ana", "email": "ana@example.com" },
        "assignedTo": null,
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:00:00Z",
    }]))
    .into_response()
}

async fn mark_seen(headers: HeaderMap, Path(id): Path<String>) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if id == FAILING_ID {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "message": "Notification not found" })),
        )
            .into_response();
    }

    Json(json!({
        "message": "Notification marked as seen",
        "notification": {
            "id": id,
            "user": USER_ID,
            "message": "New task assigned: Write report",
            "kind": "task_assigned",
            "task": null,
            "assignedBy": null,
            "seen": true,
            "createdAt": "2025-01-01T00:00:00Z",
        }
    }))
    .into_response()
}

async fn dashboard(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if params.get("userId").map(String::as_str) != Some(USER_ID)
        || params.get("role").map(String::as_str) != Some("manager")
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "bad_request", "message": "userId and role are required" })),
        )
            .into_response();
    }

    Json(json!({
        "unseenNotificationCount": 2,
        "assignedTasksCount": 1,
        "createdTasksCount": 3,
        "taskStatusBreakdown": [{ "status": "pending", "count": 1 }],
        "taskCompletionTrend": [],
        "priorityBreakdown": [],
        "overdueTrends": [],
        "completionRate": 0.0,
        "completedTasksPerUser": [],
        "recentActivity": [],
    }))
    .into_response()
}

async fn all_notifications(headers: HeaderMap) -> axum::response::Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([])).into_response()
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/task/get-all", get(list_tasks))
        .route("/api/notification/:id/seen", put(mark_seen))
        .route("/api/notification/admin/all", get(all_notifications))
        .route("/api/analytics/dashboard", get(dashboard));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_login_stores_session_and_sends_token() {
    let base = spawn_server().await;
    let mut client = TaskflowClient::new(base).unwrap();

    let session = client.login("ana@example.com", "secret123").await.unwrap();
    assert_eq!(session.role(), Role::Manager);
    assert_eq!(session.token(), TOKEN);

    let tasks = client.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Write report");
    assert_eq!(tasks[0].created_by.as_ref().unwrap().username, "ana");
}

#[tokio::test]
async fn test_failed_login_surfaces_server_message() {
    let base = spawn_server().await;
    let mut client = TaskflowClient::new(base).unwrap();

    match client.login("ana@example.com", "wrong").await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert!(client.session().is_none());
}

#[tokio::test]
async fn test_requests_without_session_are_unauthorized() {
    let base = spawn_server().await;
    let client = TaskflowClient::new(base).unwrap();

    let err = client.list_tasks().await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_mark_all_seen_reports_failures() {
    let base = spawn_server().await;
    let mut client = TaskflowClient::new(base).unwrap();
    client.login("ana@example.com", "secret123").await.unwrap();

    let ok = Uuid::new_v4();
    let failing: Uuid = FAILING_ID.parse().unwrap();

    let failed = client.mark_all_seen(&[ok, failing]).await;
    assert_eq!(failed, vec![failing]);

    let notification = client.mark_seen(ok).await.unwrap();
    assert!(notification.seen);
}

#[tokio::test]
async fn test_dashboard_uses_session_identity() {
    let base = spawn_server().await;
    let mut client = TaskflowClient::new(base).unwrap();
    client.login("ana@example.com", "secret123").await.unwrap();

    let summary = client.dashboard().await.unwrap();
    assert_eq!(summary.unseen_notification_count, 2);
    assert_eq!(summary.created_tasks_count, 3);
    assert_eq!(summary.task_status_breakdown.len(), 1);
}

#[tokio::test]
async fn test_admin_feed_after_logout_is_unauthorized() {
    let base = spawn_server().await;
    let mut client = TaskflowClient::new(base).unwrap();
    client.login("ana@example.com", "secret123").await.unwrap();

    assert!(client.all_notifications().await.unwrap().is_empty());

    client.logout();
    assert!(client.all_notifications().await.unwrap_err().is_unauthorized());
}
