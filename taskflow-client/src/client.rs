//! HTTP client with one method per endpoint

use crate::{
    error::{api_error, ClientError, ClientResult},
    session::Session,
    types::{
        HealthStatus, MessageBody, NewTaskRequest, Registration, SeenOutcome, TaskChanges,
        TaskOutcome, UserChanges,
    },
};
use futures::future::join_all;
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use std::time::Duration;
use taskflow_shared::{
    models::{
        notification::{Notification, NotificationDetail},
        task::{TaskDetail, TaskStatus},
        user::{Role, UserSummary},
    },
    services::analytics::DashboardSummary,
};
use uuid::Uuid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct TaskflowClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<Session>,
}

impl TaskflowClient {
    /// Creates a client for the server at `base_url`, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        })
    }

    /// Resumes a session obtained earlier.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Forgets the session. The token itself stays valid until it expires.
    pub fn logout(&mut self) -> Option<Session> {
        self.session.take()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));

        match &self.session {
            Some(session) => builder.bearer_auth(session.token()),
            None => builder,
        }
    }

    fn current(&self) -> ClientResult<&Session> {
        self.session.as_ref().ok_or(ClientError::NotAuthenticated)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let err = api_error(status, &body);
        tracing::debug!(%status, error = %err, "Request failed");
        Err(err)
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str) -> ClientResult<T> {
        self.send(self.request(method, path)).await
    }

    async fn call_with<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(method, path).json(body)).await
    }

    pub async fn health(&self) -> ClientResult<HealthStatus> {
        self.call(Method::GET, "/health").await
    }

    // Auth and users

    /// Logs in and keeps the resulting session.
    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<&Session> {
        let session: Session = self
            .call_with(
                Method::POST,
                "/api/auth/login",
                &json!({ "email": email, "password": password }),
            )
            .await?;

        tracing::debug!(user_id = %session.user_id(), "Logged in");
        Ok(&*self.session.insert(session))
    }

    /// Registers an account and keeps the resulting session.
    pub async fn register(&mut self, registration: &Registration) -> ClientResult<&Session> {
        let session: Session = self
            .call_with(Method::POST, "/api/auth/register", registration)
            .await?;

        Ok(&*self.session.insert(session))
    }

    pub async fn list_users(&self) -> ClientResult<Vec<UserSummary>> {
        self.call(Method::GET, "/api/auth/get-all").await
    }

    pub async fn update_user(&self, id: Uuid, changes: &UserChanges) -> ClientResult<UserSummary> {
        self.call_with(Method::PUT, &format!("/api/auth/update/{}", id), changes)
            .await
    }

    /// Returns the server's confirmation message.
    pub async fn delete_user(&self, id: Uuid) -> ClientResult<String> {
        let body: MessageBody = self
            .call(Method::DELETE, &format!("/api/auth/delete/{}", id))
            .await?;
        Ok(body.message)
    }

    // Tasks

    pub async fn create_task(&self, task: &NewTaskRequest) -> ClientResult<TaskOutcome> {
        self.call_with(Method::POST, "/api/task/create", task).await
    }

    pub async fn list_tasks(&self) -> ClientResult<Vec<TaskDetail>> {
        self.call(Method::GET, "/api/task/get-all").await
    }

    pub async fn get_task(&self, id: Uuid) -> ClientResult<TaskDetail> {
        self.call(Method::GET, &format!("/api/task/get/{}", id)).await
    }

    pub async fn update_task(&self, id: Uuid, changes: &TaskChanges) -> ClientResult<TaskOutcome> {
        self.call_with(Method::PUT, &format!("/api/task/update/{}", id), changes)
            .await
    }

    pub async fn update_task_status(
        &self,
        id: Uuid,
        status: TaskStatus,
    ) -> ClientResult<TaskOutcome> {
        self.call_with(
            Method::PATCH,
            &format!("/api/task/upt-status/{}", id),
            &json!({ "status": status }),
        )
        .await
    }

    pub async fn delete_task(&self, id: Uuid) -> ClientResult<String> {
        let body: MessageBody = self
            .call(Method::DELETE, &format!("/api/task/delete/{}", id))
            .await?;
        Ok(body.message)
    }

    // Notifications

    pub async fn user_notifications(&self, user_id: Uuid) -> ClientResult<Vec<NotificationDetail>> {
        self.call(Method::GET, &format!("/api/notification/user/{}", user_id))
            .await
    }

    /// Notifications for the logged-in user
    pub async fn my_notifications(&self) -> ClientResult<Vec<NotificationDetail>> {
        let user_id = self.current()?.user_id();
        self.user_notifications(user_id).await
    }

    pub async fn mark_seen(&self, id: Uuid) -> ClientResult<Notification> {
        let outcome: SeenOutcome = self
            .call(Method::PUT, &format!("/api/notification/{}/seen", id))
            .await?;
        Ok(outcome.notification)
    }

    /// Marks every id as seen, one request each, and returns the ids that
    /// could not be marked.
    pub async fn mark_all_seen(&self, ids: &[Uuid]) -> Vec<Uuid> {
        let results = join_all(ids.iter().map(|&id| async move {
            (id, self.mark_seen(id).await)
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(notification_id = %id, error = %e, "Failed to mark notification as seen");
                    Some(id)
                }
            })
            .collect()
    }

    /// Admin audit view
    pub async fn all_notifications(&self) -> ClientResult<Vec<NotificationDetail>> {
        self.call(Method::GET, "/api/notification/admin/all").await
    }

    // Analytics

    /// Dashboard for the logged-in user at their own role.
    pub async fn dashboard(&self) -> ClientResult<DashboardSummary> {
        let session = self.current()?;
        self.dashboard_for(session.user_id(), session.role()).await
    }

    pub async fn dashboard_for(&self, user_id: Uuid, role: Role) -> ClientResult<DashboardSummary> {
        let builder = self
            .request(Method::GET, "/api/analytics/dashboard")
            .query(&[("userId", user_id.to_string()), ("role", role.to_string())]);

        self.send(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = TaskflowClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
        assert!(client.session().is_none());
    }

    #[tokio::test]
    async fn test_session_required_for_own_data() {
        let client = TaskflowClient::new("http://127.0.0.1:1").unwrap();

        assert!(matches!(
            client.dashboard().await,
            Err(ClientError::NotAuthenticated)
        ));
        assert!(matches!(
            client.my_notifications().await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_logout_returns_session() {
        let session = Session::new(Uuid::new_v4(), "ana", "ana@example.com", Role::User, "t");
        let mut client = TaskflowClient::new("http://localhost:8080")
            .unwrap()
            .with_session(session.clone());

        assert_eq!(client.logout(), Some(session));
        assert!(client.session().is_none());
    }
}
