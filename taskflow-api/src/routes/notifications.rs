//! Notification endpoints

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskflow_shared::{
    auth::{
        authorization::{require_role, require_self_or_role},
        middleware::AuthContext,
    },
    models::{
        notification::{Notification, NotificationDetail},
        user::Role,
    },
};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkSeenResponse {
    pub message: String,
    pub notification: Notification,
}

/// A user's own feed; managers and admins may read anyone's.
pub async fn list_user_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<NotificationDetail>>> {
    require_self_or_role(&auth, user_id, Role::Manager)?;

    Ok(Json(state.notifications().list_for_user(user_id).await?))
}

pub async fn mark_seen(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MarkSeenResponse>> {
    let notification = state.notifications().mark_seen(id).await?;

    Ok(Json(MarkSeenResponse {
        message: "Notification marked as seen".to_string(),
        notification,
    }))
}

/// Admin audit view across all users
pub async fn list_all_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<NotificationDetail>>> {
    require_role(&auth, Role::Admin)?;

    Ok(Json(state.notifications().list_all().await?))
}
