//! Dashboard endpoint
//!
//! ```text
//! GET /api/analytics/dashboard?userId=<uuid>&role=<admin|manager|user>
//! ```
//!
//! Both parameters are required. Callers below manager may only ask about
//! themselves, and nobody may ask for a role above their own.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use taskflow_shared::{
    auth::middleware::AuthContext,
    models::user::Role,
    services::analytics::DashboardSummary,
};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub user_id: Option<String>,
    pub role: Option<String>,
}

/// Validated dashboard request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardTarget {
    pub user_id: Uuid,
    pub role: Role,
}

impl DashboardQuery {
    /// Checks presence and format, then the caller's right to see the target.
    pub fn authorize(self, auth: &AuthContext) -> ApiResult<DashboardTarget> {
        let (Some(user_id), Some(role)) = (
            self.user_id.filter(|v| !v.trim().is_empty()),
            self.role.filter(|v| !v.trim().is_empty()),
        ) else {
            return Err(ApiError::BadRequest("userId and role are required".to_string()));
        };

        let user_id = Uuid::parse_str(user_id.trim())
            .map_err(|_| ApiError::BadRequest(format!("Invalid userId: {}", user_id)))?;
        let role = role.trim().parse::<Role>().map_err(ApiError::BadRequest)?;

        if !auth.is_self_or(user_id, Role::Manager) {
            return Err(ApiError::Forbidden(
                "Not authorized to view this dashboard".to_string(),
            ));
        }
        if !auth.role.has_permission(role) {
            return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
        }

        Ok(DashboardTarget { user_id, role })
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> ApiResult<Json<DashboardSummary>> {
    let Query(query) = query?;
    let target = query.authorize(&auth)?;

    let summary = state.analytics().dashboard(target.user_id, target.role).await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "u".to_string(),
            email: "u@example.com".to_string(),
            role,
        }
    }

    fn query(user_id: Option<String>, role: Option<&str>) -> DashboardQuery {
        DashboardQuery {
            user_id,
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_missing_parameters() {
        let auth = ctx(Role::Admin);
        for q in [
            query(None, Some("admin")),
            query(Some(auth.user_id.to_string()), None),
            query(Some(String::new()), Some("admin")),
        ] {
            assert!(matches!(q.authorize(&auth), Err(ApiError::BadRequest(_))));
        }
    }

    #[test]
    fn test_malformed_parameters() {
        let auth = ctx(Role::Admin);
        assert!(matches!(
            query(Some("abc".to_string()), Some("admin")).authorize(&auth),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            query(Some(auth.user_id.to_string()), Some("root")).authorize(&auth),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_user_sees_only_self() {
        let auth = ctx(Role::User);
        let own = query(Some(auth.user_id.to_string()), Some("user"))
            .authorize(&auth)
            .unwrap();
        assert_eq!(own.user_id, auth.user_id);

        assert!(matches!(
            query(Some(Uuid::new_v4().to_string()), Some("user")).authorize(&auth),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_role_cannot_be_escalated() {
        let auth = ctx(Role::User);
        assert!(matches!(
            query(Some(auth.user_id.to_string()), Some("admin")).authorize(&auth),
            Err(ApiError::Forbidden(_))
        ));

        let manager = ctx(Role::Manager);
        let target = query(Some(Uuid::new_v4().to_string()), Some("manager"))
            .authorize(&manager)
            .unwrap();
        assert_eq!(target.role, Role::Manager);
    }
}
