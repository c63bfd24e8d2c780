//! Authentication and user administration
//!
//! - `POST /api/auth/login`: exchange credentials for a session token
//! - `POST /api/auth/register`: create an account and log in
//! - `GET /api/auth/get-all`: list users
//! - `PUT /api/auth/update/:id`: self-service or admin update
//! - `DELETE /api/auth/delete/:id`: admin only
//!
//! Emails are compared case-insensitively and stored lowercase.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use taskflow_shared::{
    auth::{
        authorization::{require_role, require_self_or_role},
        jwt,
        middleware::AuthContext,
        password::{self, MIN_PASSWORD_LENGTH},
    },
    models::user::{CreateUser, Role, UpdateUser, User, UserSummary},
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const USER_EXISTS: &str = "User already exists";
const USER_NOT_FOUND: &str = "User not found";

/// Usernames are stored trimmed, so whitespace alone is empty.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(
            ValidationError::new("blank").with_message("Username must not be blank".into()),
        );
    }
    Ok(())
}

/// True when the insert lost a race on the unique email index.
fn is_email_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .constraint()
            .map(|constraint| constraint.contains("email"))
            .unwrap_or(false),
        _ => false,
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(min = 1, max = 100, message = "Username must be 1 to 100 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Defaults to `user`
    pub role: Option<Role>,
}

/// Login and registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, max = 100, message = "Username must be 1 to 100 characters"),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    /// Only admins may change roles
    pub role: Option<Role>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn auth_response(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let token = jwt::issue_session_token(&user, state.jwt_secret(), state.config.session_lifetime())?;

    Ok(AuthResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        token,
    })
}

/// Unknown email and wrong password get the same 400.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let user = User::find_by_email(&state.db, &normalize_email(&req.email))
        .await?
        .ok_or_else(|| ApiError::BadRequest(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login rejected");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
    Ok(Json(auth_response(&state, user)?))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let email = normalize_email(&req.email);
    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::BadRequest(USER_EXISTS.to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username.trim().to_string(),
            email,
            password_hash,
            role: req.role.unwrap_or_default(),
        },
    )
    .await
    .map_err(|e| {
        if is_email_conflict(&e) {
            ApiError::BadRequest(USER_EXISTS.to_string())
        } else {
            ApiError::from(e)
        }
    })?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

/// Users may edit themselves; admins may edit anyone and change roles.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserSummary>> {
    let Json(req) = payload?;
    req.validate()?;

    require_self_or_role(&auth, id, Role::Admin)?;
    if req.role.is_some() {
        require_role(&auth, Role::Admin)?;
    }

    let existing = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    let email = req.email.as_deref().map(normalize_email);
    if let Some(email) = &email {
        if let Some(other) = User::find_by_email(&state.db, email).await? {
            if other.id != existing.id {
                return Err(ApiError::Conflict("Email already exists".to_string()));
            }
        }
    }

    let password_hash = match req.password.as_deref() {
        Some(plain) => Some(password::hash_password(plain)?),
        None => None,
    };

    let changes = UpdateUser {
        username: req.username.map(|u| u.trim().to_string()),
        email,
        password_hash,
        role: req.role,
    };

    if changes.is_empty() {
        return Ok(Json(existing.into()));
    }

    let updated = User::update(&state.db, id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    tracing::info!(user_id = %id, updated_by = %auth.user_id, "User updated");
    Ok(Json(updated.into()))
}

/// Hard delete. Tasks and notifications that point at the user are kept.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    require_role(&auth, Role::Admin)?;

    if !User::delete(&state.db, id).await? {
        return Err(ApiError::NotFound(USER_NOT_FOUND.to_string()));
    }

    tracing::info!(user_id = %id, deleted_by = %auth.user_id, "User removed");
    Ok(Json(json!({ "message": "User removed successfully" })))
}
