//! Explicit authentication context

use serde::{Deserialize, Serialize};
use taskflow_shared::models::user::Role;
use uuid::Uuid;

/// Logged-in identity, built from the login or register response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "id")]
    user_id: Uuid,
    username: String,
    email: String,
    role: Role,
    token: String,
}

impl Session {
    pub fn new(
        user_id: Uuid,
        username: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        token: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            email: email.into(),
            role,
            token: token.into(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Bearer token for the `Authorization` header
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Managers and admins see every user's data
    pub fn is_supervisor(&self) -> bool {
        self.role.is_supervisor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_auth_response() {
        let id = Uuid::new_v4();
        let body = format!(
            r#"{{"id":"{}","username":"ana","email":"ana@example.com","role":"manager","token":"abc"}}"#,
            id
        );

        let session: Session = serde_json::from_str(&body).unwrap();
        assert_eq!(session.user_id(), id);
        assert_eq!(session.username(), "ana");
        assert_eq!(session.role(), Role::Manager);
        assert_eq!(session.token(), "abc");
        assert!(session.is_supervisor());
    }
}
