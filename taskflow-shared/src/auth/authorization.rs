//! Role checks
//!
//! Roles are ordered admin > manager > user. Handlers call these helpers
//! after authentication and map [`AuthzError`] to 403.

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::Role;

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole { required: Role, actual: Role },

    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Requires the caller to hold at least `required`.
pub fn require_role(auth: &AuthContext, required: Role) -> Result<(), AuthzError> {
    if auth.role.has_permission(required) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            required,
            actual: auth.role,
        })
    }
}

/// Requires the caller to be `owner` or to hold at least `role`.
pub fn require_self_or_role(
    auth: &AuthContext,
    owner: Uuid,
    role: Role,
) -> Result<(), AuthzError> {
    if auth.is_self_or(owner, role) {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
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

    #[test]
    fn test_require_role() {
        assert!(require_role(&ctx(Role::Admin), Role::Manager).is_ok());
        assert!(require_role(&ctx(Role::Manager), Role::Manager).is_ok());

        let err = require_role(&ctx(Role::User), Role::Manager).unwrap_err();
        assert!(matches!(
            err,
            AuthzError::InsufficientRole {
                required: Role::Manager,
                actual: Role::User
            }
        ));
        assert_eq!(
            err.to_string(),
            "Insufficient permissions: requires manager, has user"
        );
    }

    #[test]
    fn test_require_self_or_role() {
        let user = ctx(Role::User);
        assert!(require_self_or_role(&user, user.user_id, Role::Admin).is_ok());
        assert!(require_self_or_role(&user, Uuid::new_v4(), Role::Admin).is_err());

        let manager = ctx(Role::Manager);
        assert!(require_self_or_role(&manager, Uuid::new_v4(), Role::Manager).is_ok());
        assert!(require_self_or_role(&manager, Uuid::new_v4(), Role::Admin).is_err());
    }
}
