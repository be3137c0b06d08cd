//! Authenticated user, role and session models.

use serde::{Deserialize, Serialize};

use super::{AppRole, UserId};

/// The user behind the current access token, as reported by the identity
/// service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Identity-service user identifier.
    pub id: UserId,
    /// Sign-in email, if the identity provider exposes one.
    #[serde(default)]
    pub email: Option<String>,
}

/// A row of the `user_roles` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleRow {
    /// Granted role.
    pub role: AppRole,
}

/// Insert payload of the `user_roles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUserRole {
    /// User receiving the role.
    pub user_id: UserId,
    /// Granted role.
    pub role: AppRole,
}

/// The signed-in user and the roles granted to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Authenticated user.
    pub user: AuthUser,
    /// Roles from `user_roles`.
    pub roles: Vec<AppRole>,
}

impl Session {
    /// Returns `true` if the user holds `role`.
    #[inline]
    #[must_use]
    pub fn has_role(&self, role: AppRole) -> bool {
        self.roles.contains(&role)
    }

    /// Returns `true` if the user is an administrator.
    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(AppRole::Admin)
    }

    /// Returns `true` if the user is a business owner.
    #[inline]
    #[must_use]
    pub fn is_business_owner(&self) -> bool {
        self.has_role(AppRole::BusinessOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_auth_user_ignores_metadata() {
        let json = r#"{
            "id": "u-1",
            "aud": "authenticated",
            "email": "owner@example.com",
            "user_metadata": {"full_name": "Ada"}
        }"#;
        let user: AuthUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::from("u-1"));
        assert_eq!(user.email.as_deref(), Some("owner@example.com"));
    }

    #[test]
    fn session_role_checks() {
        let session = Session {
            user: AuthUser {
                id: UserId::from("u-1"),
                email: None,
            },
            roles: vec![AppRole::BusinessOwner],
        };
        assert!(session.is_business_owner());
        assert!(!session.is_admin());
    }

    #[test]
    fn deserialize_role_rows() {
        let json = r#"[{"role": "admin"}, {"role": "business_owner"}]"#;
        let rows: Vec<UserRoleRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].role, AppRole::Admin);
    }
}
