//! Dashboard user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::permission::PermissionMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user row. `password_hash` never leaves the service.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub permissions: JsonValue,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn effective_permissions(&self) -> PermissionMatrix {
        PermissionMatrix::effective(self.role, &self.permissions)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub permissions: PermissionMatrix,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let permissions = user.effective_permissions();
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            permissions,
            is_active: user.is_active,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "البريد الإلكتروني غير صالح"))]
    pub email: String,

    #[validate(length(min = 8, message = "كلمة المرور يجب أن تكون 8 أحرف على الأقل"))]
    pub password: String,

    #[validate(length(min = 1, max = 255, message = "الاسم الكامل مطلوب"))]
    pub full_name: String,

    #[serde(default)]
    pub role: Role,

    /// Normalized before storage; omitted means defaults.
    #[serde(default)]
    pub permissions: Option<JsonValue>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub permissions: Option<JsonValue>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetPasswordRequest {
    #[validate(length(min = 8, message = "كلمة المرور يجب أن تكون 8 أحرف على الأقل"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangeOwnPasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,

    #[validate(length(min = 8, message = "كلمة المرور يجب أن تكون 8 أحرف على الأقل"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permission::{PermissionAction, PermissionSection};
    use serde_json::json;

    fn user(role: Role, permissions: JsonValue) -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            full_name: "مستخدم".to_string(),
            role,
            permissions,
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_response_hides_hash_and_normalizes() {
        let u = user(Role::User, json!({"companies": {"create": true}}));
        let response = UserResponse::from(u);
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["permissions"]["companies"]["create"], true);
        assert_eq!(json["permissions"]["companies"]["view"], true);
    }

    #[test]
    fn test_admin_effective_permissions() {
        let u = user(Role::Admin, json!({}));
        assert!(u
            .effective_permissions()
            .allows(PermissionSection::Users, PermissionAction::Delete));
    }

    #[test]
    fn test_create_request_validation() {
        let req: CreateUserRequest = serde_json::from_value(json!({
            "email": "new@example.com",
            "password": "longenough",
            "full_name": "جديد"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.role, Role::User);

        let bad: CreateUserRequest = serde_json::from_value(json!({
            "email": "nope",
            "password": "short",
            "full_name": ""
        }))
        .unwrap();
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 3);
    }
}
