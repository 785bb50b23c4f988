use serde::{Deserialize, Serialize};

use super::claims::Claims;
use super::repo_types::User;

pub const DEFAULT_ROLE: &str = "user";

/// Sanitized identity derived from a verified user row or a verified token.
/// Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            role: user
                .role
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        }
    }
}

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self {
        Self {
            id: c.sub,
            name: c.name,
            email: c.email,
            role: c.role,
        }
    }
}

/// Login form body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Returned by the session and refresh endpoints.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Principal,
    #[serde(with = "time::serde::rfc3339")]
    pub expires: time::OffsetDateTime,
}
