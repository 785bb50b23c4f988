use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String, // stored as-is, compared verbatim
    pub role: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
impl User {
    pub(crate) fn fixture(id: i64, email: &str, password: &str, role: Option<&str>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            name: format!("User {id}"),
            email: email.into(),
            password: password.into(),
            role: role.map(Into::into),
            created_at: now,
            updated_at: now,
        }
    }
}
