use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::repo_types::User;
use crate::db::{PoolError, PoolManager};

/// Read access to user rows.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, PoolError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, PoolError>;
}

/// `UserStore` backed by the shared PostgreSQL pool.
pub struct PgUserStore {
    pools: Arc<PoolManager>,
}

impl PgUserStore {
    pub fn new(pools: Arc<PoolManager>) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, PoolError> {
        let db = self.pools.acquire().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, PoolError> {
        let db = self.pools.acquire().await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&db)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::RwLock;

    use super::*;

    /// In-memory store for tests; `failing()` simulates an outage.
    #[derive(Default)]
    pub(crate) struct MemoryUserStore {
        users: RwLock<Vec<User>>,
        fail: bool,
    }

    impl MemoryUserStore {
        pub(crate) fn with_users(users: Vec<User>) -> Self {
            Self {
                users: RwLock::new(users),
                fail: false,
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                users: RwLock::default(),
                fail: true,
            }
        }

        pub(crate) fn set_role(&self, id: i64, role: &str) {
            let mut users = self.users.write().unwrap();
            if let Some(u) = users.iter_mut().find(|u| u.id == id) {
                u.role = Some(role.into());
            }
        }

        pub(crate) fn remove(&self, id: i64) {
            self.users.write().unwrap().retain(|u| u.id != id);
        }

        fn check(&self) -> Result<(), PoolError> {
            if self.fail {
                Err(PoolError::Initialization(sqlx::Error::PoolTimedOut))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, PoolError> {
            self.check()?;
            Ok(self.users.read().unwrap().iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<User>, PoolError> {
            self.check()?;
            Ok(self.users.read().unwrap().iter().find(|u| u.id == id).cloned())
        }
    }
}
