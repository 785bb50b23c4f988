use anyhow::Context;
use sqlx::PgPool;
use tracing::{info, warn};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "adminpass";

/// Creates the tables if absent and seeds the default admin into an empty
/// `users` table. Safe to run on every start.
pub async fn bootstrap(db: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL UNIQUE,
            password VARCHAR(255) NOT NULL CHECK (password <> ''),
            role VARCHAR(50) NOT NULL DEFAULT 'user',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(db)
    .await
    .context("create users table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id BIGSERIAL PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            image_url TEXT NOT NULL,
            content TEXT NOT NULL,
            author_id BIGINT NOT NULL REFERENCES users(id),
            status VARCHAR(20) NOT NULL DEFAULT 'draft',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(db)
    .await
    .context("create articles table")?;

    // single statement so concurrent starts cannot both seed
    let seeded = sqlx::query(
        r#"
        INSERT INTO users (name, email, password, role)
        SELECT 'Admin', $1, $2, 'admin'
        WHERE NOT EXISTS (SELECT 1 FROM users)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(DEFAULT_ADMIN_EMAIL)
    .bind(DEFAULT_ADMIN_PASSWORD)
    .execute(db)
    .await
    .context("seed default admin")?
    .rows_affected();

    if seeded > 0 {
        warn!(
            email = DEFAULT_ADMIN_EMAIL,
            "default admin created with well-known password; change it immediately"
        );
    }

    info!("schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, db::PoolManager};

    #[tokio::test]
    #[ignore = "needs an empty postgres database configured via DB_* env vars"]
    async fn bootstrap_twice_seeds_exactly_one_admin() {
        dotenvy::dotenv().ok();
        let cfg = AppConfig::from_env().expect("config");
        let manager = PoolManager::new(cfg.db);
        let pool = manager.acquire().await.expect("pool");

        bootstrap(&pool).await.expect("first bootstrap");
        bootstrap(&pool).await.expect("second bootstrap");

        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT role FROM users WHERE email = $1")
                .bind(DEFAULT_ADMIN_EMAIL)
                .fetch_all(&pool)
                .await
                .expect("select admin");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "admin");

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(total, 1);

        manager.close().await;
    }
}
