//! Process-wide PostgreSQL pool with lazy, verified initialisation.
//!
//! The manager owns a single slot that is either empty or holds a pool whose
//! connectivity was proven by a test connection. A failed check leaves the
//! slot empty, so the next `acquire` builds from scratch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::{DbConfig, TlsConfig};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("database pool initialization failed: {0}")]
    Initialization(#[source] sqlx::Error),
    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),
}

pub struct PoolManager {
    config: DbConfig,
    slot: Mutex<Option<PgPool>>,
    builds: AtomicUsize,
}

impl PoolManager {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(None),
            builds: AtomicUsize::new(0),
        }
    }

    /// Returns the memoized pool, building and probing it on first use.
    ///
    /// Concurrent cold callers are serialized on the slot lock; the first
    /// one builds, the rest observe its result.
    pub async fn acquire(&self) -> Result<PgPool, PoolError> {
        let mut slot = self.slot.lock().await;
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        let attempt = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            host = %self.config.host,
            port = self.config.port,
            database = %self.config.database,
            tls = self.config.tls.enabled,
            tls_verify = self.config.tls.verify,
            attempt,
            "pool.create"
        );

        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(self.config.connect_timeout)
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect_lazy_with(self.connect_options());

        match pool.acquire().await {
            Ok(conn) => {
                drop(conn);
                info!(attempt, size = pool.size(), "pool.ready");
                *slot = Some(pool.clone());
                Ok(pool)
            }
            Err(e) => {
                error!(error = %e, attempt, "pool.failed");
                pool.close().await;
                Err(PoolError::Initialization(e))
            }
        }
    }

    /// Round-trips `SELECT 1` through the pool.
    pub async fn ping(&self) -> Result<(), PoolError> {
        let pool = self.acquire().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Closes the live pool, if any, and returns the slot to empty.
    pub async fn close(&self) {
        let pool = self.slot.lock().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            info!("pool.closed");
        }
    }

    #[cfg(test)]
    pub async fn is_initialized(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Number of build attempts made so far, successful or not.
    #[cfg(test)]
    pub fn build_attempts(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    fn connect_options(&self) -> PgConnectOptions {
        let cfg = &self.config;
        let mut opts = PgConnectOptions::new()
            .host(&cfg.host)
            .port(cfg.port)
            .username(&cfg.user)
            .password(&cfg.password)
            .database(&cfg.database)
            .ssl_mode(ssl_mode(&cfg.tls));

        if cfg.tls.enabled {
            if let Some(ca) = &cfg.tls.ca_cert {
                opts = opts.ssl_root_cert(ca);
            }
            if let Some(cert) = &cfg.tls.client_cert {
                opts = opts.ssl_client_cert(cert);
            }
            if let Some(key) = &cfg.tls.client_key {
                opts = opts.ssl_client_key(key);
            }
        }
        opts
    }
}

/// `enabled && !verify` encrypts without checking the server certificate.
pub fn ssl_mode(tls: &TlsConfig) -> PgSslMode {
    match (tls.enabled, tls.verify) {
        (false, _) => PgSslMode::Disable,
        (true, false) => PgSslMode::Require,
        (true, true) => PgSslMode::VerifyFull,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn unreachable_config() -> DbConfig {
        DbConfig {
            host: "127.0.0.1".into(),
            port: 1,
            user: "nobody".into(),
            password: "nothing".into(),
            database: "none".into(),
            max_connections: 2,
            connect_timeout: Duration::from_millis(200),
            tls: TlsConfig::default(),
        }
    }

    #[test]
    fn ssl_mode_follows_tls_toggles() {
        let mut tls = TlsConfig::default();
        assert!(matches!(ssl_mode(&tls), PgSslMode::Disable));
        tls.verify = true;
        assert!(matches!(ssl_mode(&tls), PgSslMode::Disable));
        tls.enabled = true;
        tls.verify = false;
        assert!(matches!(ssl_mode(&tls), PgSslMode::Require));
        tls.verify = true;
        assert!(matches!(ssl_mode(&tls), PgSslMode::VerifyFull));
    }

    #[tokio::test]
    async fn failed_check_leaves_slot_empty_and_next_call_rebuilds() {
        let manager = PoolManager::new(unreachable_config());

        let err = manager.acquire().await.unwrap_err();
        assert!(matches!(err, PoolError::Initialization(_)));
        assert!(!manager.is_initialized().await);
        assert_eq!(manager.build_attempts(), 1);

        assert!(manager.acquire().await.is_err());
        assert_eq!(manager.build_attempts(), 2);
        assert!(!manager.is_initialized().await);
    }

    #[tokio::test]
    async fn concurrent_cold_callers_never_observe_a_broken_handle() {
        let manager = Arc::new(PoolManager::new(unreachable_config()));
        let mut tasks = Vec::new();
        for _ in 0..4 {
            let m = manager.clone();
            tasks.push(tokio::spawn(async move { m.acquire().await.is_ok() }));
        }
        for t in tasks {
            assert!(!t.await.expect("join"));
        }
        assert_eq!(manager.build_attempts(), 4);
        assert!(!manager.is_initialized().await);
    }

    #[tokio::test]
    async fn ping_propagates_initialization_failure() {
        let manager = PoolManager::new(unreachable_config());
        assert!(matches!(
            manager.ping().await,
            Err(PoolError::Initialization(_))
        ));
    }

    #[tokio::test]
    #[ignore = "needs a running postgres configured via DB_* env vars"]
    async fn concurrent_cold_callers_share_one_pool() {
        dotenvy::dotenv().ok();
        let cfg = crate::config::AppConfig::from_env().expect("config");
        let manager = Arc::new(PoolManager::new(cfg.db));
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let m = manager.clone();
            tasks.push(tokio::spawn(async move { m.acquire().await.is_ok() }));
        }
        for t in tasks {
            assert!(t.await.expect("join"));
        }
        assert_eq!(manager.build_attempts(), 1);
        manager.ping().await.expect("ping");
        manager.close().await;
        assert!(!manager.is_initialized().await);
    }
}
