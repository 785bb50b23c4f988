use crate::auth::{guard::RouteRules, jwt::SessionKeys, repo::{PgUserStore, UserStore}};
use crate::config::AppConfig;
use crate::db::PoolManager;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pools: Arc<PoolManager>,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionKeys,
    pub rules: Arc<RouteRules>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wires the state without touching the database; the pool is built on
    /// first use.
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let sessions = SessionKeys::new(&config.session)?;
        let pools = Arc::new(PoolManager::new(config.db.clone()));
        let users = Arc::new(PgUserStore::new(pools.clone())) as Arc<dyn UserStore>;

        Ok(Self {
            pools,
            users,
            sessions,
            rules: Arc::new(RouteRules::default()),
            config,
        })
    }

    #[cfg(test)]
    pub fn fake(users: Arc<dyn UserStore>) -> Self {
        use crate::config::{DbConfig, SessionConfig, TlsConfig};
        use std::time::Duration;

        let config = Arc::new(AppConfig {
            db: DbConfig {
                host: "127.0.0.1".into(),
                port: 1,
                user: "test".into(),
                password: "test".into(),
                database: "test".into(),
                max_connections: 1,
                connect_timeout: Duration::from_millis(100),
                tls: TlsConfig::default(),
            },
            session: SessionConfig {
                secret: "test-secret".into(),
                issuer: "test".into(),
                audience: "test".into(),
                cookie_secure: false,
            },
        });
        let sessions = SessionKeys::new(&config.session).expect("test keys");
        let pools = Arc::new(PoolManager::new(config.db.clone()));

        Self {
            pools,
            users,
            sessions,
            rules: Arc::new(RouteRules::default()),
            config,
        }
    }
}
