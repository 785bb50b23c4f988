use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub cookie_secure: bool,
}

/// Transport encryption settings for the database connection.
///
/// `verify` is independent of `enabled`: with `enabled && !verify` the link is
/// encrypted but the server certificate is accepted as-is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    pub enabled: bool,
    pub verify: bool,
    pub ca_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub tls: TlsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{key} must be set"));

        let port = match get("DB_PORT") {
            Some(v) => v.parse::<u16>().with_context(|| format!("DB_PORT={v}"))?,
            None => 5432,
        };
        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS={v}"))?,
            None => 10,
        };
        let connect_timeout = match get("DB_CONNECT_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.parse::<u64>()
                    .with_context(|| format!("DB_CONNECT_TIMEOUT_SECS={v}"))?,
            ),
            None => Duration::from_secs(10),
        };

        let cert_dir = PathBuf::from(get("DB_CERT_PATH").unwrap_or_default());
        let cert_file = |key: &str| -> Option<PathBuf> {
            let name = get(key).filter(|v| !v.is_empty())?;
            let path = cert_dir.join(name);
            if path.exists() {
                Some(path)
            } else {
                warn!(key, path = %path.display(), "certificate file not found; skipping");
                None
            }
        };

        let tls_enabled = flag(get("DB_SSL_ENABLED"));
        let tls = if tls_enabled {
            TlsConfig {
                enabled: true,
                verify: flag(get("DB_SSL_VERIFY")),
                ca_cert: cert_file("DB_CA_CERT"),
                client_cert: cert_file("DB_CLIENT_CERT"),
                client_key: cert_file("DB_CLIENT_KEY"),
            }
        } else {
            TlsConfig::default()
        };

        let db = DbConfig {
            host: required("DB_HOST")?,
            port,
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            database: required("DB_NAME")?,
            max_connections,
            connect_timeout,
            tls,
        };

        let secret = required("SESSION_SECRET")?;
        if secret.is_empty() {
            anyhow::bail!("SESSION_SECRET must not be empty");
        }
        let session = SessionConfig {
            secret,
            issuer: get("SESSION_ISSUER").unwrap_or_else(|| "cmsgate".into()),
            audience: get("SESSION_AUDIENCE").unwrap_or_else(|| "cmsgate-users".into()),
            cookie_secure: flag(get("COOKIE_SECURE")),
        };

        Ok(Self { db, session })
    }
}

fn flag(value: Option<String>) -> bool {
    value.map(|v| v == "true").unwrap_or(false)
}
