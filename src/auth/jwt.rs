use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::{claims::Claims, dto::Principal};
use crate::{config::SessionConfig, state::AppState};

/// Fixed session lifetime.
pub const SESSION_TTL: Duration = Duration::days(30);

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl SessionKeys {
    pub fn new(cfg: &SessionConfig) -> anyhow::Result<Self> {
        if cfg.secret.is_empty() {
            anyhow::bail!("session secret must not be empty");
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        })
    }

    /// Signs a token for `principal`, valid for [`SESSION_TTL`] from now.
    ///
    /// Every call embeds the principal's current id and role, so a refresh
    /// that passes a reloaded principal never carries a stale role forward.
    pub fn issue(&self, principal: &Principal) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: principal.id.clone(),
            name: principal.name.clone(),
            email: principal.email.clone(),
            role: principal.role.clone(),
            iat: now.unix_timestamp() as usize,
            exp: (now + SESSION_TTL).unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %principal.id, role = %principal.role, "session token signed");
        Ok(token)
    }

    /// Checks signature, expiry, issuer and audience. Expiry is exact, with
    /// no clock leeway.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }

    /// Like [`verify`](Self::verify) but collapses every failure into `None`.
    pub fn resolve(&self, token: &str) -> Option<Principal> {
        match self.verify(token) {
            Ok(claims) => Some(claims.into()),
            Err(e) => {
                debug!(error = %e, "session token rejected");
                None
            }
        }
    }
}
