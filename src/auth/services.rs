use tracing::{debug, error, warn};

use super::{dto::Principal, jwt::SessionKeys, repo::UserStore};
use crate::{db::PoolError, error::AppError};

/// Checks `email`/`password` against the stored row. The email must match
/// the stored value exactly.
///
/// `Ok(None)` covers both an unknown email and a wrong password. Store
/// failures come back as `Err` so outages never look like bad logins.
pub async fn verify_credentials(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<Option<Principal>, PoolError> {
    if email.is_empty() || password.is_empty() {
        debug!("login rejected before lookup");
        return Ok(None);
    }

    let user = match users.find_by_email(email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login failed");
            return Ok(None);
        }
        Err(e) => {
            error!(error = %e, "user lookup failed");
            return Err(e);
        }
    };

    // plaintext comparison; an empty stored secret never matches
    if user.password.is_empty() || user.password != password {
        warn!(email = %email, "login failed");
        return Ok(None);
    }

    Ok(Some(Principal::from(user)))
}

/// Re-reads the user behind a verified token and signs a fresh token with
/// their current id and role. `Ok(None)` when the token is invalid or the
/// user no longer exists.
pub async fn refresh_session(
    users: &dyn UserStore,
    keys: &SessionKeys,
    token: &str,
) -> Result<Option<(Principal, String)>, AppError> {
    let Some(current) = keys.resolve(token) else {
        return Ok(None);
    };
    let Ok(id) = current.id.parse::<i64>() else {
        warn!(sub = %current.id, "token subject is not a user id");
        return Ok(None);
    };
    let Some(user) = users.find_by_id(id).await? else {
        warn!(user_id = id, "session refresh for missing user");
        return Ok(None);
    };

    let principal = Principal::from(user);
    let token = keys.issue(&principal)?;
    Ok(Some((principal, token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::test_keys;
    use crate::auth::repo::memory::MemoryUserStore;
    use crate::auth::repo_types::User;

    fn store() -> MemoryUserStore {
        MemoryUserStore::with_users(vec![
            User::fixture(1, "admin@example.com", "adminpass", Some("admin")),
            User::fixture(2, "writer@example.com", "pw", None),
            User::fixture(3, "blank@example.com", "", None),
        ])
    }

    #[tokio::test]
    async fn matching_credentials_yield_principal() {
        let users = store();
        let p = verify_credentials(&users, "admin@example.com", "adminpass")
            .await
            .expect("no infra error")
            .expect("match");
        assert_eq!(p.id, "1");
        assert_eq!(p.email, "admin@example.com");
        assert_eq!(p.name, "User 1");
        assert_eq!(p.role, "admin");
    }

    #[tokio::test]
    async fn missing_role_defaults_to_user() {
        let users = store();
        let p = verify_credentials(&users, "writer@example.com", "pw")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p.role, "user");
    }

    #[tokio::test]
    async fn wrong_half_is_indistinguishable() {
        let users = store();
        let wrong_password = verify_credentials(&users, "admin@example.com", "nope")
            .await
            .unwrap();
        let wrong_email = verify_credentials(&users, "ghost@example.com", "adminpass")
            .await
            .unwrap();
        assert_eq!(wrong_password, None);
        assert_eq!(wrong_email, None);
    }

    #[tokio::test]
    async fn empty_inputs_and_empty_stored_secret_never_match() {
        let users = store();
        assert!(verify_credentials(&users, "", "x").await.unwrap().is_none());
        assert!(verify_credentials(&users, "admin@example.com", "")
            .await
            .unwrap()
            .is_none());
        assert!(verify_credentials(&users, "blank@example.com", "")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn email_match_is_exact() {
        let users = store();
        assert!(verify_credentials(&users, "ADMIN@example.com", "adminpass")
            .await
            .unwrap()
            .is_none());
        assert!(verify_credentials(&users, "  admin@example.com ", "adminpass")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn stored_email_without_dotted_domain_can_log_in() {
        let users = MemoryUserStore::with_users(vec![User::fixture(
            1,
            "admin@localhost",
            "adminpass",
            Some("admin"),
        )]);
        let p = verify_credentials(&users, "admin@localhost", "adminpass")
            .await
            .expect("no infra error")
            .expect("stored user with matching credentials");
        assert_eq!(p.email, "admin@localhost");
        assert_eq!(p.role, "admin");
    }

    #[tokio::test]
    async fn store_outage_propagates() {
        let users = MemoryUserStore::failing();
        let res = verify_credentials(&users, "admin@example.com", "adminpass").await;
        assert!(matches!(res, Err(PoolError::Initialization(_))));
    }

    #[tokio::test]
    async fn refresh_reembeds_current_role() {
        let users = store();
        let keys = test_keys("dev-secret");
        let p = verify_credentials(&users, "writer@example.com", "pw")
            .await
            .unwrap()
            .unwrap();
        let token = keys.issue(&p).unwrap();

        users.set_role(2, "editor");
        let (refreshed, new_token) = refresh_session(&users, &keys, &token)
            .await
            .unwrap()
            .expect("refreshed");
        assert_eq!(refreshed.role, "editor");
        assert_eq!(keys.resolve(&new_token).unwrap().role, "editor");
    }

    #[tokio::test]
    async fn refresh_for_deleted_user_or_bad_token_is_none() {
        let users = store();
        let keys = test_keys("dev-secret");
        let p = verify_credentials(&users, "writer@example.com", "pw")
            .await
            .unwrap()
            .unwrap();
        let token = keys.issue(&p).unwrap();
        users.remove(2);

        assert!(refresh_session(&users, &keys, &token).await.unwrap().is_none());
        assert!(refresh_session(&users, &keys, "bogus").await.unwrap().is_none());
    }
}
