//! Request gate enforcing the public/protected access policy.
//!
//! | class     | token   | outcome              |
//! |-----------|---------|----------------------|
//! | protected | none    | redirect to login    |
//! | protected | valid   | proceed              |
//! | public    | valid   | redirect to dashboard|
//! | public    | none    | proceed              |
//!
//! Paths matched by no rule pass through untouched.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{dto::Principal, extractors::extract_session_token};
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

#[derive(Debug, Clone)]
pub enum PathPattern {
    Exact(String),
    /// The path itself and everything below it, on segment boundaries.
    Subtree(String),
}

impl PathPattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == p,
            PathPattern::Subtree(p) => match path.strip_prefix(p.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(String),
}

/// Ordered rule list; the first matching rule classifies the path.
#[derive(Debug, Clone)]
pub struct RouteRules {
    rules: Vec<(PathPattern, RouteClass)>,
    login_path: String,
    dashboard_path: String,
}

impl Default for RouteRules {
    fn default() -> Self {
        Self {
            rules: vec![
                (PathPattern::Exact(LOGIN_PATH.into()), RouteClass::Public),
                (PathPattern::Subtree(DASHBOARD_PATH.into()), RouteClass::Protected),
            ],
            login_path: LOGIN_PATH.into(),
            dashboard_path: DASHBOARD_PATH.into(),
        }
    }
}

impl RouteRules {
    pub fn classify(&self, path: &str) -> Option<RouteClass> {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, class)| *class)
    }

    pub fn decide(&self, class: Option<RouteClass>, authenticated: bool) -> GuardDecision {
        match (class, authenticated) {
            (Some(RouteClass::Protected), false) => GuardDecision::Redirect(self.login_path.clone()),
            (Some(RouteClass::Public), true) => GuardDecision::Redirect(self.dashboard_path.clone()),
            _ => GuardDecision::Proceed,
        }
    }
}

/// Middleware: resolves the token, then either short-circuits with a 302 or
/// hands the request (with the principal attached) to the handler.
pub async fn route_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let class = state.rules.classify(req.uri().path());
    if class.is_none() {
        return next.run(req).await;
    }

    // any verification failure counts as unauthenticated
    let principal: Option<Principal> =
        extract_session_token(req.headers()).and_then(|t| state.sessions.resolve(&t));

    match state.rules.decide(class, principal.is_some()) {
        GuardDecision::Redirect(to) => {
            debug!(path = %req.uri().path(), to = %to, "guard redirect");
            (StatusCode::FOUND, [(header::LOCATION, to)]).into_response()
        }
        GuardDecision::Proceed => {
            if let Some(p) = principal {
                req.extensions_mut().insert(p);
            }
            next.run(req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let rules = RouteRules::default();
        assert_eq!(rules.classify("/login"), Some(RouteClass::Public));
        assert_eq!(rules.classify("/dashboard"), Some(RouteClass::Protected));
        assert_eq!(
            rules.classify("/dashboard/article-editor"),
            Some(RouteClass::Protected)
        );
        assert_eq!(rules.classify("/dashboardx"), None);
        assert_eq!(rules.classify("/login/extra"), None);
        assert_eq!(rules.classify("/api/health"), None);
    }

    #[test]
    fn decision_matrix() {
        let rules = RouteRules::default();
        let protected = Some(RouteClass::Protected);
        let public = Some(RouteClass::Public);
        assert_eq!(
            rules.decide(protected, false),
            GuardDecision::Redirect("/login".into())
        );
        assert_eq!(rules.decide(protected, true), GuardDecision::Proceed);
        assert_eq!(
            rules.decide(public, true),
            GuardDecision::Redirect("/dashboard".into())
        );
        assert_eq!(rules.decide(public, false), GuardDecision::Proceed);
        assert_eq!(rules.decide(None, false), GuardDecision::Proceed);
    }
}
