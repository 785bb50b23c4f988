use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, SessionResponse},
        extractors::{clear_session_cookie, extract_session_token, session_cookie},
        guard::{DASHBOARD_PATH, LOGIN_PATH},
        services::{refresh_session, verify_credentials},
    },
    error::{AppError, UNAVAILABLE_MESSAGE},
    state::AppState,
};

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn login_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/session", get(session))
        .route("/api/auth/refresh", post(refresh))
}

fn login_form(error: Option<&str>) -> Html<String> {
    let error = error
        .map(|e| format!(r#"<p class="error">{e}</p>"#))
        .unwrap_or_default();
    Html(format!(
        r#"<form method="post" action="{LOGIN_PATH}">{error}<input name="email" type="email"><input name="password" type="password"><button>Sign in</button></form>"#
    ))
}

pub async fn login_page() -> Html<String> {
    login_form(None)
}

#[instrument(skip(state, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginRequest>,
) -> Response {
    let principal = match verify_credentials(state.users.as_ref(), &form.email, &form.password).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return (StatusCode::UNAUTHORIZED, login_form(Some(INVALID_CREDENTIALS))).into_response();
        }
        Err(e) => {
            error!(error = %e, "login unavailable");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                login_form(Some(UNAVAILABLE_MESSAGE)),
            )
                .into_response();
        }
    };

    let token = match state.sessions.issue(&principal) {
        Ok(t) => t,
        Err(e) => return AppError::Internal(e).into_response(),
    };

    info!(user_id = %principal.id, role = %principal.role, "user logged in");
    let jar = jar.add(session_cookie(token, state.config.session.cookie_secure));
    (jar, Redirect::to(DASHBOARD_PATH)).into_response()
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (clear_session_cookie(jar), Redirect::to(LOGIN_PATH))
}

#[instrument(skip(state, headers))]
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AppError> {
    let token = extract_session_token(&headers).ok_or(AppError::Unauthorized)?;
    let claims = state
        .sessions
        .verify(&token)
        .map_err(|_| AppError::Unauthorized)?;
    let expires = OffsetDateTime::from_unix_timestamp(claims.exp as i64)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(SessionResponse {
        user: claims.into(),
        expires,
    }))
}

#[instrument(skip(state, jar, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = extract_session_token(&headers).ok_or(AppError::Unauthorized)?;
    let Some((principal, token)) =
        refresh_session(state.users.as_ref(), &state.sessions, &token).await?
    else {
        return Ok((clear_session_cookie(jar), AppError::Unauthorized).into_response());
    };

    let claims = state.sessions.verify(&token)?;
    let expires = OffsetDateTime::from_unix_timestamp(claims.exp as i64)
        .map_err(|e| AppError::Internal(e.into()))?;

    info!(user_id = %principal.id, role = %principal.role, "session refreshed");
    let jar = jar.add(session_cookie(token, state.config.session.cookie_secure));
    Ok((jar, Json(SessionResponse { user: principal, expires })).into_response())
}
