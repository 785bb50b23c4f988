use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::{
    auth::{dto::Principal, extractors::AuthPrincipal},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub page: &'static str,
    pub user: Principal,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard/article-editor", get(article_editor))
}

#[instrument(skip_all)]
pub async fn dashboard(AuthPrincipal(user): AuthPrincipal) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        page: "dashboard",
        user,
    })
}

#[instrument(skip_all)]
pub async fn article_editor(AuthPrincipal(user): AuthPrincipal) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        page: "article-editor",
        user,
    })
}
