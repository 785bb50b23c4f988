use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateArticleRequest, UpdateArticleRequest},
    repo,
    repo_types::Article,
};
use crate::{
    auth::{dto::Principal, extractors::AuthPrincipal},
    db::PoolError,
    error::AppError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/simple-articles", get(list_articles).post(create_article))
        .route("/api/simple-articles/:id", put(update_article))
}

fn principal_id(p: &Principal) -> Result<i64, AppError> {
    p.id.parse().map_err(|_| AppError::Unauthorized)
}

/// A missing author row surfaces as a client error, not a 500.
fn insert_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::BadRequest("Unknown author".into())
        }
        _ => PoolError::from(e).into(),
    }
}

#[instrument(skip(state, principal, body))]
pub async fn create_article(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(body): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>), AppError> {
    let new = body.validate()?;
    // drafts are only listed and edited by their author, so only the caller
    // may be named as author
    if new.author_id != principal_id(&principal)? {
        return Err(AppError::Forbidden);
    }
    let db = state.pools.acquire().await?;
    let article = repo::insert_draft(&db, &new).await.map_err(insert_error)?;
    info!(article_id = article.id, author_id = article.author_id, "draft created");
    Ok((StatusCode::CREATED, Json(article)))
}

#[instrument(skip(state, principal))]
pub async fn list_articles(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<Vec<Article>>, AppError> {
    let author_id = principal_id(&principal)?;
    let db = state.pools.acquire().await?;
    let articles = repo::list_by_author(&db, author_id)
        .await
        .map_err(PoolError::from)?;
    Ok(Json(articles))
}

#[instrument(skip(state, principal, body))]
pub async fn update_article(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
    Json(body): Json<UpdateArticleRequest>,
) -> Result<Json<Article>, AppError> {
    let author_id = principal_id(&principal)?;
    let changes = body.validate()?;
    let db = state.pools.acquire().await?;
    let article = repo::update_draft(&db, id, author_id, &changes)
        .await
        .map_err(PoolError::from)?
        .ok_or(AppError::NotFound)?;
    info!(article_id = article.id, "draft updated");
    Ok(Json(article))
}
