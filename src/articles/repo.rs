use sqlx::PgPool;

use super::repo_types::{Article, NewArticle, DRAFT};
use super::dto::UpdateArticleRequest;

pub async fn insert_draft(db: &PgPool, new: &NewArticle) -> Result<Article, sqlx::Error> {
    sqlx::query_as::<_, Article>(
        r#"
        INSERT INTO articles (title, image_url, content, author_id, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, image_url, content, author_id, status, created_at, updated_at
        "#,
    )
    .bind(&new.title)
    .bind(&new.image_url)
    .bind(&new.content)
    .bind(new.author_id)
    .bind(DRAFT)
    .fetch_one(db)
    .await
}

pub async fn list_by_author(db: &PgPool, author_id: i64) -> Result<Vec<Article>, sqlx::Error> {
    sqlx::query_as::<_, Article>(
        r#"
        SELECT id, title, image_url, content, author_id, status, created_at, updated_at
        FROM articles
        WHERE author_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(author_id)
    .fetch_all(db)
    .await
}

/// Updates a draft owned by `author_id`; `None` when no such draft exists.
pub async fn update_draft(
    db: &PgPool,
    id: i64,
    author_id: i64,
    changes: &UpdateArticleRequest,
) -> Result<Option<Article>, sqlx::Error> {
    sqlx::query_as::<_, Article>(
        r#"
        UPDATE articles
        SET title = COALESCE($3, title),
            image_url = COALESCE($4, image_url),
            content = COALESCE($5, content),
            updated_at = now()
        WHERE id = $1 AND author_id = $2 AND status = $6
        RETURNING id, title, image_url, content, author_id, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(author_id)
    .bind(changes.title.as_deref())
    .bind(changes.image_url.as_deref())
    .bind(changes.content.as_deref())
    .bind(DRAFT)
    .fetch_optional(db)
    .await
}
