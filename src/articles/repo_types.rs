use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

pub const DRAFT: &str = "draft";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    pub content: String,
    pub author_id: i64,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated insert payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub image_url: String,
    pub content: String,
    pub author_id: i64,
}
