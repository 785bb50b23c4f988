use serde::Deserialize;

use super::repo_types::NewArticle;
use crate::error::AppError;

const MISSING_FIELDS: &str = "Missing required fields";

/// Author ids arrive either as numbers or as numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AuthorId {
    Number(i64),
    Text(String),
}

impl AuthorId {
    fn parse(&self) -> Option<i64> {
        match self {
            AuthorId::Number(n) => Some(*n),
            AuthorId::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub content: Option<String>,
    pub author_id: Option<AuthorId>,
}

impl CreateArticleRequest {
    pub fn validate(self) -> Result<NewArticle, AppError> {
        let missing = || AppError::BadRequest(MISSING_FIELDS.into());
        let title = non_empty(self.title).ok_or_else(missing)?;
        let image_url = non_empty(self.image_url).ok_or_else(missing)?;
        let content = non_empty(self.content).ok_or_else(missing)?;
        let author_id = self
            .author_id
            .ok_or_else(missing)?
            .parse()
            .ok_or_else(|| AppError::BadRequest("Invalid authorId".into()))?;
        Ok(NewArticle {
            title,
            image_url,
            content,
            author_id,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub content: Option<String>,
}

impl UpdateArticleRequest {
    /// Drops blank fields; errors when nothing is left to change.
    pub fn validate(self) -> Result<Self, AppError> {
        let req = Self {
            title: non_empty(self.title),
            image_url: non_empty(self.image_url),
            content: non_empty(self.content),
        };
        if req.title.is_none() && req.image_url.is_none() && req.content.is_none() {
            return Err(AppError::BadRequest("Nothing to update".into()));
        }
        Ok(req)
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}
