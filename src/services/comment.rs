//! Comment service
//!
//! Creation, editing and deletion of comments. Only a comment's author may
//! change it; for anyone else the comment does not exist, so callers answer
//! 404 rather than 403.

use anyhow::Context;
use std::sync::Arc;

use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::forms::{BadWordsFilter, CommentForm};
use crate::models::{Comment, CreateCommentInput, User};

/// Error types for comment operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// Missing comment or news item, or a comment owned by someone else
    #[error("Not found")]
    NotFound,

    /// The submitted form is invalid; it carries its field errors
    #[error("Invalid comment form")]
    Validation(CommentForm),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
    news_repo: Arc<dyn NewsRepository>,
    filter: BadWordsFilter,
}

impl CommentService {
    pub fn new(
        repo: Arc<dyn CommentRepository>,
        news_repo: Arc<dyn NewsRepository>,
        filter: BadWordsFilter,
    ) -> Self {
        Self {
            repo,
            news_repo,
            filter,
        }
    }

    pub fn filter(&self) -> &BadWordsFilter {
        &self.filter
    }

    /// Post a comment on a news item as `author`
    pub async fn create(
        &self,
        news_id: i64,
        author: &User,
        mut form: CommentForm,
    ) -> Result<Comment, CommentServiceError> {
        if self
            .news_repo
            .get_by_id(news_id)
            .await
            .context("Failed to load news")?
            .is_none()
        {
            return Err(CommentServiceError::NotFound);
        }

        if !form.validate(&self.filter) {
            tracing::debug!(news_id, user_id = author.id, "Rejected comment");
            return Err(CommentServiceError::Validation(form));
        }

        let comment = self
            .repo
            .create(&CreateCommentInput::new(news_id, author.id, form.text))
            .await?;

        tracing::info!(comment_id = comment.id, news_id, user_id = author.id, "Comment created");
        Ok(comment)
    }

    /// Fetch a comment that `user` wrote. Anyone else's comment is `NotFound`.
    pub async fn get_own(&self, id: i64, user: &User) -> Result<Comment, CommentServiceError> {
        let comment = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load comment")?
            .ok_or(CommentServiceError::NotFound)?;

        if !user.can_modify(comment.author_id) {
            tracing::debug!(comment_id = id, user_id = user.id, "Comment hidden from non-author");
            return Err(CommentServiceError::NotFound);
        }

        Ok(comment)
    }

    /// Replace the text of `user`'s own comment
    pub async fn update(
        &self,
        id: i64,
        user: &User,
        mut form: CommentForm,
    ) -> Result<Comment, CommentServiceError> {
        let mut comment = self.get_own(id, user).await?;

        if !form.validate(&self.filter) {
            return Err(CommentServiceError::Validation(form));
        }

        if !self.repo.update_text(id, &form.text).await? {
            return Err(CommentServiceError::NotFound);
        }

        tracing::info!(comment_id = id, user_id = user.id, "Comment updated");
        comment.text = form.text;
        Ok(comment)
    }

    /// Delete `user`'s own comment, returning what was removed
    pub async fn delete(&self, id: i64, user: &User) -> Result<Comment, CommentServiceError> {
        let comment = self.get_own(id, user).await?;

        if !self.repo.delete(id).await? {
            return Err(CommentServiceError::NotFound);
        }

        tracing::info!(comment_id = id, user_id = user.id, "Comment deleted");
        Ok(comment)
    }

    pub async fn count(&self) -> Result<i64, CommentServiceError> {
        Ok(self.repo.count().await?)
    }
}
