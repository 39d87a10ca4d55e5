//! News service
//!
//! Home page listing and the news detail view with its comment thread.

use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::models::{CommentWithAuthor, CreateNewsInput, News, NewsWithCount};

/// Error types for news operations
#[derive(Debug, thiserror::Error)]
pub enum NewsServiceError {
    #[error("News not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A news item with its comments, oldest comment first
#[derive(Debug, Clone, Serialize)]
pub struct NewsDetail {
    pub news: News,
    pub comments: Vec<CommentWithAuthor>,
}

pub struct NewsService {
    news_repo: Arc<dyn NewsRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    page_size: u32,
}

impl NewsService {
    /// `page_size` is the number of items on the home page
    pub fn new(
        news_repo: Arc<dyn NewsRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        page_size: u32,
    ) -> Self {
        Self {
            news_repo,
            comment_repo,
            page_size,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The `page_size` most recent news items, newest first
    pub async fn home_page(&self) -> Result<Vec<NewsWithCount>, NewsServiceError> {
        let news = self
            .news_repo
            .list_latest(i64::from(self.page_size))
            .await
            .context("Failed to load home page")?;
        Ok(news)
    }

    pub async fn get(&self, id: i64) -> Result<News, NewsServiceError> {
        self.news_repo
            .get_by_id(id)
            .await
            .context("Failed to load news")?
            .ok_or(NewsServiceError::NotFound(id))
    }

    /// News item plus its comments in chronological order
    pub async fn detail(&self, id: i64) -> Result<NewsDetail, NewsServiceError> {
        let news = self.get(id).await?;
        let comments = self
            .comment_repo
            .list_by_news(id)
            .await
            .context("Failed to load comments")?;
        Ok(NewsDetail { news, comments })
    }

    pub async fn create(&self, input: CreateNewsInput) -> Result<News, NewsServiceError> {
        validate_input(&input)?;
        let news = self.news_repo.create(&input).await?;
        tracing::info!(news_id = news.id, "News created");
        Ok(news)
    }

    /// Insert many news items at once
    pub async fn create_many(&self, inputs: &[CreateNewsInput]) -> Result<usize, NewsServiceError> {
        for input in inputs {
            validate_input(input)?;
        }
        Ok(self.news_repo.create_many(inputs).await?)
    }

    pub async fn count(&self) -> Result<i64, NewsServiceError> {
        Ok(self.news_repo.count().await?)
    }

    /// Insert `inputs` only when there is no news yet. Returns how many were added.
    pub async fn seed_if_empty(&self, inputs: &[CreateNewsInput]) -> Result<usize, NewsServiceError> {
        if self.count().await? > 0 {
            tracing::debug!("News table not empty, skipping seed");
            return Ok(0);
        }
        let added = self.create_many(inputs).await?;
        tracing::info!("Seeded {} news item(s)", added);
        Ok(added)
    }
}

/// A handful of dated news items for a fresh install
pub fn demo_news() -> Vec<CreateNewsInput> {
    let today = chrono::Utc::now().date_naive();
    [
        ("Открытие сайта", "Добро пожаловать на YaNews! Здесь публикуются новости и их обсуждения."),
        ("Комментарии", "Зарегистрируйтесь и войдите, чтобы оставлять комментарии к новостям."),
        ("Правила", "Будьте вежливы: комментарии с запрещенными словами не публикуются."),
    ]
    .into_iter()
    .enumerate()
    .map(|(age, (title, text))| {
        CreateNewsInput::new(title, text).with_date(today - chrono::Duration::days(age as i64))
    })
    .collect()
}

fn validate_input(input: &CreateNewsInput) -> Result<(), NewsServiceError> {
    if input.title.trim().is_empty() {
        return Err(NewsServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    if input.title.chars().count() > 250 {
        return Err(NewsServiceError::ValidationError(
            "Title cannot exceed 250 characters".to_string(),
        ));
    }
    Ok(())
}
