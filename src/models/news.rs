//! News model

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A published news item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Publication date, used for home page ordering
    pub date: NaiveDate,
}

/// News item with the number of comments attached to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsWithCount {
    #[serde(flatten)]
    pub news: News,
    pub comment_count: i64,
}

/// Input for creating a news item
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNewsInput {
    pub title: String,
    pub text: String,
    /// Defaults to today when omitted
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl CreateNewsInput {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            date: None,
        }
    }

    /// Set an explicit publication date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Publication date, falling back to today (UTC)
    pub fn resolved_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}
