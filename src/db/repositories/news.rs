//! News repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::{CreateNewsInput, News, NewsWithCount};

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Create a news item
    async fn create(&self, input: &CreateNewsInput) -> Result<News>;

    /// Insert several news items in one transaction
    async fn create_many(&self, inputs: &[CreateNewsInput]) -> Result<usize>;

    async fn get_by_id(&self, id: i64) -> Result<Option<News>>;

    /// Most recent news first (date descending, then id descending), at most `limit` items
    async fn list_latest(&self, limit: i64) -> Result<Vec<NewsWithCount>>;

    async fn count(&self) -> Result<i64>;
}

pub struct SqlxNewsRepository {
    pool: DbPool,
}

impl SqlxNewsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, input: &CreateNewsInput) -> Result<News> {
        let date = input.resolved_date();
        let result = sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
            .bind(&input.title)
            .bind(&input.text)
            .bind(date)
            .execute(&self.pool)
            .await
            .context("Failed to create news")?;

        Ok(News {
            id: result.last_insert_rowid(),
            title: input.title.clone(),
            text: input.text.clone(),
            date,
        })
    }

    async fn create_many(&self, inputs: &[CreateNewsInput]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for input in inputs {
            sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
                .bind(&input.title)
                .bind(&input.text)
                .bind(input.resolved_date())
                .execute(&mut *tx)
                .await
                .context("Failed to insert news")?;
        }
        tx.commit().await?;
        Ok(inputs.len())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<News>> {
        let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get news by ID")?;

        Ok(row.as_ref().map(row_to_news))
    }

    async fn list_latest(&self, limit: i64) -> Result<Vec<NewsWithCount>> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.title, n.text, n.date,
                   (SELECT COUNT(*) FROM comments c WHERE c.news_id = n.id) AS comment_count
            FROM news n
            ORDER BY n.date DESC, n.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list news")?;

        Ok(rows
            .iter()
            .map(|row| NewsWithCount {
                news: row_to_news(row),
                comment_count: row.get("comment_count"),
            })
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count news")?;
        Ok(count)
    }
}

fn row_to_news(row: &SqliteRow) -> News {
    News {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        date: row.get("date"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::NaiveDate;

    async fn setup() -> SqlxNewsRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxNewsRepository::new(pool)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;

        let created = repo
            .create(&CreateNewsInput::new("Заголовок", "Текст").with_date(day(1)))
            .await
            .unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.date, day(1));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = setup().await;
        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_latest_orders_and_limits() {
        let repo = setup().await;
        let inputs: Vec<_> = [3, 1, 5, 2, 4]
            .iter()
            .map(|d| CreateNewsInput::new(format!("Новость {}", d), "x").with_date(day(*d)))
            .collect();
        assert_eq!(repo.create_many(&inputs).await.unwrap(), 5);

        let latest = repo.list_latest(3).await.unwrap();
        let dates: Vec<_> = latest.iter().map(|n| n.news.date).collect();

        assert_eq!(dates, vec![day(5), day(4), day(3)]);
        assert!(latest.iter().all(|n| n.comment_count == 0));
        assert_eq!(repo.count().await.unwrap(), 5);
    }
}
