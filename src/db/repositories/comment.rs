//! Comment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DbPool;
use crate::models::{Comment, CommentWithAuthor, CreateCommentInput};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a comment; `created` defaults to now
    async fn create(&self, input: &CreateCommentInput) -> Result<Comment>;

    /// Insert several comments in one transaction
    async fn create_many(&self, inputs: &[CreateCommentInput]) -> Result<usize>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments of a news item, oldest first
    async fn list_by_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Replace the text of a comment. Returns false if it does not exist.
    async fn update_text(&self, id: i64, text: &str) -> Result<bool>;

    /// Returns false if the comment does not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

pub struct SqlxCommentRepository {
    pool: DbPool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

const INSERT_COMMENT: &str =
    "INSERT INTO comments (news_id, author_id, text, created) VALUES (?, ?, ?, ?)";

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, input: &CreateCommentInput) -> Result<Comment> {
        let created = input.created.unwrap_or_else(Utc::now);
        let result = sqlx::query(INSERT_COMMENT)
            .bind(input.news_id)
            .bind(input.author_id)
            .bind(&input.text)
            .bind(created)
            .execute(&self.pool)
            .await
            .context("Failed to create comment")?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            news_id: input.news_id,
            author_id: input.author_id,
            text: input.text.clone(),
            created,
        })
    }

    async fn create_many(&self, inputs: &[CreateCommentInput]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for input in inputs {
            sqlx::query(INSERT_COMMENT)
                .bind(input.news_id)
                .bind(input.author_id)
                .bind(&input.text)
                .bind(input.created.unwrap_or_else(Utc::now))
                .execute(&mut *tx)
                .await
                .context("Failed to insert comment")?;
        }
        tx.commit().await?;
        Ok(inputs.len())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query("SELECT id, news_id, author_id, text, created FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get comment by ID")?;

        Ok(row.as_ref().map(row_to_comment))
    }

    async fn list_by_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.news_id, c.author_id, c.text, c.created, u.username
            FROM comments c
            JOIN users u ON c.author_id = u.id
            WHERE c.news_id = ?
            ORDER BY c.created ASC, c.id ASC
            "#,
        )
        .bind(news_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list comments")?;

        Ok(rows
            .iter()
            .map(|row| CommentWithAuthor {
                comment: row_to_comment(row),
                author_username: row.get("username"),
            })
            .collect())
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
            .bind(text)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update comment")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete comment")?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count comments")?;
        Ok(count)
    }
}

fn row_to_comment(row: &SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        news_id: row.get("news_id"),
        author_id: row.get("author_id"),
        text: row.get("text"),
        created: row.get("created"),
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::db::repositories::{NewsRepository, SqlxNewsRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateNewsInput, User};
    use chrono::Duration;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Whatever order comments are inserted in, they list by `created` ascending
        #[test]
        fn comments_listed_in_chronological_order(
            offsets in prop::collection::vec(-100_000i64..100_000, 0..20),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let pool = create_test_pool().await.expect("Failed to create test pool");
                migrations::run_migrations(&pool).await.expect("Failed to run migrations");
                let news = SqlxNewsRepository::new(pool.clone())
                    .create(&CreateNewsInput::new("n", "t"))
                    .await
                    .expect("Failed to create news");
                let user = SqlxUserRepository::new(pool.clone())
                    .create(&User::new("u".to_string(), "h".to_string()))
                    .await
                    .expect("Failed to create user");
                let repo = SqlxCommentRepository::new(pool);

                let now = Utc::now();
                let inputs: Vec<_> = offsets
                    .iter()
                    .map(|ms| {
                        CreateCommentInput::new(news.id, user.id, "c")
                            .with_created(now + Duration::milliseconds(*ms))
                    })
                    .collect();
                repo.create_many(&inputs).await.expect("Failed to insert comments");

                let listed = repo.list_by_news(news.id).await.expect("Failed to list comments");
                prop_assert_eq!(listed.len(), offsets.len());
                for pair in listed.windows(2) {
                    prop_assert!(pair[0].comment.created <= pair[1].comment.created);
                }
                Ok(())
            });
            result?;
        }
    }
}
