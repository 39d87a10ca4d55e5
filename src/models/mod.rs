//! Data models
//!
//! This module contains the data structures used throughout YaNews:
//! - Database entities (News, Comment, User, Session)
//! - Input types consumed by the services

mod comment;
mod news;
mod session;
mod user;

pub use comment::{Comment, CommentWithAuthor, CreateCommentInput};
pub use news::{CreateNewsInput, News, NewsWithCount};
pub use session::Session;
pub use user::User;
