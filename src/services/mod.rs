//! Services layer - business logic
//!
//! Services implement the site's rules on top of the repositories:
//! listing and ordering, comment permissions, profanity filtering, accounts.

pub mod comment;
pub mod news;
pub mod password;
pub mod user;

pub use comment::{CommentService, CommentServiceError};
pub use news::{demo_news, NewsDetail, NewsService, NewsServiceError};
pub use password::{hash_password, verify_password};
pub use user::{UserService, UserServiceError};
