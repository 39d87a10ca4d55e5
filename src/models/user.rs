//! User model
//!
//! A registered account. Only the username is shown publicly; the password
//! hash never leaves the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User.
    ///
    /// The password must already be hashed, see `services::password::hash_password()`.
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            username,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// Check if the user may edit or delete content written by `author_id`
    pub fn can_modify(&self, author_id: i64) -> bool {
        self.id == author_id
    }
}
