use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Member identifier.
pub type MemberId = i64;

/// Member entity - an account that authors posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A member that has not been persisted yet. The id is assigned on insert.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: String,
    pub username: String,
}

impl NewMember {
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
        }
    }
}
