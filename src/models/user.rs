use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    // Streak counters are nullable in the schema: accounts restored from
    // pre-streak backups carry NULLs, normalized to 0 on read.
    pub current_streak: Option<i32>,
    pub longest_streak: Option<i32>,
    pub streak_start_date: Option<NaiveDate>,
    pub last_entry_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub current_streak: i32,
    pub longest_streak: i32,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            created_at: u.created_at,
            last_login: u.last_login,
            current_streak: u.current_streak.unwrap_or(0),
            longest_streak: u.longest_streak.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    /// Set when this token was minted by rotating another.
    pub parent_token_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
