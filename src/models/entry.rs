use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: Option<String>,
    pub content: String,
    pub mood: Option<Mood>,
    pub weather: Option<String>,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub is_private: bool,
    pub is_favorite: bool,
    pub word_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fixed mood vocabulary. The wire label is the lowercase variant name;
/// presentation (emoji etc.) is the frontend's concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mood", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Excited,
    Peaceful,
    Neutral,
    Tired,
    Anxious,
    Sad,
    Angry,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Excited => "excited",
            Mood::Peaceful => "peaceful",
            Mood::Neutral => "neutral",
            Mood::Tired => "tired",
            Mood::Anxious => "anxious",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
        }
    }

    /// Moods counted by the mood-improvement metric.
    pub fn is_positive(&self) -> bool {
        matches!(self, Mood::Happy | Mood::Excited | Mood::Peaceful)
    }
}

/// Content length limits are enforced in the handler after trimming, so
/// the derive only covers the title.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    #[validate(length(max = 200, message = "Title must be under 200 characters"))]
    pub title: Option<String>,

    pub content: String,
    pub category_id: Option<Uuid>,
    pub mood: Option<Mood>,
    pub weather: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_private: Option<bool>,
}

/// Partial update, all fields optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEntryRequest {
    #[validate(length(max = 200, message = "Title must be under 200 characters"))]
    pub title: Option<String>,

    pub content: Option<String>,
    pub category_id: Option<Uuid>,
    pub mood: Option<Mood>,
    pub weather: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Normalize a raw tag list: trim, drop empties, keep order.
pub fn clean_tags(tags: Option<Vec<String>>) -> Vec<String> {
    tags.unwrap_or_default()
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Word count by whitespace splitting, the same rule the stats totals use.
pub fn count_words(content: &str) -> i32 {
    content.split_whitespace().count() as i32
}
