use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::entry::Mood;

/// Reusable entry scaffold (gratitude list, daily review, ...). Carries
/// the same optional metadata as an entry so the editor can prefill it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntryTemplate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub content: String,
    pub category_id: Option<Uuid>,
    pub mood: Option<Mood>,
    pub weather: Option<String>,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, max = 100, message = "Template name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 10000, message = "Template content is required"))]
    pub content: String,

    pub category_id: Option<Uuid>,
    pub mood: Option<Mood>,
    pub weather: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_default: Option<bool>,
}
