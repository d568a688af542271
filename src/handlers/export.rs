use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::entry::{Entry, Mood};
use crate::models::template::EntryTemplate;
use crate::models::user::User;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// Full-account snapshot. The same shape is parsed back on restore, so
/// most fields are optional with the defaults the restore path applies.
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupDocument {
    pub user: BackupUser,
    pub categories: Vec<BackupCategory>,
    pub entries: Vec<BackupEntry>,
    pub templates: Vec<BackupTemplate>,
    #[serde(default)]
    pub backup_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupUser {
    pub username: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupCategory {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupEntry {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
    #[serde(default)]
    pub word_count: Option<i32>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Category name, informational only; links are not restored.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupTemplate {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Accepts RFC 3339 with an offset, or a naive ISO timestamp assumed to
/// be UTC. Anything else is `None` and the caller falls back to now.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}

fn resolve_category<'a>(
    categories: &'a HashMap<Uuid, String>,
    category_id: Option<Uuid>,
) -> Option<&'a str> {
    category_id
        .and_then(|id| categories.get(&id))
        .map(String::as_str)
}

fn render_text_export(
    entries: &[Entry],
    categories: &HashMap<Uuid, String>,
    date_label: &str,
) -> String {
    let mut text = format!("My Diary Export - {}\n", date_label);
    text.push_str(&"=".repeat(50));
    text.push_str("\n\n");

    for entry in entries {
        text.push_str(&format!("Entry #{}\n", entry.id));
        text.push_str(&format!(
            "Date: {}\n",
            entry.created_at.format("%Y-%m-%d %H:%M")
        ));
        if let Some(title) = &entry.title {
            text.push_str(&format!("Title: {}\n", title));
        }
        if let Some(mood) = entry.mood {
            text.push_str(&format!("Mood: {}\n", mood.as_str()));
        }
        if let Some(weather) = &entry.weather {
            text.push_str(&format!("Weather: {}\n", weather));
        }
        if let Some(location) = &entry.location {
            text.push_str(&format!("Location: {}\n", location));
        }
        if let Some(category) = resolve_category(categories, entry.category_id) {
            text.push_str(&format!("Category: {}\n", category));
        }
        if !entry.tags.is_empty() {
            text.push_str(&format!("Tags: {}\n", entry.tags.join(", ")));
        }
        text.push_str(&format!("Words: {}\n", entry.word_count));
        text.push_str(&"-".repeat(30));
        text.push('\n');
        text.push_str(&entry.content);
        text.push_str("\n\n");
    }

    text
}

async fn load_category_names(
    db: &sqlx::PgPool,
    user_id: Uuid,
) -> AppResult<HashMap<Uuid, String>> {
    let names = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, name FROM categories WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?
    .into_iter()
    .collect();
    Ok(names)
}

pub async fn export_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let entries = sqlx::query_as::<_, Entry>(
        "SELECT * FROM entries WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let categories = load_category_names(&state.db, auth_user.id).await?;
    let now = Utc::now();

    tracing::info!(user_id = %auth_user.id, entries = entries.len(), "Export requested");

    if query.format.as_deref() == Some("json") {
        let rows: Vec<serde_json::Value> = entries
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "id": entry.id,
                    "title": entry.title,
                    "content": entry.content,
                    "mood": entry.mood,
                    "weather": entry.weather,
                    "location": entry.location,
                    "tags": entry.tags,
                    "category": resolve_category(&categories, entry.category_id),
                    "timestamp": entry.created_at.to_rfc3339(),
                    "word_count": entry.word_count,
                })
            })
            .collect();

        let headers = [(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=diary_export_{}.json",
                now.format("%Y%m%d")
            ),
        )];
        return Ok((headers, Json(rows)).into_response());
    }

    let text = render_text_export(&entries, &categories, &now.format("%Y-%m-%d").to_string());
    let headers = [
        (
            header::CONTENT_TYPE,
            "text/plain; charset=utf-8".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=diary_export_{}.txt",
                now.format("%Y%m%d")
            ),
        ),
    ];
    Ok((headers, text).into_response())
}

pub async fn create_backup(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Response> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    let categories = sqlx::query_as::<_, crate::models::category::Category>(
        "SELECT * FROM categories WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;
    let category_names: HashMap<Uuid, String> = categories
        .iter()
        .map(|c| (c.id, c.name.clone()))
        .collect();

    let entries = sqlx::query_as::<_, Entry>(
        "SELECT * FROM entries WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let templates = sqlx::query_as::<_, EntryTemplate>(
        "SELECT * FROM entry_templates WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let document = BackupDocument {
        user: BackupUser {
            username: user.username.clone(),
            created_at: Some(user.created_at.to_rfc3339()),
        },
        categories: categories
            .iter()
            .map(|c| BackupCategory {
                id: Some(c.id),
                name: c.name.clone(),
                color: c.color.clone(),
                created_at: Some(c.created_at.to_rfc3339()),
            })
            .collect(),
        entries: entries
            .iter()
            .map(|e| BackupEntry {
                id: Some(e.id),
                title: e.title.clone(),
                content: e.content.clone(),
                mood: e.mood,
                weather: e.weather.clone(),
                location: e.location.clone(),
                tags: e.tags.clone(),
                is_private: Some(e.is_private),
                is_favorite: Some(e.is_favorite),
                word_count: Some(e.word_count),
                timestamp: Some(e.created_at.to_rfc3339()),
                updated_at: Some(e.updated_at.to_rfc3339()),
                category: resolve_category(&category_names, e.category_id).map(str::to_string),
            })
            .collect(),
        templates: templates
            .iter()
            .map(|t| BackupTemplate {
                id: Some(t.id),
                name: t.name.clone(),
                content: t.content.clone(),
                mood: t.mood,
                weather: t.weather.clone(),
                location: t.location.clone(),
                tags: t.tags.clone(),
                is_default: Some(t.is_default),
                created_at: Some(t.created_at.to_rfc3339()),
                category: resolve_category(&category_names, t.category_id).map(str::to_string),
            })
            .collect(),
        backup_date: Some(Utc::now().to_rfc3339()),
    };

    tracing::info!(user_id = %auth_user.id, "Backup created");

    let headers = [(
        header::CONTENT_DISPOSITION,
        format!(
            "attachment; filename=diary_backup_{}_{}.json",
            user.username,
            Utc::now().format("%Y%m%d_%H%M%S")
        ),
    )];
    Ok((headers, Json(document)).into_response())
}

pub async fn restore_backup(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: String,
) -> AppResult<Json<serde_json::Value>> {
    let document: BackupDocument = match serde_json::from_str(&body) {
        Ok(document) => document,
        Err(e) if e.is_syntax() || e.is_eof() => {
            return Err(AppError::Validation("Invalid JSON backup file".into()))
        }
        Err(_) => {
            return Err(AppError::Validation("Invalid backup file format".into()))
        }
    };

    // One transaction so a failed restore leaves nothing behind.
    let mut tx = state.db.begin().await?;

    let mut categories_restored = 0u32;
    for category in &document.categories {
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE user_id = $1 AND name = $2",
        )
        .bind(auth_user.id)
        .bind(&category.name)
        .fetch_one(&mut *tx)
        .await?;
        if existing > 0 {
            continue;
        }

        sqlx::query("INSERT INTO categories (id, user_id, name, color) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::new_v4())
            .bind(auth_user.id)
            .bind(&category.name)
            .bind(&category.color)
            .execute(&mut *tx)
            .await?;
        categories_restored += 1;
    }

    let mut entries_restored = 0u32;
    for entry in &document.entries {
        if let Some(id) = entry.id {
            let existing = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM entries WHERE id = $1 AND user_id = $2",
            )
            .bind(id)
            .bind(auth_user.id)
            .fetch_one(&mut *tx)
            .await?;
            if existing > 0 {
                continue;
            }
        }

        let created_at = entry.timestamp.as_deref().and_then(parse_timestamp);
        let updated_at = entry.updated_at.as_deref().and_then(parse_timestamp);

        sqlx::query(
            r#"
            INSERT INTO entries
                (id, user_id, title, content, mood, weather, location, tags,
                 is_private, is_favorite, word_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    COALESCE($12, NOW()), COALESCE($13, NOW()))
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(auth_user.id)
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(entry.mood)
        .bind(&entry.weather)
        .bind(&entry.location)
        .bind(&entry.tags)
        .bind(entry.is_private.unwrap_or(true))
        .bind(entry.is_favorite.unwrap_or(false))
        .bind(entry.word_count.unwrap_or(0))
        .bind(created_at)
        .bind(updated_at)
        .execute(&mut *tx)
        .await?;
        entries_restored += 1;
    }

    let mut templates_restored = 0u32;
    for template in &document.templates {
        if let Some(id) = template.id {
            let existing = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM entry_templates WHERE id = $1 AND user_id = $2",
            )
            .bind(id)
            .bind(auth_user.id)
            .fetch_one(&mut *tx)
            .await?;
            if existing > 0 {
                continue;
            }
        }

        let created_at = template.created_at.as_deref().and_then(parse_timestamp);

        sqlx::query(
            r#"
            INSERT INTO entry_templates
                (id, user_id, name, content, mood, weather, location, tags, is_default, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, NOW()))
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(auth_user.id)
        .bind(&template.name)
        .bind(&template.content)
        .bind(template.mood)
        .bind(&template.weather)
        .bind(&template.location)
        .bind(&template.tags)
        .bind(template.is_default.unwrap_or(false))
        .bind(created_at)
        .execute(&mut *tx)
        .await?;
        templates_restored += 1;
    }

    tx.commit().await?;

    // Streak counters are deliberately untouched here.
    tracing::info!(
        user_id = %auth_user.id,
        categories_restored,
        entries_restored,
        templates_restored,
        "Backup restored"
    );

    Ok(Json(serde_json::json!({
        "message": "Backup restored successfully!",
        "categories_restored": categories_restored,
        "entries_restored": entries_restored,
        "templates_restored": templates_restored,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_parse_with_offset_or_naive() {
        let with_offset = parse_timestamp("2024-03-10T14:30:00+02:00").unwrap();
        assert_eq!(
            with_offset,
            Utc.with_ymd_and_hms(2024, 3, 10, 12, 30, 0).unwrap()
        );

        let naive = parse_timestamp("2024-03-10T14:30:00").unwrap();
        assert_eq!(naive, Utc.with_ymd_and_hms(2024, 3, 10, 14, 30, 0).unwrap());

        let fractional = parse_timestamp("2024-03-10T14:30:00.123456").unwrap();
        assert_eq!(fractional.date_naive().to_string(), "2024-03-10");

        assert!(parse_timestamp("last tuesday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn text_export_lists_entry_fields() {
        let category_id = Uuid::new_v4();
        let mut categories = HashMap::new();
        categories.insert(category_id, "Travel".to_string());

        let entry = Entry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category_id: Some(category_id),
            title: Some("Lisbon".into()),
            content: "Walked the old town all afternoon.".into(),
            mood: Some(Mood::Happy),
            weather: Some("sunny".into()),
            location: Some("Lisbon".into()),
            tags: vec!["travel".into(), "food".into()],
            is_private: true,
            is_favorite: false,
            word_count: 6,
            created_at: Utc.with_ymd_and_hms(2024, 3, 10, 9, 15, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, 10, 9, 15, 0).unwrap(),
        };

        let text = render_text_export(&[entry], &categories, "2024-03-11");

        assert!(text.starts_with("My Diary Export - 2024-03-11\n"));
        assert!(text.contains(&"=".repeat(50)));
        assert!(text.contains("Date: 2024-03-10 09:15\n"));
        assert!(text.contains("Title: Lisbon\n"));
        assert!(text.contains("Mood: happy\n"));
        assert!(text.contains("Weather: sunny\n"));
        assert!(text.contains("Category: Travel\n"));
        assert!(text.contains("Tags: travel, food\n"));
        assert!(text.contains("Words: 6\n"));
        assert!(text.contains(&"-".repeat(30)));
        assert!(text.contains("Walked the old town all afternoon.\n"));
    }

    #[test]
    fn text_export_omits_absent_fields() {
        let entry = Entry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category_id: None,
            title: None,
            content: "Nothing else to report.".into(),
            mood: None,
            weather: None,
            location: None,
            tags: vec![],
            is_private: true,
            is_favorite: false,
            word_count: 4,
            created_at: Utc.with_ymd_and_hms(2024, 3, 10, 9, 15, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, 10, 9, 15, 0).unwrap(),
        };

        let text = render_text_export(&[entry], &HashMap::new(), "2024-03-11");

        assert!(!text.contains("Title:"));
        assert!(!text.contains("Mood:"));
        assert!(!text.contains("Category:"));
        assert!(!text.contains("Tags:"));
        assert!(text.contains("Words: 4\n"));
    }

    #[test]
    fn backup_document_rejects_missing_sections() {
        let incomplete = r#"{"user": {"username": "ada"}, "categories": [], "entries": []}"#;
        let err = serde_json::from_str::<BackupDocument>(incomplete).unwrap_err();
        assert!(err.is_data());

        let complete = r#"{
            "user": {"username": "ada"},
            "categories": [],
            "entries": [],
            "templates": []
        }"#;
        let document: BackupDocument = serde_json::from_str(complete).unwrap();
        assert_eq!(document.user.username, "ada");
        assert!(document.backup_date.is_none());
    }

    #[test]
    fn backup_entries_tolerate_minimal_rows() {
        let raw = r##"{
            "user": {"username": "ada"},
            "categories": [{"name": "Work", "color": "#f39c12"}],
            "entries": [{"content": "Ten characters at least."}],
            "templates": []
        }"##;
        let document: BackupDocument = serde_json::from_str(raw).unwrap();
        let entry = &document.entries[0];
        assert!(entry.id.is_none());
        assert!(entry.tags.is_empty());
        assert!(entry.is_private.is_none());
    }
}
