use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::entry::{
    clean_tags, count_words, CreateEntryRequest, Entry, ListQuery, SearchQuery, UpdateEntryRequest,
};
use crate::models::user::User;
use crate::services::streak::{self, StreakCounters, StreakInfo};
use crate::AppState;

const ENTRIES_PER_PAGE: i64 = 10;

#[derive(Debug, Serialize)]
pub struct EntryPage {
    pub entries: Vec<Entry>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
}

fn page_count(total: i64, per_page: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    }
}

/// Content rules shared by create and update, applied after trimming.
fn validate_content(content: &str) -> Result<(), AppError> {
    let chars = content.chars().count();
    if chars < 10 {
        return Err(AppError::Validation(
            "Entry must be at least 10 characters long".into(),
        ));
    }
    if chars > 10_000 {
        return Err(AppError::Validation(
            "Entry is too long (maximum 10,000 characters)".into(),
        ));
    }
    Ok(())
}

/// A referenced category must belong to the caller.
pub(crate) async fn check_category_owned(
    db: &sqlx::PgPool,
    user_id: Uuid,
    category_id: Uuid,
) -> AppResult<()> {
    let owned =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE id = $1 AND user_id = $2")
            .bind(category_id)
            .bind(user_id)
            .fetch_one(db)
            .await?;
    if owned == 0 {
        return Err(AppError::Validation("Unknown category".into()));
    }
    Ok(())
}

/// Read the caller's streak counters, advance them for an entry written
/// today, and write them back.
async fn advance_streak(state: &AppState, user_id: Uuid) -> AppResult<()> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    let mut counters = StreakCounters::from(&user);
    let today = Utc::now().date_naive();
    streak::record_entry(&mut counters, today);

    sqlx::query(
        r#"
        UPDATE users SET
            current_streak = $2,
            longest_streak = $3,
            streak_start_date = $4,
            last_entry_date = $5
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(counters.current_streak)
    .bind(counters.longest_streak)
    .bind(counters.streak_start_date)
    .bind(counters.last_entry_date)
    .execute(&state.db)
    .await?;

    Ok(())
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<EntryPage>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(ENTRIES_PER_PAGE).clamp(1, 100);

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM entries WHERE user_id = $1")
        .bind(auth_user.id)
        .fetch_one(&state.db)
        .await?;

    // Pinned entries first, then newest.
    let entries = sqlx::query_as::<_, Entry>(
        r#"
        SELECT * FROM entries
        WHERE user_id = $1
        ORDER BY is_favorite DESC, created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(auth_user.id)
    .bind(per_page)
    .bind((page - 1) * per_page)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(EntryPage {
        entries,
        page,
        per_page,
        total,
        pages: page_count(total, per_page),
    }))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateEntryRequest>,
) -> AppResult<Json<Entry>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let content = body.content.trim();
    validate_content(content)?;

    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let location = body
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty());
    let weather = body.weather.as_deref().filter(|w| !w.is_empty());
    let tags = clean_tags(body.tags);
    let word_count = count_words(content);

    if let Some(category_id) = body.category_id {
        check_category_owned(&state.db, auth_user.id, category_id).await?;
    }

    let entry = sqlx::query_as::<_, Entry>(
        r#"
        INSERT INTO entries (id, user_id, category_id, title, content, mood, weather, location, tags, is_private, word_count)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.category_id)
    .bind(title)
    .bind(content)
    .bind(body.mood)
    .bind(weather)
    .bind(location)
    .bind(&tags)
    .bind(body.is_private.unwrap_or(true))
    .bind(word_count)
    .fetch_one(&state.db)
    .await?;

    // The streak advances only on creation, never on edit or delete.
    advance_streak(&state, auth_user.id).await?;

    tracing::info!(
        user_id = %auth_user.id,
        entry_id = %entry.id,
        words = word_count,
        "Entry created"
    );

    Ok(Json(entry))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<Entry>> {
    let entry = sqlx::query_as::<_, Entry>("SELECT * FROM entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Entry not found".into()))?;

    Ok(Json(entry))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateEntryRequest>,
) -> AppResult<Json<Entry>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let content = body.content.as_deref().map(str::trim);
    if let Some(content) = content {
        validate_content(content)?;
    }
    let word_count = content.map(count_words);
    let tags = body.tags.map(|t| clean_tags(Some(t)));

    if let Some(category_id) = body.category_id {
        check_category_owned(&state.db, auth_user.id, category_id).await?;
    }

    let entry = sqlx::query_as::<_, Entry>(
        r#"
        UPDATE entries SET
            title = COALESCE($3, title),
            content = COALESCE($4, content),
            word_count = COALESCE($5, word_count),
            category_id = COALESCE($6, category_id),
            mood = COALESCE($7, mood),
            weather = COALESCE($8, weather),
            location = COALESCE($9, location),
            tags = COALESCE($10, tags),
            is_private = COALESCE($11, is_private),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .bind(&body.title)
    .bind(content)
    .bind(word_count)
    .bind(body.category_id)
    .bind(body.mood)
    .bind(&body.weather)
    .bind(&body.location)
    .bind(&tags)
    .bind(body.is_private)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Entry not found".into()))?;

    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Entry not found".into()));
    }

    tracing::info!(user_id = %auth_user.id, entry_id = %entry_id, "Entry deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let entry = sqlx::query_as::<_, Entry>(
        r#"
        UPDATE entries
        SET is_favorite = NOT is_favorite, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Entry not found".into()))?;

    let status = if entry.is_favorite { "pinned" } else { "unpinned" };
    tracing::info!(user_id = %auth_user.id, entry_id = %entry_id, status, "Favorite toggled");

    Ok(Json(serde_json::json!({
        "success": true,
        "is_favorite": entry.is_favorite,
        "message": format!("Entry {} successfully!", status),
    })))
}

pub async fn search_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Entry>>> {
    let pattern = query
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", q));

    let from = query
        .date_from
        .map(|d| d.and_time(NaiveTime::MIN).and_utc());
    // Strict upper bound on the next day keeps the whole to-date included.
    let to = query
        .date_to
        .and_then(|d| d.succ_opt())
        .map(|d| d.and_time(NaiveTime::MIN).and_utc());

    let entries = sqlx::query_as::<_, Entry>(
        r#"
        SELECT * FROM entries
        WHERE user_id = $1
          AND ($2::text IS NULL OR content LIKE $2)
          AND ($3::timestamptz IS NULL OR created_at >= $3)
          AND ($4::timestamptz IS NULL OR created_at < $4)
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(pattern)
    .bind(from)
    .bind(to)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn get_streak(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<StreakInfo>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    let counters = StreakCounters::from(&user);
    let today = Utc::now().date_naive();

    Ok(Json(streak::describe(&counters, today)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(95, 10), 10);
    }

    #[test]
    fn content_limits_use_character_counts() {
        assert!(validate_content("exactly 10").is_ok());
        assert!(validate_content("too short").is_err());
        let long = "x".repeat(10_000);
        assert!(validate_content(&long).is_ok());
        let too_long = "x".repeat(10_001);
        assert!(validate_content(&too_long).is_err());
    }
}
