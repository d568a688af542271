use std::collections::HashMap;

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::entry::Entry;
use crate::services::stats::{compute_stats, StatsSummary};
use crate::AppState;

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<StatsSummary>> {
    // Newest-first: compute_stats requires it for the improvement split.
    let entries = sqlx::query_as::<_, Entry>(
        r#"
        SELECT * FROM entries
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let categories: HashMap<Uuid, String> =
        sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM categories WHERE user_id = $1")
            .bind(auth_user.id)
            .fetch_all(&state.db)
            .await?
            .into_iter()
            .collect();

    let today = Utc::now().date_naive();

    Ok(Json(compute_stats(&entries, &categories, today)))
}
