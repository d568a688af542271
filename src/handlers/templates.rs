use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::handlers::entries::check_category_owned;
use crate::models::entry::clean_tags;
use crate::models::template::{CreateTemplateRequest, EntryTemplate};
use crate::AppState;

pub async fn list_templates(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<EntryTemplate>>> {
    let templates = sqlx::query_as::<_, EntryTemplate>(
        "SELECT * FROM entry_templates WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(templates))
}

pub async fn create_template(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateTemplateRequest>,
) -> AppResult<Json<EntryTemplate>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let name = body.name.trim();
    let content = body.content.trim();
    if name.is_empty() || content.is_empty() {
        return Err(AppError::Validation(
            "Template name and content are required".into(),
        ));
    }

    if let Some(category_id) = body.category_id {
        check_category_owned(&state.db, auth_user.id, category_id).await?;
    }

    let tags = clean_tags(body.tags);

    let template = sqlx::query_as::<_, EntryTemplate>(
        r#"
        INSERT INTO entry_templates (id, user_id, name, content, category_id, mood, weather, location, tags, is_default)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(name)
    .bind(content)
    .bind(body.category_id)
    .bind(body.mood)
    .bind(&body.weather)
    .bind(&body.location)
    .bind(&tags)
    .bind(body.is_default.unwrap_or(false))
    .fetch_one(&state.db)
    .await?;

    tracing::info!(user_id = %auth_user.id, template_id = %template.id, "Template created");

    Ok(Json(template))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(template_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM entry_templates WHERE id = $1 AND user_id = $2")
        .bind(template_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Template not found".into()));
    }

    tracing::info!(user_id = %auth_user.id, template_id = %template_id, "Template deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
