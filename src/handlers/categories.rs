use axum::{extract::State, Extension, Json};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::category::{Category, CreateCategoryRequest, DEFAULT_COLOR};
use crate::AppState;

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Category>>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT * FROM categories WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateCategoryRequest>,
) -> AppResult<Json<Category>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    body.validate_color().map_err(AppError::Validation)?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Category name is required".into()));
    }

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM categories WHERE user_id = $1 AND name = $2",
    )
    .bind(auth_user.id)
    .bind(name)
    .fetch_one(&state.db)
    .await?;
    if existing > 0 {
        return Err(AppError::Conflict("Category already exists".into()));
    }

    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (id, user_id, name, color)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(name)
    .bind(body.color.as_deref().unwrap_or(DEFAULT_COLOR))
    .fetch_one(&state.db)
    .await?;

    tracing::info!(user_id = %auth_user.id, category_id = %category.id, "Category created");

    Ok(Json(category))
}
