use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptsQuery {
    pub mood: Option<String>,
    pub category: Option<String>,
}

pub async fn chat(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<serde_json::Value>> {
    if !state.assistant.is_enabled() {
        return Err(AppError::Unavailable("AI assistant is not available".into()));
    }

    let message = body.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".into()));
    }

    let reply = state.assistant.chat(&auth_user.username, message).await;

    Ok(Json(serde_json::json!({
        "success": true,
        "response": reply.reply,
        "source": reply.source,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

pub async fn suggest_prompts(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthUser>,
    Query(query): Query<PromptsQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let mood = query.mood.as_deref().unwrap_or("neutral");
    let category = query.category.as_deref().unwrap_or("general");

    let prompts = state.assistant.suggest_prompts(mood, category).await;

    Ok(Json(serde_json::json!({
        "success": true,
        "prompts": prompts,
    })))
}
