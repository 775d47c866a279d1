//! Moderator management handlers for Web API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::web::dto::{AddModeratorRequest, ApiResponse, ModeratorResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/boards/:id/moderators - List moderators. Moderators only.
pub async fn list_moderators(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(board_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ModeratorResponse>>>, ApiError> {
    let moderators = state
        .service()
        .list_moderators(&board_id, &claims.sub)
        .await?;

    Ok(Json(ApiResponse::new(
        moderators.into_iter().map(ModeratorResponse::from).collect(),
    )))
}

/// POST /api/boards/:id/moderators - Add a moderator by email. Creator only.
pub async fn add_moderator(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(board_id): Path<String>,
    ValidatedJson(req): ValidatedJson<AddModeratorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ModeratorResponse>>), ApiError> {
    let service = state.service();
    let moderator = service
        .add_moderator(&board_id, &claims.sub, &req.email)
        .await?;

    let entry = service
        .list_moderators(&board_id, &claims.sub)
        .await?
        .into_iter()
        .find(|m| m.id == moderator.id)
        .ok_or_else(|| ApiError::internal("Moderator vanished after insert"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ModeratorResponse::from(entry))),
    ))
}

/// DELETE /api/boards/:id/moderators/:user_id - Remove a moderator. Creator only.
pub async fn remove_moderator(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path((board_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .service()
        .remove_moderator(&board_id, &claims.sub, &user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
