//! Board handlers for Web API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::policy::{AccessDecision, PostingDecision};
use crate::web::dto::{
    ApiResponse, BoardResponse, CreateBoardRequest, UpdateBoardRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, OptionalAuthUser};

/// POST /api/boards - Create a board owned by the caller.
pub async fn create_board(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateBoardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BoardResponse>>), ApiError> {
    state.sync_user(&claims).await?;

    let board = state
        .service()
        .create_board(&claims.sub, &req.into_new_board())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(BoardResponse::from_board(
            board,
            Some(claims.sub.as_str()),
        ))),
    ))
}

/// GET /api/boards - List the caller's boards.
pub async fn list_my_boards(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<BoardResponse>>>, ApiError> {
    let boards = state.service().list_boards_by_creator(&claims.sub).await?;

    let responses = boards
        .into_iter()
        .map(|b| BoardResponse::from_board(b, Some(claims.sub.as_str())))
        .collect();

    Ok(Json(ApiResponse::new(responses)))
}

/// GET /api/boards/:id - Get board details.
pub async fn get_board(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(board_id): Path<String>,
) -> Result<Json<ApiResponse<BoardResponse>>, ApiError> {
    let viewer = auth.viewer();
    let board = state.service().view_board(&board_id, viewer.as_ref()).await?;

    let viewer_id = viewer.as_ref().map(|v| v.id.as_str());
    Ok(Json(ApiResponse::new(BoardResponse::from_board(
        board, viewer_id,
    ))))
}

/// GET /api/boards/view/:token - Open a board through its view token.
pub async fn get_board_by_view_token(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<BoardResponse>>, ApiError> {
    let viewer = auth.viewer();
    let board = state
        .service()
        .view_board_by_token(&token, viewer.as_ref())
        .await?;

    let viewer_id = viewer.as_ref().map(|v| v.id.as_str());
    Ok(Json(ApiResponse::new(BoardResponse::from_board(
        board, viewer_id,
    ))))
}

/// GET /api/boards/post/:token - Open a board through its post token.
pub async fn get_board_by_post_token(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<BoardResponse>>, ApiError> {
    let viewer = auth.viewer();
    let board = state
        .service()
        .view_board_by_post_token(&token, viewer.as_ref())
        .await?;

    let viewer_id = viewer.as_ref().map(|v| v.id.as_str());
    Ok(Json(ApiResponse::new(BoardResponse::from_board(
        board, viewer_id,
    ))))
}

/// GET /api/boards/:id/access - Evaluate access without failing.
pub async fn check_board_access(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(board_id): Path<String>,
) -> Result<Json<ApiResponse<AccessDecision>>, ApiError> {
    let viewer = auth.viewer();
    let decision = state
        .service()
        .check_board_access(&board_id, viewer.as_ref())
        .await?;
    Ok(Json(ApiResponse::new(decision)))
}

/// PATCH /api/boards/:id - Update board settings. Creator only.
pub async fn update_board(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(board_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateBoardRequest>,
) -> Result<Json<ApiResponse<BoardResponse>>, ApiError> {
    let board = state
        .service()
        .update_board(&board_id, &claims.sub, &req.into_update())
        .await?;

    Ok(Json(ApiResponse::new(BoardResponse::from_board(
        board,
        Some(claims.sub.as_str()),
    ))))
}

/// GET /api/boards/:id/posting-limit - Whether the caller may post again.
pub async fn get_posting_limit(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(board_id): Path<String>,
) -> Result<Json<ApiResponse<PostingDecision>>, ApiError> {
    let decision = state
        .service()
        .check_posting_limits(&board_id, &claims.viewer())
        .await?;
    Ok(Json(ApiResponse::new(decision)))
}
