//! Post and moderation handlers for Web API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::web::dto::{
    ApiResponse, CreatePostRequest, EditPostRequest, ModerationRequest, PostResponse,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, OptionalAuthUser};

/// GET /api/boards/:id/posts - List the posts visible to the caller.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    auth: OptionalAuthUser,
    Path(board_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<PostResponse>>>, ApiError> {
    let service = state.service();
    let viewer = auth.viewer();
    let posts = service.list_posts(&board_id, viewer.as_ref()).await?;

    let viewer_id = viewer.as_ref().map(|v| v.id.as_str());
    let is_moderator = match viewer_id {
        Some(id) => service.has_moderator_permissions(&board_id, id).await?,
        None => false,
    };

    let responses = posts
        .into_iter()
        .map(|p| PostResponse::from_post(p, viewer_id, is_moderator))
        .collect();

    Ok(Json(ApiResponse::new(responses)))
}

/// POST /api/boards/:id/posts - Create a post.
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(board_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PostResponse>>), ApiError> {
    state.sync_user(&claims).await?;

    let post = state
        .service()
        .create_post(&board_id, &claims.viewer(), &req.into_new_post())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(PostResponse::from_post(
            post,
            Some(claims.sub.as_str()),
            false,
        ))),
    ))
}

/// POST /api/boards/post/:token/posts - Create a post through a post token.
pub async fn create_post_by_token(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(token): Path<String>,
    ValidatedJson(req): ValidatedJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PostResponse>>), ApiError> {
    state.sync_user(&claims).await?;

    let post = state
        .service()
        .create_post_by_token(&token, &claims.viewer(), &req.into_new_post())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(PostResponse::from_post(
            post,
            Some(claims.sub.as_str()),
            false,
        ))),
    ))
}

/// PATCH /api/posts/:id - Edit the caller's own post within the edit window.
pub async fn edit_post(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(post_id): Path<String>,
    ValidatedJson(req): ValidatedJson<EditPostRequest>,
) -> Result<Json<ApiResponse<PostResponse>>, ApiError> {
    let post = state
        .service()
        .edit_post(
            &post_id,
            &claims.sub,
            &req.content,
            req.media_urls.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::new(PostResponse::from_post(
        post,
        Some(claims.sub.as_str()),
        false,
    ))))
}

/// POST /api/posts/:id/moderation - Apply a moderation action.
pub async fn moderate_post(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(post_id): Path<String>,
    ValidatedJson(req): ValidatedJson<ModerationRequest>,
) -> Result<Json<ApiResponse<PostResponse>>, ApiError> {
    let action = req.into_action()?;
    let post = state
        .service()
        .moderate_post(&post_id, &claims.sub, &action)
        .await?;

    Ok(Json(ApiResponse::new(PostResponse::from_post(
        post,
        Some(claims.sub.as_str()),
        true,
    ))))
}
