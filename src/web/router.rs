//! Router configuration for Web API.

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    add_moderator, check_board_access, create_board, create_post, create_post_by_token,
    edit_post, get_board, get_board_by_post_token, get_board_by_view_token, get_config,
    get_posting_limit, list_moderators, list_my_boards, list_posts, moderate_post,
    remove_moderator, update_board, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let board_routes = Router::new()
        .route("/", get(list_my_boards).post(create_board))
        .route("/view/:token", get(get_board_by_view_token))
        .route("/post/:token", get(get_board_by_post_token))
        .route("/post/:token/posts", post(create_post_by_token))
        .route("/:id", get(get_board).patch(update_board))
        .route("/:id/access", get(check_board_access))
        .route("/:id/posts", get(list_posts).post(create_post))
        .route("/:id/posting-limit", get(get_posting_limit))
        .route("/:id/moderators", get(list_moderators).post(add_moderator))
        .route("/:id/moderators/:user_id", delete(remove_moderator));

    let post_routes = Router::new()
        .route("/:id", patch(edit_post))
        .route("/:id/moderation", post(moderate_post));

    let api_routes = Router::new()
        .route("/config", get(get_config))
        .nest("/boards", board_routes)
        .nest("/posts", post_routes);

    // Clone jwt_state for the middleware closure
    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[test]
    fn test_create_health_router() {
        let _router = create_health_router();
    }

    #[tokio::test]
    async fn test_create_router() {
        let db = Database::open_in_memory().await.unwrap();
        let state = Arc::new(AppState::new(db));
        let _router = create_router(state, Arc::new(JwtState::new("secret")), &[]);
    }
}
