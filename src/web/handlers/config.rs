//! Configuration handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::web::dto::{ApiResponse, ConfigResponse};

/// GET /api/config - Public client configuration.
///
/// Exposes the feature flags injected at startup. No authentication required.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ApiResponse<ConfigResponse>> {
    Json(ApiResponse::new(ConfigResponse {
        features: state.features,
    }))
}
