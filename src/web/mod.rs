//! Web API module for Danke.
//!
//! A thin axum layer over [`crate::board::BoardService`]: it verifies the
//! identity provider's session tokens, maps request bodies onto service
//! calls and service errors onto HTTP status codes.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
