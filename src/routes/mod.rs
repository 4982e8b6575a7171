use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    db::RecommendationCache,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::SimilarityCache,
};

pub mod recommendations;

/// Shared application state
pub struct AppState {
    pub config: Config,
    /// Similarity matrix of the last catalog seen
    pub similarity: Arc<SimilarityCache>,
    /// Finished recommendation lists, when Redis is configured
    pub cache: Option<Arc<dyn RecommendationCache>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            similarity: Arc::new(SimilarityCache::new()),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn RecommendationCache>) -> Self {
        self.cache = Some(cache);
        self
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(Arc::new(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route("/recommendations", post(recommendations::recommend))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
