use axum::{extract::State, Extension, Json};
use std::sync::Arc;
use std::time::Instant;

use crate::{
    db::CacheKey,
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Recommendation, RecommendationRequest},
    routes::AppState,
    services::recommend_cached,
};

/// Handler for recommendations endpoint
///
/// Similarity scoring is quadratic in catalog size, so it runs on the
/// blocking pool behind a size limit and a timeout.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let config = &state.config;
    let top_n = request.top_n.unwrap_or(config.default_top_n);

    if top_n == 0 {
        return Err(AppError::InvalidInput(
            "top_n must be a positive integer".to_string(),
        ));
    }

    if request.catalog.len() > config.max_catalog_size {
        return Err(AppError::PayloadTooLarge(format!(
            "catalog has {} items, limit is {}",
            request.catalog.len(),
            config.max_catalog_size
        )));
    }

    let user_id = request.user_id.clone();
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        catalog_size = request.catalog.len(),
        activity_count = request.activity.len(),
        top_n,
        "Processing recommendation request"
    );

    let cache_key = state.cache.as_ref().map(|_| {
        CacheKey::recommendations(&user_id, &request.catalog, &request.activity, top_n)
    });

    if let (Some(cache), Some(key)) = (&state.cache, &cache_key) {
        match cache.get_recommendations(key).await {
            Ok(Some(cached)) => {
                tracing::info!(request_id = %request_id, %key, "Serving cached recommendations");
                return Ok(Json(cached));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Cache lookup failed");
            }
        }
    }

    let start = Instant::now();
    let similarity = Arc::clone(&state.similarity);
    let task = tokio::task::spawn_blocking(move || {
        recommend_cached(
            &similarity,
            &request.user_id,
            &request.catalog,
            &request.activity,
            top_n,
        )
    });

    let recommendations = tokio::time::timeout(config.recommend_timeout(), task)
        .await
        .map_err(|_| {
            AppError::Timeout(format!(
                "recommendations not ready within {}ms",
                config.recommend_timeout_ms
            ))
        })?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if let (Some(cache), Some(key)) = (&state.cache, &cache_key) {
        cache.put_recommendations(key, &recommendations, config.cache_ttl_secs);
    }

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        count = recommendations.len(),
        processing_time_ms = start.elapsed().as_millis(),
        "Recommendations completed"
    );

    Ok(Json(recommendations))
}
