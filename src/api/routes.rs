//! API Routes
//!
//! Configures the Axum router with all cache admin endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, cleanup_handler, clear_all_handler, clear_handler, get_handler,
    health_handler, invalidate_handler, invalidate_pattern_handler, set_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /stats` - Stats of every cache
/// - `DELETE /caches` - Clear every cache
/// - `DELETE /caches/:domain` - Clear one cache
/// - `GET /caches/:domain/stats` - Stats of one cache
/// - `PUT|GET|DELETE /caches/:domain/entries` - Set, look up, invalidate an entry
/// - `POST /caches/:domain/invalidate` - Invalidate by key substring
/// - `POST /caches/:domain/cleanup` - Sweep expired entries now
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/caches", delete(clear_all_handler))
        .route("/caches/:domain", delete(clear_handler))
        .route("/caches/:domain/stats", get(cache_stats_handler))
        .route(
            "/caches/:domain/entries",
            get(get_handler).put(set_handler).delete(invalidate_handler),
        )
        .route("/caches/:domain/invalidate", post(invalidate_pattern_handler))
        .route("/caches/:domain/cleanup", post(cleanup_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use crate::cache::{CacheRegistry, ManualClock, MemoryStorage};
    use crate::config::Config;

    fn create_test_app() -> Router {
        let registry = CacheRegistry::with_storage(
            &Config::default(),
            Arc::new(MemoryStorage::new()),
            Arc::new(ManualClock::new(0)),
        );
        create_router(AppState::new(registry))
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        create_test_app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let request = Request::builder().uri("/stats").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_set_endpoint() {
        let request = Request::builder()
            .method("PUT")
            .uri("/caches/products/entries")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"identifier":"/products","value":[1]}"#))
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let request = Request::builder()
            .uri("/caches/api/entries?identifier=%2Fnothing")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_cache_is_not_found() {
        let request = Request::builder()
            .method("POST")
            .uri("/caches/orders/cleanup")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }
}
