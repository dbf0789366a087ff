use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::http::routes::{comments, health, posts};
use crate::state::AppState;

pub fn build(state: AppState) -> Router {
    let cors = build_cors(&state.config.cors_allow_origins);
    let mut router = Router::new()
        .route("/health", get(health::health))
        .route(
            "/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/comments/{id}", delete(comments::delete_comment))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/{id}", get(posts::get_post).delete(posts::delete_post))
        .with_state(state);
    if let Some(cors) = cors {
        router = router.layer(cors);
    }
    router
}

fn build_cors(allowed: &[String]) -> Option<CorsLayer> {
    if allowed.is_empty() {
        return None;
    }
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS]);
    if allowed.iter().any(|origin| is_wildcard_origin(origin)) {
        return Some(cors.allow_origin(Any).allow_headers(Any));
    }

    let origins: Vec<HeaderValue> = allowed
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "invalid CORS origin ignored");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        cors.allow_origin(AllowOrigin::list(origins))
            .allow_headers([CONTENT_TYPE]),
    )
}

fn is_wildcard_origin(origin: &str) -> bool {
    origin.trim() == "*"
}
