//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod extract;
pub mod http;

/// Build the application router with:
/// - JSON API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/formats", get(http::http_formats))
        // Learning
        .route("/api/v1/learn", post(http::http_post_learn))
        .route("/api/v1/flashcards", post(http::http_post_flashcards))
        .route("/api/v1/blurting", post(http::http_post_blurting))
        // Game
        .route("/api/v1/game/challenge", get(http::http_get_challenge))
        .route("/api/v1/game/answer", post(http::http_post_answer))
        .route("/api/v1/game/stats", get(http::http_get_stats))
        .route("/api/v1/game/leaderboard", get(http::http_get_leaderboard))
        .route("/api/v1/game/categories", get(http::http_get_categories))
        // Community
        .route(
            "/api/v1/community/explanations",
            post(http::http_post_explanation).get(http::http_get_explanations),
        )
        .route("/api/v1/community/explanations/:id/upvote", post(http::http_post_upvote))
        .route("/api/v1/community/stats", get(http::http_get_community_stats))
        // Forum
        .route("/api/v1/forum/threads", post(http::http_post_thread).get(http::http_get_threads))
        .route("/api/v1/forum/threads/:id", get(http::http_get_thread))
        .route("/api/v1/forum/threads/:id/replies", post(http::http_post_reply))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
