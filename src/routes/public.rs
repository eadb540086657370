use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client. The blog has no draft or hidden state, so the whole published
/// catalogue is readable here; the only write-shaped endpoint is the login
/// exchange itself.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitors and load balancers. Answers "ok"
        // without touching the store.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/login
        // Exchanges a username/password pair for a 24-hour bearer token.
        // Unknown usernames and wrong passwords are indistinguishable in the response.
        .route("/auth/login", post(handlers::login))
        // GET /posts
        // Lists every post, newest first.
        .route("/posts", get(handlers::list_posts))
        // GET /posts/{id}
        // Retrieves a single post, 404 when the id is unknown.
        .route("/posts/{id}", get(handlers::get_post))
}
