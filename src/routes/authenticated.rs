use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Authenticated Router Module
///
/// Defines the routes that mutate the post catalogue. Every admin account
/// manages every post; there is no per-post ownership.
///
/// Access Control Strategy:
/// Every handler in this module relies on the bearer-token middleware being
/// present on the router layer above this module. The handlers additionally
/// extract `AuthUser` themselves, so a route accidentally mounted without
/// the layer still rejects anonymous requests.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /posts
        // Creates a post from a multipart form (title, content, optional image).
        // The author is resolved from the bearer token, never from the form body.
        .route("/posts", post(handlers::create_post))
        // PUT/DELETE /posts/{id}
        // Partially updates or permanently removes a post. Update fields that are
        // omitted from the form keep their stored values.
        .route(
            "/posts/{id}",
            put(handlers::update_post).delete(handlers::delete_post),
        )
}
