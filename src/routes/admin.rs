use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Admin Router Module
///
/// Defines the account provisioning endpoint. This router is nested under
/// `/admin` by the application router.
///
/// Access Control:
/// Provisioning is not behind the bearer-token layer, because the first
/// account must be creatable before any token can exist. The handler gates
/// every call on the `x-setup-token` header instead, and the whole endpoint
/// is disabled when the server runs without a `SETUP_TOKEN`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /admin/accounts
        // Creates an author account from a username and plaintext password.
        // The password is hashed before it is stored; duplicates answer 409.
        .route("/accounts", post(handlers::create_account))
}
