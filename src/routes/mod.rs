/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules. Access control is applied explicitly at the module level via
/// Axum layers, so a route can only end up protected or open by being
/// placed in the corresponding module.

/// Routes accessible to all clients (anonymous, read-only plus login).
pub mod public;

/// Routes protected by the bearer-token middleware.
/// Requires a valid, unexpired token.
pub mod authenticated;

/// Routes for account provisioning, gated by the setup token.
pub mod admin;
