use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{error::ApiError, token::TokenService};

/// AuthUser
///
/// The resolved identity of an authenticated request: the typed output of
/// the authorization gate. Handlers take this as a parameter, which makes
/// the gate's result an explicit value threaded through the call chain
/// rather than an untyped side channel on the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The account the presented token was issued to.
    pub account_id: Uuid,
    /// The username embedded in the token's claims.
    pub username: String,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any protected handler. Per request the gate moves
/// through exactly one of two terminal outcomes:
///
/// 1. Token extraction: the Authorization header must carry a
///    `Bearer <token>` value; anything else rejects with `MissingCredential`.
/// 2. Token verification: signature and expiry are checked by the token
///    service; any failure rejects with `InvalidCredential`.
/// 3. On success the claims become the request's `AuthUser`.
///
/// The claim is self-contained, so no store lookup happens here. This gate
/// is the only authorization boundary in the system: there are no roles or
/// scopes beyond "holds a valid admin token".
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // Allows the extractor to pull the token service from the app state.
    TokenService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenService::from_ref(state);

        // Absence of the header, a non-string value, or a non-Bearer scheme
        // all mean no credential was presented at all.
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::MissingCredential)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::MissingCredential)?;

        // A presented-but-unverifiable token is a different rejection; the
        // token service collapses every verification failure into one kind.
        let claims = tokens.verify(token)?;

        Ok(AuthUser {
            account_id: claims.sub,
            username: claims.username,
        })
    }
}
