use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// ApiError
///
/// The request-scoped error taxonomy for the whole service. Every failure a
/// handler, the auth gate, the repository, or the asset store can produce is
/// one of these variants, and the `IntoResponse` impl below is the single
/// place where they are mapped to client-visible HTTP statuses.
///
/// Internal detail (sqlx error text, S3 SDK errors, token parse failures) is
/// logged with `tracing` at the point of failure and never carried inside a
/// variant, so nothing sensitive can leak into a response body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No bearer token was presented on a protected route.
    #[error("missing bearer credential")]
    MissingCredential,

    /// Bad username/password, or a malformed, tampered, or expired token.
    /// One variant for all of these: the response must not reveal which
    /// check failed.
    #[error("invalid username, password, or token")]
    InvalidCredential,

    /// The requested post id does not exist.
    #[error("post not found")]
    NotFound,

    /// Bootstrap attempted with a username that is already registered.
    #[error("username already taken")]
    UsernameTaken,

    /// Malformed or incomplete input (bad multipart body, missing fields).
    #[error("{0}")]
    BadRequest(String),

    /// The external asset store rejected or failed the image upload.
    #[error("image upload failed")]
    AssetUpload,

    /// The persistence backend is unreachable or a query failed.
    #[error("storage backend unavailable")]
    StoreUnavailable,

    /// Catch-all for failures that should be impossible in normal operation
    /// (e.g. the password hasher or token signer erroring).
    #[error("internal server error")]
    Internal,
}

/// ErrorBody
///
/// The JSON shape of every error response: `{"error": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingCredential | ApiError::InvalidCredential => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::UsernameTaken => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AssetUpload => StatusCode::BAD_GATEWAY,
            ApiError::StoreUnavailable | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// ConfigError
///
/// Startup-only failures raised while loading `AppConfig` or constructing the
/// token service. These are fatal before the server binds; they are never
/// mapped to an HTTP response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("{0} must not be empty")]
    EmptyValue(&'static str),

    #[error("invalid value for {0}")]
    InvalidValue(&'static str),
}
