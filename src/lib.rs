use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services: credentials, tokens, persistence, asset storage, handlers.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod storage;
pub mod token;

// Route modules, split by access level (public, authenticated, admin).
pub mod routes;
use auth::AuthUser; // The resolved bearer-token identity.
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Shortcuts for main.rs and the test suites; the full paths stay available.
pub use config::AppConfig;
pub use error::{ApiError, ConfigError};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{AssetStoreState, MockAssetStore, S3AssetStore};
pub use token::TokenService;

/// Multipart submissions carry one image at most; 10 MiB covers any
/// reasonable blog photo while bounding memory per request.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// ApiDoc
///
/// Collects every `#[utoipa::path]`-annotated handler and every `ToSchema`
/// model into a single OpenAPI document. The generated JSON is mounted at
/// `/api-docs/openapi.json` and browsable through the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    // Handlers must be registered here as well as in their routers.
    paths(
        handlers::login, handlers::create_account,
        handlers::list_posts, handlers::get_post,
        handlers::create_post, handlers::update_post, handlers::delete_post
    ),
    // Schemas referenced by the paths above.
    components(
        schemas(
            models::Account, models::Post,
            models::LoginRequest, models::LoginResponse,
            models::CreateAccountRequest,
            models::CreatePostForm, models::UpdatePostForm,
        )
    ),
    tags(
        (name = "inkpress", description = "Single-author blog API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a request handler can reach, assembled once in `main` and
/// cloned per request. All members are cheap to clone (Arc handles, prepared
/// keys) and none are mutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: account and post persistence behind a trait object.
    pub repo: RepositoryState,
    /// Asset Layer: the S3/MinIO image store behind a trait object.
    pub assets: AssetStoreState,
    /// Token Layer: issues and verifies the signed bearer tokens.
    pub tokens: TokenService,
    /// Configuration: environment-derived settings, loaded once at startup.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Lets extractors pull a single component out of the shared AppState, so
// e.g. the auth gate can depend on TokenService alone rather than the whole
// state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AssetStoreState {
    fn from_ref(app_state: &AppState) -> AssetStoreState {
        app_state.assets.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// The bearer-token gate applied to `authenticated_routes`.
///
/// *Mechanism*: Extracting `AuthUser` runs the full token check via its
/// `FromRequestParts` impl, so a missing or invalid bearer token rejects the
/// request with a 401 before the handler runs. On success the request
/// proceeds unchanged.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Builds the full application router: route modules merged by access level,
/// the bearer-token layer on the mutating routes, and the observability
/// stack wrapped around everything.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Correlation header attached to every request and response.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Swagger UI plus the raw OpenAPI JSON.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Open reads and the login exchange, no middleware.
        .merge(public::public_routes())
        // Post mutations, behind the bearer-token gate.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin Routes: Nested under '/admin'. The setup-token check happens
        // *inside* the handler, because provisioning must work before any
        // bearer token exists.
        .nest("/admin", admin::admin_routes())
        // Image uploads arrive inline in the multipart body.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: A unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, carrying the
                // generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: Returns the x-request-id header
                // to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (applied last, wide open)
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`. Pulls the `x-request-id` header set by the
/// request-id layer into the span, next to the method and URI, so every log
/// line emitted while handling one request shares the same correlation id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    // Fields every log line inside the request span inherits.
    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
