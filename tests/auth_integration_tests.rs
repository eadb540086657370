use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use inkpress::{
    AppConfig, AppState, MemoryRepository, MockAssetStore, TokenService,
    auth::AuthUser,
    error::{ApiError, ConfigError},
    password,
    token::{Claims, TOKEN_TTL_HOURS},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_ACCOUNT_ID: Uuid = Uuid::from_u128(1);

/// Signs a token by hand so tests control the expiry directly. A negative
/// offset produces an already-expired token.
fn create_token(account_id: Uuid, secret: &str, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: account_id,
        username: "admin".to_string(),
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(jwt_secret: &str) -> AppState {
    AppState {
        repo: Arc::new(MemoryRepository::new()),
        assets: Arc::new(MockAssetStore::new()),
        tokens: TokenService::new(jwt_secret).expect("test secret must be accepted"),
        config: AppConfig::default(),
    }
}

/// Builds the request `Parts` the extractor runs against.
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn bearer_parts(token: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    parts
}

// --- Extractor Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_token() {
    let token = create_token(TEST_ACCOUNT_ID, TEST_JWT_SECRET, 3600);
    let app_state = create_app_state(TEST_JWT_SECRET);

    let mut parts = bearer_parts(&token);
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    let user = auth_user.unwrap();
    assert_eq!(user.account_id, TEST_ACCOUNT_ID);
    assert_eq!(user.username, "admin");
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::MissingCredential);
}

#[tokio::test]
async fn test_auth_failure_with_non_bearer_scheme() {
    let app_state = create_app_state(TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_static("Basic dXNlcjpwYXNz"),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    // A non-Bearer scheme counts as "no credential presented", not as a bad token.
    assert_eq!(auth_user.unwrap_err(), ApiError::MissingCredential);
}

#[tokio::test]
async fn test_auth_failure_with_garbage_token() {
    let app_state = create_app_state(TEST_JWT_SECRET);

    let mut parts = bearer_parts("definitely-not-a-jwt");
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::InvalidCredential);
}

#[tokio::test]
async fn test_auth_failure_with_expired_token() {
    // Expired one hour ago.
    let token = create_token(TEST_ACCOUNT_ID, TEST_JWT_SECRET, -3600);
    let app_state = create_app_state(TEST_JWT_SECRET);

    let mut parts = bearer_parts(&token);
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::InvalidCredential);
}

#[tokio::test]
async fn test_auth_failure_with_token_at_expiry_second() {
    // `exp` equals the current second. The lifetime ends at `exp` exactly,
    // so the boundary second is already invalid.
    let token = create_token(TEST_ACCOUNT_ID, TEST_JWT_SECRET, 0);
    let app_state = create_app_state(TEST_JWT_SECRET);

    let mut parts = bearer_parts(&token);
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::InvalidCredential);
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    // Signed with a different secret than the one the service verifies with.
    let token = create_token(TEST_ACCOUNT_ID, "some-other-secret-entirely", 3600);
    let app_state = create_app_state(TEST_JWT_SECRET);

    let mut parts = bearer_parts(&token);
    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::InvalidCredential);
}

// --- Token Service Tests ---

#[tokio::test]
async fn test_issue_and_verify_roundtrip() {
    let service = TokenService::new(TEST_JWT_SECRET).unwrap();

    let token = service.issue(TEST_ACCOUNT_ID, "admin").unwrap();
    let claims = service.verify(&token).unwrap();

    assert_eq!(claims.sub, TEST_ACCOUNT_ID);
    assert_eq!(claims.username, "admin");
    // The lifetime is fixed by the service, not negotiable by callers.
    assert_eq!(claims.exp - claims.iat, (TOKEN_TTL_HOURS * 3600) as usize);
}

#[tokio::test]
async fn test_verify_rejects_forged_claims() {
    let service = TokenService::new(TEST_JWT_SECRET).unwrap();

    let genuine = service.issue(TEST_ACCOUNT_ID, "admin").unwrap();
    let other = service.issue(Uuid::from_u128(2), "intruder").unwrap();

    // Splice the other token's claims into the genuine token's signature.
    let genuine_parts: Vec<&str> = genuine.split('.').collect();
    let other_parts: Vec<&str> = other.split('.').collect();
    let forged = format!(
        "{}.{}.{}",
        genuine_parts[0], other_parts[1], genuine_parts[2]
    );

    assert_eq!(
        service.verify(&forged).unwrap_err(),
        ApiError::InvalidCredential
    );
}

#[tokio::test]
async fn test_verify_failures_are_uniform() {
    let service = TokenService::new(TEST_JWT_SECRET).unwrap();

    let garbage = service.verify("not.a.token").unwrap_err();
    let expired = service
        .verify(&create_token(TEST_ACCOUNT_ID, TEST_JWT_SECRET, -60))
        .unwrap_err();
    let boundary = service
        .verify(&create_token(TEST_ACCOUNT_ID, TEST_JWT_SECRET, 0))
        .unwrap_err();
    let foreign = service
        .verify(&create_token(TEST_ACCOUNT_ID, "wrong-secret-wrong-secret", 60))
        .unwrap_err();

    // Malformed, expired, and mis-signed tokens must be indistinguishable
    // to the caller.
    assert_eq!(garbage, ApiError::InvalidCredential);
    assert_eq!(expired, ApiError::InvalidCredential);
    assert_eq!(boundary, ApiError::InvalidCredential);
    assert_eq!(foreign, ApiError::InvalidCredential);
}

#[tokio::test]
async fn test_empty_secret_rejected_at_construction() {
    assert_eq!(
        TokenService::new("").err(),
        Some(ConfigError::EmptyValue("JWT_SECRET"))
    );
}

// --- Password Hashing Tests ---

#[test]
fn test_password_roundtrip() {
    let hash = password::hash_password("secret123").unwrap();
    assert!(password::verify_password("secret123", &hash));
}

#[test]
fn test_password_rejects_wrong_plaintext() {
    let hash = password::hash_password("secret123").unwrap();
    assert!(!password::verify_password("secret124", &hash));
}

#[test]
fn test_password_hashes_are_salted() {
    // Same plaintext, two different hashes: the salt is per-call random.
    let first = password::hash_password("secret123").unwrap();
    let second = password::hash_password("secret123").unwrap();
    assert_ne!(first, second);

    assert!(password::verify_password("secret123", &first));
    assert!(password::verify_password("secret123", &second));
}

#[test]
fn test_password_verify_tolerates_malformed_stored_hash() {
    // A corrupted stored hash must fail verification, not panic.
    assert!(!password::verify_password("secret123", "not-a-phc-string"));
    assert!(!password::verify_password("secret123", ""));
}

#[test]
fn test_password_hash_is_not_the_plaintext() {
    let hash = password::hash_password("secret123").unwrap();
    assert!(!hash.contains("secret123"));
    assert!(hash.starts_with("$argon2"));
}
