use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Account
///
/// An administrator identity stored in the `accounts` table. Accounts are
/// created once through the bootstrap path and are never updated or deleted.
/// The password hash is an opaque PHC string and is stripped from every
/// serialized form: JSON responses, the OpenAPI schema, and the exported
/// TypeScript type all omit it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Account {
    pub id: Uuid,
    /// Unique login name, immutable after creation.
    pub username: String,
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Post
///
/// A blog post record from the `posts` table. This is the primary data
/// structure for the core business logic.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    /// FK to accounts.id. Set once at creation from the authenticated
    /// identity and never reassigned afterwards.
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    /// Public URL of the attached image in the external asset store, if any.
    pub image_url: Option<String>,

    // Set by the store on insert; updated_at refreshes on every update.
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for the public login endpoint (POST /auth/login).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// LoginResponse
///
/// Output schema carrying the signed bearer token. The token is opaque to
/// clients; they present it verbatim in the Authorization header.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
}

/// CreateAccountRequest
///
/// Input payload for the admin bootstrap endpoint (POST /admin/accounts).
/// The password never leaves this process: it is hashed before storage and
/// the plaintext is dropped.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateAccountRequest {
    pub username: String,
    pub password: String,
}

/// CreatePostForm
///
/// Documentation schema for the multipart body of POST /posts. The actual
/// handler parses the multipart stream field by field; this struct exists so
/// the generated OpenAPI document describes the expected parts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreatePostForm {
    pub title: String,
    pub content: String,
    /// Optional image file part; uploaded to the asset store before the
    /// post record is written.
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<String>,
}

/// UpdatePostForm
///
/// Documentation schema for the multipart body of PUT /posts/{id}. Every
/// part is optional: an omitted field leaves the stored value untouched,
/// while a present-but-empty `title`/`content` field explicitly sets the
/// empty string.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdatePostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Optional replacement image; the previous asset is orphaned, not
    /// deleted.
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<String>,
}

// --- Repository Inputs (Internal) ---

/// NewPost
///
/// The fields the repository needs to insert a post. `author_id` comes from
/// the authenticated identity, never from client input.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

/// PostUpdate
///
/// Partial update carrier for the repository. `None` means "leave the stored
/// value untouched"; `Some` overwrites, including `Some("")` which clears a
/// text field to empty. The distinction between an omitted field and an
/// empty one is part of the update contract.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}
