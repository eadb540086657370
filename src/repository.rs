use crate::error::ApiError;
use crate::models::{Account, NewPost, Post, PostUpdate};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository
///
/// Defines the abstract contract for all persistence operations: the
/// credential store (accounts) and the post store share one handle. Handlers
/// interact with the data layer through this trait without knowing the
/// concrete implementation (Postgres in production, in-memory in tests).
///
/// Store failures are never swallowed here: every method surfaces them as
/// `ApiError::StoreUnavailable` after logging the underlying error, so the
/// boundary can map them to a generic server failure without leaking detail.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Credential Store ---
    // Lookup for login. A missing username is Ok(None), not an error.
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, ApiError>;
    // Bootstrap insert. A duplicate username fails with `UsernameTaken`.
    async fn insert_account(&self, username: &str, password_hash: &str)
    -> Result<Account, ApiError>;

    // --- Post Store ---
    // Public listing, newest created_at first.
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError>;
    // Single-post lookup. A missing id is Ok(None).
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, ApiError>;
    async fn create_post(&self, new_post: NewPost) -> Result<Post, ApiError>;
    // Partial update: None fields keep their stored values, Some overwrites
    // (including Some("")). updated_at refreshes on every hit. Ok(None) when
    // the id does not exist.
    async fn update_post(&self, id: Uuid, patch: PostUpdate) -> Result<Option<Post>, ApiError>;
    // Hard delete. Ok(true) when a row was removed, Ok(false) otherwise.
    async fn delete_post(&self, id: Uuid) -> Result<bool, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Logs a failed store operation and collapses it to the client-safe kind.
fn store_error(op: &str, err: sqlx::Error) -> ApiError {
    tracing::error!("{op} error: {err:?}");
    ApiError::StoreUnavailable
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by a
/// PostgreSQL pool injected at construction. The pool is created once in
/// main and reused; this type never connects on its own.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "id, author_id, title, content, image_url, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, ApiError> {
        sqlx::query_as::<_, Account>(
            "SELECT id, username, password_hash, created_at FROM accounts WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("find_account_by_username", e))
    }

    async fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Account, ApiError> {
        sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (id, username, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, username, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // The unique index on username is the authority on duplicates.
            sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::UsernameTaken,
            other => store_error("insert_account", other),
        })
    }

    async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("list_posts", e))
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, ApiError> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("get_post", e))
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post, ApiError> {
        sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (id, author_id, title, content, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {POST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new_post.author_id)
        .bind(new_post.title)
        .bind(new_post.content)
        .bind(new_post.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("create_post", e))
    }

    /// Uses COALESCE so that NULL binds (omitted fields) keep the stored
    /// column value while non-NULL binds overwrite it, empty strings
    /// included. updated_at always refreshes when the row exists.
    async fn update_post(&self, id: Uuid, patch: PostUpdate) -> Result<Option<Post>, ApiError> {
        sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts \
             SET title = COALESCE($2, title), \
                 content = COALESCE($3, content), \
                 image_url = COALESCE($4, image_url), \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("update_post", e))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, ApiError> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() > 0)
            .map_err(|e| store_error("delete_post", e))
    }
}

/// MemoryRepository
///
/// An in-memory implementation of `Repository` with the same observable
/// semantics as the Postgres one: list ordering, partial-update behavior,
/// duplicate-username detection, updated_at refresh. Used by the test suite
/// so the full request flow can run without a database.
#[derive(Default)]
pub struct MemoryRepository {
    accounts: RwLock<Vec<Account>>,
    // Insertion order is kept so that posts with identical created_at
    // timestamps still list deterministically (latest insert first).
    posts: RwLock<Vec<Post>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, ApiError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.username == username).cloned())
    }

    async fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Account, ApiError> {
        let mut accounts = self.accounts.write().await;
        if accounts.iter().any(|a| a.username == username) {
            return Err(ApiError::UsernameTaken);
        }

        let account = Account {
            id: Uuid::new_v4(),
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: Utc::now(),
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        let posts = self.posts.read().await;
        // Newest-insert-first before the stable sort, so equal timestamps
        // keep a deterministic newest-first order.
        let mut listed: Vec<Post> = posts.iter().rev().cloned().collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, ApiError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post, ApiError> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            author_id: new_post.author_id,
            title: new_post.title,
            content: new_post.content,
            image_url: new_post.image_url,
            created_at: now,
            updated_at: now,
        };

        self.posts.write().await.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: Uuid, patch: PostUpdate) -> Result<Option<Post>, ApiError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(image_url) = patch.image_url {
            post.image_url = Some(image_url);
        }
        post.updated_at = Utc::now();

        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() < before)
    }
}
