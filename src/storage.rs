use crate::error::ApiError;
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use std::sync::Arc;
use uuid::Uuid;

// 1. AssetStore Contract
/// AssetStore
///
/// Defines the abstract contract for all interactions with the object
/// storage layer. Handlers push uploaded image bytes through this trait and
/// receive back a public URL, without knowing whether the backend is a real
/// S3-compatible store or a mock.
///
/// **Send + Sync + async_trait** are required to turn this into a shareable,
/// thread-safe trait object (`Arc<dyn AssetStore>`).
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Idempotently prepares the backing bucket. Only called against local
    /// MinIO during startup; production buckets are provisioned out of band.
    async fn ensure_bucket_exists(&self);

    /// Stores one uploaded object under the given folder and returns the
    /// public URL where it can be fetched. Any backend failure is collapsed
    /// to `ApiError::AssetUpload` after logging, so callers can abort the
    /// surrounding write without leaking store detail to the client.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        folder: &str,
    ) -> Result<String, ApiError>;
}

/// AssetStoreState
///
/// The concrete type used to share the storage service across the
/// application state.
pub type AssetStoreState = Arc<dyn AssetStore>;

// 2. S3 Implementation
/// S3AssetStore
///
/// The S3-compatible implementation of the `AssetStore` trait. Works against
/// MinIO locally and any S3 API in production; the only difference is the
/// endpoint and credentials handed to `new`.
pub struct S3AssetStore {
    client: s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3AssetStore {
    /// Builds the client by hand instead of using the ambient AWS
    /// environment config, so local MinIO (path-style, fixed credentials)
    /// and production S3 run through the same code path.
    pub fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_base_url: &str,
    ) -> Self {
        let credentials = s3::config::Credentials::new(
            access_key, secret_key, None, // session token
            None, // expiry
            "inkpress",
        );

        let config = s3::Config::builder()
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_owned()))
            .credentials_provider(credentials)
            // MinIO serves buckets as path segments, not subdomains.
            .force_path_style(true)
            .behavior_version_latest()
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket: bucket.to_owned(),
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn ensure_bucket_exists(&self) {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => tracing::debug!("bucket {} already exists", self.bucket),
            Err(_) => {
                tracing::info!("bucket {} not found, creating...", self.bucket);
                if let Err(err) = self.client.create_bucket().bucket(&self.bucket).send().await {
                    tracing::error!("failed to create bucket {}: {err:?}", self.bucket);
                }
            }
        }
    }

    async fn upload(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        folder: &str,
    ) -> Result<String, ApiError> {
        let key = object_key(folder, content_type);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(s3::primitives::ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| {
                tracing::error!("failed to upload {key}: {err:?}");
                ApiError::AssetUpload
            })?;

        tracing::debug!("uploaded {key} to bucket {}", self.bucket);
        Ok(format!("{}/{}/{key}", self.public_base_url, self.bucket))
    }
}

/// Builds a collision-free object key: sanitized folder prefix plus a fresh
/// UUID, with the extension inferred from the declared content type.
fn object_key(folder: &str, content_type: &str) -> String {
    let name = format!("{}.{}", Uuid::new_v4(), extension_for(content_type));
    let prefix = sanitize_key(folder);
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    }
}

/// Maps the uploaded content type to a file extension. Unrecognized types
/// still store fine, they just get a generic extension.
fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

/// Strips characters that could break out of the intended key space. The
/// folder prefix must stay a flat, URL-safe identifier; the file name with
/// its extension is appended separately.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

// 3. Mock Implementation
/// MockAssetStore
///
/// A mock implementation of the `AssetStore` trait for tests. Returns
/// plausible-looking URLs without touching the network, and can be flipped
/// into a failing mode to exercise the upload-first error path.
pub struct MockAssetStore {
    should_fail: bool,
}

impl MockAssetStore {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    /// Every upload through this instance fails with `AssetUpload`.
    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetStore for MockAssetStore {
    async fn ensure_bucket_exists(&self) {}

    async fn upload(
        &self,
        _bytes: Vec<u8>,
        content_type: &str,
        folder: &str,
    ) -> Result<String, ApiError> {
        if self.should_fail {
            return Err(ApiError::AssetUpload);
        }

        let key = object_key(folder, content_type);
        Ok(format!(
            "http://localhost:9000/mock-bucket/{key}?signature=fake"
        ))
    }
}
