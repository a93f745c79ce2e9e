use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::Image;

/// Object-key prefix for every campground image.
pub const IMAGE_FOLDER: &str = "campgrounds";

/// StorageError
///
/// Failures reported by the object storage layer. The message is for logs only.
#[derive(Debug, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub String);

/// PendingUpload
///
/// A file received in a multipart form, buffered in memory until validation has passed.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// 1. StorageService Contract
/// StorageService
///
/// The abstract contract for all interactions with image storage. Handlers only ever
/// hold an `Arc<dyn StorageService>`, so tests swap in `MockStorageService`.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in `Env::Local` to provision MinIO.
    async fn ensure_bucket_exists(&self);

    /// Stores `bytes` under `key` and returns the public URL + key pair to persist.
    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Image, StorageError>;

    /// Removes the object stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

// 2. The Real Implementation (S3/MinIO)
/// S3StorageClient
///
/// Concrete implementation on the AWS SDK for S3. Works against AWS itself, MinIO, or any
/// S3-compatible gateway; `force_path_style(true)` keeps MinIO happy.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_url: String,
}

impl S3StorageClient {
    /// Constructs the S3 client using credentials and configuration from AppConfig.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_url, self.bucket_name, key)
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// CreateBucket is idempotent from our point of view: an "already owned" error is
    /// the expected outcome on every start after the first.
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(bucket = %self.bucket_name, "create_bucket: {}", e);
        }
    }

    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Image, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError(e.to_string()))?;

        Ok(Image {
            url: self.object_url(key),
            filename: key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError(e.to_string()))?;
        Ok(())
    }
}

/// sanitize_key
///
/// Strips path traversal components (`..`, `.`, empty segments) from a key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// image_key
///
/// A fresh, collision-free object key for an uploaded file, keeping a short
/// alphanumeric extension from the client's filename when there is one.
pub fn image_key(original_name: &str) -> String {
    let extension = std::path::Path::new(original_name)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .filter(|ext| ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string());
    format!("{}/{}.{}", IMAGE_FOLDER, Uuid::new_v4(), extension)
}

/// upload_images
///
/// Pushes every pending file to storage in order and stops at the first failure.
/// Files stored before the failure are left in place.
pub async fn upload_images(
    storage: &dyn StorageService,
    files: Vec<PendingUpload>,
) -> Result<Vec<Image>, StorageError> {
    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        let key = image_key(&file.original_name);
        stored.push(storage.upload(&key, &file.content_type, file.bytes).await?);
    }
    Ok(stored)
}

/// delete_images
///
/// Best-effort removal: a blob that cannot be deleted is logged, never fatal, because the
/// database side of the operation has already been committed.
pub async fn delete_images<'a>(
    storage: &dyn StorageService,
    filenames: impl IntoIterator<Item = &'a str>,
) {
    for filename in filenames {
        if let Err(e) = storage.delete(filename).await {
            tracing::warn!(filename, "failed to delete stored image: {}", e);
        }
    }
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory `StorageService` for tests. Records every stored and deleted key so tests
/// can assert on storage side effects.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    uploaded: Arc<Mutex<Vec<String>>>,
    deleted: Arc<Mutex<Vec<String>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub async fn uploaded_keys(&self) -> Vec<String> {
        self.uploaded.lock().await.clone()
    }

    pub async fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {
        // No-op in mock environment.
    }

    async fn upload(
        &self,
        key: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<Image, StorageError> {
        if self.should_fail {
            return Err(StorageError(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }

        let sanitized_key = sanitize_key(key);
        self.uploaded.lock().await.push(sanitized_key.clone());

        Ok(Image {
            url: format!("http://localhost:9000/mock-bucket/{}", sanitized_key),
            filename: sanitized_key,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }
        self.deleted.lock().await.push(key.to_string());
        Ok(())
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;
