use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::sync::Arc;
use tokio::sync::Mutex;

// 1. StorageService Contract
/// StorageService
///
/// Defines the contract for the object storage holding thumbnails, tour programs and images.
/// Handlers stream every accepted upload through this trait before the database write, so the
/// concrete backend (S3/MinIO in deployments, the in-memory mock in tests) can be swapped freely.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the configured bucket exists. Used in the `Env::Local` setup to provision MinIO.
    async fn ensure_bucket_exists(&self);

    /// Stores `bytes` under `key` and returns the public URL of the stored object.
    ///
    /// # Arguments
    /// * `key`: The object key (folder + generated file name).
    /// * `content_type`: The MIME type recorded on the object.
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, String>;
}

// 2. The Real Implementation (S3/MinIO)
/// S3StorageClient
///
/// The concrete implementation using the AWS SDK for S3. Path-style addressing keeps it
/// compatible with MinIO and other S3-compatible gateways.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3StorageClient {
    /// new
    ///
    /// Constructs the S3 client using credentials and configuration from AppConfig.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
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

        let client = s3::Client::from_conf(config);

        Self {
            client,
            bucket_name: bucket.to_string(),
            public_base_url: format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// ensure_bucket_exists
    ///
    /// CreateBucket is idempotent for the owner, so this is safe to call at every startup.
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(error = %e, bucket = %self.bucket_name, "create_bucket skipped");
        }
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, String> {
        let key = sanitize_key(key);
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        Ok(format!("{}/{}", self.public_base_url, key))
    }
}

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`) and empty segments from an object key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// Keeps uploaded objects in memory and returns deterministic local URLs.
/// Tests inspect `stored_keys` to assert what a handler uploaded.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all uploads return a simulated failure.
    pub should_fail: bool,
    objects: Arc<Mutex<Vec<(String, String, usize)>>>,
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

    /// Keys of every object stored so far, in upload order.
    pub async fn stored_keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .await
            .iter()
            .map(|(key, _, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }

        let sanitized_key = sanitize_key(key);
        self.objects
            .lock()
            .await
            .push((sanitized_key.clone(), content_type.to_string(), bytes.len()));

        Ok(format!("http://localhost:9000/mock-bucket/{}", sanitized_key))
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;
