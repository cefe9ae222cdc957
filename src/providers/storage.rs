use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::{error::DisplayErrorContext, primitives::ByteStream};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::ProviderError;
use crate::models::StoredImage;

/// ImageStore
///
/// Contract for the object store holding writer profile images and article photos.
/// Implementations return the public URL together with the key needed to delete the file.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Creates the configured bucket if missing. Only called for `Env::Local` (MinIO).
    async fn ensure_bucket_exists(&self);

    /// Stores `bytes` under `folder` with a fresh random name.
    async fn upload(&self, folder: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredImage, ProviderError>;

    async fn delete(&self, remote_id: &str) -> Result<(), ProviderError>;
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        _ => "jpg",
    }
}

/// sanitize_key
///
/// Strips empty, `.` and `..` segments so a folder name cannot walk out of the bucket.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn object_key(folder: &str, content_type: &str) -> String {
    format!(
        "{}/{}.{}",
        sanitize_key(folder),
        Uuid::new_v4(),
        extension_for(content_type)
    )
}

/// S3ImageStore
///
/// `ImageStore` over the AWS SDK. Works against MinIO locally and any S3-compatible
/// endpoint in production; path-style addressing is required by both.
#[derive(Clone)]
pub struct S3ImageStore {
    client: s3::Client,
    bucket_name: String,
    public_base: String,
}

impl S3ImageStore {
    pub fn new(endpoint: &str, region: &str, access_key: &str, secret_key: &str, bucket: &str) -> Self {
        let credentials = s3::config::Credentials::new(access_key, secret_key, None, None, "static");

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
            public_base: format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        }
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket on an existing bucket fails harmlessly.
        if let Err(e) = self.client.create_bucket().bucket(&self.bucket_name).send().await {
            tracing::debug!(error = %DisplayErrorContext(&e), "create_bucket skipped");
        }
    }

    async fn upload(&self, folder: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredImage, ProviderError> {
        let key = object_key(folder, content_type);
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| ProviderError::Storage(DisplayErrorContext(&e).to_string()))?;

        Ok(StoredImage {
            url: format!("{}/{}", self.public_base, key),
            remote_id: key,
        })
    }

    async fn delete(&self, remote_id: &str) -> Result<(), ProviderError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(remote_id)
            .send()
            .await
            .map_err(|e| ProviderError::Storage(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

/// MockImageStore
///
/// In-memory `ImageStore` for tests. Records uploaded and deleted keys so tests can
/// assert that replaced images are cleaned up.
#[derive(Default)]
pub struct MockImageStore {
    /// When true, every operation fails.
    pub should_fail: bool,
    uploaded: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn ensure_bucket_exists(&self) {}

    async fn upload(&self, folder: &str, _bytes: Vec<u8>, content_type: &str) -> Result<StoredImage, ProviderError> {
        if self.should_fail {
            return Err(ProviderError::Simulated("storage"));
        }
        let key = object_key(folder, content_type);
        self.uploaded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key.clone());
        Ok(StoredImage {
            url: format!("http://localhost:9000/mock-bucket/{key}"),
            remote_id: key,
        })
    }

    async fn delete(&self, remote_id: &str) -> Result<(), ProviderError> {
        if self.should_fail {
            return Err(ProviderError::Simulated("storage"));
        }
        self.deleted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(remote_id.to_string());
        Ok(())
    }
}

pub type StorageState = Arc<dyn ImageStore>;
