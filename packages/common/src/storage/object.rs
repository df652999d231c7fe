use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use uuid::Uuid;

use super::error::StorageError;
use super::key::{ObjectName, validate_relative_key};
use super::reference::StorageReference;
use super::traits::{BoxReader, StorageBackend};
use crate::config::ObjectStorageConfig;

const SCHEME: &str = "s3://";

/// S3-compatible object store backend.
///
/// References have the form `s3://{bucket}/{key}`. Downloads are served through
/// presigned GET URLs rather than through this process.
pub struct ObjectStorage {
    bucket: Box<Bucket>,
    key_prefix: String,
    presign_expiry_secs: u32,
}

impl ObjectStorage {
    pub fn new(config: &ObjectStorageConfig) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Remote(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Remote(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Remote(e.to_string()))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            key_prefix: config.key_prefix.trim_matches('/').to_string(),
            presign_expiry_secs: config.presign_expiry_secs,
        })
    }

    fn object_key(&self, name: &ObjectName<'_>) -> String {
        let key = name.with_unique_prefix(&Uuid::now_v7().simple().to_string());
        if self.key_prefix.is_empty() {
            key
        } else {
            format!("{}/{key}", self.key_prefix)
        }
    }

    fn reference_for(&self, key: &str) -> StorageReference {
        StorageReference::new(format!("{SCHEME}{}/{key}", self.bucket.name()))
    }

    /// Recover the object key from a reference issued for this bucket.
    fn key_for<'a>(&self, reference: &'a StorageReference) -> Option<&'a str> {
        let rest = reference.as_str().strip_prefix(SCHEME)?;
        let (bucket, key) = rest.split_once('/')?;
        if bucket != self.bucket.name() {
            return None;
        }
        validate_relative_key(key).ok()?;
        Some(key)
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait]
impl StorageBackend for ObjectStorage {
    async fn upload(
        &self,
        mut reader: BoxReader,
        name: &str,
    ) -> Result<StorageReference, StorageError> {
        let name = ObjectName::parse(name)?;
        let key = self.object_key(&name);

        let response = self
            .bucket
            .put_object_stream(&mut reader, &key)
            .await
            .map_err(|e| StorageError::Write(format!("failed to upload {key}: {e}")))?;

        let status = response.status_code();
        if !is_success(status) {
            return Err(StorageError::Write(format!(
                "object store answered {status} for {key}"
            )));
        }

        tracing::debug!(key = %key, bucket = %self.bucket.name(), "Stored object in bucket");
        Ok(self.reference_for(&key))
    }

    async fn delete(&self, reference: &StorageReference) -> Result<(), StorageError> {
        let key = self
            .key_for(reference)
            .ok_or_else(|| StorageError::InvalidReference(reference.to_string()))?;

        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        match response.status_code() {
            status if is_success(status) || status == 404 => Ok(()),
            status => Err(StorageError::Remote(format!(
                "delete of {key} answered {status}"
            ))),
        }
    }

    async fn resolve_download_location(
        &self,
        reference: &StorageReference,
    ) -> Result<String, StorageError> {
        let key = self
            .key_for(reference)
            .ok_or_else(|| StorageError::Resolve(reference.to_string()))?;

        let (_, status) = self
            .bucket
            .head_object(key)
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;
        if status == 404 {
            return Err(StorageError::Resolve(reference.to_string()));
        }
        if !is_success(status) {
            return Err(StorageError::Remote(format!(
                "head of {key} answered {status}"
            )));
        }

        self.bucket
            .presign_get(key, self.presign_expiry_secs, None)
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))
    }
}
