use std::sync::Arc;

use common::storage::{LocalStorage, ObjectStorage, StorageBackend, StorageError};

use crate::config::{StorageBackendKind, StorageConfig};

/// Build the configured storage backend. Called once at startup.
pub async fn build_storage(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    match config.backend {
        StorageBackendKind::Local => {
            let store = LocalStorage::from_config(&config.local).await?;
            tracing::info!(
                base_path = %config.local.base_path.display(),
                base_url = %config.local.base_url,
                "Using local filesystem storage"
            );
            Ok(Arc::new(store))
        }
        StorageBackendKind::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                StorageError::Remote("storage.backend is \"s3\" but [storage.s3] is missing".into())
            })?;
            let store = ObjectStorage::new(s3)?;
            tracing::info!(bucket = %s3.bucket, region = %s3.region, "Using object storage");
            Ok(Arc::new(store))
        }
    }
}
