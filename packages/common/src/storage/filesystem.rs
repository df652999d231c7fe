use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::StorageError;
use super::key::{ObjectName, validate_relative_key};
use super::reference::StorageReference;
use super::traits::{BoxReader, StorageBackend};
use crate::config::LocalStorageConfig;

/// Everything but RFC 3986 unreserved characters is escaped in URL segments.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// How many timestamps to try before giving up on finding a free filename.
const MAX_CREATE_ATTEMPTS: i64 = 16;

/// Local filesystem storage backend.
///
/// Files land under `{base_path}/{dir}/{nanos}_{filename}` and are addressed
/// by `{base_url}/{dir}/{nanos}_{filename}`, where `{dir}` is the directory
/// part of the suggested name (possibly empty). Each URL segment is
/// percent-encoded, so the reference stays fetchable for names containing
/// `#`, `?`, `%` or spaces.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create the backend, creating `base_path` and its parents if missing.
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        Ok(Self {
            base_path,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn from_config(config: &LocalStorageConfig) -> Result<Self, StorageError> {
        Self::new(config.base_path.clone(), config.base_url.clone()).await
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn url_for(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect();
        format!("{}/{}", self.base_url, encoded.join("/"))
    }

    /// Recover the backend-relative key from a reference this backend issued.
    fn key_for(&self, reference: &StorageReference) -> Option<String> {
        let encoded = reference
            .as_str()
            .strip_prefix(self.base_url.as_str())?
            .strip_prefix('/')?;
        let key = percent_decode_str(encoded).decode_utf8().ok()?.into_owned();
        validate_relative_key(&key).ok()?;
        Some(key)
    }

    /// Open a brand-new file for `name`, bumping the timestamp prefix until an
    /// unused filename is found.
    async fn create_unique(
        &self,
        name: &ObjectName<'_>,
    ) -> Result<(String, PathBuf, fs::File), StorageError> {
        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();

        for attempt in 0..MAX_CREATE_ATTEMPTS {
            let key = name.with_unique_prefix(&(stamp + attempt).to_string());
            let path = self.base_path.join(&key);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((key, path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::Write(format!(
                        "failed to create {}: {e}",
                        path.display()
                    )));
                }
            }
        }

        Err(StorageError::Write(format!(
            "no free filename for {} after {MAX_CREATE_ATTEMPTS} attempts",
            name.file
        )))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        mut reader: BoxReader,
        name: &str,
    ) -> Result<StorageReference, StorageError> {
        let name = ObjectName::parse(name)?;

        if let Some(dir) = name.dir {
            let dir = self.base_path.join(dir);
            fs::create_dir_all(&dir).await.map_err(|e| {
                StorageError::Write(format!("failed to create {}: {e}", dir.display()))
            })?;
        }

        let (key, path, mut file) = self.create_unique(&name).await?;

        let written = match tokio::io::copy(&mut reader, &mut file).await {
            Ok(n) => file.flush().await.map(|_| n),
            Err(e) => Err(e),
        };
        drop(file);

        match written {
            Ok(bytes) => {
                tracing::debug!(key = %key, bytes, "Stored object on local filesystem");
                Ok(StorageReference::new(self.url_for(&key)))
            }
            Err(e) => {
                // Never leave a truncated object behind.
                let _ = fs::remove_file(&path).await;
                Err(StorageError::Write(format!("failed to save {key}: {e}")))
            }
        }
    }

    async fn delete(&self, reference: &StorageReference) -> Result<(), StorageError> {
        let key = self
            .key_for(reference)
            .ok_or_else(|| StorageError::InvalidReference(reference.to_string()))?;

        match fs::remove_file(self.base_path.join(&key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key = %key, "Object already absent on delete");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_download_location(
        &self,
        reference: &StorageReference,
    ) -> Result<String, StorageError> {
        let key = self
            .key_for(reference)
            .ok_or_else(|| StorageError::Resolve(reference.to_string()))?;

        if !fs::try_exists(self.base_path.join(&key)).await? {
            return Err(StorageError::Resolve(reference.to_string()));
        }

        // Local references are already public URLs.
        Ok(reference.as_str().to_string())
    }
}
