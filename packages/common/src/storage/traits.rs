use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::reference::StorageReference;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Pluggable blob storage.
///
/// Implementations are selected once at startup and shared across requests,
/// so they must be safe for concurrent use.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Drain `reader` into a new object derived from `name` and return a
    /// reference to it.
    ///
    /// `name` may contain `/`-separated directory segments. The backend makes
    /// the final key unique and never overwrites an existing object. Size
    /// limits are the caller's responsibility.
    async fn upload(&self, reader: BoxReader, name: &str)
    -> Result<StorageReference, StorageError>;

    /// Store an in-memory buffer.
    async fn upload_bytes(
        &self,
        data: &[u8],
        name: &str,
    ) -> Result<StorageReference, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.upload(reader, name).await
    }

    /// Remove the object behind `reference`.
    ///
    /// Deleting an object that no longer exists succeeds.
    async fn delete(&self, reference: &StorageReference) -> Result<(), StorageError>;

    /// Return a location a client can fetch the object from. Depending on the
    /// backend this is a public URL or a time-limited signed URL.
    async fn resolve_download_location(
        &self,
        reference: &StorageReference,
    ) -> Result<String, StorageError>;
}
