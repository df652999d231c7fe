mod error;
mod key;
mod reference;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod object;

pub use error::StorageError;
pub use filesystem::LocalStorage;
#[cfg(feature = "object-storage")]
pub use object::ObjectStorage;
pub use reference::StorageReference;
pub use traits::{BoxReader, StorageBackend};
