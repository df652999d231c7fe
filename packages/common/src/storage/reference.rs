use std::fmt;

/// Opaque token a [`StorageBackend`](super::StorageBackend) hands out on upload.
///
/// Only the issuing backend may interpret its contents. Everyone else stores it
/// and passes it back verbatim.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StorageReference(String);

impl StorageReference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for StorageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageReference({})", self.0)
    }
}

impl fmt::Display for StorageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
