use std::fmt;

/// Errors that can occur during storage backend operations.
#[derive(Debug)]
pub enum StorageError {
    /// The destination could not be created or the input stream could not be
    /// fully drained.
    Write(String),
    /// The reference does not point at an object this backend knows about.
    Resolve(String),
    /// The reference was not issued by this backend or is malformed.
    InvalidReference(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The remote object store rejected or failed a request.
    Remote(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(msg) => write!(f, "storage write failed: {msg}"),
            Self::Resolve(reference) => write!(f, "unknown storage reference: {reference}"),
            Self::InvalidReference(reference) => {
                write!(f, "invalid storage reference: {reference}")
            }
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::Remote(msg) => write!(f, "object store error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
