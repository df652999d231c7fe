use super::error::StorageError;

/// A suggested object name split into its directory part and final segment.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ObjectName<'a> {
    pub dir: Option<&'a str>,
    pub file: &'a str,
}

impl<'a> ObjectName<'a> {
    /// Split and validate a `/`-separated relative name such as
    /// `"<owner>/bills/invoice.pdf"`.
    pub fn parse(name: &'a str) -> Result<Self, StorageError> {
        validate_relative_key(name).map_err(StorageError::Write)?;

        Ok(match name.rsplit_once('/') {
            Some((dir, file)) => Self {
                dir: Some(dir),
                file,
            },
            None => Self {
                dir: None,
                file: name,
            },
        })
    }

    /// Build the final key with `unique` prepended to the last segment.
    pub fn with_unique_prefix(&self, unique: &str) -> String {
        match self.dir {
            Some(dir) => format!("{dir}/{unique}_{}", self.file),
            None => format!("{unique}_{}", self.file),
        }
    }
}

/// Reject anything that could escape the backend's namespace.
pub(crate) fn validate_relative_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("name must not be empty".into());
    }
    if key.contains('\0') || key.chars().any(|c| c.is_ascii_control()) {
        return Err(format!("name contains control characters: {key:?}"));
    }
    if key.contains('\\') {
        return Err(format!("name must not contain backslashes: {key}"));
    }
    if key.starts_with('/') {
        return Err(format!("name must be relative: {key}"));
    }
    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(format!("name has an invalid path segment: {key}"));
        }
    }
    Ok(())
}
