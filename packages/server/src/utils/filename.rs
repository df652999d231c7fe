/// Longest filename accepted for an upload, in bytes.
const MAX_FILENAME_LEN: usize = 255;

/// Reasons an uploaded filename is refused.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    Empty,
    TooLong,
    /// `/` or `\` would turn the name into a path.
    PathSeparator,
    /// Dot-files and `..`.
    Hidden,
    /// NUL, CR, LF and the other ASCII control characters.
    ControlCharacter,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "File field must have a filename",
            Self::TooLong => "Filename exceeds 255 bytes",
            Self::PathSeparator => "Invalid filename: path separators are not allowed",
            Self::Hidden => "Invalid filename: names starting with '.' are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validate a client-supplied filename that becomes the last segment of a
/// storage name. Returns the trimmed name.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }
    if trimmed.len() > MAX_FILENAME_LEN {
        return Err(FilenameError::TooLong);
    }
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }
    if trimmed.contains(['/', '\\']) {
        return Err(FilenameError::PathSeparator);
    }
    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}
