use std::path::PathBuf;

/// Errors that can occur across the codemetry platform.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use codemetry_core::CodemetryError;
///
/// let err = CodemetryError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CodemetryError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The path is not a git repository with commit history.
    #[error("invalid repository: {0}")]
    InvalidRepo(String),

    /// A malformed or contradictory analysis request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Git operation failure after the repository was opened.
    #[error("git error: {0}")]
    Git(String),

    /// AI explainer API or response error.
    #[error("AI error: {0}")]
    Ai(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CodemetryError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn invalid_repo_displays_message() {
        let err = CodemetryError::InvalidRepo("no commits on HEAD".into());
        assert_eq!(err.to_string(), "invalid repository: no commits on HEAD");
    }

    #[test]
    fn invalid_argument_displays_message() {
        let err = CodemetryError::InvalidArgument("since is after until".into());
        assert!(err.to_string().starts_with("invalid argument:"));
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = CodemetryError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert!(err.to_string().contains("/tmp/missing.toml"));
    }
}
