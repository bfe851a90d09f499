use std::path::PathBuf;

/// Failures of the AI description capability. Every variant is scoped to a
/// single photo and ends up as that photo's `last_error`.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("no API key configured")]
    MissingCredential,

    #[error("unreadable image {}: {reason}", .path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("API error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("analysis aborted: {0}")]
    Aborted(String),
}

/// Failures of the on-disk rename. The original file is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum RenameError {
    #[error("failed to rename {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no free name for '{stem}' after {limit} attempts")]
    CollisionLimit { stem: String, limit: usize },

    #[error("path has no parent directory: {}", .0.display())]
    InvalidPath(PathBuf),
}
