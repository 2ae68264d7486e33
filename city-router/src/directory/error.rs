//! Building directory error types.

/// Errors from a building directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Directory returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// No building with this id
    #[error("building not found: {0}")]
    NotFound(String),

    /// Response or file couldn't be parsed
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Buildings file couldn't be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
