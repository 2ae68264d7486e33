//! Geometry source error types.

/// Errors that can occur while loading city geometry.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// Reading the geometry file failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The geometry document is not valid JSON for the expected shape
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
