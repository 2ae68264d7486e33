//! Graph construction errors.

use crate::config::ConfigError;

/// Why a geometry document could not be turned into a graph.
///
/// Any of these aborts the whole build.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphBuildError {
    /// Two parcels, or two bridge/dock nodes, share an id
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// A coordinate is non-finite or out of range
    #[error("invalid coordinate in {id}: {message}")]
    InvalidCoordinate { id: String, message: String },

    /// A parcel has fewer than three distinct boundary vertices
    #[error("parcel {0} has fewer than three distinct vertices")]
    DegenerateParcel(String),

    /// A bridge or dock references a parcel that doesn't exist
    #[error("{referenced_by} references unknown parcel {parcel}")]
    UnknownParcel {
        referenced_by: String,
        parcel: String,
    },

    /// A canal link references a dock that doesn't exist
    #[error("canal references unknown dock {0}")]
    UnknownDock(String),

    /// A canal link starts and ends at the same dock
    #[error("canal at dock {0} leads back to itself")]
    CanalLoop(String),

    /// The router configuration is unusable
    #[error("invalid router configuration: {0}")]
    Config(#[from] ConfigError),
}
