//! Error types for chorus-sync

use thiserror::Error;

/// Failures reported by the host media layer or audio graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    /// The host refused to start playback (e.g. autoplay policy)
    #[error("Playback rejected by host: {0}")]
    PlaybackRejected(String),

    /// The audio graph could not create or connect a node
    #[error("Audio graph connection failed: {0}")]
    GraphConnection(String),

    /// A node handle the graph does not know about
    #[error("Unknown audio node: {0}")]
    UnknownNode(u64),
}

/// Result type for host operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Failures while building a sync group
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GroupError {
    /// A group needs exactly one main track
    #[error("Expected exactly one main track, found {found}")]
    MainTrackCount { found: usize },
}

/// Result type for group construction
pub type GroupResult<T> = Result<T, GroupError>;
