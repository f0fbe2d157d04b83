//! Error types for terrain generation and editing

use thiserror::Error;

use crate::voxel::chunk::ChunkCoord;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected configuration or call argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A world position resolved to a chunk outside the grid
    #[error("Chunk {coord:?} is outside the chunk grid")]
    OutOfBounds { coord: ChunkCoord },

    /// Edits need a full halo neighbourhood, so outermost chunks refuse them
    #[error("Edit rejected: chunk {coord:?} lies on the grid boundary")]
    BoundaryEditRejected { coord: ChunkCoord },

    /// A node's backing index does not address the noise field
    #[error("Field index {index:?} out of range for field of shape {dims:?}")]
    IndexOutOfRange { index: [u32; 3], dims: [u32; 3] },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Whether the host can ignore this error and keep running
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::BoundaryEditRejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_rejection_is_recoverable() {
        let err = Error::BoundaryEditRejected { coord: ChunkCoord::new(0, 1, 1) };
        assert!(err.is_recoverable());
        assert!(!Error::invalid("bad").is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = Error::invalid("surface level 2 outside [0, 1]");
        assert_eq!(err.to_string(), "Invalid argument: surface level 2 outside [0, 1]");

        let err = Error::IndexOutOfRange { index: [9, 0, 0], dims: [4, 4, 4] };
        assert!(err.to_string().contains("[9, 0, 0]"));
    }
}
