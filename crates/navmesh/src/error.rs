//! Error types for navmesh generation and export

use std::io;
use thiserror::Error;

/// Failure of a single build attempt. No partial navmesh survives it.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid build configuration: {0}")]
    InvalidConfig(String),

    #[error("mesh '{mesh}' has invalid geometry: {reason}")]
    InvalidGeometry { mesh: String, reason: String },

    #[error("input geometry has a degenerate bounding volume")]
    DegenerateBounds,

    #[error("navmesh would need {required} tiles, limit is {limit}")]
    TooManyTiles { required: u64, limit: u32 },

    #[error("[Tile {x:02},{y:02}] voxelization failed: {reason}")]
    Voxelization { x: u32, y: u32, reason: String },
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("navmesh generation failed")]
    Build(#[from] BuildError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no navmesh has been generated, nothing to export")]
    NothingToExport,

    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}
