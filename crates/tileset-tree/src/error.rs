//! Error type shared by every tiling operation.

use thiserror::Error;

use crate::TileAddress;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TilingError>;

/// Errors produced while building or serializing a tileset.
#[derive(Error, Debug)]
pub enum TilingError {
    /// An extent whose maximum is below its minimum (or is not finite) on some axis.
    #[error("invalid extent on {axis} axis: min {min} > max {max}")]
    InvalidExtent {
        /// Axis name (`x`, `y` or `z`).
        axis: char,
        /// Minimum bound on that axis.
        min: f64,
        /// Maximum bound on that axis.
        max: f64,
    },

    /// A flat extent array that is neither `[xmin, ymin, xmax, ymax]` nor the 6-number form.
    #[error("extent must have 4 or 6 numbers, got {len}")]
    MalformedExtent {
        /// Number of values supplied.
        len: usize,
    },

    /// Root error or subdivision factor outside the usable range.
    #[error("invalid geometric error model: {0}")]
    InvalidErrorModel(String),

    /// ECEF mode was requested but only a translation was supplied.
    #[error("ECEF frame requested without a 16-number transform")]
    MissingEcefTransform,

    /// A parent/child edge that is neither pure spatial nor pure LOD refinement.
    #[error("invalid edge {parent} -> {child}: {reason}")]
    InvalidHierarchy {
        /// Parent tile label.
        parent: String,
        /// Child tile label.
        child: String,
        /// What is wrong with the edge.
        reason: &'static str,
    },

    /// An address deeper than the levels the tree makes available.
    #[error("tile {address} is outside the {available_levels} available levels")]
    AddressOutOfRange {
        /// Offending address.
        address: TileAddress,
        /// Number of levels in the tree.
        available_levels: u32,
    },

    /// An octree address handed to a quadtree (or vice versa).
    #[error("tile {0} does not belong to the tree's subdivision scheme")]
    SchemeMismatch(TileAddress),

    /// Configuration value rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A `.subtree` file that cannot be decoded.
    #[error("invalid subtree file: {0}")]
    InvalidSubtree(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
