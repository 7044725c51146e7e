//! Geometric error decay along the spatial and LOD refinement axes.
//!
//! A tileset declares a document-level error budget. The addressable root
//! tile sits one spatial step below it, so its error is
//! `root_error / subdivision_factor`. From there:
//!
//! - every spatial step (quadtree/octree child) divides by the subdivision factor,
//! - every LOD step (same address, `lod + 1`) divides by [`LOD_ERROR_DIVISOR`].
//!
//! An edge in the tile tree is always one or the other, never both.

use crate::{Result, TilingError};

/// Default divisor applied per spatial subdivision step.
pub const DEFAULT_SUBDIVISION_FACTOR: f64 = 2.0;

/// Divisor applied per LOD step, independent of the subdivision factor.
pub const LOD_ERROR_DIVISOR: f64 = 8.0;

/// Kind of refinement along a parent/child edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    /// Child is a spatial subdivision of the parent, same LOD.
    Spatial,
    /// Child covers the same cell at the next LOD.
    Lod,
}

/// Computes the error of a tile `spatial_depth` steps below the document
/// root (the root itself is depth 0) and `lod` steps down the LOD axis.
pub fn error_for(root_error: f64, spatial_depth: u32, lod: u32, subdivision_factor: f64) -> f64 {
    let spatial = subdivision_factor.powi(spatial_depth as i32 + 1);
    let lod = LOD_ERROR_DIVISOR.powi(lod as i32);
    root_error / spatial / lod
}

/// Validated root error and subdivision factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricErrorModel {
    root_error: f64,
    subdivision_factor: f64,
}

impl GeometricErrorModel {
    /// Creates a model, rejecting a negative or non-finite root error and a
    /// subdivision factor that is not strictly positive.
    pub fn new(root_error: f64, subdivision_factor: f64) -> Result<Self> {
        if !root_error.is_finite() || root_error < 0.0 {
            return Err(TilingError::InvalidErrorModel(format!(
                "root error must be a non-negative number, got {root_error}"
            )));
        }
        if !subdivision_factor.is_finite() || subdivision_factor <= 0.0 {
            return Err(TilingError::InvalidErrorModel(format!(
                "subdivision factor must be positive, got {subdivision_factor}"
            )));
        }
        Ok(Self {
            root_error,
            subdivision_factor,
        })
    }

    /// Model with the default subdivision factor of 2.
    pub fn with_root_error(root_error: f64) -> Result<Self> {
        Self::new(root_error, DEFAULT_SUBDIVISION_FACTOR)
    }

    /// Document-level error, written as the tileset's `geometricError`.
    #[inline]
    pub fn root_error(&self) -> f64 {
        self.root_error
    }

    #[inline]
    pub fn subdivision_factor(&self) -> f64 {
        self.subdivision_factor
    }

    /// Error of the document's root tile.
    pub fn root_tile_error(&self) -> f64 {
        self.root_error / self.subdivision_factor
    }

    /// See [`error_for`].
    pub fn error_for(&self, spatial_depth: u32, lod: u32) -> f64 {
        error_for(self.root_error, spatial_depth, lod, self.subdivision_factor)
    }

    /// Error of a child given its parent's error and the edge kind.
    pub fn refine(&self, parent_error: f64, refinement: Refinement) -> f64 {
        match refinement {
            Refinement::Spatial => parent_error / self.subdivision_factor,
            Refinement::Lod => parent_error / LOD_ERROR_DIVISOR,
        }
    }
}
