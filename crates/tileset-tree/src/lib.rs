//! Spatial tiling and 3D Tiles serialization.
//!
//! Turns bounding extents of a geometry source into a quadtree or octree of
//! tiles, assigns each tile a bounding volume and geometric error, resolves
//! the root coordinate frame and writes the result as an explicit
//! `tileset.json` or as an implicit tileset with binary subtree files.
//!
//! # Example
//!
//! ```ignore
//! use tileset_tree::frame::{resolve, FrameOptions, FrameReference};
//! use tileset_tree::tree::build_implicit;
//! use tileset_tree::tileset::{encode_implicit, Availability, ImplicitOptions};
//!
//! let frame = resolve(&FrameReference::geocentric(5.0, 52.0), &FrameOptions::default())?;
//! let tree = build_implicit(&extent, &model, SubdivisionScheme::Quadtree, 4, &frame)?;
//! let output = encode_implicit(&tree, &availability, &ImplicitOptions::default())?;
//! ```

mod address;
mod error;
mod extent;

pub mod config;
pub mod frame;
pub mod geometric_error;
pub mod source;
pub mod tileset;
pub mod tree;
pub mod volume;

pub use address::{SubdivisionScheme, TileAddress};
pub use config::TilingConfig;
pub use error::{Result, TilingError};
pub use extent::{Extent, EXTENT_PADDING};
pub use frame::{CoordinateFrame, FrameOptions, FrameReference};
pub use geometric_error::{GeometricErrorModel, Refinement, LOD_ERROR_DIVISOR};
pub use volume::{BoundingVolume, GeographicRegion, OrientedBox, VolumeKind};
