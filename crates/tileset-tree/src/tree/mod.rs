//! Tile trees.
//!
//! Explicit trees are stored in a [`TileArena`]: tiles live in one flat
//! vector and child lists hold [`TileId`] indices. Every parent/child edge is
//! either a spatial refinement (child cell, same LOD) or an LOD refinement
//! (same cell, next LOD), which fixes how the geometric error decays along it.
//!
//! Implicit trees are never materialized; an [`ImplicitTree`] computes the
//! extent and error of any address on demand.
//!
//! # Example
//!
//! ```ignore
//! use tileset_tree::tree::{build_explicit, ExplicitParams, Tile, TileArena};
//!
//! let arena = TileArena::from_roots(root_level_tiles)?;
//! let document = build_explicit(&arena, &params)?;
//! ```

mod arena;
mod builder;
mod tile;
mod visitor;

pub use arena::{TileArena, TileId};
pub use builder::{build_explicit, build_implicit, ExplicitParams, ImplicitTree, MAX_IMPLICIT_DEPTH};
pub use tile::{classify_edge, Tile};
pub use visitor::{FnVisitor, TileStats, TileVisitor};
