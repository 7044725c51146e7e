//! Visitor pattern for tile tree traversal.

use super::arena::TileId;
use super::tile::Tile;

/// Visitor for processing tiles during a [`TileArena::walk`](super::TileArena::walk).
pub trait TileVisitor {
    /// Called once per tile, parents before children.
    ///
    /// `depth` counts edges from the tileset's root node, so root-level
    /// tiles are at depth 1.
    fn visit(&mut self, id: TileId, tile: &Tile, depth: u32);
}

/// A visitor that calls a closure for each tile.
pub struct FnVisitor<F>
where
    F: FnMut(TileId, &Tile, u32),
{
    func: F,
}

impl<F> FnVisitor<F>
where
    F: FnMut(TileId, &Tile, u32),
{
    /// Creates a new visitor from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> TileVisitor for FnVisitor<F>
where
    F: FnMut(TileId, &Tile, u32),
{
    fn visit(&mut self, id: TileId, tile: &Tile, depth: u32) {
        (self.func)(id, tile, depth);
    }
}

/// Tallies tiles while walking a tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TileStats {
    /// Every tile visited.
    pub tiles: usize,
    /// Tiles that carry geometry.
    pub available: usize,
    /// Tiles above LOD 0.
    pub lod_tiles: usize,
    /// Deepest depth seen.
    pub max_depth: u32,
}

impl TileVisitor for TileStats {
    fn visit(&mut self, _id: TileId, tile: &Tile, depth: u32) {
        self.tiles += 1;
        self.available += usize::from(tile.is_available());
        self.lod_tiles += usize::from(tile.lod() > 0);
        self.max_depth = self.max_depth.max(depth);
    }
}
