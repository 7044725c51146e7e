//! Index-based storage for explicit tile trees.

use std::collections::HashMap;

use tracing::debug;

use crate::{Refinement, Result, TileAddress, TilingError};

use super::tile::{classify_edge, Tile};
use super::visitor::TileVisitor;

/// Index of a tile inside a [`TileArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(usize);

impl TileId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Slot {
    tile: Tile,
    refinement: Option<Refinement>,
    children: Vec<TileId>,
}

/// A forest of tiles stored by index.
///
/// Root-level tiles hang directly below the tileset's root node. Every other
/// tile is attached to exactly one parent through a validated edge that is
/// either pure spatial or pure LOD refinement (see
/// [`classify_edge`](super::classify_edge)). Tiles are never removed, so ids
/// stay valid for the arena's lifetime.
#[derive(Debug, Clone, Default)]
pub struct TileArena {
    slots: Vec<Slot>,
    roots: Vec<TileId>,
}

impl TileArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an arena from root-level tiles and the children they carry.
    ///
    /// Every tile of `roots` hangs directly below the tileset's root node,
    /// whatever its address. Nested children are attached below their parent
    /// in the order given, each edge validated with
    /// [`classify_edge`](super::classify_edge).
    pub fn from_roots(roots: Vec<Tile>) -> Result<Self> {
        let mut arena = Self::new();
        let mut pending = Vec::with_capacity(roots.len());
        for mut tile in roots {
            let children = tile.take_children();
            pending.push((arena.push_root(tile), children));
        }
        while let Some((parent, children)) = pending.pop() {
            for mut child in children {
                let grandchildren = child.take_children();
                pending.push((arena.push_child(parent, child)?, grandchildren));
            }
        }

        debug!(tiles = arena.len(), roots = arena.roots.len(), "arranged tiles as given");
        Ok(arena)
    }

    /// Adds a root-level tile.
    ///
    /// Children carried by `tile` are not attached; see [`TileArena::from_roots`].
    pub fn push_root(&mut self, tile: Tile) -> TileId {
        let id = self.push_slot(tile, None);
        self.roots.push(id);
        id
    }

    /// Adds `tile` as a child of `parent`, validating the edge.
    ///
    /// Children carried by `tile` are not attached.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this arena.
    pub fn push_child(&mut self, parent: TileId, tile: Tile) -> Result<TileId> {
        let refinement = classify_edge(&self.slots[parent.0].tile, &tile)?;
        let id = self.push_slot(tile, Some(refinement));
        self.slots[parent.0].children.push(id);
        Ok(id)
    }

    fn push_slot(&mut self, mut tile: Tile, refinement: Option<Refinement>) -> TileId {
        tile.take_children();
        let id = TileId(self.slots.len());
        self.slots.push(Slot {
            tile,
            refinement,
            children: Vec::new(),
        });
        id
    }

    /// Infers edges from addresses instead of taking them from the input.
    ///
    /// Nested children are flattened into one list first. A tile with
    /// `lod > 0` hangs below the tile with the same address and `lod - 1`
    /// when present; otherwise below the tile in its parent cell with the
    /// same LOD. Tiles with neither become root-level tiles. Duplicate
    /// `(address, lod)` pairs are rejected.
    pub fn arrange(tiles: Vec<Tile>) -> Result<Self> {
        let mut flat = Vec::with_capacity(tiles.len());
        let mut stack = tiles;
        while let Some(mut tile) = stack.pop() {
            stack.extend(tile.take_children());
            flat.push(tile);
        }
        flat.sort_by_key(|t| (t.address().level, t.lod(), t.address()));

        let mut arena = Self::new();
        let mut index: HashMap<(TileAddress, u32), TileId> = HashMap::with_capacity(flat.len());

        for tile in flat {
            let key = (tile.address(), tile.lod());
            if index.contains_key(&key) {
                return Err(TilingError::InvalidHierarchy {
                    parent: tile.label(),
                    child: tile.label(),
                    reason: "duplicate tile",
                });
            }

            let lod_parent = tile
                .lod()
                .checked_sub(1)
                .and_then(|lod| index.get(&(tile.address(), lod)));
            let spatial_parent = tile
                .address()
                .parent()
                .and_then(|addr| index.get(&(addr, tile.lod())));

            let id = match lod_parent.or(spatial_parent).copied() {
                Some(parent) => arena.push_child(parent, tile)?,
                None => arena.push_root(tile),
            };
            index.insert(key, id);
        }

        debug!(tiles = arena.len(), roots = arena.roots.len(), "arranged tiles by address");
        Ok(arena)
    }

    /// Number of tiles.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Root-level tiles, in insertion order.
    #[inline]
    pub fn roots(&self) -> &[TileId] {
        &self.roots
    }

    /// Returns the tile with the given id.
    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.slots.get(id.0).map(|s| &s.tile)
    }

    /// Children of a tile, in insertion order.
    pub fn children(&self, id: TileId) -> &[TileId] {
        match self.slots.get(id.0) {
            Some(slot) => &slot.children,
            None => &[],
        }
    }

    /// Kind of the edge from the tile's parent, `None` for root-level tiles.
    pub fn refinement(&self, id: TileId) -> Option<Refinement> {
        self.slots.get(id.0).and_then(|s| s.refinement)
    }

    /// Iterates over all tiles with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (TileId, &Tile)> {
        self.slots.iter().enumerate().map(|(i, s)| (TileId(i), &s.tile))
    }

    /// Depth of the forest below the tileset root (0 for an empty arena).
    pub fn depth(&self) -> usize {
        fn depth_of(arena: &TileArena, id: TileId) -> usize {
            1 + arena
                .children(id)
                .iter()
                .map(|&c| depth_of(arena, c))
                .max()
                .unwrap_or(0)
        }
        self.roots.iter().map(|&r| depth_of(self, r)).max().unwrap_or(0)
    }

    /// Visits every tile depth-first, parents before children.
    ///
    /// `depth` passed to the visitor is 1 for root-level tiles, matching their
    /// distance from the tileset's root node.
    pub fn walk<V: TileVisitor>(&self, visitor: &mut V) {
        for &root in &self.roots {
            self.walk_from(root, 1, visitor);
        }
    }

    fn walk_from<V: TileVisitor>(&self, id: TileId, depth: u32, visitor: &mut V) {
        visitor.visit(id, &self.slots[id.0].tile, depth);
        for &child in &self.slots[id.0].children {
            self.walk_from(child, depth + 1, visitor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::visitor::FnVisitor;
    use crate::Extent;

    fn make_tile(level: u32, x: u32, y: u32) -> Tile {
        Tile::new(
            TileAddress::new(level, x, y),
            Extent::from_array([0.0, 0.0, 10.0, 10.0, 0.0, 10.0]).unwrap(),
        )
    }

    #[test]
    fn empty_arena() {
        let arena = TileArena::new();
        assert!(arena.is_empty());
        assert_eq!(arena.depth(), 0);
        assert!(arena.roots().is_empty());
    }

    #[test]
    fn push_child_validates_edge() {
        let mut arena = TileArena::new();
        let root = arena.push_root(make_tile(0, 0, 0));

        let spatial = arena.push_child(root, make_tile(1, 1, 0)).unwrap();
        assert_eq!(arena.refinement(spatial), Some(Refinement::Spatial));

        let lod = arena.push_child(spatial, make_tile(1, 1, 0).with_lod(1)).unwrap();
        assert_eq!(arena.refinement(lod), Some(Refinement::Lod));

        assert!(arena.push_child(root, make_tile(2, 0, 0)).is_err());
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.depth(), 3);
        assert_eq!(arena.children(root), &[spatial]);
    }

    #[test]
    fn arrange_nests_by_address_and_lod() {
        let tiles = vec![
            make_tile(1, 1, 1),
            make_tile(1, 1, 1).with_lod(1),
            make_tile(0, 0, 0),
            make_tile(2, 0, 0),
            make_tile(3, 7, 7),
        ];
        let arena = TileArena::arrange(tiles).unwrap();

        // (0,0,0) is a root; (2,0,0) has no level-1 parent in the list and
        // (3,7,7) has no level-2 parent, so both are roots too.
        assert_eq!(arena.roots().len(), 3);
        let root = arena.roots()[0];
        assert_eq!(arena.get(root).unwrap().address(), TileAddress::ROOT);

        let level1 = arena.children(root);
        assert_eq!(level1.len(), 1);
        let lod_children = arena.children(level1[0]);
        assert_eq!(lod_children.len(), 1);
        assert_eq!(arena.get(lod_children[0]).unwrap().lod(), 1);
        assert_eq!(arena.refinement(lod_children[0]), Some(Refinement::Lod));
    }

    #[test]
    fn arrange_rejects_duplicates() {
        let tiles = vec![make_tile(1, 0, 0), make_tile(1, 0, 0)];
        assert!(matches!(
            TileArena::arrange(tiles),
            Err(TilingError::InvalidHierarchy { reason: "duplicate tile", .. })
        ));
    }

    #[test]
    fn from_roots_keeps_list_entries_as_siblings() {
        let arena = TileArena::from_roots(vec![
            make_tile(0, 0, 0).with_child(make_tile(1, 0, 1).with_child(make_tile(2, 1, 3))),
            make_tile(1, 1, 1).with_child(make_tile(1, 1, 1).with_lod(1)),
        ])
        .unwrap();

        assert_eq!(arena.len(), 5);
        assert_eq!(arena.roots().len(), 2);
        let [first, second] = arena.roots() else {
            panic!("expected two roots");
        };
        assert_eq!(arena.get(*second).unwrap().address(), TileAddress::new(1, 1, 1));
        assert_eq!(arena.refinement(*second), None);

        let lod = arena.children(*second);
        assert_eq!(lod.len(), 1);
        assert_eq!(arena.refinement(lod[0]), Some(Refinement::Lod));
        assert_eq!(arena.depth(), 3);

        let level1 = arena.children(*first);
        assert_eq!(arena.get(level1[0]).unwrap().address(), TileAddress::new(1, 0, 1));
        let level2 = arena.children(level1[0]);
        assert_eq!(arena.get(level2[0]).unwrap().address(), TileAddress::new(2, 1, 3));
        assert!(arena.iter().all(|(_, tile)| tile.children().is_empty()));
    }

    #[test]
    fn from_roots_validates_nested_edges() {
        let result = TileArena::from_roots(vec![make_tile(0, 0, 0).with_child(make_tile(2, 0, 0))]);
        assert!(matches!(result, Err(TilingError::InvalidHierarchy { .. })));
    }

    #[test]
    fn arrange_flattens_nested_children() {
        let arena = TileArena::arrange(vec![
            make_tile(1, 1, 1),
            make_tile(0, 0, 0).with_child(make_tile(1, 0, 0)),
        ])
        .unwrap();
        assert_eq!(arena.roots().len(), 1);
        assert_eq!(arena.children(arena.roots()[0]).len(), 2);
    }

    #[test]
    fn walk_is_depth_first() {
        let arena = TileArena::arrange(vec![
            make_tile(0, 0, 0),
            make_tile(1, 0, 0),
            make_tile(2, 1, 1),
            make_tile(1, 1, 1),
        ])
        .unwrap();

        let mut seen = Vec::new();
        arena.walk(&mut FnVisitor::new(|_, tile: &Tile, depth| {
            seen.push((tile.address(), depth));
        }));

        assert_eq!(
            seen,
            vec![
                (TileAddress::new(0, 0, 0), 1),
                (TileAddress::new(1, 0, 0), 2),
                (TileAddress::new(2, 1, 1), 3),
                (TileAddress::new(1, 1, 1), 2),
            ]
        );
    }
}
