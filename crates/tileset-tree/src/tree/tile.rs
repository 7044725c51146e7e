//! Tile records supplied by the caller.

use crate::{Extent, Refinement, Result, TileAddress, TilingError};

/// A tile in the spatial/LOD hierarchy.
///
/// Tiles carry their own extent; the height range is often computed
/// separately from the horizontal bounds and, when present, overrides the
/// extent's z bounds.
///
/// A tile may also carry its children, which is how callers spell out the
/// hierarchy for [`TileArena::from_roots`](super::TileArena::from_roots).
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    address: TileAddress,
    lod: u32,
    available: bool,
    extent: Extent,
    z_range: Option<(f64, f64)>,
    children: Vec<Tile>,
}

impl Tile {
    /// Creates an available LOD-0 tile.
    pub fn new(address: TileAddress, extent: Extent) -> Self {
        Self {
            address,
            lod: 0,
            available: true,
            extent,
            z_range: None,
            children: Vec::new(),
        }
    }

    /// Sets the level-of-detail band.
    pub fn with_lod(mut self, lod: u32) -> Self {
        self.lod = lod;
        self
    }

    /// Marks whether the tile has geometry of its own.
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Sets the height range, overriding the extent's z bounds.
    pub fn with_z_range(mut self, zmin: f64, zmax: f64) -> Self {
        self.z_range = Some((zmin, zmax));
        self
    }

    /// Appends a child; the edge is validated when the tile enters an arena.
    pub fn with_child(mut self, child: Tile) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several children.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Tile>) -> Self {
        self.children.extend(children);
        self
    }

    #[inline]
    pub fn address(&self) -> TileAddress {
        self.address
    }

    #[inline]
    pub fn lod(&self) -> u32 {
        self.lod
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.available
    }

    #[inline]
    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    #[inline]
    pub fn z_range(&self) -> Option<(f64, f64)> {
        self.z_range
    }

    /// Children given by the caller, before the tile enters an arena.
    #[inline]
    pub fn children(&self) -> &[Tile] {
        &self.children
    }

    pub(super) fn take_children(&mut self) -> Vec<Tile> {
        std::mem::take(&mut self.children)
    }

    /// Extent used for the tile's bounding volume: the horizontal extent
    /// combined with the z-range when one is set.
    pub fn bounding_extent(&self) -> Result<Extent> {
        match self.z_range {
            Some((zmin, zmax)) => self.extent.with_z_range(zmin, zmax),
            None => Ok(self.extent),
        }
    }

    /// Short label for logs and errors, e.g. `2/1/3/0@lod1`.
    pub fn label(&self) -> String {
        format!("{}@lod{}", self.address, self.lod)
    }
}

/// Classifies the edge `parent -> child`.
///
/// A spatial child keeps the LOD and sits in a direct child cell of the
/// parent; an LOD child keeps the address and increments the LOD. Anything
/// else mixes the two axes and is rejected.
pub fn classify_edge(parent: &Tile, child: &Tile) -> Result<Refinement> {
    let invalid = |reason| TilingError::InvalidHierarchy {
        parent: parent.label(),
        child: child.label(),
        reason,
    };

    if child.lod == parent.lod {
        if parent.address.is_parent_of(&child.address) {
            Ok(Refinement::Spatial)
        } else {
            Err(invalid("spatial child is not in a child cell of its parent"))
        }
    } else if child.lod == parent.lod + 1 {
        if child.address == parent.address {
            Ok(Refinement::Lod)
        } else {
            Err(invalid("LOD child must keep its parent's address"))
        }
    } else {
        Err(invalid("child LOD must equal the parent's LOD or the next one"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tile(level: u32, x: u32, y: u32) -> Tile {
        Tile::new(
            TileAddress::new(level, x, y),
            Extent::from_array([0.0, 0.0, 10.0, 10.0, 0.0, 0.0]).unwrap(),
        )
    }

    #[test]
    fn z_range_overrides_extent() {
        let tile = make_tile(0, 0, 0).with_z_range(1.0, 9.0);
        let e = tile.bounding_extent().unwrap();
        assert_eq!(e.to_array(), [0.0, 0.0, 10.0, 10.0, 1.0, 9.0]);

        let inverted = make_tile(0, 0, 0).with_z_range(9.0, 1.0);
        assert!(inverted.bounding_extent().is_err());
    }

    #[test]
    fn spatial_edge() {
        let parent = make_tile(1, 1, 0);
        let child = make_tile(2, 3, 1);
        assert_eq!(classify_edge(&parent, &child).unwrap(), Refinement::Spatial);
    }

    #[test]
    fn lod_edge() {
        let parent = make_tile(1, 1, 0);
        let child = make_tile(1, 1, 0).with_lod(1);
        assert_eq!(classify_edge(&parent, &child).unwrap(), Refinement::Lod);
    }

    #[test]
    fn mixed_edges_are_rejected() {
        let parent = make_tile(1, 1, 0);

        // refines both address and LOD
        assert!(classify_edge(&parent, &make_tile(2, 2, 0).with_lod(1)).is_err());
        // skips a level
        assert!(classify_edge(&parent, &make_tile(3, 4, 0)).is_err());
        // skips an LOD band
        assert!(classify_edge(&parent, &make_tile(1, 1, 0).with_lod(2)).is_err());
        // same tile twice
        assert!(classify_edge(&parent, &make_tile(1, 1, 0)).is_err());
    }

    #[test]
    fn builder_methods() {
        let tile = make_tile(2, 1, 1).with_lod(3).with_available(false);
        assert_eq!(tile.lod(), 3);
        assert!(!tile.is_available());
        assert_eq!(tile.label(), "2/1/1/0@lod3");

        let parent = make_tile(0, 0, 0)
            .with_child(make_tile(1, 0, 0))
            .with_children([make_tile(1, 1, 0), make_tile(1, 0, 1)]);
        assert_eq!(parent.children().len(), 3);
        assert_eq!(parent.children()[1].address(), TileAddress::new(1, 1, 0));
    }
}
