//! Tree construction: explicit documents from a tile arena, and the lazily
//! evaluated geometry of implicit trees.

use tracing::{debug, info_span, trace};

use crate::tileset::{content_uri, Content, TileNode, TilesetDocument, TilesetOptions};
use crate::{
    BoundingVolume, CoordinateFrame, Extent, GeometricErrorModel, Result, SubdivisionScheme,
    TileAddress, TilingError,
};

use super::arena::{TileArena, TileId};
use super::visitor::TileStats;

/// Deepest level an implicit tree may reach; addresses are 32-bit per axis.
pub const MAX_IMPLICIT_DEPTH: u32 = 30;

/// Inputs of [`build_explicit`] besides the tiles themselves.
#[derive(Debug, Clone)]
pub struct ExplicitParams<'a> {
    /// Resolved root frame.
    pub frame: &'a CoordinateFrame,
    /// Extent of the whole dataset, used for the root node's volume.
    pub extent: Extent,
    pub model: GeometricErrorModel,
    /// Scheme the tile addresses belong to.
    pub scheme: SubdivisionScheme,
    pub options: TilesetOptions,
}

/// Builds an explicit tileset document from a tile arena.
///
/// The document's root node covers `params.extent`, carries the frame's
/// transform and has the error `root_error / factor`. Root-level tiles of the
/// arena hang below it one spatial step down; every further edge divides the
/// error by the subdivision factor (spatial) or by 8 (LOD). Available tiles
/// reference content; unavailable tiles stay in the tree as structural nodes.
pub fn build_explicit(arena: &TileArena, params: &ExplicitParams<'_>) -> Result<TilesetDocument> {
    let _span = info_span!("build_explicit", tiles = arena.len()).entered();

    for (_, tile) in arena.iter() {
        if !tile.address().fits(params.scheme) {
            return Err(TilingError::SchemeMismatch(tile.address()));
        }
    }

    let frame = params.frame;
    let model = &params.model;
    let mut root = TileNode::new(
        BoundingVolume::of_extent(frame.volume_kind(), &params.extent, frame.origin()),
        model.root_tile_error(),
    );
    root.refine = Some(params.options.refine);
    root.transform = Some(frame.transform_array());

    for &id in arena.roots() {
        let tile = arena.get(id).ok_or_else(|| dangling(id))?;
        let error = model.error_for(1, tile.lod());
        root.children.push(build_node(arena, id, error, params)?);
    }

    let mut stats = TileStats::default();
    arena.walk(&mut stats);
    debug!(
        tiles = stats.tiles,
        available = stats.available,
        lod_tiles = stats.lod_tiles,
        depth = stats.max_depth,
        volume = ?frame.volume_kind(),
        "built explicit tileset"
    );

    Ok(TilesetDocument {
        asset: params.options.asset(frame.crs()),
        geometric_error: model.root_error(),
        root,
    })
}

fn build_node(
    arena: &TileArena,
    id: TileId,
    error: f64,
    params: &ExplicitParams<'_>,
) -> Result<TileNode> {
    let tile = arena.get(id).ok_or_else(|| dangling(id))?;
    let extent = tile.bounding_extent()?;
    let frame = params.frame;

    let mut node = TileNode::new(
        BoundingVolume::of_extent(frame.volume_kind(), &extent, frame.origin()),
        error,
    );
    if tile.is_available() {
        node.content = Some(Content {
            uri: content_uri(
                &tile.address(),
                tile.lod(),
                params.scheme,
                params.options.content_format,
            ),
        });
    } else {
        trace!(tile = %tile.label(), "structural tile without content");
    }

    for &child in arena.children(id) {
        let refinement = arena.refinement(child).ok_or_else(|| dangling(child))?;
        let child_error = params.model.refine(error, refinement);
        node.children.push(build_node(arena, child, child_error, params)?);
    }
    Ok(node)
}

fn dangling(id: TileId) -> TilingError {
    TilingError::InvalidHierarchy {
        parent: "arena".to_owned(),
        child: format!("#{}", id.index()),
        reason: "tile id does not belong to the arena",
    }
}

/// Geometry of an implicit tile tree.
///
/// Nothing is materialized up front: the extent of a tile is the root extent
/// halved along its address path, and its error depends on the level only.
#[derive(Debug, Clone)]
pub struct ImplicitTree {
    extent: Extent,
    model: GeometricErrorModel,
    scheme: SubdivisionScheme,
    max_depth: u32,
    frame: CoordinateFrame,
}

/// Sets up an implicit tree over `extent` subdivided down to `max_depth`.
///
/// `max_depth = 0` is a tree holding only the root tile.
pub fn build_implicit(
    extent: &Extent,
    model: &GeometricErrorModel,
    scheme: SubdivisionScheme,
    max_depth: u32,
    frame: &CoordinateFrame,
) -> Result<ImplicitTree> {
    if max_depth > MAX_IMPLICIT_DEPTH {
        return Err(TilingError::InvalidConfig(format!(
            "max depth {max_depth} exceeds {MAX_IMPLICIT_DEPTH}"
        )));
    }
    debug!(%scheme, max_depth, volume = ?frame.volume_kind(), "set up implicit tree");
    Ok(ImplicitTree {
        extent: *extent,
        model: *model,
        scheme,
        max_depth,
        frame: frame.clone(),
    })
}

impl ImplicitTree {
    #[inline]
    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    #[inline]
    pub fn model(&self) -> &GeometricErrorModel {
        &self.model
    }

    #[inline]
    pub fn scheme(&self) -> SubdivisionScheme {
        self.scheme
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Number of levels, root included.
    #[inline]
    pub fn available_levels(&self) -> u32 {
        self.max_depth + 1
    }

    #[inline]
    pub fn frame(&self) -> &CoordinateFrame {
        &self.frame
    }

    /// Checks that `address` belongs to this tree.
    pub fn check(&self, address: &TileAddress) -> Result<()> {
        if !address.fits(self.scheme) {
            return Err(TilingError::SchemeMismatch(*address));
        }
        if address.level > self.max_depth {
            return Err(TilingError::AddressOutOfRange {
                address: *address,
                available_levels: self.available_levels(),
            });
        }
        Ok(())
    }

    /// Extent of the tile at `address`.
    pub fn tile_extent(&self, address: &TileAddress) -> Result<Extent> {
        self.check(address)?;
        Ok(self.extent.cell(self.scheme, address))
    }

    /// Bounding volume of the tile at `address`.
    pub fn bounding_volume(&self, address: &TileAddress) -> Result<BoundingVolume> {
        let extent = self.tile_extent(address)?;
        Ok(BoundingVolume::of_extent(
            self.frame.volume_kind(),
            &extent,
            self.frame.origin(),
        ))
    }

    /// Geometric error of the tile at `address`: `root_error / factor^(level + 1)`.
    pub fn geometric_error(&self, address: &TileAddress) -> Result<f64> {
        self.check(address)?;
        Ok(self.model.error_for(address.level, 0))
    }

    /// Children of a tile, empty at the deepest level.
    pub fn children(&self, address: &TileAddress) -> Vec<TileAddress> {
        if address.level >= self.max_depth {
            return Vec::new();
        }
        address.children(self.scheme)
    }

    /// Every tile of the full tree, level by level in Morton order.
    ///
    /// The count grows as `4^max_depth` (or `8^max_depth`); meant for small trees.
    pub fn tiles(&self) -> impl Iterator<Item = TileAddress> + '_ {
        let mut level = vec![TileAddress::ROOT];
        std::iter::from_fn(move || {
            if level.is_empty() {
                return None;
            }
            let next = level.iter().flat_map(|a| self.children(a)).collect();
            Some(std::mem::replace(&mut level, next))
        })
        .flatten()
    }

    /// Materializes the full tree as an explicit document without content.
    pub fn document(&self, options: &TilesetOptions) -> Result<TilesetDocument> {
        let _span = info_span!("implicit_document", max_depth = self.max_depth).entered();
        let mut root = self.node(&TileAddress::ROOT)?;
        root.refine = Some(options.refine);
        root.transform = Some(self.frame.transform_array());
        Ok(TilesetDocument {
            asset: options.asset(self.frame.crs()),
            geometric_error: self.model.root_error(),
            root,
        })
    }

    fn node(&self, address: &TileAddress) -> Result<TileNode> {
        let mut node =
            TileNode::new(self.bounding_volume(address)?, self.geometric_error(address)?);
        for child in self.children(address) {
            node.children.push(self.node(&child)?);
        }
        Ok(node)
    }
}
