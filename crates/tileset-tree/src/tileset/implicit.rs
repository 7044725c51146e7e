//! Implicit tileset encoding.
//!
//! Content availability is supplied per tile address. Tile availability is
//! derived from it: a tile is available when it or any descendant has
//! content. Tiles are grouped into subtrees of `subtree_levels` levels; a
//! subtree file is written for the root band and for every band root that is
//! available, and each subtree marks which of the next band's roots exist.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use tracing::{debug, info_span, trace, warn};

use crate::tree::{FnVisitor, ImplicitTree, Tile, TileArena};
use crate::{Result, TileAddress, TilingError};

use super::subtree::Subtree;
use super::{
    content_template, subtree_template, subtree_uri, write_document, Content, ImplicitTiling,
    Subtrees, TileNode, TilesetDocument, TilesetOptions,
};

/// Levels per subtree file used when nothing else is configured.
pub const DEFAULT_SUBTREE_LEVELS: u32 = 7;

/// Bits per availability bitstream we are willing to allocate.
const MAX_SUBTREE_BITS: u64 = 1 << 32;

/// Set of tile addresses that carry content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    content: BTreeSet<TileAddress>,
}

impl Availability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects addresses, ignoring duplicates.
    pub fn from_addresses<I: IntoIterator<Item = TileAddress>>(addresses: I) -> Self {
        Self {
            content: addresses.into_iter().collect(),
        }
    }

    /// Addresses of the arena's available tiles, regardless of LOD band.
    pub fn from_arena(arena: &TileArena) -> Self {
        let mut availability = Self::new();
        arena.walk(&mut FnVisitor::new(|_, tile: &Tile, _| {
            if tile.is_available() {
                availability.insert(tile.address());
            }
        }));
        availability
    }

    /// Marks `address` as having content. Returns `false` if it already had.
    pub fn insert(&mut self, address: TileAddress) -> bool {
        self.content.insert(address)
    }

    pub fn contains(&self, address: &TileAddress) -> bool {
        self.content.contains(address)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Content addresses in `(level, x, y, z)` order.
    pub fn iter(&self) -> impl Iterator<Item = &TileAddress> {
        self.content.iter()
    }

    /// Content tiles plus all of their ancestors.
    fn tiles(&self) -> BTreeSet<TileAddress> {
        let mut tiles = BTreeSet::new();
        for &address in &self.content {
            let mut current = Some(address);
            while let Some(a) = current {
                if !tiles.insert(a) {
                    break;
                }
                current = a.parent();
            }
        }
        tiles
    }
}

/// Settings of the implicit output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitOptions {
    pub tileset: TilesetOptions,
    /// Levels per subtree file; clamped to the tree's available levels.
    pub subtree_levels: u32,
}

impl Default for ImplicitOptions {
    fn default() -> Self {
        Self {
            tileset: TilesetOptions::default(),
            subtree_levels: DEFAULT_SUBTREE_LEVELS,
        }
    }
}

/// One encoded `.subtree` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreeFile {
    /// Root tile of the subtree.
    pub address: TileAddress,
    /// Path relative to `tileset.json`.
    pub uri: String,
    pub bytes: Vec<u8>,
}

/// Root document plus the subtree files it references.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplicitTileset {
    pub document: TilesetDocument,
    /// Subtree files ordered by root address; the root subtree comes first.
    pub subtrees: Vec<SubtreeFile>,
}

impl ImplicitTileset {
    /// Writes `tileset.json` and the subtree files below `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        write_document(&dir.join("tileset.json"), &self.document)?;
        for subtree in &self.subtrees {
            let path = dir.join(&subtree.uri);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &subtree.bytes)?;
        }
        debug!(dir = %dir.display(), subtrees = self.subtrees.len(), "wrote implicit tileset");
        Ok(())
    }
}

/// Encodes an implicit tree and its content availability.
///
/// Every content address must belong to the tree's scheme and lie within its
/// levels. The root subtree is always written, even when nothing is available.
pub fn encode_implicit(
    tree: &ImplicitTree,
    availability: &Availability,
    options: &ImplicitOptions,
) -> Result<ImplicitTileset> {
    let scheme = tree.scheme();
    let available_levels = tree.available_levels();
    let _span = info_span!(
        "encode_implicit",
        %scheme,
        available_levels,
        content = availability.len()
    )
    .entered();

    if options.subtree_levels == 0 {
        return Err(TilingError::InvalidConfig("subtree levels must be at least 1".into()));
    }
    let subtree_levels = options.subtree_levels.min(available_levels);
    let child_bits = u64::from(scheme.branching()).checked_pow(subtree_levels);
    if child_bits.is_none_or(|bits| bits > MAX_SUBTREE_BITS) {
        return Err(TilingError::InvalidConfig(format!(
            "{subtree_levels} subtree levels are too many for a {scheme}"
        )));
    }
    for address in availability.iter() {
        tree.check(address)?;
    }
    if tree.model().subdivision_factor() != 2.0 {
        warn!(
            factor = tree.model().subdivision_factor(),
            "implicit tilesets halve the error per level; the factor only affects the root"
        );
    }

    let mut subtrees = BTreeMap::new();
    subtrees.insert(TileAddress::ROOT, Subtree::new(scheme, subtree_levels));

    for tile in availability.tiles() {
        let band = tile.level / subtree_levels * subtree_levels;
        let Some(root) = tile.ancestor_at(band) else {
            continue;
        };
        let subtree = subtrees
            .entry(root)
            .or_insert_with(|| Subtree::new(scheme, subtree_levels));
        let relative = tile.relative_to(&root);
        subtree.set_tile(&relative);
        if availability.contains(&tile) {
            subtree.set_content(&relative);
        }

        if band > 0 && band == tile.level {
            if let Some(parent_root) = tile.ancestor_at(band - subtree_levels) {
                subtrees
                    .entry(parent_root)
                    .or_insert_with(|| Subtree::new(scheme, subtree_levels))
                    .set_child_subtree(&tile.relative_to(&parent_root));
            }
        }
    }

    let files = subtrees
        .iter()
        .map(|(address, subtree)| {
            trace!(subtree = %address, tiles = subtree.tiles().count_ones(), "encoded subtree");
            Ok(SubtreeFile {
                address: *address,
                uri: subtree_uri(address, scheme),
                bytes: subtree.to_bytes()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let frame = tree.frame();
    let mut root = TileNode::new(
        tree.bounding_volume(&TileAddress::ROOT)?,
        tree.model().root_tile_error(),
    );
    root.refine = Some(options.tileset.refine);
    root.transform = Some(frame.transform_array());
    root.content = Some(Content {
        uri: content_template(scheme, options.tileset.content_format),
    });
    root.implicit_tiling = Some(ImplicitTiling {
        subdivision_scheme: scheme,
        subtree_levels,
        available_levels,
        subtrees: Subtrees {
            uri: subtree_template(scheme),
        },
    });

    debug!(subtrees = files.len(), subtree_levels, "encoded implicit tileset");
    Ok(ImplicitTileset {
        document: TilesetDocument {
            asset: options.tileset.asset(frame.crs()),
            geometric_error: tree.model().root_error(),
            root,
        },
        subtrees: files,
    })
}
