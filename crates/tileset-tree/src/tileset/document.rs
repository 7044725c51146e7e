//! Tileset document model.

use serde::{Deserialize, Serialize};

use crate::{BoundingVolume, Result, SubdivisionScheme};

/// 3D Tiles version written to `asset.version`.
pub const TILES_VERSION: &str = "1.1";

/// Asset metadata for the tileset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// 3D Tiles version.
    pub version: String,
    /// Application-specific version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tileset_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    /// Source CRS, absent for geographic tilesets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            version: TILES_VERSION.to_owned(),
            tileset_version: None,
            copyright: None,
            crs: None,
        }
    }
}

/// Refinement strategy for child tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Refine {
    /// Children are rendered in addition to their parent.
    #[default]
    Add,
    /// Children replace their parent.
    Replace,
}

impl std::str::FromStr for Refine {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADD" => Ok(Self::Add),
            "REPLACE" => Ok(Self::Replace),
            _ => Err(format!("unknown refinement '{s}'")),
        }
    }
}

/// Content reference of a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// URI of the tile payload, or a template for implicit tilesets.
    pub uri: String,
}

/// Reference to the subtree files of an implicit tileset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtrees {
    /// URI template, e.g. `subtrees/{level}_{x}_{y}.subtree`.
    pub uri: String,
}

/// Implicit tiling metadata on the root tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplicitTiling {
    pub subdivision_scheme: SubdivisionScheme,
    pub subtree_levels: u32,
    pub available_levels: u32,
    pub subtrees: Subtrees,
}

/// A tile as written to the tileset document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileNode {
    pub bounding_volume: BoundingVolume,
    pub geometric_error: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refine: Option<Refine>,
    /// 4×4 column-major transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<[f64; 16]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit_tiling: Option<ImplicitTiling>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TileNode>,
}

impl TileNode {
    /// Creates a leaf node without content.
    pub fn new(bounding_volume: BoundingVolume, geometric_error: f64) -> Self {
        Self {
            bounding_volume,
            geometric_error,
            refine: None,
            transform: None,
            content: None,
            implicit_tiling: None,
            children: Vec::new(),
        }
    }

    /// Count of tiles in this subtree, including `self`.
    pub fn count_tiles(&self) -> usize {
        1 + self.children.iter().map(TileNode::count_tiles).sum::<usize>()
    }

    /// Depth of this subtree (1 for a leaf).
    pub fn max_depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TileNode::max_depth)
            .max()
            .unwrap_or(0)
    }

    /// Count of tiles in this subtree that reference content.
    pub fn count_content(&self) -> usize {
        usize::from(self.content.is_some())
            + self.children.iter().map(TileNode::count_content).sum::<usize>()
    }
}

/// Root tileset descriptor (`tileset.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesetDocument {
    pub asset: Asset,
    /// Error above the root tile.
    pub geometric_error: f64,
    pub root: TileNode,
}

impl TilesetDocument {
    /// Parses a tileset document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether the document uses implicit tiling.
    pub fn is_implicit(&self) -> bool {
        self.root.implicit_tiling.is_some()
    }
}
