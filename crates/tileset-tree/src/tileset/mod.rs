//! Tileset documents and their serialized forms.
//!
//! Two output shapes are supported:
//!
//! - **Explicit**: every tile is a JSON node nested under the root
//!   (see [`build_explicit`](crate::tree::build_explicit) and [`serialize`]).
//! - **Implicit**: the root tile carries `implicitTiling` metadata and tile
//!   availability lives in binary `.subtree` files ([`encode_implicit`]).
//!
//! # Example
//!
//! ```ignore
//! use tileset_tree::tileset::{encode_implicit, Availability, ImplicitOptions};
//!
//! let availability = Availability::from_addresses([TileAddress::new(1, 0, 1)]);
//! let output = encode_implicit(&tree, &availability, &ImplicitOptions::default())?;
//! output.write_to(Path::new("out"))?;
//! ```

mod document;
mod implicit;
mod serializer;
mod subtree;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{SubdivisionScheme, TileAddress};

pub use document::{
    Asset, Content, ImplicitTiling, Refine, Subtrees, TileNode, TilesetDocument, TILES_VERSION,
};
pub use implicit::{
    encode_implicit, Availability, ImplicitOptions, ImplicitTileset, SubtreeFile,
    DEFAULT_SUBTREE_LEVELS,
};
pub use serializer::{serialize, serialize_pretty, to_writer, write_document};
pub use subtree::{Bitstream, Subtree};

/// Directory holding tile payloads, relative to `tileset.json`.
pub const CONTENT_DIR: &str = "content";

/// Directory holding `.subtree` files, relative to `tileset.json`.
pub const SUBTREE_DIR: &str = "subtrees";

/// Payload format referenced by content URIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    /// Binary glTF, loaded directly by 3D Tiles 1.1 viewers.
    #[default]
    Glb,
    /// Batched 3D model (3D Tiles 1.0).
    B3dm,
}

impl ContentFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Glb => "glb",
            Self::B3dm => "b3dm",
        }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ContentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "glb" => Ok(Self::Glb),
            "b3dm" => Ok(Self::B3dm),
            _ => Err(format!("unknown content format '{s}'")),
        }
    }
}

/// Document-level settings shared by the explicit and implicit outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TilesetOptions {
    /// Refinement written on the root tile.
    pub refine: Refine,
    pub content_format: ContentFormat,
    /// Written to `asset.tilesetVersion`.
    pub tileset_version: Option<String>,
    /// Written to `asset.copyright`.
    pub copyright: Option<String>,
}

impl TilesetOptions {
    /// Asset block for a tileset in the given CRS.
    pub fn asset(&self, crs: Option<&str>) -> Asset {
        Asset {
            tileset_version: self.tileset_version.clone(),
            copyright: self.copyright.clone(),
            crs: crs.map(str::to_owned),
            ..Asset::default()
        }
    }
}

/// URI of a tile payload, e.g. `content/2_1_3.glb` or `content/2_1_3_lod1.glb`.
pub fn content_uri(
    address: &TileAddress,
    lod: u32,
    scheme: SubdivisionScheme,
    format: ContentFormat,
) -> String {
    let stem = address.stem(scheme);
    if lod == 0 {
        format!("{CONTENT_DIR}/{stem}.{format}")
    } else {
        format!("{CONTENT_DIR}/{stem}_lod{lod}.{format}")
    }
}

/// Content URI template of an implicit root tile.
pub fn content_template(scheme: SubdivisionScheme, format: ContentFormat) -> String {
    format!("{CONTENT_DIR}/{}.{format}", template_stem(scheme))
}

/// Subtree URI template of an implicit root tile.
pub fn subtree_template(scheme: SubdivisionScheme) -> String {
    format!("{SUBTREE_DIR}/{}.subtree", template_stem(scheme))
}

/// URI of the subtree file rooted at `address`; matches [`subtree_template`].
pub fn subtree_uri(address: &TileAddress, scheme: SubdivisionScheme) -> String {
    format!("{SUBTREE_DIR}/{}.subtree", address.stem(scheme))
}

fn template_stem(scheme: SubdivisionScheme) -> &'static str {
    match scheme {
        SubdivisionScheme::Quadtree => "{level}_{x}_{y}",
        SubdivisionScheme::Octree => "{level}_{x}_{y}_{z}",
    }
}
