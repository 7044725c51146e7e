//! Scene descriptions read by the command-line tool.
//!
//! A scene is what the spatial store would have produced: the dataset
//! extent, how the tileset is anchored, the tiles with their addresses and,
//! optionally, projection metadata to check the source units.
//!
//! Top-level entries of `tiles` are the root-level tiles; deeper tiles are
//! listed under their parent's `children`. With `arrange_by_address` the
//! hierarchy is inferred from the addresses instead.
//!
//! ```json
//! {
//!   "extent": [841974.3, 6517985.9, 843026.2, 6519046.1, 155.3, 208.6],
//!   "reference": { "translation": [842500.2, 6518516.0, 0.0] },
//!   "srid": 28992,
//!   "tiles": [{
//!     "level": 1, "x": 0, "y": 1, "z_range": [155.3, 190.0],
//!     "children": [{ "level": 1, "x": 0, "y": 1, "lod": 1 }]
//!   }]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use nalgebra::Vector3;
use serde::Deserialize;
use tileset_tree::source::SpatialRefDefinition;
use tileset_tree::tree::{Tile, TileArena, MAX_IMPLICIT_DEPTH};
use tileset_tree::{Extent, FrameReference, SubdivisionScheme, TileAddress};

/// How the tileset root is anchored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneReference {
    /// Reference point in the target space.
    Translation([f64; 3]),
    /// Full 4×4 column-major transform and the offset already removed from the geometry.
    Transform {
        matrix: [f64; 16],
        #[serde(default)]
        local_origin: [f64; 3],
    },
    /// Geographic center in degrees; geocentric translation, or a full ENU
    /// frame when `enu` is set.
    Geographic {
        lon: f64,
        lat: f64,
        #[serde(default)]
        enu: bool,
    },
}

/// A tile as listed in a scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneTile {
    #[serde(flatten)]
    pub address: TileAddress,
    #[serde(default)]
    pub lod: u32,
    #[serde(default = "available_by_default")]
    pub available: bool,
    /// Own extent; the matching cell of the scene extent when absent.
    #[serde(default)]
    pub extent: Option<Extent>,
    #[serde(default)]
    pub z_range: Option<[f64; 2]>,
    #[serde(default)]
    pub children: Vec<SceneTile>,
}

fn available_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scene {
    pub extent: Extent,
    /// Defaults to the center of `extent`.
    #[serde(default)]
    pub reference: Option<SceneReference>,
    #[serde(default)]
    pub tiles: Vec<SceneTile>,
    /// Infer parent/child edges from tile addresses, ignoring `children`.
    #[serde(default)]
    pub arrange_by_address: bool,
    #[serde(default)]
    pub srid: Option<i32>,
    /// Projection metadata by SRID.
    #[serde(default)]
    pub spatial_refs: HashMap<i32, SpatialRefDefinition>,
}

impl Scene {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading scene {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing scene {}", path.display()))
    }

    /// Frame reference of the scene.
    pub fn frame_reference(&self) -> FrameReference {
        match &self.reference {
            Some(SceneReference::Translation(t)) => FrameReference::translation(*t),
            Some(SceneReference::Transform {
                matrix,
                local_origin,
            }) => FrameReference::transform(*matrix, *local_origin),
            Some(SceneReference::Geographic { lon, lat, enu: false }) => {
                FrameReference::geocentric(*lon, *lat)
            }
            Some(SceneReference::Geographic { lon, lat, enu: true }) => {
                FrameReference::enu_at(*lon, *lat, Vector3::zeros())
            }
            None => FrameReference::Translation(self.extent.center().coords),
        }
    }

    /// Library tiles for the scene's root-level tiles, children included.
    ///
    /// Fails on addresses that do not fit `scheme` or lie deeper than
    /// [`MAX_IMPLICIT_DEPTH`].
    pub fn tiles(&self, scheme: SubdivisionScheme) -> anyhow::Result<Vec<Tile>> {
        self.tiles.iter().map(|t| self.tile(t, scheme)).collect()
    }

    /// The scene's tiles arranged for an explicit build.
    pub fn arena(&self, scheme: SubdivisionScheme) -> anyhow::Result<TileArena> {
        let tiles = self.tiles(scheme)?;
        let arena = if self.arrange_by_address {
            TileArena::arrange(tiles)
        } else {
            TileArena::from_roots(tiles)
        };
        Ok(arena?)
    }

    fn tile(&self, t: &SceneTile, scheme: SubdivisionScheme) -> anyhow::Result<Tile> {
        if t.address.level > MAX_IMPLICIT_DEPTH {
            bail!("tile {} is deeper than level {MAX_IMPLICIT_DEPTH}", t.address);
        }
        if !t.address.fits(scheme) {
            bail!("tile {} is not a {scheme} address", t.address);
        }

        let extent = t
            .extent
            .unwrap_or_else(|| self.extent.cell(scheme, &t.address));
        let mut tile = Tile::new(t.address, extent)
            .with_lod(t.lod)
            .with_available(t.available);
        if let Some([zmin, zmax]) = t.z_range {
            tile = tile.with_z_range(zmin, zmax);
        }
        let children = t
            .children
            .iter()
            .map(|c| self.tile(c, scheme))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(tile.with_children(children))
    }
}
