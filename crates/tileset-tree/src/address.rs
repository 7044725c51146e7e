//! Quadtree/octree tile addressing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Spatial subdivision scheme of a tile tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubdivisionScheme {
    /// Four children per tile, split in x and y.
    #[default]
    Quadtree,
    /// Eight children per tile, split in x, y and z.
    Octree,
}

impl SubdivisionScheme {
    /// Number of children a tile splits into.
    #[inline]
    pub fn branching(self) -> u32 {
        match self {
            Self::Quadtree => 4,
            Self::Octree => 8,
        }
    }

    /// Number of spatial axes that are subdivided.
    #[inline]
    pub fn dimensions(self) -> u32 {
        match self {
            Self::Quadtree => 2,
            Self::Octree => 3,
        }
    }

    /// Number of tiles in levels `0..levels` of a full tree.
    pub fn tiles_in_levels(self, levels: u32) -> u64 {
        let b = u64::from(self.branching());
        (b.pow(levels) - 1) / (b - 1)
    }

    /// Name used in tileset documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quadtree => "QUADTREE",
            Self::Octree => "OCTREE",
        }
    }
}

impl fmt::Display for SubdivisionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubdivisionScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "QUADTREE" => Ok(Self::Quadtree),
            "OCTREE" => Ok(Self::Octree),
            _ => Err(format!("unknown subdivision scheme '{s}'")),
        }
    }
}

/// Position of a tile in the spatial hierarchy.
///
/// `level` is the subdivision depth (0 = the single root cell), and
/// `x`, `y`, `z` are grid coordinates at that level. `z` stays 0 in a quadtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileAddress {
    pub level: u32,
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub z: u32,
}

impl TileAddress {
    /// The root cell.
    pub const ROOT: TileAddress = TileAddress {
        level: 0,
        x: 0,
        y: 0,
        z: 0,
    };

    /// Creates a quadtree address.
    pub fn new(level: u32, x: u32, y: u32) -> Self {
        Self { level, x, y, z: 0 }
    }

    /// Creates an octree address.
    pub fn new_octree(level: u32, x: u32, y: u32, z: u32) -> Self {
        Self { level, x, y, z }
    }

    /// Returns the containing cell one level up, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.level == 0 {
            return None;
        }
        Some(Self {
            level: self.level - 1,
            x: self.x >> 1,
            y: self.y >> 1,
            z: self.z >> 1,
        })
    }

    /// Returns the ancestor at `level`, or `None` if `level` is deeper than `self`.
    pub fn ancestor_at(&self, level: u32) -> Option<Self> {
        let shift = self.level.checked_sub(level)?;
        let up = |c: u32| c.checked_shr(shift).unwrap_or(0);
        Some(Self {
            level,
            x: up(self.x),
            y: up(self.y),
            z: up(self.z),
        })
    }

    /// Whether `child` is one of this cell's direct children.
    pub fn is_parent_of(&self, child: &TileAddress) -> bool {
        child.parent().as_ref() == Some(self)
    }

    /// Whether this cell contains `other` (or is `other`).
    pub fn contains(&self, other: &TileAddress) -> bool {
        other.ancestor_at(self.level).as_ref() == Some(self)
    }

    /// Returns the direct children, ordered by Morton index.
    pub fn children(&self, scheme: SubdivisionScheme) -> Vec<TileAddress> {
        (0..scheme.branching())
            .map(|octant| Self {
                level: self.level + 1,
                x: (self.x << 1) | (octant & 1),
                y: (self.y << 1) | ((octant >> 1) & 1),
                z: (self.z << 1) | ((octant >> 2) & 1),
            })
            .collect()
    }

    /// Whether the address is valid for `scheme` (quadtree addresses keep `z == 0`)
    /// and its coordinates fit in the grid at its level.
    pub fn fits(&self, scheme: SubdivisionScheme) -> bool {
        let dim = 1u64 << self.level.min(63);
        let in_grid = |c: u32| u64::from(c) < dim;
        let z_ok = match scheme {
            SubdivisionScheme::Quadtree => self.z == 0,
            SubdivisionScheme::Octree => in_grid(self.z),
        };
        in_grid(self.x) && in_grid(self.y) && z_ok
    }

    /// Address relative to `root`, which must contain `self`.
    pub fn relative_to(&self, root: &TileAddress) -> TileAddress {
        debug_assert!(root.contains(self), "{root} does not contain {self}");
        let shift = self.level - root.level;
        let mask = |c: u32| c - (c >> shift << shift);
        Self {
            level: shift,
            x: mask(self.x),
            y: mask(self.y),
            z: mask(self.z),
        }
    }

    /// Morton (Z-order) index of the cell within its level.
    ///
    /// Bits are interleaved x first: `x0 y0 [z0] x1 y1 [z1] ...` from the
    /// least significant bit up.
    pub fn morton_index(&self, scheme: SubdivisionScheme) -> u64 {
        let dims = scheme.dimensions();
        let mut index = 0u64;
        for bit in 0..self.level {
            let shift = u64::from(bit * dims);
            index |= u64::from((self.x >> bit) & 1) << shift;
            index |= u64::from((self.y >> bit) & 1) << (shift + 1);
            if scheme == SubdivisionScheme::Octree {
                index |= u64::from((self.z >> bit) & 1) << (shift + 2);
            }
        }
        index
    }

    /// File-name stem: `{level}_{x}_{y}` or `{level}_{x}_{y}_{z}`.
    pub fn stem(&self, scheme: SubdivisionScheme) -> String {
        match scheme {
            SubdivisionScheme::Quadtree => format!("{}_{}_{}", self.level, self.x, self.y),
            SubdivisionScheme::Octree => {
                format!("{}_{}_{}_{}", self.level, self.x, self.y, self.z)
            }
        }
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.level, self.x, self.y, self.z)
    }
}
