//! Bounding volumes: oriented local boxes and geographic regions.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::Extent;

/// Bounding volume of a tile.
///
/// Exactly one representation is used for a whole tileset: boxes for local
/// (projected or ENU) frames, regions for geographic frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundingVolume {
    /// `{"box": [cx, cy, cz, xx, xy, xz, yx, yy, yz, zx, zy, zz]}`
    Box(OrientedBox),
    /// `{"region": [west, south, east, north, minHeight, maxHeight]}`
    Region(GeographicRegion),
}

/// Which [`BoundingVolume`] variant a frame produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    Box,
    Region,
}

impl BoundingVolume {
    /// Computes the volume of `extent` in the representation `kind`.
    ///
    /// `translation` is only used by boxes, which are expressed relative to
    /// the tileset's local origin.
    pub fn of_extent(kind: VolumeKind, extent: &Extent, translation: &Vector3<f64>) -> Self {
        match kind {
            VolumeKind::Box => Self::Box(compute_box(extent, translation)),
            VolumeKind::Region => Self::Region(compute_region(extent)),
        }
    }

    /// The representation of this volume.
    pub fn kind(&self) -> VolumeKind {
        match self {
            Self::Box(_) => VolumeKind::Box,
            Self::Region(_) => VolumeKind::Region,
        }
    }

    pub fn as_box(&self) -> Option<&OrientedBox> {
        match self {
            Self::Box(b) => Some(b),
            Self::Region(_) => None,
        }
    }

    pub fn as_region(&self) -> Option<&GeographicRegion> {
        match self {
            Self::Region(r) => Some(r),
            Self::Box(_) => None,
        }
    }
}

/// Oriented bounding box given by a center and three half-axis vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 12]", from = "[f64; 12]")]
pub struct OrientedBox {
    pub center: Point3<f64>,
    pub half_axes: [Vector3<f64>; 3],
}

impl OrientedBox {
    /// Flattens to the 12-number tileset layout.
    #[rustfmt::skip]
    pub fn to_array(&self) -> [f64; 12] {
        let [x, y, z] = self.half_axes;
        [
            self.center.x, self.center.y, self.center.z,
            x.x, x.y, x.z,
            y.x, y.y, y.z,
            z.x, z.y, z.z,
        ]
    }

    /// Half-widths along the three axes.
    pub fn half_widths(&self) -> Vector3<f64> {
        Vector3::new(
            self.half_axes[0].norm(),
            self.half_axes[1].norm(),
            self.half_axes[2].norm(),
        )
    }
}

impl From<OrientedBox> for [f64; 12] {
    fn from(b: OrientedBox) -> Self {
        b.to_array()
    }
}

impl From<[f64; 12]> for OrientedBox {
    fn from(v: [f64; 12]) -> Self {
        Self {
            center: Point3::new(v[0], v[1], v[2]),
            half_axes: [
                Vector3::new(v[3], v[4], v[5]),
                Vector3::new(v[6], v[7], v[8]),
                Vector3::new(v[9], v[10], v[11]),
            ],
        }
    }
}

/// Geographic region: longitudes/latitudes in radians, heights in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 6]", from = "[f64; 6]")]
pub struct GeographicRegion {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl GeographicRegion {
    /// Flattens to `[west, south, east, north, minHeight, maxHeight]`.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.west,
            self.south,
            self.east,
            self.north,
            self.min_height,
            self.max_height,
        ]
    }
}

impl From<GeographicRegion> for [f64; 6] {
    fn from(r: GeographicRegion) -> Self {
        r.to_array()
    }
}

impl From<[f64; 6]> for GeographicRegion {
    fn from(v: [f64; 6]) -> Self {
        Self {
            west: v[0],
            south: v[1],
            east: v[2],
            north: v[3],
            min_height: v[4],
            max_height: v[5],
        }
    }
}

/// Computes the axis-aligned box of `extent`, expressed relative to `translation`.
///
/// The center is the extent midpoint minus `translation`; the half-axes are
/// `(hx, 0, 0)`, `(0, hy, 0)` and `(0, 0, hz)`. Callers whose height range
/// differs from the horizontal query pass an extent built with
/// [`Extent::with_z_range`].
pub fn compute_box(extent: &Extent, translation: &Vector3<f64>) -> OrientedBox {
    let half = extent.half_extents();
    OrientedBox {
        center: extent.center() - *translation,
        half_axes: [
            Vector3::new(half.x, 0.0, 0.0),
            Vector3::new(0.0, half.y, 0.0),
            Vector3::new(0.0, 0.0, half.z),
        ],
    }
}

/// Computes the geographic region of an extent given in degrees.
///
/// x/y bounds are converted to radians; heights stay in metres.
pub fn compute_region(extent: &Extent) -> GeographicRegion {
    let (min, max) = (extent.min(), extent.max());
    GeographicRegion {
        west: min.x.to_radians(),
        south: min.y.to_radians(),
        east: max.x.to_radians(),
        north: max.y.to_radians(),
        min_height: min.z,
        max_height: max.z,
    }
}
