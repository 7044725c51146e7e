//! Axis-aligned extents in source units.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{Result, SubdivisionScheme, TileAddress, TilingError};

/// Horizontal padding applied by extent sources so that geometries lying
/// exactly on the boundary are not excluded.
pub const EXTENT_PADDING: f64 = 1e-6;

/// An axis-aligned 3D extent, `min <= max` on every axis.
///
/// Extents are expressed in the source's units: projected metres when the
/// source projection is kept, geographic degrees (x = longitude,
/// y = latitude) with heights in metres otherwise.
///
/// Serialized as `[xmin, ymin, xmax, ymax, zmin, zmax]`; the 4-number form is
/// accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 6]")]
pub struct Extent {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Extent {
    /// Creates an extent from its two corners.
    ///
    /// Fails with [`TilingError::InvalidExtent`] when `max < min` on any axis
    /// or a bound is not finite. Zero-width axes are allowed.
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Result<Self> {
        for (axis, (lo, hi)) in ['x', 'y', 'z'].into_iter().zip(min.iter().zip(max.iter())) {
            if !lo.is_finite() || !hi.is_finite() || hi < lo {
                return Err(TilingError::InvalidExtent {
                    axis,
                    min: *lo,
                    max: *hi,
                });
            }
        }
        Ok(Self { min, max })
    }

    /// Creates an extent from `[xmin, ymin, xmax, ymax, zmin, zmax]`.
    pub fn from_array(values: [f64; 6]) -> Result<Self> {
        let [xmin, ymin, xmax, ymax, zmin, zmax] = values;
        Self::new(Point3::new(xmin, ymin, zmin), Point3::new(xmax, ymax, zmax))
    }

    /// Creates an extent from a flat slice.
    ///
    /// Accepts the 6-number form or the 2D `[xmin, ymin, xmax, ymax]` form,
    /// which yields a flat extent at height zero.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match *values {
            [xmin, ymin, xmax, ymax] => Self::from_array([xmin, ymin, xmax, ymax, 0.0, 0.0]),
            [xmin, ymin, xmax, ymax, zmin, zmax] => {
                Self::from_array([xmin, ymin, xmax, ymax, zmin, zmax])
            }
            _ => Err(TilingError::MalformedExtent { len: values.len() }),
        }
    }

    /// Returns the extent as `[xmin, ymin, xmax, ymax, zmin, zmax]`.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.min.x, self.min.y, self.max.x, self.max.y, self.min.z, self.max.z,
        ]
    }

    /// Returns a copy with the height range replaced.
    ///
    /// Heights are usually queried separately from the horizontal bounds,
    /// so tiles carry a z-range that overrides the generic extent's z.
    pub fn with_z_range(&self, zmin: f64, zmax: f64) -> Result<Self> {
        Self::new(
            Point3::new(self.min.x, self.min.y, zmin),
            Point3::new(self.max.x, self.max.y, zmax),
        )
    }

    /// Returns the minimum corner.
    #[inline]
    pub fn min(&self) -> Point3<f64> {
        self.min
    }

    /// Returns the maximum corner.
    #[inline]
    pub fn max(&self) -> Point3<f64> {
        self.max
    }

    /// Midpoint per axis, computed as `min + 0.5 * (max - min)`.
    pub fn center(&self) -> Point3<f64> {
        self.min + self.half_extents()
    }

    /// Half the span per axis. Never negative.
    pub fn half_extents(&self) -> Vector3<f64> {
        (self.max - self.min) * 0.5
    }

    /// Grows the horizontal bounds by `delta` on each side; heights are untouched.
    pub fn padded(&self, delta: f64) -> Self {
        Self {
            min: Point3::new(self.min.x - delta, self.min.y - delta, self.min.z),
            max: Point3::new(self.max.x + delta, self.max.y + delta, self.max.z),
        }
    }

    /// Returns the child cell at the given octant offsets (each 0 or 1).
    ///
    /// Quadtree cells only split x and y and keep the full height range;
    /// octree cells also split z.
    pub fn child(&self, scheme: SubdivisionScheme, ix: u32, iy: u32, iz: u32) -> Extent {
        let half = self.half_extents();
        let offset = |i: usize, bit: u32| self.min[i] + half[i] * f64::from(bit & 1);
        let (zmin, zmax) = match scheme {
            SubdivisionScheme::Quadtree => (self.min.z, self.max.z),
            SubdivisionScheme::Octree => {
                let lo = offset(2, iz);
                (lo, lo + half.z)
            }
        };
        let xmin = offset(0, ix);
        let ymin = offset(1, iy);
        Self {
            min: Point3::new(xmin, ymin, zmin),
            max: Point3::new(xmin + half.x, ymin + half.y, zmax),
        }
    }

    /// Returns the cell at `address` in the grid this extent is subdivided into.
    ///
    /// Levels past 32 have no coordinate bits left and keep halving towards
    /// the cell's minimum corner.
    pub fn cell(&self, scheme: SubdivisionScheme, address: &TileAddress) -> Extent {
        let mut cell = *self;
        for shift in (0..address.level).rev() {
            let bit = |c: u32| c.checked_shr(shift).unwrap_or(0) & 1;
            cell = cell.child(scheme, bit(address.x), bit(address.y), bit(address.z));
        }
        cell
    }
}

impl TryFrom<Vec<f64>> for Extent {
    type Error = TilingError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::from_slice(&values)
    }
}

impl From<Extent> for [f64; 6] {
    fn from(extent: Extent) -> Self {
        extent.to_array()
    }
}
