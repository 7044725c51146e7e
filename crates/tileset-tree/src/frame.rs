//! Coordinate frame resolution for the tileset root.
//!
//! A tileset is anchored in one of three ways:
//!
//! - **ECEF** (`use_ecef_transform`): geometry is in a local East-North-Up frame
//!   and the root carries the full ENU→ECEF rotation plus translation.
//! - **Projected** (`keep_projection`): geometry stays in the source's projected
//!   coordinates, shifted by a translation; the root carries that translation only.
//! - **Geographic** (neither): bounding volumes are geographic regions and the
//!   root carries a translation to the geocentric reference point.
//!
//! `use_ecef_transform` takes precedence over `keep_projection`. The first two
//! produce box volumes; the geographic mode produces regions and drops the CRS.

use nalgebra::{Matrix4, Vector3};

use crate::{Result, TilingError, VolumeKind};

/// WGS84 semi-major axis in metres.
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

/// WGS84 flattening.
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257_223_563;

/// Where the tileset's local origin comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameReference {
    /// A 3-component reference point in the target space.
    Translation(Vector3<f64>),
    /// A caller-built 4×4 transform (column-major when flattened).
    ///
    /// `local_origin` is the offset, in source units, that was subtracted
    /// from the geometry before it was expressed in the transform's frame.
    Transform {
        matrix: Matrix4<f64>,
        local_origin: Vector3<f64>,
    },
}

impl FrameReference {
    /// Reference point from 3 numbers.
    pub fn translation(t: [f64; 3]) -> Self {
        Self::Translation(Vector3::from(t))
    }

    /// Caller-supplied transform from 16 column-major numbers.
    pub fn transform(columns: [f64; 16], local_origin: [f64; 3]) -> Self {
        Self::Transform {
            matrix: Matrix4::from_column_slice(&columns),
            local_origin: Vector3::from(local_origin),
        }
    }

    /// Translation to the ECEF position of a geographic point at height 0.
    pub fn geocentric(lon_deg: f64, lat_deg: f64) -> Self {
        Self::Translation(geodetic_to_ecef(lon_deg, lat_deg, 0.0))
    }

    /// Full ENU→ECEF transform anchored at a geographic point.
    pub fn enu_at(lon_deg: f64, lat_deg: f64, local_origin: Vector3<f64>) -> Self {
        Self::Transform {
            matrix: enu_to_ecef(lon_deg, lat_deg),
            local_origin,
        }
    }

    /// The reference point: the translation itself, or the transform's 4th column.
    pub fn point(&self) -> Vector3<f64> {
        match self {
            Self::Translation(t) => *t,
            Self::Transform { matrix, .. } => matrix.fixed_view::<3, 1>(0, 3).into_owned(),
        }
    }
}

/// Mode flags for [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameOptions {
    /// Stay in the source's projected coordinates.
    pub keep_projection: bool,
    /// Use the caller-supplied ENU→ECEF transform.
    pub use_ecef_transform: bool,
    /// Source CRS identifier, e.g. `EPSG:5698`.
    pub crs: Option<String>,
}

/// A resolved root frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateFrame {
    transform: Matrix4<f64>,
    origin: Vector3<f64>,
    volume_kind: VolumeKind,
    crs: Option<String>,
}

impl CoordinateFrame {
    /// Root transform.
    #[inline]
    pub fn transform(&self) -> &Matrix4<f64> {
        &self.transform
    }

    /// Root transform as 16 column-major numbers.
    pub fn transform_array(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.transform.as_slice());
        out
    }

    /// Offset subtracted from source extents when building boxes.
    #[inline]
    pub fn origin(&self) -> &Vector3<f64> {
        &self.origin
    }

    #[inline]
    pub fn volume_kind(&self) -> VolumeKind {
        self.volume_kind
    }

    /// Whether bounding volumes are local boxes rather than regions.
    #[inline]
    pub fn uses_box_volume(&self) -> bool {
        self.volume_kind == VolumeKind::Box
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }
}

/// Resolves the root transform, volume representation and CRS.
///
/// Precedence: `use_ecef_transform` over `keep_projection`, then the
/// geographic fallback. ECEF mode requires a [`FrameReference::Transform`];
/// the other modes accept either reference form and use its point.
pub fn resolve(reference: &FrameReference, options: &FrameOptions) -> Result<CoordinateFrame> {
    let crs = options.crs.clone().filter(|c| !c.is_empty());

    if options.use_ecef_transform {
        let FrameReference::Transform {
            matrix,
            local_origin,
        } = reference
        else {
            return Err(TilingError::MissingEcefTransform);
        };
        return Ok(CoordinateFrame {
            transform: *matrix,
            origin: *local_origin,
            volume_kind: VolumeKind::Box,
            crs,
        });
    }

    let point = reference.point();
    if options.keep_projection {
        Ok(CoordinateFrame {
            transform: Matrix4::new_translation(&point),
            origin: point,
            volume_kind: VolumeKind::Box,
            crs,
        })
    } else {
        Ok(CoordinateFrame {
            transform: Matrix4::new_translation(&point),
            origin: point,
            volume_kind: VolumeKind::Region,
            crs: None,
        })
    }
}

/// Converts WGS84 geodetic coordinates (degrees, metres) to ECEF metres.
pub fn geodetic_to_ecef(lon_deg: f64, lat_deg: f64, height: f64) -> Vector3<f64> {
    let e2 = WGS84_FLATTENING * (2.0 - WGS84_FLATTENING);
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();
    let n = WGS84_SEMI_MAJOR_AXIS / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    Vector3::new(
        (n + height) * cos_lat * cos_lon,
        (n + height) * cos_lat * sin_lon,
        (n * (1.0 - e2) + height) * sin_lat,
    )
}

/// ENU→ECEF transform at a geographic point on the ellipsoid.
///
/// Columns are the East, North and Up unit vectors in ECEF, followed by the
/// ECEF position of the point.
pub fn enu_to_ecef(lon_deg: f64, lat_deg: f64) -> Matrix4<f64> {
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();
    let position = geodetic_to_ecef(lon_deg, lat_deg, 0.0);

    #[rustfmt::skip]
    let columns = [
        -sin_lon,           cos_lon,            0.0,     0.0,
        -sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat, 0.0,
        cos_lat * cos_lon,  cos_lat * sin_lon,  sin_lat, 0.0,
        position.x,         position.y,         position.z, 1.0,
    ];
    Matrix4::from_column_slice(&columns)
}
