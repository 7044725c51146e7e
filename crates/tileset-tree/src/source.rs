//! Seams to the spatial store that supplies extents and projection metadata.
//!
//! The store itself (queries, connections) lives outside this crate. Results
//! are handed over as plain values before any tree is built.

use std::collections::HashMap;
use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Extent, Result, EXTENT_PADDING};

/// Geographic CRS codes known to use degrees.
pub const GEOGRAPHIC_SRIDS: [i32; 2] = [4326, 4979];

/// Supplies the bounding extent and geographic center of a geometry source.
pub trait ExtentSource {
    /// 3D extent, in source coordinates when `keep_projection` is set and in
    /// geographic degrees otherwise. Horizontal bounds include the padding.
    fn bounding_extent(&self, keep_projection: bool) -> Result<Extent>;

    /// Center of the source as `(lon, lat)` in degrees.
    fn center_geographic(&self) -> Result<(f64, f64)>;
}

/// An [`ExtentSource`] over extents that are already known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticExtentSource {
    /// Extent in source coordinates.
    pub projected: Extent,
    /// Extent in geographic degrees, heights in metres.
    pub geographic: Extent,
}

impl StaticExtentSource {
    pub fn new(projected: Extent, geographic: Extent) -> Self {
        Self {
            projected,
            geographic,
        }
    }
}

impl ExtentSource for StaticExtentSource {
    fn bounding_extent(&self, keep_projection: bool) -> Result<Extent> {
        let extent = if keep_projection {
            self.projected
        } else {
            self.geographic
        };
        Ok(extent.padded(EXTENT_PADDING))
    }

    fn center_geographic(&self) -> Result<(f64, f64)> {
        let c = self.geographic.center();
        Ok((c.x, c.y))
    }
}

/// Projection metadata of one SRID, as stored in `spatial_ref_sys`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialRefDefinition {
    /// Well-known-text definition.
    #[serde(default)]
    pub srtext: Option<String>,
    /// PROJ definition string.
    #[serde(default)]
    pub proj4text: Option<String>,
}

impl SpatialRefDefinition {
    /// Whether the definition declares metres as its linear unit.
    pub fn is_metric(&self) -> bool {
        let wkt = self
            .srtext
            .as_deref()
            .map(str::to_ascii_uppercase)
            .is_some_and(|s| s.contains("UNIT[\"METRE") || s.contains("UNIT[\"METER"));
        let proj = self
            .proj4text
            .as_deref()
            .is_some_and(|s| s.contains("+units=m ") || s.contains("+units=m+"));
        wkt || proj
    }
}

/// Error type returned by [`SpatialRefLookup`] implementations.
pub type LookupError = Box<dyn StdError + Send + Sync>;

/// Looks up projection metadata by SRID.
pub trait SpatialRefLookup {
    /// Returns `Ok(None)` when the SRID is unknown.
    fn lookup(&self, srid: i32) -> std::result::Result<Option<SpatialRefDefinition>, LookupError>;
}

impl SpatialRefLookup for HashMap<i32, SpatialRefDefinition> {
    fn lookup(&self, srid: i32) -> std::result::Result<Option<SpatialRefDefinition>, LookupError> {
        Ok(self.get(&srid).cloned())
    }
}

/// Whether `srid` uses metres.
///
/// EPSG:4326 and EPSG:4979 are answered without a lookup. Everything that
/// cannot be determined (no lookup, failed lookup, unknown SRID) is `false`.
pub fn is_projection_metric(lookup: Option<&dyn SpatialRefLookup>, srid: i32) -> bool {
    if GEOGRAPHIC_SRIDS.contains(&srid) {
        return false;
    }
    let Some(lookup) = lookup else {
        warn!(srid, "no spatial reference lookup, assuming non-metric units");
        return false;
    };
    match lookup.lookup(srid) {
        Ok(Some(definition)) => definition.is_metric(),
        Ok(None) => {
            warn!(srid, "unknown SRID, assuming non-metric units");
            false
        }
        Err(err) => {
            warn!(srid, error = %err, "spatial reference lookup failed, assuming non-metric units");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingLookup;

    impl SpatialRefLookup for FailingLookup {
        fn lookup(
            &self,
            _srid: i32,
        ) -> std::result::Result<Option<SpatialRefDefinition>, LookupError> {
            Err("connection refused".into())
        }
    }

    fn make_refs() -> HashMap<i32, SpatialRefDefinition> {
        HashMap::from([
            (
                28992,
                SpatialRefDefinition {
                    srtext: Some(r#"PROJCS["Amersfoort / RD New",UNIT["metre",1]]"#.into()),
                    proj4text: None,
                },
            ),
            (
                2263,
                SpatialRefDefinition {
                    srtext: Some(r#"PROJCS["NAD83 / NY LI",UNIT["US survey foot",0.3048]]"#.into()),
                    proj4text: Some("+proj=lcc +units=us-ft +no_defs".into()),
                },
            ),
            (
                3857,
                SpatialRefDefinition {
                    srtext: None,
                    proj4text: Some("+proj=merc +a=6378137 +units=m +no_defs".into()),
                },
            ),
            (
                4258,
                SpatialRefDefinition {
                    srtext: Some(r#"GEOGCS["ETRS89",UNIT["degree",0.0174532925199433]]"#.into()),
                    proj4text: Some("+proj=longlat +ellps=GRS80 +no_defs".into()),
                },
            ),
        ])
    }

    #[test]
    fn geographic_codes_skip_lookup() {
        assert!(!is_projection_metric(None, 4326));
        assert!(!is_projection_metric(Some(&FailingLookup), 4979));
    }

    #[test]
    fn detects_metric_units() {
        let refs = make_refs();
        assert!(is_projection_metric(Some(&refs), 28992));
        assert!(is_projection_metric(Some(&refs), 3857));
        assert!(!is_projection_metric(Some(&refs), 2263));
        assert!(!is_projection_metric(Some(&refs), 4258));
    }

    #[test]
    fn wkt_unit_match_ignores_case() {
        let def = SpatialRefDefinition {
            srtext: Some(r#"unit["Meter",1]"#.into()),
            proj4text: None,
        };
        assert!(def.is_metric());
        // PROJ strings are matched case-sensitively
        let proj = SpatialRefDefinition {
            srtext: None,
            proj4text: Some("+UNITS=M +no_defs".into()),
        };
        assert!(!proj.is_metric());
    }

    #[test]
    fn failures_are_not_metric() {
        let refs = make_refs();
        assert!(!is_projection_metric(Some(&refs), 99999));
        assert!(!is_projection_metric(Some(&FailingLookup), 28992));
        assert!(!is_projection_metric(None, 28992));
    }

    #[test]
    fn static_source_pads_horizontally() {
        let projected = Extent::from_array([10.0, 20.0, 30.0, 40.0, 1.0, 2.0]).unwrap();
        let geographic = Extent::from_array([4.0, 52.0, 5.0, 53.0, 1.0, 2.0]).unwrap();
        let source = StaticExtentSource::new(projected, geographic);

        let e = source.bounding_extent(true).unwrap();
        assert_eq!(e.min().x, 10.0 - EXTENT_PADDING);
        assert_eq!(e.max().y, 40.0 + EXTENT_PADDING);
        assert_eq!((e.min().z, e.max().z), (1.0, 2.0));

        let g = source.bounding_extent(false).unwrap();
        assert!((g.min().x - 4.0).abs() < 1e-5);
        assert_eq!(source.center_geographic().unwrap(), (4.5, 52.5));
    }
}
