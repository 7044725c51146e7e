//! Tiling configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::frame::FrameOptions;
use crate::tileset::{
    ContentFormat, ImplicitOptions, Refine, TilesetOptions, DEFAULT_SUBTREE_LEVELS,
};
use crate::tree::MAX_IMPLICIT_DEPTH;
use crate::{GeometricErrorModel, Result, SubdivisionScheme, TilingError};

/// Settings of one tileset build.
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Document-level geometric error.
    pub geometric_error: f64,
    /// Divisor applied per spatial subdivision step.
    pub geometric_error_factor: f64,
    pub subdivision: SubdivisionScheme,
    pub refine: Refine,
    /// Write an implicit tileset instead of an explicit tree.
    pub use_implicit_tiling: bool,
    pub keep_projection: bool,
    pub use_ecef_transform: bool,
    /// Source CRS, e.g. `EPSG:7415`.
    pub crs: Option<String>,
    /// Deepest level of an implicit tree.
    pub max_depth: u32,
    /// Levels per subtree file.
    pub subtree_levels: u32,
    pub content_format: ContentFormat,
    pub tileset_version: Option<String>,
    pub copyright: Option<String>,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            geometric_error: 2000.0,
            geometric_error_factor: 2.0,
            subdivision: SubdivisionScheme::Quadtree,
            refine: Refine::Add,
            use_implicit_tiling: true,
            keep_projection: false,
            use_ecef_transform: false,
            crs: None,
            max_depth: 4,
            subtree_levels: DEFAULT_SUBTREE_LEVELS,
            content_format: ContentFormat::Glb,
            tileset_version: None,
            copyright: None,
        }
    }
}

impl TilingConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        self.error_model()?;
        if self.subtree_levels == 0 {
            return Err(TilingError::InvalidConfig("subtree_levels must be at least 1".into()));
        }
        if self.max_depth > MAX_IMPLICIT_DEPTH {
            return Err(TilingError::InvalidConfig(format!(
                "max_depth must be at most {MAX_IMPLICIT_DEPTH}, got {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    pub fn frame_options(&self) -> FrameOptions {
        FrameOptions {
            keep_projection: self.keep_projection,
            use_ecef_transform: self.use_ecef_transform,
            crs: self.crs.clone(),
        }
    }

    pub fn error_model(&self) -> Result<GeometricErrorModel> {
        GeometricErrorModel::new(self.geometric_error, self.geometric_error_factor)
    }

    pub fn tileset_options(&self) -> TilesetOptions {
        TilesetOptions {
            refine: self.refine,
            content_format: self.content_format,
            tileset_version: self.tileset_version.clone(),
            copyright: self.copyright.clone(),
        }
    }

    pub fn implicit_options(&self) -> ImplicitOptions {
        ImplicitOptions {
            tileset: self.tileset_options(),
            subtree_levels: self.subtree_levels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TilingConfig::default();
        assert_eq!(config.geometric_error, 2000.0);
        assert_eq!(config.geometric_error_factor, 2.0);
        assert_eq!(config.subdivision, SubdivisionScheme::Quadtree);
        assert!(config.use_implicit_tiling);
        assert!(!config.keep_projection);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = TilingConfig::from_json_str(
            r#"{
                "geometric_error": 500,
                "subdivision": "OCTREE",
                "refine": "REPLACE",
                "crs": "EPSG:7415"
            }"#,
        )
        .unwrap();
        assert_eq!(config.geometric_error, 500.0);
        assert_eq!(config.subdivision, SubdivisionScheme::Octree);
        assert_eq!(config.refine, Refine::Replace);
        assert_eq!(config.subtree_levels, DEFAULT_SUBTREE_LEVELS);
        assert_eq!(config.frame_options().crs.as_deref(), Some("EPSG:7415"));
        assert_eq!(config.error_model().unwrap().root_tile_error(), 250.0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(TilingConfig::from_json_str(r#"{ "geometric_error_factor": 0 }"#).is_err());
        assert!(TilingConfig::from_json_str(r#"{ "geometric_error": -1 }"#).is_err());
        assert!(TilingConfig::from_json_str(r#"{ "subtree_levels": 0 }"#).is_err());
        assert!(TilingConfig::from_json_str(r#"{ "max_depth": 40 }"#).is_err());
        assert!(TilingConfig::from_json_str(r#"{ "subdivision": "KDTREE" }"#).is_err());
    }
}
