//! Command-line arguments.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tileset_tree::tileset::{ContentFormat, Refine};
use tileset_tree::{SubdivisionScheme, TilingConfig};

/// Builds a 3D Tiles tileset from a scene description.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Scene description (JSON): extent, frame reference and tiles.
    pub scene: PathBuf,

    /// Output directory for `tileset.json` and subtree files.
    #[arg(short, long, default_value = "tileset")]
    pub output: PathBuf,

    /// Tiling config (JSON); flags below override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Document-level geometric error.
    #[arg(short = 'g', long)]
    pub geometric_error: Option<f64>,

    /// Divisor of the geometric error per subdivision step.
    #[arg(long)]
    pub geometric_error_factor: Option<f64>,

    /// QUADTREE or OCTREE.
    #[arg(long)]
    pub subdivision: Option<SubdivisionScheme>,

    /// ADD or REPLACE.
    #[arg(long)]
    pub refine: Option<Refine>,

    /// Write an explicit tile tree instead of an implicit tileset.
    #[arg(long)]
    pub explicit: bool,

    /// Keep the source projection (box volumes, CRS retained).
    #[arg(long)]
    pub keep_projection: bool,

    /// Use the scene's ENU to ECEF transform.
    #[arg(long)]
    pub ecef: bool,

    /// Source CRS written to `asset.crs`.
    #[arg(long)]
    pub crs: Option<String>,

    /// Deepest level of an implicit tree.
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Levels per subtree file.
    #[arg(long)]
    pub subtree_levels: Option<u32>,

    /// glb or b3dm.
    #[arg(long)]
    pub content_format: Option<ContentFormat>,

    #[arg(long)]
    pub tileset_version: Option<String>,

    #[arg(long)]
    pub copyright: Option<String>,

    /// Log at debug level.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Loads the config file (or the defaults) and applies the flags.
    pub fn load_config(&self) -> anyhow::Result<TilingConfig> {
        let mut config = match &self.config {
            Some(path) => TilingConfig::from_path(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => TilingConfig::default(),
        };
        self.apply(&mut config);
        config.validate().context("invalid tiling settings")?;
        Ok(config)
    }

    fn apply(&self, config: &mut TilingConfig) {
        if let Some(v) = self.geometric_error {
            config.geometric_error = v;
        }
        if let Some(v) = self.geometric_error_factor {
            config.geometric_error_factor = v;
        }
        if let Some(v) = self.subdivision {
            config.subdivision = v;
        }
        if let Some(v) = self.refine {
            config.refine = v;
        }
        if self.explicit {
            config.use_implicit_tiling = false;
        }
        if self.keep_projection {
            config.keep_projection = true;
        }
        if self.ecef {
            config.use_ecef_transform = true;
        }
        if let Some(v) = &self.crs {
            config.crs = Some(v.clone());
        }
        if let Some(v) = self.max_depth {
            config.max_depth = v;
        }
        if let Some(v) = self.subtree_levels {
            config.subtree_levels = v;
        }
        if let Some(v) = self.content_format {
            config.content_format = v;
        }
        if let Some(v) = &self.tileset_version {
            config.tileset_version = Some(v.clone());
        }
        if let Some(v) = &self.copyright {
            config.copyright = Some(v.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "tileset",
            "scene.json",
            "--subdivision",
            "octree",
            "-g",
            "500",
            "--explicit",
            "--keep-projection",
            "--crs",
            "EPSG:7415",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.subdivision, SubdivisionScheme::Octree);
        assert_eq!(config.geometric_error, 500.0);
        assert!(!config.use_implicit_tiling);
        assert!(config.keep_projection);
        assert_eq!(config.crs.as_deref(), Some("EPSG:7415"));
        assert_eq!(config.max_depth, 4);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let cli = Cli::parse_from(["tileset", "scene.json", "--geometric-error-factor", "0"]);
        assert!(cli.load_config().is_err());
        assert!(Cli::try_parse_from(["tileset", "scene.json", "--refine", "merge"]).is_err());
    }
}
