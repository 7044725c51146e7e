//! Command-line front end for `tileset-tree`.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use tileset_tree::frame::resolve;
use tileset_tree::source::{is_projection_metric, SpatialRefLookup};
use tileset_tree::tileset::{encode_implicit, write_document, Availability};
use tileset_tree::tree::{build_explicit, build_implicit, ExplicitParams};
use tileset_tree::TilingConfig;

pub mod cli;
pub mod scene;

pub use cli::Cli;
pub use scene::{Scene, SceneReference, SceneTile};

/// What a run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Nodes in `tileset.json`.
    pub tiles: usize,
    /// Tiles with content: document nodes for explicit output, addresses
    /// for implicit output.
    pub content: usize,
    /// Subtree files written (0 for explicit tilesets).
    pub subtrees: usize,
}

/// Builds the tileset for `scene` and writes it below `output`.
pub fn run(scene: &Scene, config: &TilingConfig, output: &Path) -> anyhow::Result<Summary> {
    if config.keep_projection {
        if let Some(srid) = scene.srid {
            let lookup: &dyn SpatialRefLookup = &scene.spatial_refs;
            if !is_projection_metric(Some(lookup), srid) {
                warn!(srid, "source projection is not metric; errors may not match the data units");
            }
        }
    }

    let frame = resolve(&scene.frame_reference(), &config.frame_options())
        .context("resolving the coordinate frame")?;
    let model = config.error_model()?;
    let scheme = config.subdivision;
    let arena = scene.arena(scheme)?;

    if config.use_implicit_tiling {
        let tree = build_implicit(&scene.extent, &model, scheme, config.max_depth, &frame)?;
        let availability = Availability::from_arena(&arena);
        let output_set = encode_implicit(&tree, &availability, &config.implicit_options())?;
        output_set
            .write_to(output)
            .with_context(|| format!("writing tileset to {}", output.display()))?;

        let summary = Summary {
            tiles: output_set.document.root.count_tiles(),
            content: availability.len(),
            subtrees: output_set.subtrees.len(),
        };
        info!(?summary, output = %output.display(), "wrote implicit tileset");
        Ok(summary)
    } else {
        let params = ExplicitParams {
            frame: &frame,
            extent: scene.extent,
            model,
            scheme,
            options: config.tileset_options(),
        };
        let document = build_explicit(&arena, &params)?;

        fs::create_dir_all(output).with_context(|| format!("creating {}", output.display()))?;
        let path = output.join("tileset.json");
        write_document(&path, &document).with_context(|| format!("writing {}", path.display()))?;

        let summary = Summary {
            tiles: document.root.count_tiles(),
            content: document.root.count_content(),
            subtrees: 0,
        };
        info!(?summary, output = %output.display(), "wrote explicit tileset");
        Ok(summary)
    }
}
