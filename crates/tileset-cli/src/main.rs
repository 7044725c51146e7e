use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tileset_cli::{run, Cli, Scene};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = cli.load_config()?;
    let scene = Scene::from_path(&cli.scene)?;
    run(&scene, &config, &cli.output)
        .with_context(|| format!("building tileset from {}", cli.scene.display()))?;
    Ok(())
}
