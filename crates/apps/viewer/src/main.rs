//! G-buffer viewer
//!
//! Composites a precomputed G-buffer dataset with orbiting point lights and
//! optional per-light shadows, either in a window or straight to a PNG.

mod cli;
mod runtime;

use anyhow::Context;
use clap::Parser;
use deferred::{FrameBuffers, Scene, open_dataset};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Args;
use runtime::Mode;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.scene_config()?;

    let dataset = config
        .dataset
        .path
        .clone()
        .context("No dataset given (pass a path or set [dataset] path in the config)")?;

    let scene = Scene::from_config(&config)?;

    let store = open_dataset(&dataset)
        .with_context(|| format!("Failed to open dataset {}", dataset.display()))?;
    let frame = FrameBuffers::load(
        store.as_ref(),
        config.window.width as usize,
        config.window.height as usize,
    )?;

    let mode = match &args.export {
        Some(output) => Mode::Export(output.clone()),
        None => Mode::Interactive {
            debug_frames: args.debug_frames,
        },
    };
    info!("Starting viewer ({:?})", mode);

    runtime::run(config.window, mode, scene, frame)
}
