//! AR placement viewer
//!
//! Runs a KDL scene against the placement engine without AR hardware.
//! Use `--config <path>` to pick a scene; the other flags override it.

use anyhow::Context;
use arplace_assets::index_directory;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewer::SceneConfig;

/// Headless AR placement viewer
#[derive(Parser, Debug)]
#[command(name = "ar-viewer")]
#[command(about = "Place a catalog model on simulated AR surfaces")]
struct Args {
    /// Scene file (KDL)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog manifest (JSON)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory model locators are resolved against
    #[arg(long)]
    assets_root: Option<PathBuf>,

    /// Catalog id of the model to place (default: newest)
    #[arg(short, long)]
    model: Option<String>,

    /// Number of frames to run
    #[arg(short, long)]
    frames: Option<u64>,

    /// Write DIR/models.json listing the models under DIR, then exit
    #[arg(long, value_name = "DIR")]
    index: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Some(dir) = &args.index {
        let manifest = index_directory(dir)
            .with_context(|| format!("failed to index {}", dir.display()))?;
        let path = dir.join("models.json");
        manifest.write(&path)?;
        info!(path = %path.display(), models = manifest.models.len(), "manifest written");
        return Ok(());
    }

    let mut scene = match &args.config {
        Some(path) => SceneConfig::from_file(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if let Some(catalog) = args.catalog {
        scene.catalog = Some(catalog);
    }
    if let Some(root) = args.assets_root {
        scene.assets_root = Some(root);
    }
    if let Some(model) = args.model {
        scene.model = Some(model);
    }
    if let Some(frames) = args.frames {
        scene.frames = frames;
    }

    let summary = viewer::run(&scene).await?;
    if let Some(preview) = summary.preview {
        println!(
            "{}: AR unavailable ({}), preview scale {:.4}",
            summary.model, summary.capability, preview.uniform_scale
        );
    } else if let Some(placement) = &summary.placement {
        let position = placement.current_transform().position;
        println!(
            "{}: {} at ({:.3}, {:.3}, {:.3}) after {} frames",
            summary.model,
            placement.mode(),
            position.x,
            position.y,
            position.z,
            summary.frames
        );
    }

    Ok(())
}
