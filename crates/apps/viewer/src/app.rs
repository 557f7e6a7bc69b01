//! The viewer run: capability check, session, render-tick loop

use crate::config::SceneConfig;
use crate::renderer::LogRenderer;
use anyhow::{bail, Context};
use arplace_assets::{GltfLoader, ManifestCatalog};
use devices::GestureRecognizer;
use placement::{
    normalize, AssetLoader, Capability, CatalogEntry, NormalizationParams, PlacementState,
    SessionId, SessionOrchestrator,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// What a run did, for the final log line and for tests
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub capability: Capability,
    pub model: String,
    pub session: Option<SessionId>,
    pub frames: u64,
    /// Frames on which the hit test found a surface
    pub hit_frames: u64,
    pub gestures: usize,
    /// State of the placed object when the session ended
    pub placement: Option<PlacementState>,
    /// Set instead of `placement` when AR was unavailable
    pub preview: Option<NormalizationParams>,
    pub instances_drawn: u64,
}

impl RunSummary {
    fn new(capability: Capability, model: &CatalogEntry) -> Self {
        Self {
            capability,
            model: model.id.clone(),
            session: None,
            frames: 0,
            hit_frames: 0,
            gestures: 0,
            placement: None,
            preview: None,
            instances_drawn: 0,
        }
    }
}

/// Run the scene to completion
pub async fn run(scene: &SceneConfig) -> anyhow::Result<RunSummary> {
    let catalog_path = scene
        .catalog
        .clone()
        .context("no catalog manifest configured (scene `catalog` or --catalog)")?;
    let assets_root = scene
        .assets_root
        .clone()
        .or_else(|| catalog_path.parent().map(|dir| dir.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    let loader = Arc::new(GltfLoader::new(&assets_root));
    let substrate = scene
        .capability
        .substrate()
        .with_surfaces(scene.surfaces.clone());

    let mut orchestrator = SessionOrchestrator::new(
        scene.engine.clone(),
        substrate,
        LogRenderer::new(),
        loader.clone(),
        Box::new(ManifestCatalog::new(&catalog_path)),
    )?;

    let capability = orchestrator.resolve_capability().await;
    orchestrator
        .refresh_catalog()
        .await
        .with_context(|| format!("failed to load catalog {}", catalog_path.display()))?;
    let model = choose_model(orchestrator.catalog(), scene.model.as_deref())?;
    info!(model = %model.id, name = %model.display_name, %capability, "model selected");

    let mut summary = RunSummary::new(capability, &model);

    if !capability.is_supported() {
        warn!("AR is not supported on this device, showing a 3D preview instead");
        summary.preview = Some(preview(loader.as_ref(), &model).await?);
        return Ok(summary);
    }

    let session = orchestrator.start_session()?;
    summary.session = Some(session);
    let object = orchestrator
        .place_model(&model.id)
        .await
        .with_context(|| format!("failed to place '{}'", model.id))?;
    info!("Tap to place, pinch to scale, two fingers to rotate");

    let touches = scene.touch_script();
    let mut recognizer = GestureRecognizer::new(scene.touch);
    let mut interval = tokio::time::interval(scene.frame_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    for frame in 0..scene.frames {
        interval.tick().await;

        orchestrator
            .substrate_mut()
            .set_pose(scene.device.pose_at(frame));

        for event in touches.events_at(frame) {
            for gesture in recognizer.handle(*event) {
                summary.gestures += 1;
                match orchestrator.handle_gesture(gesture) {
                    Some(mode) => info!(frame, ?gesture, %mode, "gesture applied"),
                    None => debug!(frame, ?gesture, "gesture ignored"),
                }
            }
        }

        let report = orchestrator.tick();
        if report.hit.is_some() {
            summary.hit_frames += 1;
        }
        summary.frames += 1;
    }

    summary.placement = orchestrator.placement(object).cloned();
    summary.instances_drawn = orchestrator.renderer().instances();
    if let Some(state) = &summary.placement {
        let transform = state.current_transform();
        info!(
            object = %object,
            mode = %state.mode(),
            position = ?transform.position,
            scale = state.user_scale(),
            yaw_deg = state.user_yaw().to_degrees(),
            "final placement"
        );
    }

    orchestrator.stop_session();
    info!(
        %session,
        frames = summary.frames,
        hit_frames = summary.hit_frames,
        gestures = summary.gestures,
        "run finished"
    );
    Ok(summary)
}

/// The requested model, or the newest catalog entry
fn choose_model(catalog: &[CatalogEntry], requested: Option<&str>) -> anyhow::Result<CatalogEntry> {
    match requested {
        Some(id) => catalog
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
            .with_context(|| format!("model '{id}' is not in the catalog")),
        None => match catalog.first() {
            Some(entry) => Ok(entry.clone()),
            None => bail!("the catalog is empty"),
        },
    }
}

/// Load and normalize a model outside any AR session
async fn preview(loader: &dyn AssetLoader, model: &CatalogEntry) -> anyhow::Result<NormalizationParams> {
    let mesh = loader
        .load(&model.asset_locator)
        .await
        .with_context(|| format!("failed to load preview of '{}'", model.id))?;
    let params = normalize(&mesh);
    info!(
        model = %model.id,
        vertices = mesh.vertex_count(),
        offset = ?params.center_offset,
        scale = params.uniform_scale,
        "preview ready"
    );
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            display_name: id.to_string(),
            asset_locator: format!("{id}.glb"),
        }
    }

    #[test]
    fn test_choose_model() {
        let catalog = [entry("newest"), entry("older")];
        assert_eq!(choose_model(&catalog, None).unwrap().id, "newest");
        assert_eq!(choose_model(&catalog, Some("older")).unwrap().id, "older");
        assert!(choose_model(&catalog, Some("missing")).is_err());
        assert!(choose_model(&[], None).is_err());
    }
}
