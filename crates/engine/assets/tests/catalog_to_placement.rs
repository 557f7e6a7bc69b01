//! Index a model directory, serve it through the manifest catalog and
//! place a model with the simulated substrate

use arplace_assets::{index_directory, GltfLoader, ManifestCatalog};
use base64::Engine;
use glam::{Quat, Vec3};
use placement::sim::{ProbeOutcome, RecordingRenderer, SimulatedSubstrate};
use placement::{DetectedSurface, Error, PlacementConfig, SessionOrchestrator, Transform};
use std::path::Path;
use std::sync::Arc;

/// Axis-aligned box from `min` to `max` as an 8-vertex point cloud
fn box_gltf(min: Vec3, max: Vec3) -> String {
    let corners: Vec<f32> = (0..8)
        .flat_map(|i| {
            [
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            ]
        })
        .collect();
    let bytes: Vec<u8> = corners.iter().flat_map(|v| v.to_le_bytes()).collect();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

    format!(
        r#"{{
  "asset": {{"version": "2.0"}},
  "scene": 0,
  "scenes": [{{"nodes": [0]}}],
  "nodes": [{{"mesh": 0}}],
  "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}, "mode": 0}}]}}],
  "buffers": [{{"byteLength": {len}, "uri": "data:application/octet-stream;base64,{encoded}"}}],
  "bufferViews": [{{"buffer": 0, "byteLength": {len}}}],
  "accessors": [{{
    "bufferView": 0, "componentType": 5126, "count": 8, "type": "VEC3",
    "min": [{}, {}, {}], "max": [{}, {}, {}]
  }}]
}}"#,
        min.x,
        min.y,
        min.z,
        max.x,
        max.y,
        max.z,
        len = bytes.len(),
    )
}

fn write_models(dir: &Path) {
    std::fs::create_dir_all(dir.join("furniture")).unwrap();
    std::fs::write(
        dir.join("furniture/sofa.gltf"),
        box_gltf(Vec3::new(-2.0, 0.0, -1.0), Vec3::new(4.0, 2.0, 3.0)),
    )
    .unwrap();
    std::fs::write(dir.join("broken.gltf"), "{ not gltf").unwrap();
}

type Orchestrator = SessionOrchestrator<SimulatedSubstrate, RecordingRenderer>;

async fn orchestrator(dir: &Path) -> Orchestrator {
    let manifest_path = dir.join("models.json");
    index_directory(dir).unwrap().write(&manifest_path).unwrap();

    let substrate = SimulatedSubstrate::new(ProbeOutcome::Supported)
        .with_surfaces(vec![DetectedSurface::floor(1, 0.0)]);
    let mut orchestrator = SessionOrchestrator::new(
        PlacementConfig::default(),
        substrate,
        RecordingRenderer::default(),
        Arc::new(GltfLoader::new(dir)),
        Box::new(ManifestCatalog::new(manifest_path)),
    )
    .unwrap();

    orchestrator.resolve_capability().await;
    orchestrator.start_session().unwrap();
    orchestrator.refresh_catalog().await.unwrap();
    orchestrator
}

#[tokio::test]
async fn test_indexed_model_is_placed_normalized() {
    let dir = tempfile::tempdir().unwrap();
    write_models(dir.path());
    let mut orchestrator = orchestrator(dir.path()).await;

    let ids: Vec<&str> = orchestrator.catalog().iter().map(|e| e.id.as_str()).collect();
    assert!(ids.contains(&"furniture/sofa"));
    assert!(ids.contains(&"broken"));

    let id = orchestrator.place_model("furniture/sofa").await.unwrap();
    assert_eq!(orchestrator.model_id(id), Some("furniture/sofa"));

    orchestrator.substrate_mut().set_pose(Some(Transform::new(
        Vec3::new(0.5, 1.5, -2.0),
        Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
    )));
    orchestrator.tick();

    let frame = orchestrator.renderer().last_frame().unwrap();
    let matrix = frame.instances[0].model_matrix;
    assert!(matrix
        .transform_point3(Vec3::ONE)
        .abs_diff_eq(Vec3::new(0.5, 0.0, -2.0), 1e-4));

    let bounds = frame.instances[0].mesh.bounding_box().unwrap();
    let size = matrix.transform_point3(bounds.max) - matrix.transform_point3(bounds.min);
    assert!((size.max_element() - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn test_broken_model_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    write_models(dir.path());
    let mut orchestrator = orchestrator(dir.path()).await;

    match orchestrator.place_model("broken").await {
        Err(Error::AssetLoad { locator, .. }) => assert_eq!(locator, "broken.gltf"),
        other => panic!("expected AssetLoad, got {:?}", other),
    }
    assert_eq!(orchestrator.object_count(), 0);
}

#[tokio::test]
async fn test_model_deleted_after_indexing() {
    let dir = tempfile::tempdir().unwrap();
    write_models(dir.path());
    let mut orchestrator = orchestrator(dir.path()).await;

    std::fs::remove_file(dir.path().join("furniture/sofa.gltf")).unwrap();
    let err = orchestrator.place_model("furniture/sofa").await.unwrap_err();
    assert!(err.is_surfaced());
}
