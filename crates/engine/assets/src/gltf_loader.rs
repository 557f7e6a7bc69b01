//! glTF 2.0 / GLB model loading
//!
//! Only geometry is read: vertex positions and indices of every primitive in
//! the default scene, with each node's world matrix baked into the primitive.
//! Materials, textures and animations are ignored.

use crate::error::{AssetError, Result};
use async_trait::async_trait;
use base64::Engine;
use glam::{Mat4, Vec3};
use gltf::Gltf;
use placement::{AssetLoader, Mesh, MeshPrimitive};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extensions accepted as models
pub const MODEL_EXTENSIONS: [&str; 2] = ["glb", "gltf"];

/// Returns true for `.glb` / `.gltf` paths (case-insensitive)
pub fn is_model_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| MODEL_EXTENSIONS.contains(&ext.as_str()))
}

/// Load a model file from disk
///
/// External buffers are resolved relative to the file's directory.
pub fn load_gltf(path: &Path) -> Result<Mesh> {
    if !is_model_file(path) {
        return Err(AssetError::UnsupportedFormat(path.display().to_string()));
    }

    let bytes = std::fs::read(path).map_err(|err| AssetError::io(path, err))?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());

    parse_gltf(name, &bytes, path.parent())
}

/// Parse a `.gltf` or `.glb` document held in memory
pub fn parse_gltf(name: impl Into<String>, bytes: &[u8], base_dir: Option<&Path>) -> Result<Mesh> {
    let gltf = Gltf::from_slice(bytes)?;
    let buffers = load_buffers(&gltf, base_dir)?;

    let mut primitives = Vec::new();
    match gltf.default_scene().or_else(|| gltf.scenes().next()) {
        Some(scene) => {
            collect_scene(&scene, &buffers, &mut primitives)?;
        }
        // No scene graph: take every mesh as-is
        None => {
            for mesh in gltf.meshes() {
                collect_mesh(&mesh, Mat4::IDENTITY, &buffers, &mut primitives);
            }
        }
    }

    let mesh = Mesh::new(name, primitives);
    if mesh.is_empty() {
        return Err(AssetError::NoGeometry);
    }
    Ok(mesh)
}

fn load_buffers(gltf: &Gltf, base_dir: Option<&Path>) -> Result<Vec<Vec<u8>>> {
    let mut buffers = Vec::new();

    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| AssetError::MissingBuffer("GLB binary chunk".to_string()))?,
            gltf::buffer::Source::Uri(uri) => match uri.strip_prefix("data:") {
                Some(data_uri) => decode_data_uri(data_uri)?,
                None => {
                    let path = base_dir.unwrap_or(Path::new(".")).join(uri);
                    std::fs::read(&path).map_err(|err| AssetError::io(path, err))?
                }
            },
        };

        if data.len() < buffer.length() {
            return Err(AssetError::MissingBuffer(format!(
                "buffer {} holds {} bytes, {} declared",
                buffer.index(),
                data.len(),
                buffer.length()
            )));
        }
        buffers.push(data);
    }

    Ok(buffers)
}

fn decode_data_uri(data_uri: &str) -> Result<Vec<u8>> {
    let (_, payload) = data_uri
        .split_once(";base64,")
        .ok_or_else(|| AssetError::MissingBuffer("data URI is not base64".to_string()))?;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|err| AssetError::MissingBuffer(format!("bad base64 data URI: {err}")))
}

/// Walk the scene graph with an explicit stack
///
/// A node reached twice means the hierarchy is not a forest (a cycle or a
/// shared child), which glTF forbids.
fn collect_scene(
    scene: &gltf::Scene,
    buffers: &[Vec<u8>],
    primitives: &mut Vec<MeshPrimitive>,
) -> Result<()> {
    let mut visited = HashSet::new();
    let mut pending: Vec<(gltf::Node, Mat4)> =
        scene.nodes().map(|node| (node, Mat4::IDENTITY)).collect();

    while let Some((node, parent)) = pending.pop() {
        if !visited.insert(node.index()) {
            return Err(AssetError::InvalidHierarchy(node.index()));
        }

        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
        if let Some(mesh) = node.mesh() {
            collect_mesh(&mesh, world, buffers, primitives);
        }
        pending.extend(node.children().map(|child| (child, world)));
    }

    Ok(())
}

fn collect_mesh(
    mesh: &gltf::Mesh,
    world: Mat4,
    buffers: &[Vec<u8>],
    primitives: &mut Vec<MeshPrimitive>,
) {
    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

        let Some(positions) = reader.read_positions() else {
            warn!(
                mesh = mesh.name().unwrap_or("unnamed"),
                "primitive without positions skipped"
            );
            continue;
        };
        let positions: Vec<Vec3> = positions.map(Vec3::from).collect();
        let indices = reader
            .read_indices()
            .map(|indices| indices.into_u32().collect())
            .unwrap_or_default();

        primitives.push(
            MeshPrimitive::new(positions)
                .with_indices(indices)
                .with_transform(world),
        );
    }
}

/// Asset loader reading model files below a root directory
#[derive(Debug, Clone)]
pub struct GltfLoader {
    root: PathBuf,
}

impl GltfLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a catalog locator
    ///
    /// `file://` prefixes are stripped; relative locators are joined to the
    /// root, absolute ones are used as-is.
    pub fn resolve(&self, locator: &str) -> PathBuf {
        let locator = locator.strip_prefix("file://").unwrap_or(locator);
        self.root.join(locator)
    }
}

#[async_trait]
impl AssetLoader for GltfLoader {
    async fn load(&self, locator: &str) -> placement::Result<Mesh> {
        let path = self.resolve(locator);
        debug!(locator, path = %path.display(), "reading model");

        let mesh = tokio::task::spawn_blocking(move || load_gltf(&path))
            .await
            .map_err(|err| placement::Error::asset_load(locator, err))?
            .map_err(|err| err.into_load_error(locator))?;

        debug!(
            locator,
            primitives = mesh.primitives.len(),
            vertices = mesh.vertex_count(),
            "model read"
        );
        Ok(mesh)
    }
}
