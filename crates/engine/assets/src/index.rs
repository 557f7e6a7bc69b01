//! Build a manifest from the models found in a directory

use crate::catalog::{Manifest, ManifestEntry};
use crate::error::{AssetError, Result};
use crate::gltf_loader::is_model_file;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Scan `dir` recursively for `.glb` / `.gltf` files
///
/// Ids and urls are paths relative to `dir` with `/` separators (the id
/// without its extension), so the manifest works with a
/// [`GltfLoader`](crate::GltfLoader) rooted at `dir`. File modification
/// times become `created_at`.
pub fn index_directory(dir: &Path) -> Result<Manifest> {
    if !dir.is_dir() {
        return Err(AssetError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut models = Vec::new();
    traverse_directory(dir, dir, &mut models)?;
    models.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

    info!(dir = %dir.display(), count = models.len(), "indexed models");
    Ok(Manifest {
        generated: Some(Utc::now()),
        models,
    })
}

fn traverse_directory(dir: &Path, base_dir: &Path, models: &mut Vec<ManifestEntry>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|err| AssetError::io(dir, err))?;

    for entry in entries {
        let entry = entry.map_err(|err| AssetError::io(dir, err))?;
        let path = entry.path();
        // Symlinks are never followed, so a link back up the tree cannot loop
        let file_type = entry.file_type().map_err(|err| AssetError::io(&path, err))?;

        if file_type.is_dir() {
            traverse_directory(&path, base_dir, models)?;
        } else if file_type.is_file() && is_model_file(&path) {
            let relative = path.strip_prefix(base_dir).unwrap_or(&path);
            let url = relative.to_string_lossy().replace('\\', "/");
            let id = relative
                .with_extension("")
                .to_string_lossy()
                .replace('\\', "/");
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().replace(['_', '-'], " "))
                .unwrap_or_else(|| id.clone());

            let created_at = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .ok()
                .map(DateTime::<Utc>::from);

            debug!(%id, %url, "found model");
            models.push(ManifestEntry {
                id,
                name,
                url,
                created_at,
            });
        }
    }

    Ok(())
}
