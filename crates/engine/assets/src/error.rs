//! Error types for asset loading and catalogs

use std::path::PathBuf;

/// Errors that can occur while reading models or catalog manifests
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Filesystem failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The glTF document could not be parsed
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    /// A manifest is not valid JSON or has the wrong shape
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Only `.glb` and `.gltf` files can be loaded
    #[error("Unsupported asset format: {0}")]
    UnsupportedFormat(String),

    /// A buffer the document refers to is missing
    #[error("Missing buffer: {0}")]
    MissingBuffer(String),

    /// A node is reachable more than once in the scene graph
    #[error("Invalid node hierarchy: node {0} is reached twice")]
    InvalidHierarchy(usize),

    /// The default scene contains no vertex positions
    #[error("Asset contains no geometry")]
    NoGeometry,
}

/// Result type for asset operations
pub type Result<T> = std::result::Result<T, AssetError>;

impl AssetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetError::Io {
            path: path.into(),
            source,
        }
    }

    /// Report as a failed load of `locator`
    pub fn into_load_error(self, locator: &str) -> placement::Error {
        placement::Error::asset_load(locator, self)
    }

    /// Report as a catalog failure
    pub fn into_catalog_error(self) -> placement::Error {
        placement::Error::Catalog(self.to_string())
    }
}
