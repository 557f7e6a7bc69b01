//! Model assets for the AR placement engine
//!
//! Implements the engine's asset and catalog seams on top of the local
//! filesystem.
//!
//! # Modules
//!
//! - [`gltf_loader`]: `.glb` / `.gltf` geometry loading ([`GltfLoader`])
//! - [`catalog`]: JSON manifest catalog ([`ManifestCatalog`])
//! - [`index`]: Manifest generation from a directory of models
//! - [`error`]: Error types

pub mod catalog;
pub mod error;
pub mod gltf_loader;
pub mod index;

pub use catalog::{Manifest, ManifestCatalog, ManifestEntry};
pub use error::{AssetError, Result};
pub use gltf_loader::{is_model_file, load_gltf, parse_gltf, GltfLoader, MODEL_EXTENSIONS};
pub use index::index_directory;
