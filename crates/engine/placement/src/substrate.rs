//! Interfaces to the layers the engine drives but does not implement
//!
//! - [`TrackingSubstrate`]: camera tracking (capability, session, pose, surfaces)
//! - [`RenderSink`]: draws mesh instances at composed transforms
//! - [`AssetLoader`]: turns an asset locator into a [`Mesh`]
//! - [`CatalogProvider`]: lists the models a user can place

use crate::error::Result;
use crate::hit_test::DetectedSurface;
use crate::mesh::Mesh;
use crate::placement::PlacementMode;
use crate::session::ObjectId;
use crate::transform::Transform;
use async_trait::async_trait;
use glam::Mat4;
use std::sync::Arc;

/// Failure reported by a tracking substrate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SubstrateError(pub String);

impl SubstrateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Camera-based tracking backend (WebXR, ARCore, ARKit, a simulator, ...)
#[async_trait]
pub trait TrackingSubstrate: Send + Sync {
    /// Whether the platform exposes a tracking API at all
    ///
    /// When this is false the capability probe resolves to unsupported
    /// without calling [`is_session_supported`](Self::is_session_supported).
    fn has_tracking_api(&self) -> bool;

    /// Ask the platform whether an AR session can be opened
    async fn is_session_supported(&self) -> std::result::Result<bool, SubstrateError>;

    /// Open the tracking session
    fn start_session(&mut self) -> std::result::Result<(), SubstrateError>;

    /// Close the tracking session; no pose or surface data is read afterwards
    fn end_session(&mut self);

    /// Device pose for the current frame, if tracking has one
    fn device_pose(&self) -> Option<Transform>;

    /// Surfaces detected so far
    fn detected_surfaces(&self) -> &[DetectedSurface];
}

/// One anchored object ready to draw
#[derive(Debug, Clone)]
pub struct RenderInstance {
    pub object: ObjectId,
    /// Shared, never-mutated geometry
    pub mesh: Arc<Mesh>,
    /// placement * user adjustment * normalization
    pub model_matrix: Mat4,
    pub mode: PlacementMode,
}

/// Receives draw requests once per tick
pub trait RenderSink {
    /// Called before any instance of a tick is drawn
    fn begin_frame(&mut self, _frame: u64) {}

    fn draw(&mut self, instance: &RenderInstance);

    /// Called after the last instance of a tick
    fn end_frame(&mut self) {}
}

/// Asynchronous model loader
///
/// Implementations report failures as [`Error::AssetLoad`](crate::Error::AssetLoad);
/// the engine never retries.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    async fn load(&self, locator: &str) -> Result<Mesh>;
}

/// A model the user can choose to place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub display_name: String,
    pub asset_locator: String,
}

/// Source of selectable models
///
/// Implementations report failures as [`Error::Catalog`](crate::Error::Catalog).
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn list(&self) -> Result<Vec<CatalogEntry>>;

    /// Re-read the underlying store; the next `list` reflects it
    async fn refresh(&self) -> Result<()>;
}
