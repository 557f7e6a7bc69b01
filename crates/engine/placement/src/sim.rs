//! In-memory substrate implementations
//!
//! Used by the test suite and by the headless viewer to drive the engine
//! without a camera or GPU.

use crate::error::{Error, Result};
use crate::hit_test::DetectedSurface;
use crate::mesh::Mesh;
use crate::substrate::{
    AssetLoader, CatalogEntry, CatalogProvider, RenderInstance, RenderSink, SubstrateError,
    TrackingSubstrate,
};
use crate::transform::Transform;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// How the simulated capability check answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Supported,
    Unsupported,
    /// The check itself fails
    Rejected(String),
    /// The check never completes
    Hang,
}

/// Scriptable tracking substrate
#[derive(Debug)]
pub struct SimulatedSubstrate {
    tracking_api: bool,
    outcome: ProbeOutcome,
    probes: AtomicU32,
    surfaces: Vec<DetectedSurface>,
    pose: Option<Transform>,
    running: bool,
    sessions_started: u32,
    start_failure: Option<String>,
}

impl SimulatedSubstrate {
    pub fn new(outcome: ProbeOutcome) -> Self {
        Self {
            tracking_api: true,
            outcome,
            probes: AtomicU32::new(0),
            surfaces: Vec::new(),
            pose: None,
            running: false,
            sessions_started: 0,
            start_failure: None,
        }
    }

    /// Environment with no tracking API at all
    pub fn without_tracking_api() -> Self {
        Self {
            tracking_api: false,
            ..Self::new(ProbeOutcome::Unsupported)
        }
    }

    pub fn with_surfaces(mut self, surfaces: Vec<DetectedSurface>) -> Self {
        self.surfaces = surfaces;
        self
    }

    pub fn add_surface(&mut self, surface: DetectedSurface) {
        self.surfaces.push(surface);
    }

    pub fn clear_surfaces(&mut self) {
        self.surfaces.clear();
    }

    /// Set the device pose reported while the session runs
    pub fn set_pose(&mut self, pose: Option<Transform>) {
        self.pose = pose;
    }

    /// Make the next `start_session` fail with `message`
    pub fn fail_next_start(&mut self, message: impl Into<String>) {
        self.start_failure = Some(message.into());
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn sessions_started(&self) -> u32 {
        self.sessions_started
    }

    /// Number of times the capability check was actually performed
    pub fn probe_count(&self) -> u32 {
        self.probes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TrackingSubstrate for SimulatedSubstrate {
    fn has_tracking_api(&self) -> bool {
        self.tracking_api
    }

    async fn is_session_supported(&self) -> std::result::Result<bool, SubstrateError> {
        self.probes.fetch_add(1, Ordering::Relaxed);
        match &self.outcome {
            ProbeOutcome::Supported => Ok(true),
            ProbeOutcome::Unsupported => Ok(false),
            ProbeOutcome::Rejected(reason) => Err(SubstrateError::new(reason.clone())),
            ProbeOutcome::Hang => std::future::pending().await,
        }
    }

    fn start_session(&mut self) -> std::result::Result<(), SubstrateError> {
        if let Some(message) = self.start_failure.take() {
            return Err(SubstrateError(message));
        }
        self.running = true;
        self.sessions_started += 1;
        Ok(())
    }

    fn end_session(&mut self) {
        self.running = false;
    }

    fn device_pose(&self) -> Option<Transform> {
        self.pose.filter(|_| self.running)
    }

    fn detected_surfaces(&self) -> &[DetectedSurface] {
        if self.running {
            self.surfaces.as_slice()
        } else {
            &[]
        }
    }
}

/// Everything drawn during one tick
#[derive(Debug, Clone, Default)]
pub struct RecordedFrame {
    pub frame: u64,
    pub instances: Vec<RenderInstance>,
}

/// Render sink that keeps every draw call
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    frames: Vec<RecordedFrame>,
}

impl RecordingRenderer {
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }
}

impl RenderSink for RecordingRenderer {
    fn begin_frame(&mut self, frame: u64) {
        self.frames.push(RecordedFrame {
            frame,
            instances: Vec::new(),
        });
    }

    fn draw(&mut self, instance: &RenderInstance) {
        if let Some(frame) = self.frames.last_mut() {
            frame.instances.push(instance.clone());
        }
    }
}

/// Asset loader serving meshes from memory
#[derive(Debug, Default)]
pub struct MemoryAssetLoader {
    meshes: HashMap<String, Mesh>,
    loads: AtomicU32,
}

impl MemoryAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mut self, locator: impl Into<String>, mesh: Mesh) -> Self {
        self.meshes.insert(locator.into(), mesh);
        self
    }

    /// Number of `load` calls served or rejected
    pub fn load_count(&self) -> u32 {
        self.loads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AssetLoader for MemoryAssetLoader {
    async fn load(&self, locator: &str) -> Result<Mesh> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.meshes
            .get(locator)
            .cloned()
            .ok_or_else(|| Error::asset_load(locator, "no such asset"))
    }
}

/// Fixed catalog, optionally failing every call
#[derive(Debug, Default)]
pub struct StaticCatalog {
    entries: Vec<CatalogEntry>,
    failure: Option<String>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            failure: Some(message.into()),
        }
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(Error::Catalog(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalog {
    async fn list(&self) -> Result<Vec<CatalogEntry>> {
        self.check()?;
        Ok(self.entries.clone())
    }

    async fn refresh(&self) -> Result<()> {
        self.check()
    }
}
