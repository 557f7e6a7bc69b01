//! Session orchestration
//!
//! [`SessionOrchestrator`] owns the single tracking session, the anchored
//! objects placed in it, and the cache of loaded assets. It is driven from
//! one render-tick loop:
//!
//! - [`tick`](SessionOrchestrator::tick) runs the hit test for objects that
//!   are still tracking and draws every anchored object;
//! - gestures ([`handle_gesture`](SessionOrchestrator::handle_gesture)) are
//!   applied synchronously and show up in the next tick;
//! - model loads are split into [`request_model`](SessionOrchestrator::request_model)
//!   (no borrow held while loading) and [`attach`](SessionOrchestrator::attach),
//!   which refuses models requested under a session that has since ended.
//!
//! Anchored objects live in an arena keyed by [`ObjectId`]; callers only
//! ever refer to them by id.

use crate::capability::{Capability, CapabilityDetector};
use crate::config::PlacementConfig;
use crate::error::{Error, Result};
use crate::hit_test::{DeviceRay, HitTestTracker};
use crate::mesh::Mesh;
use crate::normalize::{normalize, NormalizationParams};
use crate::placement::{PlacementMode, PlacementState};
use crate::substrate::{
    AssetLoader, CatalogEntry, CatalogProvider, RenderInstance, RenderSink, TrackingSubstrate,
};
use crate::transform::Transform;
use devices::Gesture;
use futures::future::BoxFuture;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identifies one tracking session; never reused within an orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Stable handle to an anchored object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "object-{}", self.0)
    }
}

/// Geometry and normalization shared by every placement of one asset
#[derive(Debug)]
struct LoadedAsset {
    locator: String,
    mesh: Arc<Mesh>,
    normalization: NormalizationParams,
}

enum PendingSource {
    Cached(Arc<LoadedAsset>),
    Loading(BoxFuture<'static, Result<Mesh>>),
}

/// A model load in flight, detached from the orchestrator
///
/// Await [`resolve`](Self::resolve) and hand the result to
/// [`SessionOrchestrator::attach`].
pub struct PendingModel {
    session: SessionId,
    entry: CatalogEntry,
    source: PendingSource,
}

impl PendingModel {
    /// Session the model was requested under
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    /// True if the asset was already loaded and no I/O will happen
    pub fn is_cached(&self) -> bool {
        matches!(self.source, PendingSource::Cached(_))
    }

    /// Finish loading and normalize the mesh
    pub async fn resolve(self) -> Result<LoadedModel> {
        let asset = match self.source {
            PendingSource::Cached(asset) => asset,
            PendingSource::Loading(load) => {
                let locator = self.entry.asset_locator.clone();
                let mesh = load.await?;
                if mesh.is_empty() {
                    return Err(Error::asset_load(locator, "asset contains no geometry"));
                }
                let normalization = normalize(&mesh);
                info!(
                    model = %self.entry.id,
                    vertices = mesh.vertex_count(),
                    scale = normalization.uniform_scale,
                    "model loaded"
                );
                Arc::new(LoadedAsset {
                    locator,
                    mesh: Arc::new(mesh),
                    normalization,
                })
            }
        };

        Ok(LoadedModel {
            session: self.session,
            entry: self.entry,
            asset,
        })
    }
}

impl std::fmt::Debug for PendingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingModel")
            .field("session", &self.session)
            .field("entry", &self.entry)
            .field("cached", &self.is_cached())
            .finish()
    }
}

/// A loaded, normalized model waiting to be attached
#[derive(Debug)]
pub struct LoadedModel {
    session: SessionId,
    entry: CatalogEntry,
    asset: Arc<LoadedAsset>,
}

impl LoadedModel {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.asset.mesh
    }

    pub fn normalization(&self) -> NormalizationParams {
        self.asset.normalization
    }
}

#[derive(Debug)]
struct AnchoredObject {
    model_id: String,
    asset: Arc<LoadedAsset>,
    placement: PlacementState,
}

/// What one call to [`SessionOrchestrator::tick`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub frame: u64,
    /// `None` when no session was active and nothing happened
    pub session: Option<SessionId>,
    /// Whether a hit test ran this tick
    pub hit_tested: bool,
    pub hit: Option<Transform>,
    /// Objects whose transform followed the hit
    pub updated: usize,
    pub drawn: usize,
}

impl TickReport {
    fn idle(frame: u64) -> Self {
        Self {
            frame,
            session: None,
            hit_tested: false,
            hit: None,
            updated: 0,
            drawn: 0,
        }
    }
}

/// Owns the tracking session and every anchored object in it
pub struct SessionOrchestrator<S, R> {
    config: PlacementConfig,
    capability: CapabilityDetector,
    tracker: HitTestTracker,
    substrate: S,
    renderer: R,
    loader: Arc<dyn AssetLoader>,
    catalog: Box<dyn CatalogProvider>,
    entries: Vec<CatalogEntry>,
    assets: HashMap<String, Arc<LoadedAsset>>,
    session: Option<SessionId>,
    sessions_started: u64,
    objects: BTreeMap<ObjectId, AnchoredObject>,
    next_object: u64,
    selected: Option<ObjectId>,
    last_hit: Option<Transform>,
    frame: u64,
}

impl<S, R> SessionOrchestrator<S, R>
where
    S: TrackingSubstrate,
    R: RenderSink,
{
    pub fn new(
        config: PlacementConfig,
        substrate: S,
        renderer: R,
        loader: Arc<dyn AssetLoader>,
        catalog: Box<dyn CatalogProvider>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            capability: CapabilityDetector::new(config.probe_timeout()),
            tracker: HitTestTracker::from_config(&config),
            config,
            substrate,
            renderer,
            loader,
            catalog,
            entries: Vec::new(),
            assets: HashMap::new(),
            session: None,
            sessions_started: 0,
            objects: BTreeMap::new(),
            next_object: 0,
            selected: None,
            last_hit: None,
            frame: 0,
        })
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    // ------------------------------------------------------------------
    // Capability and session lifecycle
    // ------------------------------------------------------------------

    /// Run (or reuse) the capability probe
    pub async fn resolve_capability(&self) -> Capability {
        self.capability.probe(&self.substrate).await
    }

    /// Capability as known right now; `Unknown` until the probe resolves
    pub fn capability(&self) -> Capability {
        self.capability.current()
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.session
    }

    /// Open a tracking session
    ///
    /// Rejected with [`Error::SessionConflict`] while a session is running,
    /// and with [`Error::TrackingUnavailable`] unless the capability probe
    /// has resolved to supported.
    pub fn start_session(&mut self) -> Result<SessionId> {
        if let Some(active) = self.session {
            warn!(%active, "session start rejected, a session is already active");
            return Err(Error::SessionConflict { active });
        }

        let capability = self.capability.current();
        if !capability.is_supported() {
            info!(%capability, "session start skipped, AR tracking unavailable");
            return Err(Error::TrackingUnavailable(capability));
        }

        self.substrate.start_session()?;

        self.sessions_started += 1;
        let id = SessionId(self.sessions_started);
        self.session = Some(id);
        self.last_hit = None;
        info!(session = %id, "tracking session started");
        Ok(id)
    }

    /// End the active session, dropping every anchored object
    ///
    /// Returns the id of the session that was stopped, `None` if there was
    /// none. No tracking data is read after this returns.
    pub fn stop_session(&mut self) -> Option<SessionId> {
        let id = self.session.take()?;
        self.substrate.end_session();

        let dropped = self.objects.len();
        self.objects.clear();
        self.selected = None;
        self.last_hit = None;

        info!(session = %id, dropped, "tracking session stopped");
        Some(id)
    }

    // ------------------------------------------------------------------
    // Catalog and model loading
    // ------------------------------------------------------------------

    /// Re-read the catalog and return the current entries
    pub async fn refresh_catalog(&mut self) -> Result<&[CatalogEntry]> {
        let listed = match self.catalog.refresh().await {
            Ok(()) => self.catalog.list().await,
            Err(err) => Err(err),
        };

        match listed {
            Ok(entries) => {
                debug!(count = entries.len(), "catalog refreshed");
                self.entries = entries;
                Ok(&self.entries)
            }
            Err(err) => {
                warn!(error = %err, "catalog refresh failed");
                Err(err)
            }
        }
    }

    /// Entries from the last successful catalog refresh
    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Start loading a catalog model for placement in the active session
    ///
    /// The returned future does not borrow the orchestrator. Assets loaded
    /// before are served from the cache.
    pub fn request_model(&self, model_id: &str) -> Result<PendingModel> {
        let session = self.session.ok_or(Error::NoActiveSession)?;
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.id == model_id)
            .cloned()
            .ok_or_else(|| Error::UnknownModel(model_id.to_string()))?;

        let source = match self.assets.get(&entry.asset_locator) {
            Some(asset) => {
                debug!(model = %entry.id, "asset served from cache");
                PendingSource::Cached(Arc::clone(asset))
            }
            None => {
                let loader = Arc::clone(&self.loader);
                let locator = entry.asset_locator.clone();
                debug!(model = %entry.id, %locator, "loading asset");
                PendingSource::Loading(Box::pin(async move { loader.load(&locator).await }))
            }
        };

        Ok(PendingModel {
            session,
            entry,
            source,
        })
    }

    /// Anchor a loaded model in the session it was requested under
    ///
    /// The new object starts tracking from the last known hit (identity if
    /// there is none) and becomes the selected object.
    pub fn attach(&mut self, loaded: LoadedModel) -> Result<ObjectId> {
        if self.session != Some(loaded.session) {
            warn!(
                session = %loaded.session,
                model = %loaded.entry.id,
                "discarding model loaded for an ended session"
            );
            return Err(Error::SessionEnded(loaded.session));
        }

        let asset = Arc::clone(
            self.assets
                .entry(loaded.asset.locator.clone())
                .or_insert(loaded.asset),
        );

        self.next_object += 1;
        let id = ObjectId(self.next_object);
        let initial = self.last_hit.unwrap_or(Transform::IDENTITY);
        self.objects.insert(
            id,
            AnchoredObject {
                model_id: loaded.entry.id.clone(),
                asset,
                placement: PlacementState::new(initial),
            },
        );
        self.selected = Some(id);

        info!(object = %id, model = %loaded.entry.id, "model anchored, tracking");
        Ok(id)
    }

    /// Request, load and attach in one step
    pub async fn place_model(&mut self, model_id: &str) -> Result<ObjectId> {
        let pending = self.request_model(model_id)?;
        let loaded = pending.resolve().await.map_err(|err| {
            warn!(model = model_id, error = %err, "model load failed");
            err
        })?;
        self.attach(loaded)
    }

    // ------------------------------------------------------------------
    // Anchored objects
    // ------------------------------------------------------------------

    pub fn placement(&self, id: ObjectId) -> Option<&PlacementState> {
        self.objects.get(&id).map(|object| &object.placement)
    }

    /// Catalog id of the model behind an anchored object
    pub fn model_id(&self, id: ObjectId) -> Option<&str> {
        self.objects.get(&id).map(|object| object.model_id.as_str())
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &PlacementState)> {
        self.objects
            .iter()
            .map(|(id, object)| (*id, &object.placement))
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    /// Make `id` the target of subsequent gestures
    pub fn select(&mut self, id: ObjectId) -> Result<()> {
        if !self.objects.contains_key(&id) {
            return Err(Error::UnknownObject(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    /// Deselect and destroy an anchored object
    pub fn remove_object(&mut self, id: ObjectId) -> Result<()> {
        self.objects.remove(&id).ok_or(Error::UnknownObject(id))?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        debug!(object = %id, "anchored object removed");
        Ok(())
    }

    /// Freeze an object where it is; false if it was already placed
    pub fn confirm(&mut self, id: ObjectId) -> Result<bool> {
        let object = self.objects.get_mut(&id).ok_or(Error::UnknownObject(id))?;
        let changed = object.placement.confirm();
        if changed {
            info!(object = %id, transform = ?object.placement.current_transform(), "placement confirmed");
        }
        Ok(changed)
    }

    /// Let an object follow hits again; false if it was already tracking
    pub fn release(&mut self, id: ObjectId) -> Result<bool> {
        let object = self.objects.get_mut(&id).ok_or(Error::UnknownObject(id))?;
        let changed = object.placement.release();
        if changed {
            info!(object = %id, "placement released for repositioning");
        }
        Ok(changed)
    }

    /// Route the select gesture: confirm while tracking, release while placed
    pub fn handle_select(&mut self) -> Option<PlacementMode> {
        let id = self.selected?;
        let mode = self.objects.get(&id)?.placement.mode();
        let result = match mode {
            PlacementMode::Tracking => self.confirm(id),
            PlacementMode::Placed => self.release(id),
        };
        result.ok()?;
        self.placement(id).map(PlacementState::mode)
    }

    /// Apply a gesture to the selected object
    ///
    /// Returns the object's mode afterwards, or `None` when there is no
    /// active session or no selected object.
    pub fn handle_gesture(&mut self, gesture: Gesture) -> Option<PlacementMode> {
        self.session?;

        match gesture {
            Gesture::Select => self.handle_select(),
            Gesture::Pinch { factor } => {
                let object = self.objects.get_mut(&self.selected?)?;
                let scale =
                    object
                        .placement
                        .scale_by(factor, self.config.min_scale, self.config.max_scale);
                debug!(scale, "user scale adjusted");
                Some(object.placement.mode())
            }
            Gesture::Twist { radians } => {
                let object = self.objects.get_mut(&self.selected?)?;
                let yaw = object.placement.rotate_by(radians);
                debug!(yaw, "user yaw adjusted");
                Some(object.placement.mode())
            }
        }
    }

    // ------------------------------------------------------------------
    // Render tick
    // ------------------------------------------------------------------

    /// Last hit seen in the current session
    pub fn last_hit(&self) -> Option<Transform> {
        self.last_hit
    }

    /// One unit of render-loop work: hit test, state update, draw
    pub fn tick(&mut self) -> TickReport {
        let Some(session) = self.session else {
            return TickReport::idle(self.frame);
        };

        self.frame += 1;
        let mut report = TickReport {
            session: Some(session),
            ..TickReport::idle(self.frame)
        };

        if self.objects.values().any(|object| object.placement.is_tracking()) {
            let hit = self.substrate.device_pose().and_then(|pose| {
                self.tracker
                    .on_frame(&DeviceRay::from_pose(&pose), self.substrate.detected_surfaces())
            });

            report.hit_tested = true;
            report.hit = hit;
            if hit.is_some() {
                self.last_hit = hit;
            }

            for object in self.objects.values_mut() {
                if object.placement.on_hit(hit) {
                    report.updated += 1;
                }
            }
        }

        self.renderer.begin_frame(self.frame);
        for (id, object) in &self.objects {
            let instance = RenderInstance {
                object: *id,
                mesh: Arc::clone(&object.asset.mesh),
                model_matrix: object.placement.model_matrix(&object.asset.normalization),
                mode: object.placement.mode(),
            };
            self.renderer.draw(&instance);
            report.drawn += 1;
        }
        self.renderer.end_frame();

        report
    }
}
