//! AR placement engine
//!
//! Anchors an imported model onto a real-world surface detected by a camera
//! tracking session. The engine owns no rendering or tracking code of its
//! own; it drives a [`TrackingSubstrate`] and hands composed transforms to a
//! [`RenderSink`].
//!
//! # Modules
//!
//! - [`capability`]: One-shot, cached probe for AR session support
//! - [`normalize`]: Centering offset and uniform scale for arbitrary meshes
//! - [`hit_test`]: Per-frame ray casts against detected surfaces
//! - [`placement`]: Tracking / Placed state machine for one anchored object
//! - [`session`]: Orchestrator tying the above into a render-tick loop
//! - [`substrate`]: Traits for the tracking, rendering, asset and catalog layers
//! - [`sim`]: In-memory substrate used by tests and the headless viewer
//!
//! # Render tick
//!
//! ```ignore
//! let mut orchestrator = SessionOrchestrator::new(config, substrate, renderer, loader, catalog)?;
//! if orchestrator.resolve_capability().await == Capability::Supported {
//!     orchestrator.start_session()?;
//!     orchestrator.refresh_catalog().await?;
//!     let id = orchestrator.place_model("chair").await?;
//!     loop {
//!         orchestrator.tick();
//!         // user taps -> orchestrator.handle_gesture(Gesture::Select)
//!     }
//! }
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod mesh;
pub mod normalize;
pub mod placement;
pub mod session;
pub mod sim;
pub mod substrate;
pub mod transform;

pub use capability::{Capability, CapabilityDetector};
pub use config::PlacementConfig;
pub use error::{Error, Result};
pub use hit_test::{DetectedSurface, DeviceRay, HitTestTracker, SurfaceHit};
pub use mesh::{Aabb, Mesh, MeshPrimitive};
pub use normalize::{normalize, NormalizationParams};
pub use placement::{PlacementMode, PlacementState};
pub use session::{
    LoadedModel, ObjectId, PendingModel, SessionId, SessionOrchestrator, TickReport,
};
pub use substrate::{
    AssetLoader, CatalogEntry, CatalogProvider, RenderInstance, RenderSink, SubstrateError,
    TrackingSubstrate,
};
pub use transform::Transform;

// Re-export so callers can route input without a direct devices dependency
pub use devices::Gesture;
