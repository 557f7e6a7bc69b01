//! Headless AR placement viewer
//!
//! Drives the placement engine through a simulated tracking substrate so a
//! scene can be exercised without a camera: the device follows a scripted
//! path, the user's taps and pinches are replayed as touch events, and draw
//! calls are reported through `tracing`.
//!
//! # Modules
//!
//! - [`config`]: KDL scene files
//! - [`script`]: Device path and touch replay
//! - [`renderer`]: Logging render sink
//! - [`app`]: The run loop

pub mod app;
pub mod config;
pub mod renderer;
pub mod script;

pub use app::{run, RunSummary};
pub use config::{CapabilityScript, ConfigError, SceneConfig};
