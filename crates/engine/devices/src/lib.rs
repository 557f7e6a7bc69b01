//! Touch input abstractions for the AR viewer
//!
//! This crate turns raw touch events into the small set of gestures the
//! placement engine understands.
//!
//! # Modules
//!
//! - [`touch`]: Multi-touch state tracking
//! - [`gesture`]: Tap / pinch / twist recognition on top of [`touch`]

pub mod gesture;
pub mod touch;

// Re-export commonly used types at crate root
pub use gesture::{Gesture, GestureConfig, GestureRecognizer};
pub use touch::{TouchPhase, TouchPoint, TouchState};
