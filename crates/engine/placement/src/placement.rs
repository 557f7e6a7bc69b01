//! Placement state machine for one anchored object
//!
//! ```text
//!            hit / no hit (transform follows hits, kept on miss)
//!              +-----+
//!              v     |
//!          +----------+   confirm    +--------+
//!  new --> | Tracking | -----------> | Placed |
//!          +----------+ <----------- +--------+
//!                         release
//! ```
//!
//! While `Placed` the transform is frozen. On `release` it stays where it
//! was until the next valid hit arrives, so the model does not jump.
//!
//! User adjustments (pinch scale, twist yaw) are kept apart from the hit
//! transform and only meet it when the render matrix is composed.

use crate::normalize::NormalizationParams;
use crate::transform::Transform;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Placement mode of an anchored object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Following the surface hit under the device
    Tracking,
    /// Frozen where the user confirmed it
    Placed,
}

impl std::fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tracking => write!(f, "tracking"),
            Self::Placed => write!(f, "placed"),
        }
    }
}

/// Lifecycle state of one anchored object
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementState {
    mode: PlacementMode,
    transform: Transform,
    user_scale: f32,
    user_yaw: f32,
}

impl PlacementState {
    /// Start tracking from `initial` (identity or the last known hit)
    pub fn new(initial: Transform) -> Self {
        Self {
            mode: PlacementMode::Tracking,
            transform: initial,
            user_scale: 1.0,
            user_yaw: 0.0,
        }
    }

    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    pub fn is_tracking(&self) -> bool {
        self.mode == PlacementMode::Tracking
    }

    pub fn current_transform(&self) -> Transform {
        self.transform
    }

    /// Feed one frame's hit-test result
    ///
    /// Returns true if the transform changed. Misses and any input while
    /// `Placed` leave the transform alone.
    pub fn on_hit(&mut self, hit: Option<Transform>) -> bool {
        match (self.mode, hit) {
            (PlacementMode::Tracking, Some(transform)) => {
                self.transform = transform;
                true
            }
            _ => false,
        }
    }

    /// Freeze at the current transform. No-op when already placed.
    pub fn confirm(&mut self) -> bool {
        self.transition(PlacementMode::Placed)
    }

    /// Resume tracking from the frozen transform. No-op when tracking.
    pub fn release(&mut self) -> bool {
        self.transition(PlacementMode::Tracking)
    }

    /// Select gesture: confirm while tracking, release while placed
    pub fn toggle(&mut self) -> PlacementMode {
        match self.mode {
            PlacementMode::Tracking => self.confirm(),
            PlacementMode::Placed => self.release(),
        };
        self.mode
    }

    pub fn user_scale(&self) -> f32 {
        self.user_scale
    }

    pub fn user_yaw(&self) -> f32 {
        self.user_yaw
    }

    /// Multiply the user scale, keeping it within `[min, max]`
    pub fn scale_by(&mut self, factor: f32, min: f32, max: f32) -> f32 {
        if factor.is_finite() && factor > 0.0 {
            self.user_scale = (self.user_scale * factor).clamp(min, max);
        }
        self.user_scale
    }

    /// Rotate about the surface normal
    pub fn rotate_by(&mut self, radians: f32) -> f32 {
        if radians.is_finite() {
            self.user_yaw = (self.user_yaw + radians).rem_euclid(std::f32::consts::TAU);
        }
        self.user_yaw
    }

    /// Model matrix: placement * yaw * user scale * normalization
    pub fn model_matrix(&self, normalization: &NormalizationParams) -> Mat4 {
        self.transform.to_mat4()
            * Mat4::from_scale_rotation_translation(
                Vec3::splat(self.user_scale),
                Quat::from_rotation_y(self.user_yaw),
                Vec3::ZERO,
            )
            * normalization.to_mat4()
    }

    fn transition(&mut self, to: PlacementMode) -> bool {
        if self.mode == to {
            return false;
        }
        self.mode = to;
        true
    }
}

impl Default for PlacementState {
    fn default() -> Self {
        Self::new(Transform::IDENTITY)
    }
}
