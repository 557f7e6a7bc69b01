//! Engine configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for hit testing, user adjustments and the capability probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Smallest user scale a pinch can reach
    pub min_scale: f32,
    /// Largest user scale a pinch can reach
    pub max_scale: f32,
    /// Hits further than this along the device ray are ignored (meters)
    pub max_hit_distance: f32,
    /// Only accept surfaces facing roughly upward (floors, tables)
    pub horizontal_only: bool,
    /// Largest angle between a surface normal and world up when
    /// `horizontal_only` is set, in degrees
    pub max_surface_tilt_deg: f32,
    /// A capability probe still pending after this long resolves to unsupported
    pub probe_timeout_ms: u64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 10.0,
            max_hit_distance: 20.0,
            horizontal_only: true,
            max_surface_tilt_deg: 25.0,
            probe_timeout_ms: 5_000,
        }
    }
}

impl PlacementConfig {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.min_scale > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "min_scale must be > 0, got {}",
                self.min_scale
            )));
        }
        if self.max_scale < self.min_scale {
            return Err(Error::InvalidConfig(format!(
                "max_scale ({}) must be >= min_scale ({})",
                self.max_scale, self.min_scale
            )));
        }
        if !(self.max_hit_distance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max_hit_distance must be > 0, got {}",
                self.max_hit_distance
            )));
        }
        if !(0.0..=90.0).contains(&self.max_surface_tilt_deg) {
            return Err(Error::InvalidConfig(format!(
                "max_surface_tilt_deg must be within 0..=90, got {}",
                self.max_surface_tilt_deg
            )));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Clamp a user scale into the configured range
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}
