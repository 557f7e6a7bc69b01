//! Render sink that reports draw calls through tracing

use placement::{ObjectId, PlacementMode, RenderInstance, RenderSink};
use std::collections::HashMap;
use tracing::{debug, info, trace};

/// Headless stand-in for a GPU renderer
///
/// Logs a line whenever an object's placement mode changes and keeps
/// counters for the run summary.
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
    instances: u64,
    current_frame: u64,
    modes: HashMap<ObjectId, PlacementMode>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames begun so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Instances drawn across all frames
    pub fn instances(&self) -> u64 {
        self.instances
    }
}

impl RenderSink for LogRenderer {
    fn begin_frame(&mut self, frame: u64) {
        self.frames += 1;
        self.current_frame = frame;
    }

    fn draw(&mut self, instance: &RenderInstance) {
        self.instances += 1;

        let previous = self.modes.insert(instance.object, instance.mode);
        if previous != Some(instance.mode) {
            let (_, _, translation) = instance.model_matrix.to_scale_rotation_translation();
            info!(
                frame = self.current_frame,
                object = %instance.object,
                mode = %instance.mode,
                position = ?translation,
                "object mode"
            );
        }

        trace!(
            object = %instance.object,
            mesh = %instance.mesh.name,
            matrix = ?instance.model_matrix,
            "draw"
        );
    }

    fn end_frame(&mut self) {
        if self.current_frame % 60 == 0 {
            debug!(frame = self.current_frame, drawn = self.instances, "frame");
        }
    }
}

