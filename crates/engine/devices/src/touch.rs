//! Touch input support
//!
//! Tracks the fingers currently on screen so the gesture layer can derive
//! taps, pinches and twists. Times are seconds on the caller's clock; only
//! differences are ever used.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Touch event phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchPhase {
    /// A finger touched the screen
    Started,
    /// A finger moved on the screen
    Moved,
    /// A finger was lifted from the screen
    Ended,
    /// The touch was cancelled (e.g., by a system dialog)
    Cancelled,
}

/// A single touch point
#[derive(Debug, Clone, Copy)]
pub struct TouchPoint {
    /// Unique identifier for this touch (for multi-touch tracking)
    pub id: u64,
    /// Current position of the touch in window coordinates
    pub position: Vec2,
    /// Position reported by the previous event for this touch
    pub previous_position: Vec2,
    /// Where the finger first landed
    pub start_position: Vec2,
    /// The phase of this touch event
    pub phase: TouchPhase,
    /// Event time in seconds
    pub time: f64,
    /// Time the finger first landed
    pub started_at: f64,
}

impl TouchPoint {
    /// Create a new touch point
    pub fn new(id: u64, position: Vec2, phase: TouchPhase, time: f64) -> Self {
        Self {
            id,
            position,
            previous_position: position,
            start_position: position,
            phase,
            time,
            started_at: time,
        }
    }

    /// Get the delta movement since the last update
    pub fn delta(&self) -> Vec2 {
        self.position - self.previous_position
    }

    /// Total distance travelled from the landing point
    pub fn travel(&self) -> f32 {
        self.position.distance(self.start_position)
    }

    /// Seconds the finger has been down
    pub fn duration(&self) -> f64 {
        self.time - self.started_at
    }
}

/// Touch state tracker for multi-touch input
///
/// Tracks all active touch points and provides query methods.
#[derive(Debug, Clone, Default)]
pub struct TouchState {
    /// Currently active touch points
    touches: Vec<TouchPoint>,
    /// Maximum number of simultaneous touches seen since the last clear
    max_touches: usize,
}

impl TouchState {
    /// Create a new empty touch state
    pub fn new() -> Self {
        Self::default()
    }

    /// Update touch state with a new touch event
    ///
    /// Returns the completed touch (with its full history) when the event
    /// ends or cancels a tracked touch.
    pub fn update_touch(&mut self, touch: TouchPoint) -> Option<TouchPoint> {
        match touch.phase {
            TouchPhase::Started => {
                self.touches.retain(|t| t.id != touch.id);
                if self.touches.is_empty() {
                    self.max_touches = 0;
                }
                self.touches.push(touch);
                self.max_touches = self.max_touches.max(self.touches.len());
                None
            }
            TouchPhase::Moved => {
                if let Some(existing) = self.touches.iter_mut().find(|t| t.id == touch.id) {
                    existing.previous_position = existing.position;
                    existing.position = touch.position;
                    existing.time = touch.time;
                    existing.phase = TouchPhase::Moved;
                }
                None
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                let index = self.touches.iter().position(|t| t.id == touch.id)?;
                let mut finished = self.touches.remove(index);
                finished.previous_position = finished.position;
                finished.position = touch.position;
                finished.time = touch.time;
                finished.phase = touch.phase;
                Some(finished)
            }
        }
    }

    /// Get all currently active touch points
    pub fn touches(&self) -> &[TouchPoint] {
        &self.touches
    }

    /// Get a specific touch point by ID
    pub fn get_touch(&self, id: u64) -> Option<&TouchPoint> {
        self.touches.iter().find(|t| t.id == id)
    }

    /// Get the number of currently active touches
    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    /// Check if there are any active touches
    pub fn is_touching(&self) -> bool {
        !self.touches.is_empty()
    }

    /// Calculate the center point of all active touches
    pub fn center(&self) -> Option<Vec2> {
        if self.touches.is_empty() {
            return None;
        }

        let sum: Vec2 = self.touches.iter().map(|t| t.position).sum();
        Some(sum / self.touches.len() as f32)
    }

    /// Vector from the first finger to the second
    ///
    /// Returns Some only while exactly two touches are active. Pinch and
    /// twist are measured by comparing spans over time.
    pub fn pair_span(&self) -> Option<Vec2> {
        let (t0, t1) = self.pair()?;
        Some(t1.position - t0.position)
    }

    /// Clear all touch state
    pub fn clear(&mut self) {
        self.touches.clear();
        self.max_touches = 0;
    }

    /// Get the maximum number of simultaneous touches in the current contact
    pub fn max_touches_recorded(&self) -> usize {
        self.max_touches
    }

    fn pair(&self) -> Option<(&TouchPoint, &TouchPoint)> {
        match self.touches.as_slice() {
            [t0, t1] => Some((t0, t1)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_point_delta() {
        let mut touch = TouchPoint::new(1, Vec2::new(100.0, 100.0), TouchPhase::Started, 0.0);
        assert_eq!(touch.delta(), Vec2::ZERO);

        touch.previous_position = touch.position;
        touch.position = Vec2::new(150.0, 120.0);
        assert_eq!(touch.delta(), Vec2::new(50.0, 20.0));
    }

    #[test]
    fn test_touch_state_lifecycle() {
        let mut state = TouchState::new();
        assert!(!state.is_touching());

        state.update_touch(TouchPoint::new(
            1,
            Vec2::new(100.0, 100.0),
            TouchPhase::Started,
            0.0,
        ));
        assert!(state.is_touching());
        assert_eq!(state.touch_count(), 1);

        state.update_touch(TouchPoint::new(
            1,
            Vec2::new(150.0, 150.0),
            TouchPhase::Moved,
            0.1,
        ));
        assert_eq!(state.touch_count(), 1);
        assert_eq!(state.get_touch(1).unwrap().delta(), Vec2::new(50.0, 50.0));

        let finished = state
            .update_touch(TouchPoint::new(
                1,
                Vec2::new(150.0, 150.0),
                TouchPhase::Ended,
                0.25,
            ))
            .unwrap();
        assert!(!state.is_touching());
        assert!((finished.duration() - 0.25).abs() < 1e-9);
        assert!((finished.travel() - 50.0 * 2f32.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_ending_unknown_touch_is_ignored() {
        let mut state = TouchState::new();
        let ended = state.update_touch(TouchPoint::new(9, Vec2::ZERO, TouchPhase::Ended, 0.0));
        assert!(ended.is_none());
    }

    #[test]
    fn test_multi_touch() {
        let mut state = TouchState::new();

        state.update_touch(TouchPoint::new(1, Vec2::new(100.0, 100.0), TouchPhase::Started, 0.0));
        state.update_touch(TouchPoint::new(2, Vec2::new(200.0, 200.0), TouchPhase::Started, 0.0));

        assert_eq!(state.touch_count(), 2);
        assert_eq!(state.max_touches_recorded(), 2);

        let center = state.center().unwrap();
        assert_eq!(center, Vec2::new(150.0, 150.0));
    }

    #[test]
    fn test_pair_span() {
        let mut state = TouchState::new();

        state.update_touch(TouchPoint::new(1, Vec2::new(100.0, 100.0), TouchPhase::Started, 0.0));
        assert!(state.pair_span().is_none());

        state.update_touch(TouchPoint::new(2, Vec2::new(200.0, 100.0), TouchPhase::Started, 0.0));
        assert_eq!(state.pair_span(), Some(Vec2::new(100.0, 0.0)));

        state.update_touch(TouchPoint::new(1, Vec2::new(100.0, 50.0), TouchPhase::Moved, 0.1));
        assert_eq!(state.pair_span(), Some(Vec2::new(100.0, 50.0)));

        state.update_touch(TouchPoint::new(3, Vec2::ZERO, TouchPhase::Started, 0.2));
        assert!(state.pair_span().is_none());
    }
}
