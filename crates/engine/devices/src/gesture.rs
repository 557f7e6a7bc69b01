//! Gesture recognition
//!
//! Turns raw [`TouchPoint`] events into the gestures an AR viewer reacts to:
//! a quick single-finger tap selects, two fingers pinch to scale and twist to
//! rotate.

use crate::touch::{TouchPhase, TouchPoint, TouchState};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// High level gesture produced from touch input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gesture {
    /// Single quick tap (the XR "select" action)
    Select,
    /// Two-finger pinch; `factor` > 1.0 when fingers move apart
    Pinch { factor: f32 },
    /// Two-finger rotation in radians, counter-clockwise positive
    Twist { radians: f32 },
}

/// Thresholds for gesture classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Longest contact still treated as a tap, in seconds
    pub max_tap_seconds: f64,
    /// Furthest a finger may drift during a tap, in pixels
    pub max_tap_travel: f32,
    /// Pinch factors closer to 1.0 than this are dropped
    pub pinch_deadzone: f32,
    /// Twists smaller than this (radians) are dropped
    pub twist_deadzone: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            max_tap_seconds: 0.3,
            max_tap_travel: 12.0,
            pinch_deadzone: 0.002,
            twist_deadzone: 0.001,
        }
    }
}

/// Finger spans shorter than this (pixels) carry no usable direction
const MIN_SPAN: f32 = 1e-3;

/// Stateful recognizer fed one touch event at a time
///
/// Pinch and twist are reported relative to the two-finger span at the last
/// emitted gesture, so fingers reporting in turn never count the same motion
/// twice and sub-deadzone motion accumulates until it is reported.
#[derive(Debug, Clone, Default)]
pub struct GestureRecognizer {
    config: GestureConfig,
    touches: TouchState,
    /// Finger distance at the last emitted pinch
    pinch_baseline: Option<f32>,
    /// Finger span at the last emitted twist
    twist_baseline: Option<Vec2>,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            touches: TouchState::new(),
            pinch_baseline: None,
            twist_baseline: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Current touch tracking state
    pub fn touches(&self) -> &TouchState {
        &self.touches
    }

    /// Process a touch event and return any gestures it completes
    pub fn handle(&mut self, event: TouchPoint) -> Vec<Gesture> {
        let mut gestures = Vec::new();

        match event.phase {
            TouchPhase::Started => {
                self.touches.update_touch(event);
                self.rebase();
            }
            TouchPhase::Moved => {
                self.touches.update_touch(event);
                if let Some(span) = self.touches.pair_span() {
                    self.pinch(span, &mut gestures);
                    self.twist(span, &mut gestures);
                }
            }
            TouchPhase::Ended => {
                let single_finger = self.touches.max_touches_recorded() == 1;
                if let Some(finished) = self.touches.update_touch(event) {
                    if single_finger && self.is_tap(&finished) {
                        gestures.push(Gesture::Select);
                    }
                }
                self.rebase();
            }
            TouchPhase::Cancelled => {
                self.touches.update_touch(event);
                self.rebase();
            }
        }

        gestures
    }

    /// Drop all tracked touches (e.g. when the viewer loses focus)
    pub fn reset(&mut self) {
        self.touches.clear();
        self.rebase();
    }

    /// Measure future pinches and twists from the current finger pair
    fn rebase(&mut self) {
        let span = self.touches.pair_span();
        self.pinch_baseline = span.map(Vec2::length);
        self.twist_baseline = span;
    }

    fn pinch(&mut self, span: Vec2, gestures: &mut Vec<Gesture>) {
        let distance = span.length();
        if distance <= MIN_SPAN {
            return;
        }

        match self.pinch_baseline {
            Some(baseline) if baseline > MIN_SPAN => {
                let factor = distance / baseline;
                if (factor - 1.0).abs() > self.config.pinch_deadzone {
                    gestures.push(Gesture::Pinch { factor });
                    self.pinch_baseline = Some(distance);
                }
            }
            _ => self.pinch_baseline = Some(distance),
        }
    }

    fn twist(&mut self, span: Vec2, gestures: &mut Vec<Gesture>) {
        if span.length() <= MIN_SPAN {
            return;
        }

        match self.twist_baseline {
            Some(baseline) if baseline.length() > MIN_SPAN => {
                let radians = baseline.angle_to(span);
                if radians.abs() > self.config.twist_deadzone {
                    gestures.push(Gesture::Twist { radians });
                    self.twist_baseline = Some(span);
                }
            }
            _ => self.twist_baseline = Some(span),
        }
    }

    fn is_tap(&self, touch: &TouchPoint) -> bool {
        touch.duration() <= self.config.max_tap_seconds
            && touch.travel() <= self.config.max_tap_travel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: u64, x: f32, y: f32, phase: TouchPhase, time: f64) -> TouchPoint {
        TouchPoint::new(id, Vec2::new(x, y), phase, time)
    }

    #[test]
    fn test_quick_tap_selects() {
        let mut recognizer = GestureRecognizer::default();
        assert!(recognizer
            .handle(event(1, 10.0, 10.0, TouchPhase::Started, 0.0))
            .is_empty());
        let gestures = recognizer.handle(event(1, 12.0, 11.0, TouchPhase::Ended, 0.1));
        assert_eq!(gestures, vec![Gesture::Select]);
    }

    #[test]
    fn test_long_press_is_not_a_tap() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.handle(event(1, 10.0, 10.0, TouchPhase::Started, 0.0));
        let gestures = recognizer.handle(event(1, 10.0, 10.0, TouchPhase::Ended, 1.5));
        assert!(gestures.is_empty());
    }

    #[test]
    fn test_drag_is_not_a_tap() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.handle(event(1, 10.0, 10.0, TouchPhase::Started, 0.0));
        recognizer.handle(event(1, 80.0, 10.0, TouchPhase::Moved, 0.05));
        let gestures = recognizer.handle(event(1, 80.0, 10.0, TouchPhase::Ended, 0.1));
        assert!(gestures.is_empty());
    }

    #[test]
    fn test_cancelled_touch_never_selects() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.handle(event(1, 10.0, 10.0, TouchPhase::Started, 0.0));
        let gestures = recognizer.handle(event(1, 10.0, 10.0, TouchPhase::Cancelled, 0.05));
        assert!(gestures.is_empty());
        assert!(!recognizer.touches().is_touching());
    }

    #[test]
    fn test_pinch_emits_factor_and_suppresses_tap() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.handle(event(1, 100.0, 100.0, TouchPhase::Started, 0.0));
        recognizer.handle(event(2, 200.0, 100.0, TouchPhase::Started, 0.0));

        let gestures = recognizer.handle(event(2, 250.0, 100.0, TouchPhase::Moved, 0.05));
        match gestures.as_slice() {
            [Gesture::Pinch { factor }] => assert!((factor - 1.5).abs() < 1e-4),
            other => panic!("expected a single pinch, got {:?}", other),
        }

        // Lifting the fingers quickly must not read as a tap
        assert!(recognizer
            .handle(event(2, 250.0, 100.0, TouchPhase::Ended, 0.1))
            .is_empty());
        assert!(recognizer
            .handle(event(1, 100.0, 100.0, TouchPhase::Ended, 0.1))
            .is_empty());
    }

    #[test]
    fn test_twist_emits_rotation() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.handle(event(1, 0.0, 0.0, TouchPhase::Started, 0.0));
        recognizer.handle(event(2, 100.0, 0.0, TouchPhase::Started, 0.0));

        let gestures = recognizer.handle(event(2, 0.0, 100.0, TouchPhase::Moved, 0.05));
        assert!(gestures
            .iter()
            .any(|g| matches!(g, Gesture::Twist { radians } if (radians - std::f32::consts::FRAC_PI_2).abs() < 1e-4)));
    }

    #[test]
    fn test_new_contact_after_pinch_can_tap() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.handle(event(1, 0.0, 0.0, TouchPhase::Started, 0.0));
        recognizer.handle(event(2, 50.0, 0.0, TouchPhase::Started, 0.0));
        recognizer.handle(event(1, 0.0, 0.0, TouchPhase::Ended, 0.1));
        recognizer.handle(event(2, 50.0, 0.0, TouchPhase::Ended, 0.1));

        recognizer.handle(event(3, 5.0, 5.0, TouchPhase::Started, 1.0));
        let gestures = recognizer.handle(event(3, 5.0, 5.0, TouchPhase::Ended, 1.1));
        assert_eq!(gestures, vec![Gesture::Select]);
    }

    fn pinch_product(gestures: &[Gesture]) -> f32 {
        gestures
            .iter()
            .filter_map(|g| match g {
                Gesture::Pinch { factor } => Some(*factor),
                _ => None,
            })
            .product()
    }

    fn twist_sum(gestures: &[Gesture]) -> f32 {
        gestures
            .iter()
            .filter_map(|g| match g {
                Gesture::Twist { radians } => Some(*radians),
                _ => None,
            })
            .sum()
    }

    #[test]
    fn test_alternating_fingers_pinch_once_per_motion() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.handle(event(1, 100.0, 100.0, TouchPhase::Started, 0.0));
        recognizer.handle(event(2, 200.0, 100.0, TouchPhase::Started, 0.0));

        let mut gestures = recognizer.handle(event(1, 50.0, 100.0, TouchPhase::Moved, 0.02));
        assert!((pinch_product(&gestures) - 1.5).abs() < 1e-4);

        // The other finger reports without moving
        let still = recognizer.handle(event(2, 200.0, 100.0, TouchPhase::Moved, 0.03));
        assert!(still.is_empty());

        gestures.extend(recognizer.handle(event(2, 250.0, 100.0, TouchPhase::Moved, 0.04)));
        gestures.extend(recognizer.handle(event(1, 50.0, 100.0, TouchPhase::Moved, 0.05)));

        // Span went 100 -> 200 overall
        assert!((pinch_product(&gestures) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_alternating_fingers_twist_once_per_motion() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.handle(event(1, 0.0, 0.0, TouchPhase::Started, 0.0));
        recognizer.handle(event(2, 100.0, 0.0, TouchPhase::Started, 0.0));

        let mut gestures = recognizer.handle(event(2, 100.0, 100.0, TouchPhase::Moved, 0.02));
        gestures.extend(recognizer.handle(event(1, 0.0, 0.0, TouchPhase::Moved, 0.03)));
        gestures.extend(recognizer.handle(event(1, 100.0, 0.0, TouchPhase::Moved, 0.04)));
        gestures.extend(recognizer.handle(event(2, 100.0, 100.0, TouchPhase::Moved, 0.05)));

        // Span turned from +X to +Y
        assert!((twist_sum(&gestures) - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_small_motions_accumulate_past_deadzone() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.handle(event(1, 0.0, 0.0, TouchPhase::Started, 0.0));
        recognizer.handle(event(2, 1000.0, 0.0, TouchPhase::Started, 0.0));

        // 1 px on a 1000 px span is inside the deadzone
        assert!(recognizer
            .handle(event(2, 1001.0, 0.0, TouchPhase::Moved, 0.01))
            .is_empty());
        let gestures = recognizer.handle(event(2, 1003.0, 0.0, TouchPhase::Moved, 0.02));
        assert!((pinch_product(&gestures) - 1.003).abs() < 1e-4);
    }

    #[test]
    fn test_third_finger_rebases_pair() {
        let mut recognizer = GestureRecognizer::default();
        recognizer.handle(event(1, 0.0, 0.0, TouchPhase::Started, 0.0));
        recognizer.handle(event(2, 100.0, 0.0, TouchPhase::Started, 0.0));
        recognizer.handle(event(3, 500.0, 500.0, TouchPhase::Started, 0.01));
        recognizer.handle(event(2, 300.0, 0.0, TouchPhase::Moved, 0.02));

        // Back to two fingers, span is now (300, 0)
        recognizer.handle(event(3, 500.0, 500.0, TouchPhase::Ended, 0.03));
        let gestures = recognizer.handle(event(2, 600.0, 0.0, TouchPhase::Moved, 0.04));
        assert!((pinch_product(&gestures) - 2.0).abs() < 1e-4);
    }
}
