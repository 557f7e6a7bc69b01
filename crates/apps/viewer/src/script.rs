//! Scripted device motion and touch input
//!
//! The viewer has no camera or touchscreen. A [`DevicePath`] supplies the
//! device pose for every frame and a [`TouchScript`] replays the touch
//! events a user would produce.

use devices::{TouchPhase, TouchPoint};
use glam::{EulerRot, Quat, Vec2, Vec3};
use placement::Transform;
use std::collections::BTreeMap;

/// Device pose keyframe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub frame: u64,
    pub position: Vec3,
    /// Degrees about local X; -90 looks straight down
    pub pitch: f32,
    /// Degrees about world Y
    pub yaw: f32,
}

impl Waypoint {
    fn pose(&self) -> Transform {
        orientation_pose(self.position, self.pitch, self.yaw)
    }
}

fn orientation_pose(position: Vec3, pitch_deg: f32, yaw_deg: f32) -> Transform {
    Transform::new(
        position,
        Quat::from_euler(
            EulerRot::YXZ,
            yaw_deg.to_radians(),
            pitch_deg.to_radians(),
            0.0,
        ),
    )
}

/// Frames during which tracking is lost (inclusive range)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingGap {
    pub from: u64,
    pub to: u64,
}

/// Piecewise-linear device motion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevicePath {
    waypoints: Vec<Waypoint>,
    gaps: Vec<TrackingGap>,
}

impl DevicePath {
    pub fn new(mut waypoints: Vec<Waypoint>, gaps: Vec<TrackingGap>) -> Self {
        waypoints.sort_by_key(|w| w.frame);
        Self { waypoints, gaps }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn gaps(&self) -> &[TrackingGap] {
        &self.gaps
    }

    /// Device pose at `frame`, `None` while tracking is lost
    ///
    /// Without waypoints the device hovers 1.5 m above the origin looking
    /// straight down.
    pub fn pose_at(&self, frame: u64) -> Option<Transform> {
        if self
            .gaps
            .iter()
            .any(|gap| (gap.from..=gap.to).contains(&frame))
        {
            return None;
        }

        let (first, last) = match (self.waypoints.first(), self.waypoints.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Some(orientation_pose(Vec3::new(0.0, 1.5, 0.0), -90.0, 0.0)),
        };

        if frame <= first.frame {
            return Some(first.pose());
        }
        if frame >= last.frame {
            return Some(last.pose());
        }

        let segment = self
            .waypoints
            .windows(2)
            .find(|pair| frame >= pair[0].frame && frame <= pair[1].frame)?;
        let (a, b) = (&segment[0], &segment[1]);
        let span = (b.frame - a.frame).max(1) as f32;
        let t = (frame - a.frame) as f32 / span;

        Some(orientation_pose(
            a.position.lerp(b.position, t),
            a.pitch + (b.pitch - a.pitch) * t,
            a.yaw + (b.yaw - a.yaw) * t,
        ))
    }
}

/// A user gesture scheduled at a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptedGesture {
    Tap { frame: u64, at: Vec2 },
    Pinch { frame: u64, factor: f32 },
    Twist { frame: u64, degrees: f32 },
}

impl ScriptedGesture {
    pub fn frame(&self) -> u64 {
        match self {
            Self::Tap { frame, .. } | Self::Pinch { frame, .. } | Self::Twist { frame, .. } => {
                *frame
            }
        }
    }
}

/// Where two-finger gestures happen on the simulated screen
const SCREEN_CENTER: Vec2 = Vec2::new(540.0, 1170.0);
/// Half the starting distance between two fingers, in pixels
const FINGER_SPREAD: f32 = 100.0;

/// Touch events keyed by the frame they are delivered on
#[derive(Debug, Clone, Default)]
pub struct TouchScript {
    events: BTreeMap<u64, Vec<TouchPoint>>,
    gestures: Vec<ScriptedGesture>,
}

impl TouchScript {
    /// Expand gestures into touch events timed at `fps`
    ///
    /// A tap lasts one frame, so it only reads as a tap when a frame is
    /// shorter than the recognizer's tap window.
    pub fn new(gestures: Vec<ScriptedGesture>, fps: u32) -> Self {
        let mut script = Self {
            events: BTreeMap::new(),
            gestures: gestures.clone(),
        };
        let seconds = |frame: u64| frame as f64 / f64::from(fps.max(1));
        let mut next_id = 0u64;

        for gesture in gestures {
            let frame = gesture.frame();
            match gesture {
                ScriptedGesture::Tap { at, .. } => {
                    next_id += 1;
                    script.push(frame, next_id, at, TouchPhase::Started, seconds(frame));
                    script.push(frame + 1, next_id, at, TouchPhase::Ended, seconds(frame + 1));
                }
                ScriptedGesture::Pinch { factor, .. } => {
                    let anchor = SCREEN_CENTER - Vec2::new(FINGER_SPREAD, 0.0);
                    let start = SCREEN_CENTER + Vec2::new(FINGER_SPREAD, 0.0);
                    let end = anchor + (start - anchor) * factor;
                    next_id += 2;
                    script.two_finger(frame, next_id - 1, next_id, anchor, start, end, &seconds);
                }
                ScriptedGesture::Twist { degrees, .. } => {
                    let anchor = SCREEN_CENTER - Vec2::new(FINGER_SPREAD, 0.0);
                    let start = SCREEN_CENTER + Vec2::new(FINGER_SPREAD, 0.0);
                    let end = anchor + Vec2::from_angle(degrees.to_radians()).rotate(start - anchor);
                    next_id += 2;
                    script.two_finger(frame, next_id - 1, next_id, anchor, start, end, &seconds);
                }
            }
        }

        script
    }

    pub fn gestures(&self) -> &[ScriptedGesture] {
        &self.gestures
    }

    /// Touch events delivered on `frame`, in order
    pub fn events_at(&self, frame: u64) -> &[TouchPoint] {
        self.events.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn event_count(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    fn push(&mut self, frame: u64, id: u64, at: Vec2, phase: TouchPhase, time: f64) {
        self.events
            .entry(frame)
            .or_default()
            .push(TouchPoint::new(id, at, phase, time));
    }

    /// Finger `a` holds still at `anchor` while finger `b` moves from
    /// `start` to `end` over one frame
    #[allow(clippy::too_many_arguments)]
    fn two_finger(
        &mut self,
        frame: u64,
        a: u64,
        b: u64,
        anchor: Vec2,
        start: Vec2,
        end: Vec2,
        seconds: &dyn Fn(u64) -> f64,
    ) {
        self.push(frame, a, anchor, TouchPhase::Started, seconds(frame));
        self.push(frame, b, start, TouchPhase::Started, seconds(frame));
        self.push(frame + 1, b, end, TouchPhase::Moved, seconds(frame + 1));
        self.push(frame + 2, b, end, TouchPhase::Ended, seconds(frame + 2));
        self.push(frame + 2, a, anchor, TouchPhase::Ended, seconds(frame + 2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devices::{Gesture, GestureRecognizer};

    fn recognized(script: &TouchScript, frames: u64) -> Vec<Gesture> {
        let mut recognizer = GestureRecognizer::default();
        (0..frames)
            .flat_map(|frame| script.events_at(frame).to_vec())
            .flat_map(|event| recognizer.handle(event))
            .collect()
    }

    #[test]
    fn test_default_path_looks_down() {
        let pose = DevicePath::default().pose_at(0).unwrap();
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 1.5, 0.0), 1e-6));
        assert!(pose.forward().abs_diff_eq(Vec3::NEG_Y, 1e-5));
    }

    #[test]
    fn test_path_interpolates_and_clamps() {
        let path = DevicePath::new(
            vec![
                Waypoint {
                    frame: 10,
                    position: Vec3::ZERO,
                    pitch: -90.0,
                    yaw: 0.0,
                },
                Waypoint {
                    frame: 20,
                    position: Vec3::new(2.0, 0.0, 0.0),
                    pitch: -90.0,
                    yaw: 0.0,
                },
            ],
            Vec::new(),
        );

        assert_eq!(path.pose_at(0).unwrap().position, Vec3::ZERO);
        assert!(path
            .pose_at(15)
            .unwrap()
            .position
            .abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
        assert_eq!(path.pose_at(99).unwrap().position, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_gap_loses_tracking() {
        let path = DevicePath::new(Vec::new(), vec![TrackingGap { from: 5, to: 7 }]);
        assert!(path.pose_at(4).is_some());
        assert!(path.pose_at(5).is_none());
        assert!(path.pose_at(7).is_none());
        assert!(path.pose_at(8).is_some());
    }

    #[test]
    fn test_tap_recognized_as_select() {
        let script = TouchScript::new(
            vec![ScriptedGesture::Tap {
                frame: 3,
                at: Vec2::new(100.0, 100.0),
            }],
            60,
        );
        assert_eq!(script.events_at(3).len(), 1);
        assert_eq!(recognized(&script, 10), vec![Gesture::Select]);
    }

    #[test]
    fn test_slow_frames_do_not_tap() {
        let script = TouchScript::new(
            vec![ScriptedGesture::Tap {
                frame: 0,
                at: Vec2::ZERO,
            }],
            2,
        );
        assert!(recognized(&script, 5).is_empty());
    }

    #[test]
    fn test_pinch_script_produces_factor() {
        let script = TouchScript::new(vec![ScriptedGesture::Pinch { frame: 0, factor: 1.5 }], 60);
        match recognized(&script, 5).as_slice() {
            [Gesture::Pinch { factor }] => assert!((factor - 1.5).abs() < 1e-4),
            other => panic!("expected one pinch, got {:?}", other),
        }
    }

    #[test]
    fn test_twist_script_produces_rotation() {
        let script = TouchScript::new(vec![ScriptedGesture::Twist { frame: 0, degrees: 30.0 }], 60);
        let gestures = recognized(&script, 5);
        assert!(gestures.iter().any(|g| matches!(
            g,
            Gesture::Twist { radians } if (radians - 30f32.to_radians()).abs() < 1e-4
        )));
        assert!(!gestures.contains(&Gesture::Select));
    }
}
