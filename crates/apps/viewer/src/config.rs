//! KDL scene configuration
//!
//! A scene describes everything the headless viewer simulates: the engine
//! tunables, the planes the tracking substrate reports, how the device
//! moves and which gestures the user performs.
//!
//! # Example
//!
//! ```kdl
//! viewer frames=240 fps=60
//! capability "supported"
//! catalog "models/models.json"
//! assets "models"
//! model "furniture/sofa"
//!
//! engine max_hit_distance=10.0 horizontal_only=#true max_surface_tilt_deg=20.0
//! touch max_tap_ms=250 max_tap_travel=10.0
//!
//! surfaces {
//!     floor y=0.0
//!     plane x=0.0 y=0.75 z=-1.2 half_width=0.6 half_depth=0.4
//! }
//!
//! device {
//!     waypoint frame=0 x=0.0 y=1.5 z=0.0 pitch=-60.0
//!     waypoint frame=120 x=0.5 y=1.4 z=-0.5 pitch=-75.0 yaw=20.0
//!     gap from=150 to=160
//! }
//!
//! gestures {
//!     tap frame=90
//!     pinch frame=180 factor=1.5
//!     twist frame=200 degrees=45.0
//! }
//! ```
//!
//! Relative `catalog` and `assets` paths are resolved against the scene
//! file's directory.

use crate::script::{DevicePath, ScriptedGesture, TouchScript, TrackingGap, Waypoint};
use devices::GestureConfig;
use glam::{Quat, Vec2, Vec3};
use placement::sim::{ProbeOutcome, SimulatedSubstrate};
use placement::{DetectedSurface, PlacementConfig, Transform};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Errors that can occur while reading a scene
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Scene file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not a KDL document
    #[error("KDL parse error: {0}")]
    Kdl(#[from] kdl::KdlError),

    /// Valid KDL, but not a valid scene
    #[error("Invalid scene: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

/// How the simulated device answers the AR capability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityScript {
    #[default]
    Supported,
    Unsupported,
    /// No tracking API at all
    Missing,
    /// The probe fails
    Rejected,
    /// The probe never answers
    Hang,
}

impl CapabilityScript {
    pub fn substrate(self) -> SimulatedSubstrate {
        match self {
            Self::Supported => SimulatedSubstrate::new(ProbeOutcome::Supported),
            Self::Unsupported => SimulatedSubstrate::new(ProbeOutcome::Unsupported),
            Self::Missing => SimulatedSubstrate::without_tracking_api(),
            Self::Rejected => SimulatedSubstrate::new(ProbeOutcome::Rejected(
                "capability query rejected".to_string(),
            )),
            Self::Hang => SimulatedSubstrate::new(ProbeOutcome::Hang),
        }
    }
}

impl FromStr for CapabilityScript {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "supported" => Ok(Self::Supported),
            "unsupported" => Ok(Self::Unsupported),
            "missing" => Ok(Self::Missing),
            "rejected" => Ok(Self::Rejected),
            "hang" => Ok(Self::Hang),
            other => Err(invalid(format!(
                "unknown capability '{other}' (expected supported, unsupported, missing, rejected or hang)"
            ))),
        }
    }
}

/// Everything the viewer needs for one run
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub frames: u64,
    pub fps: u32,
    pub capability: CapabilityScript,
    /// Catalog manifest (JSON)
    pub catalog: Option<PathBuf>,
    /// Directory model locators are resolved against
    pub assets_root: Option<PathBuf>,
    /// Catalog id to place; the newest entry when unset
    pub model: Option<String>,
    pub engine: PlacementConfig,
    pub touch: GestureConfig,
    pub surfaces: Vec<DetectedSurface>,
    pub device: DevicePath,
    pub gestures: Vec<ScriptedGesture>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            frames: 180,
            fps: 60,
            capability: CapabilityScript::default(),
            catalog: None,
            assets_root: None,
            model: None,
            engine: PlacementConfig::default(),
            touch: GestureConfig::default(),
            surfaces: vec![DetectedSurface::floor(1, 0.0)],
            device: DevicePath::default(),
            gestures: Vec::new(),
        }
    }
}

impl SceneConfig {
    /// Parse a scene file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut scene = Self::from_kdl(&content)?;
        if let Some(dir) = path.parent() {
            scene.catalog = scene.catalog.map(|p| dir.join(p));
            scene.assets_root = scene.assets_root.map(|p| dir.join(p));
        }
        Ok(scene)
    }

    /// Parse a scene from KDL text
    pub fn from_kdl(content: &str) -> Result<Self> {
        let doc: kdl::KdlDocument = content.parse()?;
        let mut scene = Self::default();

        for node in doc.nodes() {
            match node.name().value() {
                "viewer" => {
                    if let Some(frames) = prop_u64(node, "frames")? {
                        scene.frames = frames;
                    }
                    if let Some(fps) = prop_u64(node, "fps")? {
                        scene.fps = u32::try_from(fps)
                            .ok()
                            .filter(|fps| *fps > 0)
                            .ok_or_else(|| invalid(format!("fps must be 1..=u32::MAX, got {fps}")))?;
                    }
                }
                "capability" => scene.capability = string_arg(node)?.parse()?,
                "catalog" => scene.catalog = Some(PathBuf::from(string_arg(node)?)),
                "assets" => scene.assets_root = Some(PathBuf::from(string_arg(node)?)),
                "model" => scene.model = Some(string_arg(node)?),
                "engine" => scene.engine = parse_engine(node)?,
                "touch" => scene.touch = parse_touch(node)?,
                "surfaces" => scene.surfaces = parse_surfaces(node)?,
                "device" => scene.device = parse_device(node)?,
                "gestures" => scene.gestures = parse_gestures(node)?,
                other => return Err(invalid(format!("unknown scene node '{other}'"))),
            }
        }

        Ok(scene)
    }

    /// Wall-clock time between ticks
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    pub fn touch_script(&self) -> TouchScript {
        TouchScript::new(self.gestures.clone(), self.fps)
    }
}

fn parse_engine(node: &kdl::KdlNode) -> Result<PlacementConfig> {
    let mut engine = PlacementConfig::default();
    if let Some(v) = prop_f32(node, "min_scale")? {
        engine.min_scale = v;
    }
    if let Some(v) = prop_f32(node, "max_scale")? {
        engine.max_scale = v;
    }
    if let Some(v) = prop_f32(node, "max_hit_distance")? {
        engine.max_hit_distance = v;
    }
    if let Some(v) = prop_bool(node, "horizontal_only")? {
        engine.horizontal_only = v;
    }
    if let Some(v) = prop_f32(node, "max_surface_tilt_deg")? {
        engine.max_surface_tilt_deg = v;
    }
    if let Some(v) = prop_u64(node, "probe_timeout_ms")? {
        engine.probe_timeout_ms = v;
    }
    engine
        .validate()
        .map_err(|err| invalid(err.to_string()))?;
    Ok(engine)
}

fn parse_touch(node: &kdl::KdlNode) -> Result<GestureConfig> {
    let mut touch = GestureConfig::default();
    if let Some(ms) = prop_u64(node, "max_tap_ms")? {
        touch.max_tap_seconds = ms as f64 / 1000.0;
    }
    if let Some(v) = prop_f32(node, "max_tap_travel")? {
        touch.max_tap_travel = v;
    }
    Ok(touch)
}

fn parse_surfaces(node: &kdl::KdlNode) -> Result<Vec<DetectedSurface>> {
    let mut surfaces = Vec::new();
    for (index, child) in children(node).enumerate() {
        let id = index as u64 + 1;
        let y = prop_f32(child, "y")?.unwrap_or(0.0);
        let surface = match child.name().value() {
            "floor" => DetectedSurface::floor(id, y),
            "plane" => {
                let center = Vec3::new(
                    prop_f32(child, "x")?.unwrap_or(0.0),
                    y,
                    prop_f32(child, "z")?.unwrap_or(0.0),
                );
                let half_extents = Vec2::new(
                    required_f32(child, "half_width")?,
                    required_f32(child, "half_depth")?,
                );
                if half_extents.cmple(Vec2::ZERO).any() {
                    return Err(invalid("plane extents must be positive"));
                }
                let tilt = prop_f32(child, "tilt")?.unwrap_or(0.0).to_radians();
                DetectedSurface::new(
                    id,
                    Transform::new(center, Quat::from_rotation_x(tilt)),
                    half_extents,
                )
            }
            other => return Err(invalid(format!("unknown surface '{other}'"))),
        };
        surfaces.push(surface);
    }
    Ok(surfaces)
}

fn parse_device(node: &kdl::KdlNode) -> Result<DevicePath> {
    let mut waypoints = Vec::new();
    let mut gaps = Vec::new();

    for child in children(node) {
        match child.name().value() {
            "waypoint" => waypoints.push(Waypoint {
                frame: required_u64(child, "frame")?,
                position: Vec3::new(
                    prop_f32(child, "x")?.unwrap_or(0.0),
                    prop_f32(child, "y")?.unwrap_or(1.5),
                    prop_f32(child, "z")?.unwrap_or(0.0),
                ),
                pitch: prop_f32(child, "pitch")?.unwrap_or(-90.0),
                yaw: prop_f32(child, "yaw")?.unwrap_or(0.0),
            }),
            "gap" => {
                let from = required_u64(child, "from")?;
                let to = required_u64(child, "to")?;
                if to < from {
                    return Err(invalid(format!("gap ends ({to}) before it starts ({from})")));
                }
                gaps.push(TrackingGap { from, to });
            }
            other => return Err(invalid(format!("unknown device entry '{other}'"))),
        }
    }

    Ok(DevicePath::new(waypoints, gaps))
}

fn parse_gestures(node: &kdl::KdlNode) -> Result<Vec<ScriptedGesture>> {
    children(node)
        .map(|child| {
            let frame = required_u64(child, "frame")?;
            match child.name().value() {
                "tap" => Ok(ScriptedGesture::Tap {
                    frame,
                    at: Vec2::new(
                        prop_f32(child, "x")?.unwrap_or(540.0),
                        prop_f32(child, "y")?.unwrap_or(1170.0),
                    ),
                }),
                "pinch" => {
                    let factor = required_f32(child, "factor")?;
                    if !(factor > 0.0) {
                        return Err(invalid(format!("pinch factor must be > 0, got {factor}")));
                    }
                    Ok(ScriptedGesture::Pinch { frame, factor })
                }
                "twist" => Ok(ScriptedGesture::Twist {
                    frame,
                    degrees: required_f32(child, "degrees")?,
                }),
                other => Err(invalid(format!("unknown gesture '{other}'"))),
            }
        })
        .collect()
}

// ----------------------------------------------------------------------
// KDL value helpers
// ----------------------------------------------------------------------

fn children(node: &kdl::KdlNode) -> impl Iterator<Item = &kdl::KdlNode> {
    node.children().into_iter().flat_map(|doc| doc.nodes())
}

fn prop<'a>(node: &'a kdl::KdlNode, key: &str) -> Option<&'a kdl::KdlValue> {
    node.entries()
        .iter()
        .find(|entry| entry.name().is_some_and(|name| name.value() == key))
        .map(|entry| entry.value())
}

fn string_arg(node: &kdl::KdlNode) -> Result<String> {
    let name = node.name().value();
    let value = node
        .entries()
        .iter()
        .find(|entry| entry.name().is_none())
        .map(|entry| entry.value())
        .ok_or_else(|| invalid(format!("'{name}' needs a value")))?;

    match value {
        kdl::KdlValue::String(s) => Ok(s.clone()),
        other => Err(invalid(format!("'{name}' must be a string, got {other}"))),
    }
}

fn prop_f32(node: &kdl::KdlNode, key: &str) -> Result<Option<f32>> {
    prop(node, key)
        .map(|value| match value {
            kdl::KdlValue::Float(f) => Ok(*f as f32),
            kdl::KdlValue::Integer(i) => Ok(*i as f32),
            other => Err(invalid(format!(
                "{}.{key} must be a number, got {other}",
                node.name().value()
            ))),
        })
        .transpose()
}

fn prop_u64(node: &kdl::KdlNode, key: &str) -> Result<Option<u64>> {
    prop(node, key)
        .map(|value| match value {
            kdl::KdlValue::Integer(i) => u64::try_from(*i).map_err(|_| {
                invalid(format!(
                    "{}.{key} must be a non-negative integer, got {i}",
                    node.name().value()
                ))
            }),
            other => Err(invalid(format!(
                "{}.{key} must be an integer, got {other}",
                node.name().value()
            ))),
        })
        .transpose()
}

fn prop_bool(node: &kdl::KdlNode, key: &str) -> Result<Option<bool>> {
    prop(node, key)
        .map(|value| match value {
            kdl::KdlValue::Bool(b) => Ok(*b),
            other => Err(invalid(format!(
                "{}.{key} must be #true or #false, got {other}",
                node.name().value()
            ))),
        })
        .transpose()
}

fn required_f32(node: &kdl::KdlNode, key: &str) -> Result<f32> {
    prop_f32(node, key)?
        .ok_or_else(|| invalid(format!("{} needs {key}=", node.name().value())))
}

fn required_u64(node: &kdl::KdlNode, key: &str) -> Result<u64> {
    prop_u64(node, key)?
        .ok_or_else(|| invalid(format!("{} needs {key}=", node.name().value())))
}
