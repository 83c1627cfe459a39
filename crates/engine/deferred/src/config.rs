//! Scene configuration
//!
//! TOML file with `[window]`, `[dataset]`, `[camera]`, `[lighting]` and
//! `[render]` sections. Every field has a default, so an empty file is a
//! valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::ProjectionMode;
use crate::error::ConfigParseError;
use crate::lighting::{
    DEFAULT_AMBIENT, DEFAULT_LIGHTING_POWER, LightPosition, MAX_POINT_LIGHTS, Orbit, PointLight,
    default_lights,
};
use crate::units::{Degrees, Radians};

/// Scene configuration loaded from a TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl SceneConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigParseError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigParseError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigParseError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigParseError::InvalidValue(format!(
                "window size {}x{} is empty",
                self.window.width, self.window.height
            )));
        }
        if self.lighting.lights.len() > MAX_POINT_LIGHTS {
            return Err(ConfigParseError::InvalidValue(format!(
                "{} lights configured, at most {} are supported",
                self.lighting.lights.len(),
                MAX_POINT_LIGHTS
            )));
        }
        if self.dataset.shadows.len() > MAX_POINT_LIGHTS {
            return Err(ConfigParseError::InvalidValue(format!(
                "{} shadow datasets configured, at most {} are supported",
                self.dataset.shadows.len(),
                MAX_POINT_LIGHTS
            )));
        }
        for (i, light) in self.lighting.lights.iter().enumerate() {
            if let Some(radius) = light.radius() {
                if !(radius > 0.0) {
                    return Err(ConfigParseError::InvalidValue(format!(
                        "light {i} radius {radius} must be positive"
                    )));
                }
            }
        }
        if !(self.camera.distance > 0.0) {
            return Err(ConfigParseError::InvalidValue(format!(
                "camera distance {} must be positive",
                self.camera.distance
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_size")]
    pub width: u32,
    #[serde(default = "default_window_size")]
    pub height: u32,
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_window_size() -> u32 {
    1024
}

fn default_title() -> String {
    "G-buffer Viewer".to_string()
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_size(),
            height: default_window_size(),
            title: default_title(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// G-buffer dataset (overridden by the command line)
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Take camera azimuth/elevation from the dataset filename
    #[serde(default = "default_true")]
    pub metadata_from_filename: bool,
    /// Optional shadow dataset per light
    #[serde(default)]
    pub shadows: Vec<Option<PathBuf>>,
}

fn default_true() -> bool {
    true
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: None,
            metadata_from_filename: true,
            shadows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub projection: ProjectionMode,
    #[serde(default = "default_fov")]
    pub fov_degrees: Degrees,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    /// Orbit radius of the eye around `center`
    #[serde(default = "default_distance")]
    pub distance: f32,
    #[serde(default)]
    pub center: [f32; 3],
    /// Used when no filename metadata is available
    #[serde(default)]
    pub azimuth: Degrees,
    #[serde(default = "default_elevation")]
    pub elevation: Degrees,
}

fn default_fov() -> Degrees {
    Degrees(45.0)
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    100.0
}

fn default_distance() -> f32 {
    25.0
}

fn default_elevation() -> Degrees {
    Degrees(90.0)
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionMode::Perspective,
            fov_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
            distance: default_distance(),
            center: [0.0; 3],
            azimuth: Degrees(0.0),
            elevation: default_elevation(),
        }
    }
}

/// One configured point light
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LightConfig {
    Orbiting {
        theta: Radians,
        phi: Radians,
        theta_step: Radians,
        phi_step: Radians,
        radius: f32,
        #[serde(default = "default_intensity")]
        intensity: f32,
    },
    Fixed {
        position: [f32; 3],
        #[serde(default = "default_intensity")]
        intensity: f32,
    },
    /// Fixed light placed on a sphere, like the camera
    Angles {
        azimuth: Degrees,
        elevation: Degrees,
        radius: f32,
        #[serde(default = "default_intensity")]
        intensity: f32,
    },
}

fn default_intensity() -> f32 {
    DEFAULT_LIGHTING_POWER
}

impl LightConfig {
    fn radius(&self) -> Option<f32> {
        match self {
            Self::Orbiting { radius, .. } | Self::Angles { radius, .. } => Some(*radius),
            Self::Fixed { .. } => None,
        }
    }

    pub fn to_light(&self) -> PointLight {
        match *self {
            Self::Orbiting {
                theta,
                phi,
                theta_step,
                phi_step,
                radius,
                intensity,
            } => PointLight::orbiting(
                Orbit {
                    theta,
                    phi,
                    theta_step,
                    phi_step,
                    radius,
                },
                intensity,
            ),
            Self::Fixed {
                position,
                intensity,
            } => PointLight::fixed(Vec3::from(position), intensity),
            Self::Angles {
                azimuth,
                elevation,
                radius,
                intensity,
            } => PointLight::fixed_at_angles(azimuth, elevation, radius, intensity),
        }
    }
}

impl From<&PointLight> for LightConfig {
    fn from(light: &PointLight) -> Self {
        match light.position {
            LightPosition::Orbiting(orbit) => Self::Orbiting {
                theta: orbit.theta,
                phi: orbit.phi,
                theta_step: orbit.theta_step,
                phi_step: orbit.phi_step,
                radius: orbit.radius,
                intensity: light.intensity,
            },
            LightPosition::Fixed { world_position } => Self::Fixed {
                position: world_position.to_array(),
                intensity: light.intensity,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ambient")]
    pub ambient: [f32; 3],
    #[serde(default = "default_light_configs")]
    pub lights: Vec<LightConfig>,
}

fn default_ambient() -> [f32; 3] {
    [DEFAULT_AMBIENT; 3]
}

fn default_light_configs() -> Vec<LightConfig> {
    default_lights().iter().map(LightConfig::from).collect()
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ambient: default_ambient(),
            lights: default_light_configs(),
        }
    }
}

impl LightingConfig {
    pub fn build_lights(&self) -> Vec<PointLight> {
        self.lights.iter().map(LightConfig::to_light).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub use_shadow: bool,
    #[serde(default)]
    pub debug_view: DebugView,
}

/// Which G-buffer channel replaces the lit output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugView {
    /// Lit composite
    None,
    Depth,
    #[default]
    Normals,
    Position,
}

/// Toggles changed only by configuration and user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub use_lighting: bool,
    pub use_shadow: bool,
    pub debug_view: DebugView,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            use_lighting: true,
            use_shadow: false,
            debug_view: DebugView::default(),
        }
    }
}

impl RenderState {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            use_lighting: config.lighting.enabled,
            use_shadow: config.render.use_shadow,
            debug_view: config.render.debug_view,
        }
    }
}
