//! Scene state owned by the render loop
//!
//! Holds the camera, lights, toggles and shadow inputs. [`Scene::tick`] is the
//! only per-frame mutation; toggles change only on user input.

use std::path::Path;

use glam::Vec3;
use tracing::{debug, info, warn};

use crate::camera::{Camera, Orientation};
use crate::config::{DebugView, RenderState, SceneConfig};
use crate::error::{ConfigParseError, Result};
use crate::compositor::FrameUniforms;
use crate::lighting::{MAX_POINT_LIGHTS, PointLight};
use crate::metadata::FilenameMetadata;
use crate::shadow::ShadowEvaluator;

#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub lights: Vec<PointLight>,
    pub ambient: Vec3,
    pub state: RenderState,
    pub shadows: ShadowEvaluator,
}

impl Scene {
    pub fn new(
        camera: Camera,
        lights: Vec<PointLight>,
        ambient: Vec3,
        state: RenderState,
        shadows: ShadowEvaluator,
    ) -> Result<Self> {
        if lights.len() > MAX_POINT_LIGHTS {
            return Err(ConfigParseError::InvalidValue(format!(
                "{} lights given, at most {} are supported",
                lights.len(),
                MAX_POINT_LIGHTS
            ))
            .into());
        }
        Ok(Self {
            camera,
            lights,
            ambient,
            state,
            shadows,
        })
    }

    /// Build the scene for a configuration, loading optional shadow datasets
    pub fn from_config(config: &SceneConfig) -> Result<Self> {
        config.validate()?;

        let orientation = camera_orientation(config)?;
        let camera = Camera::orbiting(
            &config.camera,
            config.window.width,
            config.window.height,
            orientation,
        )?;
        info!(
            "Camera at azimuth {:.1} elevation {:.1}, eye {:?}",
            orientation.azimuth.0, orientation.elevation.0, camera.eye
        );

        let shadow_paths: Vec<Option<&Path>> = config
            .dataset
            .shadows
            .iter()
            .map(|p| p.as_deref())
            .collect();
        let shadows = ShadowEvaluator::load(
            &shadow_paths,
            config.window.width as usize,
            config.window.height as usize,
        );

        Self::new(
            camera,
            config.lighting.build_lights(),
            Vec3::from(config.lighting.ambient),
            RenderState::from_config(config),
            shadows,
        )
    }

    /// Advance time. Lights hold still while lighting is off.
    pub fn tick(&mut self, elapsed_seconds: f32) {
        if !self.state.use_lighting {
            return;
        }
        for light in &mut self.lights {
            light.advance(elapsed_seconds);
        }
    }

    /// Uniforms for the current frame. Shadows are evaluated only while enabled.
    pub fn frame_uniforms(&self) -> FrameUniforms {
        let shadows = if self.state.use_shadow {
            self.shadows.evaluate(&self.camera, &self.lights)
        } else {
            Vec::new()
        };
        FrameUniforms::new(
            &self.camera,
            &self.lights,
            self.ambient,
            self.state,
            &shadows,
        )
    }

    pub fn toggle_lighting(&mut self) {
        self.state.use_lighting = !self.state.use_lighting;
        debug!("Lighting: {}", self.state.use_lighting);
    }

    pub fn toggle_shadow(&mut self) {
        self.state.use_shadow = !self.state.use_shadow;
        debug!("Shadow: {}", self.state.use_shadow);
    }

    pub fn toggle_projection(&mut self) {
        self.camera = self
            .camera
            .with_projection_mode(self.camera.projection_mode.toggled());
        debug!("Projection: {:?}", self.camera.projection_mode);
    }

    pub fn set_debug_view(&mut self, view: DebugView) {
        self.state.debug_view = view;
        debug!("Debug view: {:?}", view);
    }
}

/// Camera angles from the dataset filename, falling back to configuration
fn camera_orientation(config: &SceneConfig) -> Result<Orientation> {
    let from_config = Orientation {
        azimuth: config.camera.azimuth,
        elevation: config.camera.elevation,
    };
    if !config.dataset.metadata_from_filename {
        return Ok(from_config);
    }
    match &config.dataset.path {
        Some(path) if !FilenameMetadata::is_encoded(path) => {
            warn!(
                "Dataset name {} carries no view parameters, using [camera] angles",
                path.display()
            );
            Ok(from_config)
        }
        Some(path) => {
            let meta = FilenameMetadata::from_path(path)?;
            debug!(
                "Filename metadata: iso {} secondary {}",
                meta.iso_value, meta.secondary
            );
            Ok(Orientation {
                azimuth: meta.azimuth,
                elevation: meta.elevation,
            })
        }
        None => Ok(from_config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::units::Degrees;
    use std::path::PathBuf;

    #[test]
    fn test_orientation_from_filename() {
        let mut config = SceneConfig::default();
        config.dataset.path = Some(PathBuf::from("data/A_1.5_20_90.0_100.0.h5"));
        let orientation = camera_orientation(&config).unwrap();
        assert_eq!(orientation.azimuth, Degrees(100.0));
        assert_eq!(orientation.elevation, Degrees(90.0));

        config.dataset.metadata_from_filename = false;
        let orientation = camera_orientation(&config).unwrap();
        assert_eq!(orientation.azimuth, config.camera.azimuth);
    }

    #[test]
    fn test_unencoded_filename_uses_camera_angles() {
        let mut config = SceneConfig::default();
        config.camera.azimuth = Degrees(30.0);
        for name in ["data/res.h5", "data/gbuffer"] {
            config.dataset.path = Some(PathBuf::from(name));
            let orientation = camera_orientation(&config).unwrap();
            assert_eq!(orientation.azimuth, Degrees(30.0));
            assert_eq!(orientation.elevation, config.camera.elevation);
        }
        assert!(Scene::from_config(&config).is_ok());
    }

    #[test]
    fn test_malformed_filename_is_fatal() {
        let mut config = SceneConfig::default();
        config.dataset.path = Some(PathBuf::from("data/A_1.5_iso_90.0_100.0.h5"));
        assert!(matches!(
            Scene::from_config(&config),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_tick_moves_lights_only_when_lit() {
        let mut scene = Scene::from_config(&SceneConfig::default()).unwrap();
        let start = scene.lights[0].world_position();

        scene.tick(0.0);
        assert_eq!(scene.lights[0].world_position(), start);

        scene.toggle_lighting();
        scene.tick(1.0);
        assert_eq!(scene.lights[0].world_position(), start);

        scene.toggle_lighting();
        scene.tick(1.0);
        assert_ne!(scene.lights[0].world_position(), start);
    }

    #[test]
    fn test_toggles_do_not_touch_lights() {
        let mut scene = Scene::from_config(&SceneConfig::default()).unwrap();
        let lights = scene.lights.clone();
        scene.toggle_projection();
        scene.toggle_shadow();
        scene.set_debug_view(DebugView::Position);
        assert_eq!(scene.lights, lights);
        assert!(!scene.camera.is_perspective());

        let uniforms = scene.frame_uniforms();
        assert!(!uniforms.perspective);
        assert_eq!(uniforms.debug_view, DebugView::Position);
    }

    #[test]
    fn test_too_many_lights() {
        let base = Scene::from_config(&SceneConfig::default()).unwrap();
        let lights = vec![PointLight::default_primary(); 3];
        assert!(Scene::new(
            base.camera,
            lights,
            Vec3::ZERO,
            RenderState::default(),
            ShadowEvaluator::default()
        )
        .is_err());
    }
}
