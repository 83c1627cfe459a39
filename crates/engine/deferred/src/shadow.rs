//! Shadow evaluator
//!
//! Each light may carry precomputed shadow buffers rendered from the light's
//! point of view. Per frame the evaluator pairs those buffers with the
//! light-space matrix that maps view-space fragments into the light's image.

use std::path::Path;

use glam::Mat4;
use tracing::{info, warn};

use crate::camera::{Camera, build_view, spherical_up};
use crate::dataset::{ShadowBuffers, open_dataset};
use crate::error::Result;
use crate::lighting::PointLight;

pub fn build_light_space_matrix(light_projection: Mat4, light_view: Mat4) -> Mat4 {
    light_projection * light_view
}

/// Shadow inputs of one light for one frame
#[derive(Debug, Clone, Copy)]
pub struct ShadowSource<'a> {
    pub light_space_matrix: Mat4,
    pub buffers: &'a ShadowBuffers,
}

impl ShadowBuffers {
    /// Load shadow buffers, logging and returning `None` on any failure
    pub fn load_optional(path: &Path, width: usize, height: usize) -> Option<Self> {
        let loaded = open_dataset(path)
            .and_then(|store| ShadowBuffers::load(store.as_ref(), width, height));
        match loaded {
            Ok(buffers) => {
                info!("Loaded shadow buffers from {}", path.display());
                Some(buffers)
            }
            Err(e) => {
                warn!(
                    "Shadow dataset {} unavailable, light stays unshadowed: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }
}

/// Per-light shadow buffers, indexed like the scene's lights
#[derive(Debug, Clone, Default)]
pub struct ShadowEvaluator {
    buffers: Vec<Option<ShadowBuffers>>,
}

impl ShadowEvaluator {
    pub fn new(buffers: Vec<Option<ShadowBuffers>>) -> Self {
        Self { buffers }
    }

    /// Load one optional shadow dataset per light
    pub fn load(paths: &[Option<&Path>], width: usize, height: usize) -> Self {
        let buffers = paths
            .iter()
            .map(|path| path.and_then(|p| ShadowBuffers::load_optional(p, width, height)))
            .collect();
        Self { buffers }
    }

    pub fn buffers(&self, light: usize) -> Option<&ShadowBuffers> {
        self.buffers.get(light).and_then(Option::as_ref)
    }

    pub fn has_any(&self) -> bool {
        self.buffers.iter().any(Option::is_some)
    }

    /// View matrix the shadow buffers of light `index` were rendered with
    ///
    /// The first light shares the primary camera's view. Later lights look
    /// from their own position toward the camera center.
    pub fn light_view(camera: &Camera, index: usize, light: &PointLight) -> Result<Mat4> {
        if index == 0 {
            return Ok(camera.view_matrix());
        }
        let (theta, phi) = light.spherical_angles();
        build_view(
            light.world_position(),
            camera.center,
            spherical_up(theta, phi),
        )
    }

    /// Shadow sources for every light
    ///
    /// `None` where no buffers are loaded or the light's view is degenerate
    /// this frame. A degenerate view only drops that light's shadow.
    pub fn evaluate<'a>(
        &'a self,
        camera: &Camera,
        lights: &[PointLight],
    ) -> Vec<Option<ShadowSource<'a>>> {
        let projection = camera.projection_matrix();
        lights
            .iter()
            .enumerate()
            .map(|(index, light)| {
                let buffers = self.buffers(index)?;
                match Self::light_view(camera, index, light) {
                    Ok(view) => Some(ShadowSource {
                        light_space_matrix: build_light_space_matrix(projection, view),
                        buffers,
                    }),
                    Err(e) => {
                        warn!("Shadow of light {} skipped this frame: {}", index, e);
                        None
                    }
                }
            })
            .collect()
    }
}
