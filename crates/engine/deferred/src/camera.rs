//! Camera and projection builder
//!
//! Builds view and projection matrices for the composition pass. The camera
//! orbits a center point on a sphere whose angles usually come from the
//! dataset filename (see [`crate::metadata`]).
//!
//! # Coordinate System
//!
//! Right-handed, OpenGL clip space (`z` in `[-1, 1]`). Spherical angles
//! follow the physics convention: `theta` is the azimuth in the XY plane,
//! `phi` is the polar angle from `+Z`.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;
use crate::error::{Error, Result};
use crate::units::{Degrees, Radians};

/// Scale that makes orthographic renders match perspective renders in size
///
/// Empirical: the perspective frame height at this distance.
pub const ORTHOGRAPHIC_SCALE: f32 = 25.0;

/// Squared-length threshold below which a basis vector counts as degenerate
const DEGENERATE_EPSILON: f32 = 1e-10;

/// Projection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

impl ProjectionMode {
    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            Self::Perspective => Self::Orthographic,
            Self::Orthographic => Self::Perspective,
        }
    }
}

/// Full width and height of the orthographic view volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicExtent {
    pub width: f32,
    pub height: f32,
}

impl OrthographicExtent {
    pub fn new(fov: Degrees, aspect_ratio: f32) -> Self {
        let half_angle = fov.to_radians().0 / 2.0;
        let height = 2.0 * (ORTHOGRAPHIC_SCALE * half_angle.tan());
        Self {
            width: height * aspect_ratio,
            height,
        }
    }
}

/// Build a projection matrix
///
/// `fov` is the vertical field of view. Orthographic projections derive
/// their extent from it through [`OrthographicExtent`].
pub fn build_projection(
    mode: ProjectionMode,
    fov: Degrees,
    aspect_ratio: f32,
    near: f32,
    far: f32,
) -> Mat4 {
    match mode {
        ProjectionMode::Perspective => {
            Mat4::perspective_rh_gl(fov.to_radians().0, aspect_ratio, near, far)
        }
        ProjectionMode::Orthographic => {
            let extent = OrthographicExtent::new(fov, aspect_ratio);
            Mat4::orthographic_rh_gl(
                -extent.width / 2.0,
                extent.width / 2.0,
                -extent.height / 2.0,
                extent.height / 2.0,
                near,
                far,
            )
        }
    }
}

/// Build a right-handed look-at view matrix
///
/// `up` is re-orthogonalized against the forward direction. Fails when the
/// eye sits on the center or `up` is zero or parallel to the forward axis.
pub fn build_view(eye: Vec3, center: Vec3, up: Vec3) -> Result<Mat4> {
    let forward = center - eye;
    if forward.length_squared() < DEGENERATE_EPSILON {
        return Err(Error::InvalidCameraConfig(format!(
            "eye {eye} coincides with center {center}"
        )));
    }
    if up.length_squared() < DEGENERATE_EPSILON {
        return Err(Error::InvalidCameraConfig("up vector is zero".to_string()));
    }
    if forward
        .normalize()
        .cross(up.normalize())
        .length_squared()
        < DEGENERATE_EPSILON
    {
        return Err(Error::InvalidCameraConfig(format!(
            "up {up} is parallel to view direction {forward}"
        )));
    }
    Ok(Mat4::look_at_rh(eye, center, up))
}

/// Point on a sphere of `radius` around the origin
pub fn spherical_to_cartesian(theta: Radians, phi: Radians, radius: f32) -> Vec3 {
    let (sin_theta, cos_theta) = theta.0.sin_cos();
    let (sin_phi, cos_phi) = phi.0.sin_cos();
    Vec3::new(
        radius * cos_theta * sin_phi,
        radius * sin_theta * sin_phi,
        radius * cos_phi,
    )
}

/// Unit up vector for an eye placed at spherical angles `(theta, phi)`
///
/// Tangent toward the `+Z` pole, always perpendicular to the radial
/// direction, so it never degenerates for a look-at toward the origin.
pub fn spherical_up(theta: Radians, phi: Radians) -> Vec3 {
    let (sin_theta, cos_theta) = theta.0.sin_cos();
    let (sin_phi, cos_phi) = phi.0.sin_cos();
    Vec3::new(-cos_theta * cos_phi, -sin_theta * cos_phi, sin_phi)
}

/// Viewing direction of the camera around its center
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub azimuth: Degrees,
    pub elevation: Degrees,
}

/// Camera for the composition pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub projection_mode: ProjectionMode,
    /// Vertical field of view
    pub fov: Degrees,
    pub near: f32,
    pub far: f32,
    pub width: u32,
    pub height: u32,
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
}

impl Camera {
    /// Create a camera, validating the view basis and projection parameters
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        projection_mode: ProjectionMode,
        fov: Degrees,
        near: f32,
        far: f32,
        width: u32,
        height: u32,
        eye: Vec3,
        center: Vec3,
        up: Vec3,
    ) -> Result<Self> {
        let camera = Self {
            projection_mode,
            fov,
            near,
            far,
            width,
            height,
            eye,
            center,
            up,
        };
        camera.validate()?;
        Ok(camera)
    }

    /// Place the camera on a sphere around the configured center
    pub fn orbiting(
        config: &CameraConfig,
        width: u32,
        height: u32,
        orientation: Orientation,
    ) -> Result<Self> {
        let theta = orientation.azimuth.to_radians();
        let phi = orientation.elevation.to_radians();
        let center = Vec3::from(config.center);
        let eye = center + spherical_to_cartesian(theta, phi, config.distance);

        Self::new(
            config.projection,
            config.fov_degrees,
            config.near,
            config.far,
            width,
            height,
            eye,
            center,
            spherical_up(theta, phi),
        )
    }

    /// Same camera with a different projection mode
    pub fn with_projection_mode(mut self, mode: ProjectionMode) -> Self {
        self.projection_mode = mode;
        self
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        build_projection(
            self.projection_mode,
            self.fov,
            self.aspect_ratio(),
            self.near,
            self.far,
        )
    }

    pub fn is_perspective(&self) -> bool {
        self.projection_mode == ProjectionMode::Perspective
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidCameraConfig(format!(
                "viewport {}x{} is empty",
                self.width, self.height
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(Error::InvalidCameraConfig(format!(
                "clip planes near={} far={} must satisfy 0 < near < far",
                self.near, self.far
            )));
        }
        if !(self.fov.0 > 0.0 && self.fov.0 < 180.0) {
            return Err(Error::InvalidCameraConfig(format!(
                "field of view {} degrees is out of range",
                self.fov.0
            )));
        }
        build_view(self.eye, self.center, self.up).map(|_| ())
    }
}
