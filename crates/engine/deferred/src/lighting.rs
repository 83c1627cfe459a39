//! Point light model
//!
//! Up to [`MAX_POINT_LIGHTS`] point lights plus an ambient term. A light
//! either orbits the origin on a sphere or sits at a fixed world position.
//! All positions handed to the compositor are in view space.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::spherical_to_cartesian;
use crate::units::{Degrees, Radians};

/// Number of point lights the shading pass evaluates
pub const MAX_POINT_LIGHTS: usize = 2;

/// Ambient base colour (10/255 grey)
pub const DEFAULT_AMBIENT: f32 = 10.0 / 255.0;

/// Brightness of each point light
pub const DEFAULT_LIGHTING_POWER: f32 = 2.0;

/// Spherical orbit around the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    pub theta: Radians,
    pub phi: Radians,
    /// Radians per second
    pub theta_step: Radians,
    /// Radians per second
    pub phi_step: Radians,
    pub radius: f32,
}

impl Orbit {
    fn advance(&mut self, elapsed_seconds: f32) {
        self.theta = wrap_hard(Radians(self.theta.0 + self.theta_step.0 * elapsed_seconds));
        self.phi = wrap_hard(Radians(self.phi.0 + self.phi_step.0 * elapsed_seconds));
    }
}

/// Angles past a full turn restart at exactly zero rather than wrapping
fn wrap_hard(angle: Radians) -> Radians {
    if angle.0 > Radians::TAU.0 {
        Radians(0.0)
    } else {
        angle
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightPosition {
    Orbiting(Orbit),
    Fixed { world_position: Vec3 },
}

/// A white point light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: LightPosition,
    pub intensity: f32,
}

impl PointLight {
    pub fn orbiting(orbit: Orbit, intensity: f32) -> Self {
        Self {
            position: LightPosition::Orbiting(orbit),
            intensity,
        }
    }

    pub fn fixed(world_position: Vec3, intensity: f32) -> Self {
        Self {
            position: LightPosition::Fixed { world_position },
            intensity,
        }
    }

    /// Fixed light placed from dataset angles, the same way the camera is
    pub fn fixed_at_angles(
        azimuth: Degrees,
        elevation: Degrees,
        radius: f32,
        intensity: f32,
    ) -> Self {
        let world_position =
            spherical_to_cartesian(azimuth.to_radians(), elevation.to_radians(), radius);
        Self::fixed(world_position, intensity)
    }

    /// The first of the two default orbiting lights
    pub fn default_primary() -> Self {
        Self::orbiting(
            Orbit {
                theta: Radians(1.57),
                phi: Radians(1.57),
                theta_step: Radians(0.39),
                phi_step: Radians(0.39),
                radius: 13.5,
            },
            DEFAULT_LIGHTING_POWER,
        )
    }

    /// The second default orbiting light, slower and closer
    pub fn default_secondary() -> Self {
        Self::orbiting(
            Orbit {
                theta: Radians(1.57),
                phi: Radians(1.57),
                theta_step: Radians(0.3),
                phi_step: Radians(0.3),
                radius: 8.0,
            },
            DEFAULT_LIGHTING_POWER,
        )
    }

    /// Move an orbiting light forward in time. Fixed lights ignore this.
    pub fn advance(&mut self, elapsed_seconds: f32) {
        if let LightPosition::Orbiting(orbit) = &mut self.position {
            orbit.advance(elapsed_seconds);
        }
    }

    pub fn world_position(&self) -> Vec3 {
        match self.position {
            LightPosition::Orbiting(orbit) => {
                spherical_to_cartesian(orbit.theta, orbit.phi, orbit.radius)
            }
            LightPosition::Fixed { world_position } => world_position,
        }
    }

    pub fn view_space_position(&self, view: &Mat4) -> Vec3 {
        view.transform_point3(self.world_position())
    }

    /// Spherical angles `(theta, phi)` of the light around the origin
    pub fn spherical_angles(&self) -> (Radians, Radians) {
        match self.position {
            LightPosition::Orbiting(orbit) => (orbit.theta, orbit.phi),
            LightPosition::Fixed { world_position } => {
                let radius = world_position.length();
                if radius <= f32::EPSILON {
                    return (Radians(0.0), Radians(0.0));
                }
                let theta = world_position.y.atan2(world_position.x);
                let phi = (world_position.z / radius).clamp(-1.0, 1.0).acos();
                (Radians(theta), Radians(phi))
            }
        }
    }

    pub fn color(&self) -> Vec3 {
        Vec3::splat(self.intensity)
    }
}

/// The two orbiting lights the viewer starts with
pub fn default_lights() -> Vec<PointLight> {
    vec![PointLight::default_primary(), PointLight::default_secondary()]
}
