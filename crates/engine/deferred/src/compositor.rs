//! Frame compositor (host side)
//!
//! Gathers everything the shading pass needs for one frame into a fixed
//! uniform set and drives a [`ShadingStage`] through exactly one full-screen
//! draw. The GL implementation of the stage lives in [`crate::gl`].

use glam::{Mat3, Mat4, Vec3};

use crate::camera::Camera;
use crate::config::{DebugView, RenderState};
use crate::lighting::{MAX_POINT_LIGHTS, PointLight};
use crate::shadow::ShadowSource;

/// Texture units shared by upload and sampler binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    Position = 0,
    Normal = 1,
    DiffuseColor = 2,
    Mask = 3,
    Depth = 4,
    ShadowMask0 = 5,
    ShadowDepth0 = 6,
    ShadowMask1 = 7,
    ShadowDepth1 = 8,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 9] = [
        TextureSlot::Position,
        TextureSlot::Normal,
        TextureSlot::DiffuseColor,
        TextureSlot::Mask,
        TextureSlot::Depth,
        TextureSlot::ShadowMask0,
        TextureSlot::ShadowDepth0,
        TextureSlot::ShadowMask1,
        TextureSlot::ShadowDepth1,
    ];

    pub fn unit(self) -> u32 {
        self as u32
    }

    pub fn sampler_name(self) -> &'static str {
        match self {
            TextureSlot::Position => "gPosition",
            TextureSlot::Normal => "gNormal",
            TextureSlot::DiffuseColor => "gDiffuseColor",
            TextureSlot::Mask => "gMask",
            TextureSlot::Depth => "gDepth",
            TextureSlot::ShadowMask0 => "gShadowMask",
            TextureSlot::ShadowDepth0 => "gShadowDepth",
            TextureSlot::ShadowMask1 => "gShadowMask1",
            TextureSlot::ShadowDepth1 => "gShadowDepth1",
        }
    }

    /// `(mask, depth)` slots of a shadow-casting light
    pub fn shadow_pair(light: usize) -> Option<(TextureSlot, TextureSlot)> {
        match light {
            0 => Some((TextureSlot::ShadowMask0, TextureSlot::ShadowDepth0)),
            1 => Some((TextureSlot::ShadowMask1, TextureSlot::ShadowDepth1)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Vec3(Vec3),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Int(value as i32)
    }
}

pub const U_VIEW: &str = "uView";
pub const U_PROJECTION: &str = "uProjection";
pub const U_INVERSE_VIEW: &str = "uInverseView";
pub const U_INVERSE_PROJECTION: &str = "uInverseProjection";
pub const U_NORMAL_MATRIX: &str = "uNormalMatrix";
pub const U_AMBIENT_COLOR: &str = "uAmbientColor";
pub const U_USE_LIGHTING: &str = "uUseLighting";
pub const U_USE_SHADOW: &str = "uUseShadow";
pub const U_PERSPECTIVE_PROJECTION: &str = "uPerspectiveProjection";
pub const U_SHOW_DEPTH: &str = "uShowDepth";
pub const U_SHOW_NORMALS: &str = "uShowNormals";
pub const U_SHOW_POSITION: &str = "uShowPosition";

/// Per-light uniform names: location, colour, light-space matrix, shadow flag
pub const LIGHT_UNIFORMS: [[&str; 4]; MAX_POINT_LIGHTS] = [
    [
        "uPointLightingLocation",
        "uPointLightingColor",
        "uLightSpaceMatrix",
        "uShadowEnabled",
    ],
    [
        "uPointLightingLocation1",
        "uPointLightingColor1",
        "uLightSpaceMatrix1",
        "uShadowEnabled1",
    ],
];

/// Every uniform the shading pass declares
pub const UNIFORM_NAMES: [&str; 20] = [
    U_VIEW,
    U_PROJECTION,
    U_INVERSE_VIEW,
    U_INVERSE_PROJECTION,
    U_NORMAL_MATRIX,
    U_AMBIENT_COLOR,
    LIGHT_UNIFORMS[0][0],
    LIGHT_UNIFORMS[0][1],
    LIGHT_UNIFORMS[0][2],
    LIGHT_UNIFORMS[0][3],
    LIGHT_UNIFORMS[1][0],
    LIGHT_UNIFORMS[1][1],
    LIGHT_UNIFORMS[1][2],
    LIGHT_UNIFORMS[1][3],
    U_USE_LIGHTING,
    U_USE_SHADOW,
    U_PERSPECTIVE_PROJECTION,
    U_SHOW_DEPTH,
    U_SHOW_NORMALS,
    U_SHOW_POSITION,
];

/// Uniforms of one point light slot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightUniforms {
    /// View space
    pub location: Vec3,
    pub color: Vec3,
    pub light_space_matrix: Mat4,
    pub shadow_enabled: bool,
}

/// The complete uniform set of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub inverse_view: Mat4,
    pub inverse_projection: Mat4,
    pub normal_matrix: Mat3,
    pub ambient: Vec3,
    pub lights: [LightUniforms; MAX_POINT_LIGHTS],
    pub use_lighting: bool,
    pub use_shadow: bool,
    pub perspective: bool,
    pub debug_view: DebugView,
}

impl FrameUniforms {
    /// Build the uniform set. Light slots beyond `lights.len()` stay dark.
    pub fn new(
        camera: &Camera,
        lights: &[PointLight],
        ambient: Vec3,
        state: RenderState,
        shadows: &[Option<ShadowSource<'_>>],
    ) -> Self {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();

        let mut slots = [LightUniforms::default(); MAX_POINT_LIGHTS];
        for (i, (slot, light)) in slots.iter_mut().zip(lights).enumerate() {
            let shadow = shadows.get(i).copied().flatten();
            *slot = LightUniforms {
                location: light.view_space_position(&view),
                color: light.color(),
                light_space_matrix: shadow
                    .map(|s| s.light_space_matrix)
                    .unwrap_or(Mat4::IDENTITY),
                shadow_enabled: state.use_shadow && shadow.is_some(),
            };
        }

        Self {
            view,
            projection,
            inverse_view: view.inverse(),
            inverse_projection: projection.inverse(),
            normal_matrix: Mat3::from_mat4(view).inverse().transpose(),
            ambient,
            lights: slots,
            use_lighting: state.use_lighting,
            use_shadow: state.use_shadow && slots.iter().any(|l| l.shadow_enabled),
            perspective: camera.is_perspective(),
            debug_view: state.debug_view,
        }
    }

    /// Named uniform values in declaration order
    pub fn entries(&self) -> Vec<(&'static str, UniformValue)> {
        let mut entries = vec![
            (U_VIEW, UniformValue::Mat4(self.view)),
            (U_PROJECTION, UniformValue::Mat4(self.projection)),
            (U_INVERSE_VIEW, UniformValue::Mat4(self.inverse_view)),
            (U_INVERSE_PROJECTION, UniformValue::Mat4(self.inverse_projection)),
            (U_NORMAL_MATRIX, UniformValue::Mat3(self.normal_matrix)),
            (U_AMBIENT_COLOR, UniformValue::Vec3(self.ambient)),
        ];
        for (light, names) in self.lights.iter().zip(LIGHT_UNIFORMS) {
            entries.push((names[0], UniformValue::Vec3(light.location)));
            entries.push((names[1], UniformValue::Vec3(light.color)));
            entries.push((names[2], UniformValue::Mat4(light.light_space_matrix)));
            entries.push((names[3], light.shadow_enabled.into()));
        }
        entries.extend([
            (U_USE_LIGHTING, self.use_lighting.into()),
            (U_USE_SHADOW, self.use_shadow.into()),
            (U_PERSPECTIVE_PROJECTION, self.perspective.into()),
            (U_SHOW_DEPTH, (self.debug_view == DebugView::Depth).into()),
            (U_SHOW_NORMALS, (self.debug_view == DebugView::Normals).into()),
            (U_SHOW_POSITION, (self.debug_view == DebugView::Position).into()),
        ]);
        entries
    }
}

/// Backend that executes the shading pass
pub trait ShadingStage {
    /// Bind the texture of `slot` to its unit. Returns false when the slot
    /// has nothing resident.
    fn bind_texture(&mut self, slot: TextureSlot) -> bool;

    fn set_uniform(&mut self, name: &'static str, value: UniformValue);

    fn draw_fullscreen(&mut self);
}

/// What one composition pass touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComposeStats {
    pub bound_slots: usize,
    pub uniforms: usize,
}

pub struct Compositor;

impl Compositor {
    /// Bind resident textures, upload every uniform, draw once
    pub fn compose(stage: &mut dyn ShadingStage, uniforms: &FrameUniforms) -> ComposeStats {
        let mut stats = ComposeStats::default();

        for slot in TextureSlot::ALL {
            if stage.bind_texture(slot) {
                stage.set_uniform(slot.sampler_name(), UniformValue::Int(slot.unit() as i32));
                stats.bound_slots += 1;
            }
        }

        for (name, value) in uniforms.entries() {
            stage.set_uniform(name, value);
            stats.uniforms += 1;
        }

        stage.draw_fullscreen();
        stats
    }
}
