use std::collections::HashMap;

use glow::*;
use tracing::{debug, info};

use super::{FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE, create_float_texture, create_program};
use crate::compositor::{
    ComposeStats, Compositor, FrameUniforms, ShadingStage, TextureSlot, UNIFORM_NAMES,
    UniformValue,
};
use crate::dataset::{Buffer, FrameBuffers, ShadowBuffers};
use crate::error::{Error, Result};
use crate::shadow::ShadowEvaluator;

/// GL resources of the composition pass
///
/// Owns the shader program, one texture per resident [`TextureSlot`] and the
/// uniform location cache.
pub struct GlShadingStage {
    program: Program,
    vao: VertexArray,
    textures: HashMap<TextureSlot, Texture>,
    uniform_locations: HashMap<&'static str, UniformLocation>,
}

impl GlShadingStage {
    /// Compile the shading program and look up its uniforms
    ///
    /// # Safety
    /// Must be called with an active GL context.
    pub unsafe fn new(gl: &Context) -> Result<Self> {
        unsafe {
            info!("Compiling deferred shading program");
            let program = create_program(gl, VERTEX_SHADER_SOURCE, FRAGMENT_SHADER_SOURCE)?;

            // Create VAO for fullscreen triangle
            let vao = gl
                .create_vertex_array()
                .map_err(|e| Error::ResourceInit(format!("Failed to create VAO: {}", e)))?;

            let names = UNIFORM_NAMES
                .iter()
                .copied()
                .chain(TextureSlot::ALL.iter().map(|s| s.sampler_name()));
            let mut uniform_locations = HashMap::new();
            for name in names {
                match gl.get_uniform_location(program, name) {
                    Some(location) => {
                        uniform_locations.insert(name, location);
                    }
                    None => debug!("Uniform {} is inactive", name),
                }
            }

            Ok(Self {
                program,
                vao,
                textures: HashMap::new(),
                uniform_locations,
            })
        }
    }

    /// Replace a slot's texture with `buffer`
    unsafe fn replace_texture(
        &mut self,
        gl: &Context,
        slot: TextureSlot,
        buffer: &Buffer,
        high_precision: bool,
    ) -> Result<()> {
        unsafe {
            let texture = create_float_texture(gl, buffer, high_precision)?;
            if let Some(old) = self.textures.insert(slot, texture) {
                gl.delete_texture(old);
            }
        }
        Ok(())
    }

    /// Upload every G-buffer channel
    ///
    /// # Safety
    /// Must be called with an active GL context.
    pub unsafe fn upload_frame(&mut self, gl: &Context, frame: &FrameBuffers) -> Result<()> {
        unsafe {
            self.replace_texture(gl, TextureSlot::Position, &frame.position, false)?;
            self.replace_texture(gl, TextureSlot::Normal, &frame.normal, false)?;
            self.replace_texture(gl, TextureSlot::DiffuseColor, &frame.diffuse, false)?;
            self.replace_texture(gl, TextureSlot::Mask, &frame.mask, false)?;
            self.replace_texture(gl, TextureSlot::Depth, &frame.depth, false)?;
        }
        info!("Uploaded G-buffer textures ({}x{})", frame.width, frame.height);
        Ok(())
    }

    /// Upload the shadow buffers of one light
    ///
    /// # Safety
    /// Must be called with an active GL context.
    pub unsafe fn upload_shadow(
        &mut self,
        gl: &Context,
        light: usize,
        buffers: &ShadowBuffers,
    ) -> Result<()> {
        let (mask_slot, depth_slot) = TextureSlot::shadow_pair(light).ok_or_else(|| {
            Error::ResourceInit(format!("No shadow texture slots for light {}", light))
        })?;
        unsafe {
            self.replace_texture(gl, mask_slot, &buffers.mask, false)?;
            self.replace_texture(gl, depth_slot, &buffers.depth, true)?;
        }
        info!("Uploaded shadow textures for light {}", light);
        Ok(())
    }

    /// Upload whatever shadow buffers the evaluator holds
    ///
    /// # Safety
    /// Must be called with an active GL context.
    pub unsafe fn upload_shadows(&mut self, gl: &Context, shadows: &ShadowEvaluator) -> Result<()> {
        for light in 0..crate::lighting::MAX_POINT_LIGHTS {
            if let Some(buffers) = shadows.buffers(light) {
                unsafe { self.upload_shadow(gl, light, buffers)? };
            }
        }
        Ok(())
    }

    /// Borrow the stage for one pass
    ///
    /// # Safety
    /// The GL context must stay current while the pass is used.
    pub unsafe fn pass<'a>(&'a self, gl: &'a Context) -> GlPass<'a> {
        GlPass { gl, stage: self }
    }

    /// Draw one composited frame into the currently bound framebuffer
    ///
    /// # Safety
    /// Must be called with an active GL context.
    pub unsafe fn render(
        &self,
        gl: &Context,
        uniforms: &FrameUniforms,
        width: u32,
        height: u32,
    ) -> ComposeStats {
        unsafe {
            gl.viewport(0, 0, width as i32, height as i32);
            let ambient = uniforms.ambient;
            gl.clear_color(ambient.x, ambient.y, ambient.z, 1.0);
            gl.clear(COLOR_BUFFER_BIT);
            gl.disable(DEPTH_TEST);
            gl.disable(BLEND);

            gl.use_program(Some(self.program));
            gl.bind_vertex_array(Some(self.vao));

            let mut pass = self.pass(gl);
            let stats = Compositor::compose(&mut pass, uniforms);

            gl.bind_vertex_array(None);
            gl.use_program(None);
            stats
        }
    }

    /// Clean up OpenGL resources
    ///
    /// # Safety
    /// Must be called with an active GL context.
    pub unsafe fn destroy(self, gl: &Context) {
        unsafe {
            for (_, texture) in self.textures {
                gl.delete_texture(texture);
            }
            gl.delete_vertex_array(self.vao);
            gl.delete_program(self.program);
        }
    }
}

/// [`ShadingStage`] backed by a live GL context
pub struct GlPass<'a> {
    gl: &'a Context,
    stage: &'a GlShadingStage,
}

impl ShadingStage for GlPass<'_> {
    fn bind_texture(&mut self, slot: TextureSlot) -> bool {
        let Some(texture) = self.stage.textures.get(&slot) else {
            return false;
        };
        // SAFETY: a GlPass only exists while its context is current
        unsafe {
            self.gl.active_texture(TEXTURE0 + slot.unit());
            self.gl.bind_texture(TEXTURE_2D, Some(*texture));
        }
        true
    }

    fn set_uniform(&mut self, name: &'static str, value: UniformValue) {
        let Some(location) = self.stage.uniform_locations.get(name) else {
            return;
        };
        let gl = self.gl;
        let location = Some(location);
        // SAFETY: a GlPass only exists while its context is current
        unsafe {
            match value {
                UniformValue::Int(v) => gl.uniform_1_i32(location, v),
                UniformValue::Vec3(v) => gl.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Mat3(m) => {
                    gl.uniform_matrix_3_f32_slice(location, false, &m.to_cols_array())
                }
                UniformValue::Mat4(m) => {
                    gl.uniform_matrix_4_f32_slice(location, false, &m.to_cols_array())
                }
            }
        }
    }

    fn draw_fullscreen(&mut self) {
        // SAFETY: a GlPass only exists while its context is current
        unsafe {
            self.gl.draw_arrays(TRIANGLES, 0, 3);
        }
    }
}
