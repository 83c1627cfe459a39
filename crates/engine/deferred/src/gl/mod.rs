//! OpenGL shading stage (glow)
//!
//! All functions here require a current GL 3.3 core context.

mod stage;
mod target;

pub use stage::{GlPass, GlShadingStage};
pub use target::OffscreenTarget;

use glow::*;

use crate::dataset::Buffer;
use crate::error::{Error, Result};

pub const VERTEX_SHADER_SOURCE: &str = include_str!("../shaders/deferred_shading.vert");
pub const FRAGMENT_SHADER_SOURCE: &str = include_str!("../shaders/deferred_shading.frag");

/// Compile a shader from source code
///
/// # Safety
/// Requires an active OpenGL context
pub unsafe fn compile_shader(gl: &Context, shader_type: u32, source: &str) -> Result<Shader> {
    unsafe {
        let shader = gl.create_shader(shader_type).map_err(Error::ResourceInit)?;

        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(Error::ResourceInit(format!(
                "Shader compilation error: {}",
                log
            )));
        }

        Ok(shader)
    }
}

/// Create and link a shader program from vertex and fragment shader sources
///
/// # Safety
/// Requires an active OpenGL context
pub unsafe fn create_program(gl: &Context, vertex_src: &str, fragment_src: &str) -> Result<Program> {
    unsafe {
        let program = gl.create_program().map_err(Error::ResourceInit)?;

        let vertex_shader = compile_shader(gl, VERTEX_SHADER, vertex_src)?;
        let fragment_shader = compile_shader(gl, FRAGMENT_SHADER, fragment_src)?;

        gl.attach_shader(program, vertex_shader);
        gl.attach_shader(program, fragment_shader);
        gl.link_program(program);

        gl.detach_shader(program, vertex_shader);
        gl.detach_shader(program, fragment_shader);
        gl.delete_shader(vertex_shader);
        gl.delete_shader(fragment_shader);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(Error::ResourceInit(format!("Program link error: {}", log)));
        }

        Ok(program)
    }
}

/// Texture storage for a buffer with `channels` floats per texel
fn texture_formats(channels: usize, high_precision: bool) -> Result<(u32, u32)> {
    let formats = match (channels, high_precision) {
        (1, false) => (R16F, RED),
        (1, true) => (R32F, RED),
        (3, _) => (RGB16F, RGB),
        (4, _) => (RGBA16F, RGBA),
        _ => {
            return Err(Error::ResourceInit(format!(
                "No texture format for {} channels",
                channels
            )));
        }
    };
    Ok(formats)
}

/// Upload a float buffer as a linearly filtered 2D texture
///
/// # Safety
/// Requires an active OpenGL context
pub unsafe fn create_float_texture(
    gl: &Context,
    buffer: &Buffer,
    high_precision: bool,
) -> Result<Texture> {
    let (internal_format, format) = texture_formats(buffer.channels, high_precision)?;
    unsafe {
        let texture = gl
            .create_texture()
            .map_err(|e| Error::ResourceInit(format!("Failed to create texture: {}", e)))?;

        gl.bind_texture(TEXTURE_2D, Some(texture));
        gl.pixel_store_i32(UNPACK_ALIGNMENT, 4);
        gl.tex_image_2d(
            TEXTURE_2D,
            0,
            internal_format as i32,
            buffer.width as i32,
            buffer.height as i32,
            0,
            format,
            FLOAT,
            PixelUnpackData::Slice(Some(bytemuck::cast_slice(&buffer.data))),
        );

        gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MIN_FILTER, LINEAR as i32);
        gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MAG_FILTER, LINEAR as i32);
        gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_S, CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_WRAP_T, CLAMP_TO_EDGE as i32);

        gl.bind_texture(TEXTURE_2D, None);

        Ok(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_formats() {
        assert_eq!(texture_formats(3, false).unwrap(), (RGB16F, RGB));
        assert_eq!(texture_formats(1, true).unwrap(), (R32F, RED));
        assert_eq!(texture_formats(4, false).unwrap(), (RGBA16F, RGBA));
        assert!(texture_formats(2, false).is_err());
    }
}
