use glow::*;
use tracing::info;

use crate::error::{Error, Result};

/// Float colour framebuffer for headless renders
pub struct OffscreenTarget {
    framebuffer: Framebuffer,
    color_texture: Texture,
    pub width: u32,
    pub height: u32,
}

impl OffscreenTarget {
    /// # Safety
    /// Must be called with an active GL context.
    pub unsafe fn new(gl: &Context, width: u32, height: u32) -> Result<Self> {
        unsafe {
            let framebuffer = gl
                .create_framebuffer()
                .map_err(|e| Error::ResourceInit(format!("Failed to create framebuffer: {}", e)))?;
            let color_texture = gl.create_texture().map_err(|e| {
                Error::ResourceInit(format!("Failed to create color texture: {}", e))
            })?;

            gl.bind_texture(TEXTURE_2D, Some(color_texture));
            gl.tex_image_2d(
                TEXTURE_2D,
                0,
                RGBA32F as i32,
                width as i32,
                height as i32,
                0,
                RGBA,
                FLOAT,
                PixelUnpackData::Slice(None::<&[u8]>),
            );
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MIN_FILTER, NEAREST as i32);
            gl.tex_parameter_i32(TEXTURE_2D, TEXTURE_MAG_FILTER, NEAREST as i32);

            gl.bind_framebuffer(FRAMEBUFFER, Some(framebuffer));
            gl.framebuffer_texture_2d(
                FRAMEBUFFER,
                COLOR_ATTACHMENT0,
                TEXTURE_2D,
                Some(color_texture),
                0,
            );

            let status = gl.check_framebuffer_status(FRAMEBUFFER);
            gl.bind_framebuffer(FRAMEBUFFER, None);
            gl.bind_texture(TEXTURE_2D, None);

            if status != FRAMEBUFFER_COMPLETE {
                gl.delete_framebuffer(framebuffer);
                gl.delete_texture(color_texture);
                return Err(Error::ResourceInit(format!(
                    "Framebuffer incomplete, status: {:#x}",
                    status
                )));
            }

            info!("Created {}x{} offscreen target", width, height);
            Ok(Self {
                framebuffer,
                color_texture,
                width,
                height,
            })
        }
    }

    /// Redirect drawing into this target
    ///
    /// # Safety
    /// Must be called with an active GL context.
    pub unsafe fn bind(&self, gl: &Context) {
        unsafe {
            gl.bind_framebuffer(FRAMEBUFFER, Some(self.framebuffer));
        }
    }

    /// Read back RGB floats, bottom row first
    ///
    /// # Safety
    /// Must be called with an active GL context.
    pub unsafe fn read_rgb(&self, gl: &Context) -> Vec<f32> {
        let mut pixels = vec![0.0f32; self.width as usize * self.height as usize * 3];
        unsafe {
            gl.bind_framebuffer(FRAMEBUFFER, Some(self.framebuffer));
            gl.pixel_store_i32(PACK_ALIGNMENT, 4);
            gl.read_pixels(
                0,
                0,
                self.width as i32,
                self.height as i32,
                RGB,
                FLOAT,
                PixelPackData::Slice(Some(bytemuck::cast_slice_mut(&mut pixels))),
            );
            gl.bind_framebuffer(FRAMEBUFFER, None);
        }
        pixels
    }

    /// # Safety
    /// Must be called with an active GL context.
    pub unsafe fn destroy(self, gl: &Context) {
        unsafe {
            gl.delete_framebuffer(self.framebuffer);
            gl.delete_texture(self.color_texture);
        }
    }
}
