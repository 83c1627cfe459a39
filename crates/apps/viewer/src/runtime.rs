//! Window, GL context and event loop
//!
//! One frame per `RedrawRequested`. Scene toggles change only on key input,
//! light animation only through [`Scene::tick`].

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context as _, anyhow};
use deferred::config::WindowConfig;
use deferred::export::write_png;
use deferred::gl::{GlShadingStage, OffscreenTarget};
use deferred::{DebugView, FrameBuffers, Scene};
use glow::{Context, HasContext};
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, GlProfile, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{SurfaceAttributesBuilder, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasWindowHandle;
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[cfg(target_os = "linux")]
use winit::platform::x11::EventLoopBuilderExtX11;

/// Where the debug-frames capture is written
pub const DEBUG_CAPTURE_PATH: &str = "output/frame_last.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Render until the window closes, optionally stopping after N frames
    Interactive { debug_frames: Option<u64> },
    /// Render one frame offscreen, write it and exit
    Export(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    ToggleLighting,
    ToggleShadow,
    ToggleProjection,
    ShowView(DebugView),
}

pub fn key_action(code: KeyCode) -> Option<KeyAction> {
    match code {
        KeyCode::Escape => Some(KeyAction::Quit),
        KeyCode::KeyL => Some(KeyAction::ToggleLighting),
        KeyCode::KeyH => Some(KeyAction::ToggleShadow),
        KeyCode::KeyP => Some(KeyAction::ToggleProjection),
        KeyCode::Digit0 => Some(KeyAction::ShowView(DebugView::None)),
        KeyCode::Digit1 => Some(KeyAction::ShowView(DebugView::Depth)),
        KeyCode::Digit2 => Some(KeyAction::ShowView(DebugView::Normals)),
        KeyCode::Digit3 => Some(KeyAction::ShowView(DebugView::Position)),
        _ => None,
    }
}

/// GL objects that live as long as the window
struct GlState {
    window: Window,
    gl_context: glutin::context::PossiblyCurrentContext,
    gl_surface: glutin::surface::Surface<WindowSurface>,
    gl: Arc<Context>,
    stage: GlShadingStage,
}

pub struct ViewerRuntime {
    window_config: WindowConfig,
    mode: Mode,
    scene: Scene,
    /// Taken on upload
    frame: Option<FrameBuffers>,
    state: Option<GlState>,
    last_frame: Option<Instant>,
    frame_count: u64,
    error: Option<anyhow::Error>,
}

impl ViewerRuntime {
    pub fn new(window_config: WindowConfig, mode: Mode, scene: Scene, frame: FrameBuffers) -> Self {
        Self {
            window_config,
            mode,
            scene,
            frame: Some(frame),
            state: None,
            last_frame: None,
            frame_count: 0,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("{:#}", e);
        self.error = Some(e);
        event_loop.exit();
    }

    fn init_gl(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<GlState> {
        info!("Initializing window and GL context");

        let window_attributes = Window::default_attributes()
            .with_title(&self.window_config.title)
            .with_visible(matches!(self.mode, Mode::Interactive { .. }))
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.window_config.width,
                self.window_config.height,
            ));

        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_transparency(false);

        let display_builder = DisplayBuilder::new().with_window_attributes(Some(window_attributes));

        let (window, gl_config) = display_builder
            .build(event_loop, template, |configs| {
                configs
                    .reduce(|accum, config| {
                        if config.num_samples() > accum.num_samples() {
                            config
                        } else {
                            accum
                        }
                    })
                    .expect("display offered no GL configs")
            })
            .map_err(|e| anyhow!("Failed to create display: {}", e))?;

        let window = window.context("Display builder returned no window")?;
        let window_handle = window
            .window_handle()
            .context("Window has no native handle")?
            .as_raw();
        let gl_display = gl_config.display();

        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(window_handle));

        let gl_context = unsafe {
            gl_display
                .create_context(&gl_config, &context_attributes)
                .context("Failed to create GL 3.3 core context")?
        };

        let size = window.inner_size();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            window_handle,
            NonZeroU32::new(size.width.max(1)).context("zero width")?,
            NonZeroU32::new(size.height.max(1)).context("zero height")?,
        );

        let gl_surface = unsafe {
            gl_display
                .create_window_surface(&gl_config, &attrs)
                .context("Failed to create window surface")?
        };

        let gl_context = gl_context
            .make_current(&gl_surface)
            .context("Failed to make GL context current")?;

        let gl = Arc::new(unsafe {
            Context::from_loader_function_cstr(|s| gl_display.get_proc_address(s))
        });
        info!("OpenGL context created");

        let mut stage = unsafe { GlShadingStage::new(&gl)? };
        if let Some(frame) = self.frame.take() {
            unsafe { stage.upload_frame(&gl, &frame)? };
        }
        unsafe { stage.upload_shadows(&gl, &self.scene.shadows)? };

        Ok(GlState {
            window,
            gl_context,
            gl_surface,
            gl,
            stage,
        })
    }

    fn apply_key(&mut self, event_loop: &ActiveEventLoop, action: KeyAction) {
        match action {
            KeyAction::Quit => {
                info!("Escape pressed, exiting");
                event_loop.exit();
            }
            KeyAction::ToggleLighting => self.scene.toggle_lighting(),
            KeyAction::ToggleShadow => self.scene.toggle_shadow(),
            KeyAction::ToggleProjection => self.scene.toggle_projection(),
            KeyAction::ShowView(view) => self.scene.set_debug_view(view),
        }
    }

    /// Advance the scene and draw to the window. Returns true when done.
    fn render_frame(&mut self) -> anyhow::Result<bool> {
        let Some(state) = &self.state else {
            return Ok(false);
        };

        // No movement until a previous frame exists
        let now = Instant::now();
        let elapsed = self
            .last_frame
            .map(|last| (now - last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        self.scene.tick(elapsed);
        let uniforms = self.scene.frame_uniforms();

        let size = state.window.inner_size();
        unsafe {
            state.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            state
                .stage
                .render(&state.gl, &uniforms, size.width, size.height);
        }
        state
            .gl_surface
            .swap_buffers(&state.gl_context)
            .context("Failed to swap buffers")?;

        self.frame_count += 1;

        if let Mode::Interactive {
            debug_frames: Some(frames),
        } = self.mode
        {
            if self.frame_count >= frames {
                info!(
                    "Frame {}/{} - capturing screenshot and exiting",
                    self.frame_count, frames
                );
                capture_window(&state.gl, size.width, size.height, Path::new(DEBUG_CAPTURE_PATH))?;
                return Ok(true);
            }
            debug!("Frame {}/{}", self.frame_count, frames);
        }

        state.window.request_redraw();
        Ok(false)
    }

    /// Render one frame into an offscreen target and save it
    fn export(&self, output: &Path) -> anyhow::Result<()> {
        let state = self.state.as_ref().context("GL state not initialized")?;
        let (width, height) = (self.window_config.width, self.window_config.height);
        let uniforms = self.scene.frame_uniforms();

        unsafe {
            let target = OffscreenTarget::new(&state.gl, width, height)?;
            target.bind(&state.gl);
            state.stage.render(&state.gl, &uniforms, width, height);
            let pixels = target.read_rgb(&state.gl);
            target.destroy(&state.gl);
            write_png(output, &pixels, width as usize, height as usize)?;
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(state) = self.state.take() {
            unsafe { state.stage.destroy(&state.gl) };
            info!("Rendered {} frames", self.frame_count);
        }
    }
}

/// Save the default framebuffer as PNG
fn capture_window(gl: &Context, width: u32, height: u32, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut pixels = vec![0.0f32; width as usize * height as usize * 3];
    unsafe {
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        gl.pixel_store_i32(glow::PACK_ALIGNMENT, 4);
        gl.read_pixels(
            0,
            0,
            width as i32,
            height as i32,
            glow::RGB,
            glow::FLOAT,
            glow::PixelPackData::Slice(Some(bytemuck::cast_slice_mut(&mut pixels))),
        );
    }
    write_png(path, &pixels, width as usize, height as usize)?;
    Ok(())
}

impl ApplicationHandler for ViewerRuntime {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match self.init_gl(event_loop) {
            Ok(state) => self.state = Some(state),
            Err(e) => return self.fail(event_loop, e),
        }

        if let Mode::Export(output) = self.mode.clone() {
            let result = self.export(&output);
            self.shutdown();
            if let Err(e) = result {
                return self.fail(event_loop, e);
            }
            event_loop.exit();
            return;
        }

        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(action) = key_action(code) {
                        self.apply_key(event_loop, action);
                        if action == KeyAction::Quit {
                            self.shutdown();
                        }
                    }
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(state) = &self.state {
                    if let (Some(width), Some(height)) =
                        (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                    {
                        state.gl_surface.resize(&state.gl_context, width, height);
                    }
                    state.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => match self.render_frame() {
                Ok(true) => {
                    self.shutdown();
                    event_loop.exit();
                }
                Ok(false) => {}
                Err(e) => {
                    self.shutdown();
                    self.fail(event_loop, e);
                }
            },
            _ => (),
        }
    }
}

/// Run the viewer until the window closes or the export is written
pub fn run(
    window_config: WindowConfig,
    mode: Mode,
    scene: Scene,
    frame: FrameBuffers,
) -> anyhow::Result<()> {
    #[cfg(target_os = "linux")]
    let event_loop = {
        let mut builder = EventLoop::builder();
        builder.with_x11();
        builder.build().context("Failed to create event loop")?
    };

    #[cfg(not(target_os = "linux"))]
    let event_loop = EventLoop::new().context("Failed to create event loop")?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runtime = ViewerRuntime::new(window_config, mode, scene, frame);
    event_loop
        .run_app(&mut runtime)
        .context("Event loop error")?;

    match runtime.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
