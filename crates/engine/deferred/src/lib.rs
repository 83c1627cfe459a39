//! Deferred G-buffer compositing library
//!
//! Loads precomputed per-pixel G-buffers (position, normal, mask, depth and
//! optional per-light shadow buffers) and composites one lit frame with a
//! single full-screen shading pass.
//!
//! # Architecture
//!
//! - **dataset**: Keyed float buffer stores (raw directory, memory, HDF5)
//! - **metadata**: Scene parameters encoded in dataset filenames
//! - **camera**: View and projection matrices
//! - **lighting**: Orbiting and fixed point lights
//! - **shadow**: Light-space matrices paired with shadow buffers
//! - **compositor**: Per-frame uniform set and the single-draw pass
//! - **gl**: glow implementation of the shading stage
//! - **scene**: Camera, lights and toggles owned by the render loop
//! - **export**: PNG output of composited frames

// Core modules
pub mod camera;
pub mod compositor;
pub mod lighting;
pub mod scene;
pub mod shadow;
pub mod units;

// Inputs and outputs
pub mod config;
pub mod dataset;
pub mod export;
pub mod metadata;

// GPU stage
pub mod gl;

pub mod error;

// Re-export commonly used types at crate root
pub use camera::{Camera, Orientation, ProjectionMode};
pub use compositor::{Compositor, FrameUniforms, ShadingStage, TextureSlot, UniformValue};
pub use config::{DebugView, RenderState, SceneConfig};
pub use dataset::{DatasetStore, FrameBuffers, ShadowBuffers, open_dataset};
pub use error::{ConfigParseError, DatasetError, Error, Result};
pub use lighting::{MAX_POINT_LIGHTS, PointLight};
pub use scene::Scene;
pub use shadow::ShadowEvaluator;
pub use units::{Degrees, Radians};
