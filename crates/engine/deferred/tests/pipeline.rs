//! End-to-end tests of the host side pipeline: dataset -> scene -> uniforms -> stage

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use deferred::compositor::UNIFORM_NAMES;
use deferred::config::LightConfig;
use deferred::dataset::RawDirStore;
use deferred::{
    Compositor, DebugView, FrameBuffers, PointLight, Scene, SceneConfig, ShadingStage,
    ShadowEvaluator, TextureSlot, UniformValue, open_dataset,
};
use glam::Vec3;

const SIZE: usize = 4;

/// Shading stage that records every call instead of talking to a GPU
#[derive(Default)]
struct RecordingStage {
    resident: HashSet<TextureSlot>,
    bound: Vec<TextureSlot>,
    uniforms: Vec<(&'static str, UniformValue)>,
    draws: usize,
}

impl RecordingStage {
    fn with_gbuffer() -> Self {
        Self {
            resident: TextureSlot::ALL[..5].iter().copied().collect(),
            ..Default::default()
        }
    }

    fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

impl ShadingStage for RecordingStage {
    fn bind_texture(&mut self, slot: TextureSlot) -> bool {
        if self.resident.contains(&slot) {
            self.bound.push(slot);
            true
        } else {
            false
        }
    }

    fn set_uniform(&mut self, name: &'static str, value: UniformValue) {
        self.uniforms.push((name, value));
    }

    fn draw_fullscreen(&mut self) {
        self.draws += 1;
    }
}

fn write_gbuffer(dir: &Path) {
    let store = RawDirStore::open(dir).unwrap();
    let texels = SIZE * SIZE;
    store.write("position", &vec![0.0; texels * 3]).unwrap();
    store.write("normal", &[0.0f32, 0.0, 1.0].repeat(texels)).unwrap();
    store.write("mask", &vec![1.0; texels]).unwrap();
    store.write("depth", &vec![0.5; texels]).unwrap();
}

fn write_shadow(dir: &Path) {
    let store = RawDirStore::open(dir).unwrap();
    store.write("mask", &vec![1.0; SIZE * SIZE]).unwrap();
    store.write("depth", &vec![0.25; SIZE * SIZE]).unwrap();
}

fn small_config(dataset: PathBuf) -> SceneConfig {
    let mut config = SceneConfig::default();
    config.window.width = SIZE as u32;
    config.window.height = SIZE as u32;
    config.dataset.path = Some(dataset);
    config
}

#[test]
fn test_single_draw_regardless_of_light_count() {
    let base = Scene::from_config(&SceneConfig::default()).unwrap();

    for count in 0..=2 {
        let lights: Vec<PointLight> = base.lights.iter().copied().take(count).collect();
        let scene = Scene::new(
            base.camera,
            lights,
            base.ambient,
            base.state,
            ShadowEvaluator::default(),
        )
        .unwrap();

        let mut stage = RecordingStage::with_gbuffer();
        let uniforms = scene.frame_uniforms();
        Compositor::compose(&mut stage, &uniforms);
        assert_eq!(stage.draws, 1, "{count} lights should still draw once");
    }
}

#[test]
fn test_only_known_uniform_names_are_emitted() {
    let scene = Scene::from_config(&SceneConfig::default()).unwrap();
    let mut stage = RecordingStage::with_gbuffer();
    let stats = Compositor::compose(&mut stage, &scene.frame_uniforms());

    let samplers: Vec<&str> = TextureSlot::ALL.iter().map(|s| s.sampler_name()).collect();
    for (name, _) in &stage.uniforms {
        assert!(
            UNIFORM_NAMES.contains(name) || samplers.contains(name),
            "unexpected uniform {name}"
        );
    }
    assert_eq!(stats.bound_slots, 5);
    assert_eq!(stage.bound, TextureSlot::ALL[..5].to_vec());
    assert_eq!(stats.uniforms, UNIFORM_NAMES.len());
    assert_eq!(
        stage.uniform("gDepth"),
        Some(UniformValue::Int(TextureSlot::Depth.unit() as i32))
    );
    // Shadow slots were never uploaded, so their samplers are not set
    assert_eq!(stage.uniform("gShadowMask"), None);
}

#[test]
fn test_load_dataset_and_compose() {
    let root = tempfile::tempdir().unwrap();
    let dataset = root.path().join("A_1.5_20.000000_90.0_100.0");
    std::fs::create_dir(&dataset).unwrap();
    write_gbuffer(&dataset);

    let store = open_dataset(&dataset).unwrap();
    let frame = FrameBuffers::load(store.as_ref(), SIZE, SIZE).unwrap();
    assert!(frame.diffuse.data.iter().all(|&v| v == 1.0));

    let config = small_config(dataset);
    let scene = Scene::from_config(&config).unwrap();
    // Azimuth 100, elevation 90 from the directory name
    let expected_eye = deferred::camera::spherical_to_cartesian(
        deferred::Degrees(100.0).to_radians(),
        deferred::Degrees(90.0).to_radians(),
        config.camera.distance,
    );
    assert!(scene.camera.eye.abs_diff_eq(expected_eye, 1e-4));

    let mut stage = RecordingStage::with_gbuffer();
    Compositor::compose(&mut stage, &scene.frame_uniforms());
    assert_eq!(stage.uniform("uShowNormals"), Some(UniformValue::Int(1)));
    assert_eq!(stage.uniform("uPerspectiveProjection"), Some(UniformValue::Int(1)));
}

#[test]
fn test_missing_shadow_only_disables_that_light() {
    let root = tempfile::tempdir().unwrap();
    let shadow1 = root.path().join("shadow1");
    std::fs::create_dir(&shadow1).unwrap();
    write_shadow(&shadow1);

    let mut config = SceneConfig::default();
    config.window.width = SIZE as u32;
    config.window.height = SIZE as u32;
    config.render.use_shadow = true;
    config.render.debug_view = DebugView::None;
    config.dataset.shadows = vec![Some(root.path().join("missing")), Some(shadow1)];

    let scene = Scene::from_config(&config).unwrap();
    assert!(scene.shadows.buffers(0).is_none());
    assert!(scene.shadows.buffers(1).is_some());

    let uniforms = scene.frame_uniforms();
    assert!(!uniforms.lights[0].shadow_enabled);
    assert!(uniforms.lights[1].shadow_enabled);
    assert!(uniforms.use_shadow);
    // Both lights still contribute
    assert_eq!(uniforms.lights[0].color, Vec3::splat(2.0));
    assert_eq!(uniforms.lights[1].color, Vec3::splat(2.0));

    let mut stage = RecordingStage::with_gbuffer();
    stage.resident.insert(TextureSlot::ShadowMask1);
    stage.resident.insert(TextureSlot::ShadowDepth1);
    Compositor::compose(&mut stage, &uniforms);
    assert_eq!(stage.uniform("uShadowEnabled"), Some(UniformValue::Int(0)));
    assert_eq!(stage.uniform("uShadowEnabled1"), Some(UniformValue::Int(1)));
    assert_eq!(stage.uniform("gShadowDepth1"), Some(UniformValue::Int(8)));
    assert_eq!(stage.draws, 1);
}

/// Light 1 sits straight below an off-origin center, so its shadow view is degenerate
fn degenerate_shadow_config(root: &Path) -> SceneConfig {
    let shadow1 = root.join("shadow1");
    std::fs::create_dir(&shadow1).unwrap();
    write_shadow(&shadow1);

    let mut config = SceneConfig::default();
    config.window.width = SIZE as u32;
    config.window.height = SIZE as u32;
    config.camera.center = [8.0, 0.0, 3.0];
    config.lighting.lights[1] = LightConfig::Fixed {
        position: [8.0, 0.0, 0.0],
        intensity: 2.0,
    };
    config.dataset.shadows = vec![None, Some(shadow1)];
    config
}

#[test]
fn test_degenerate_shadow_view_never_fails_frame() {
    let root = tempfile::tempdir().unwrap();
    let mut config = degenerate_shadow_config(root.path());
    config.validate().unwrap();

    config.render.use_shadow = false;
    let scene = Scene::from_config(&config).unwrap();
    assert!(scene.shadows.buffers(1).is_some());
    let uniforms = scene.frame_uniforms();
    assert!(!uniforms.use_shadow);
    assert!(!uniforms.lights[1].shadow_enabled);

    config.render.use_shadow = true;
    let scene = Scene::from_config(&config).unwrap();
    let uniforms = scene.frame_uniforms();
    // Only the degenerate light loses its shadow, lighting is unaffected
    assert!(!uniforms.lights[1].shadow_enabled);
    assert_eq!(uniforms.lights[1].color, Vec3::splat(2.0));

    let mut stage = RecordingStage::with_gbuffer();
    Compositor::compose(&mut stage, &uniforms);
    assert_eq!(stage.uniform("uShadowEnabled1"), Some(UniformValue::Int(0)));
    assert_eq!(stage.draws, 1);
}

#[test]
fn test_tick_then_uniforms_follow_light() {
    let mut scene = Scene::from_config(&SceneConfig::default()).unwrap();
    let before = scene.frame_uniforms().lights[0].location;
    scene.tick(0.5);
    let after = scene.frame_uniforms().lights[0].location;
    assert_ne!(before, after);
    // Distance from the orbit origin is unchanged in view space too
    let origin = scene.camera.view_matrix().transform_point3(Vec3::ZERO);
    assert!(((after - origin).length() - 13.5).abs() < 1e-3);
}
