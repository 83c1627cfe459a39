//! The shading program must declare every name the host binds

use deferred::TextureSlot;
use deferred::compositor::UNIFORM_NAMES;
use deferred::gl::{FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE};

fn declares(source: &str, ty: &str, name: &str) -> bool {
    source
        .lines()
        .map(str::trim)
        .any(|line| line == format!("uniform {ty} {name};"))
}

#[test]
fn test_shader_files_exist() {
    assert!(!VERTEX_SHADER_SOURCE.is_empty(), "Vertex shader source is empty!");
    assert!(
        !FRAGMENT_SHADER_SOURCE.is_empty(),
        "Fragment shader source is empty!"
    );

    assert!(
        VERTEX_SHADER_SOURCE.contains("gl_Position"),
        "Vertex shader missing gl_Position"
    );
    assert!(
        VERTEX_SHADER_SOURCE.contains("gl_VertexID"),
        "Vertex shader should draw a fullscreen triangle without buffers"
    );
    assert!(
        FRAGMENT_SHADER_SOURCE.contains("FragColor"),
        "Fragment shader missing output"
    );
}

#[test]
fn test_shaders_target_gl33_core() {
    for source in [VERTEX_SHADER_SOURCE, FRAGMENT_SHADER_SOURCE] {
        assert!(source.starts_with("#version 330 core"));
    }
}

#[test]
fn test_every_sampler_is_declared() {
    for slot in TextureSlot::ALL {
        assert!(
            declares(FRAGMENT_SHADER_SOURCE, "sampler2D", slot.sampler_name()),
            "Fragment shader missing sampler {}",
            slot.sampler_name()
        );
    }
}

#[test]
fn test_every_uniform_is_declared() {
    for name in UNIFORM_NAMES {
        let declared = ["int", "vec3", "mat3", "mat4"]
            .iter()
            .any(|ty| declares(FRAGMENT_SHADER_SOURCE, ty, name));
        assert!(declared, "Fragment shader missing uniform {name}");
    }
}

#[test]
fn test_no_undeclared_uniforms() {
    let samplers: Vec<&str> = TextureSlot::ALL.iter().map(|s| s.sampler_name()).collect();
    for line in FRAGMENT_SHADER_SOURCE.lines().map(str::trim) {
        let Some(rest) = line.strip_prefix("uniform ") else {
            continue;
        };
        let name = rest
            .split_whitespace()
            .nth(1)
            .map(|n| n.trim_end_matches(';'))
            .unwrap_or_default();
        assert!(
            UNIFORM_NAMES.contains(&name) || samplers.contains(&name),
            "Shader declares {name} which the host never sets"
        );
    }
}

/// Non-declaration lines of the fragment shader
fn body_lines() -> impl Iterator<Item = &'static str> {
    FRAGMENT_SHADER_SOURCE
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("uniform ") && !line.starts_with("//"))
}

#[test]
fn test_gbuffer_samples_are_view_space() {
    for line in body_lines().filter(|l| l.contains("gPosition") || l.contains("gNormal")) {
        assert!(
            !line.contains("uView") && !line.contains("uNormalMatrix"),
            "G-buffer sample is transformed as if it were world space: {line}"
        );
    }
    for line in body_lines() {
        assert!(
            !line.contains("uView *") && !line.contains("uNormalMatrix *"),
            "View transform applied to view-space data: {line}"
        );
    }
}

#[test]
fn test_shadow_lookup_lifts_fragment_to_world() {
    let lifts = body_lines()
        .any(|line| line.contains("uInverseView * vec4(viewPosition, 1.0)"));
    assert!(lifts, "Shadow test must map view-space fragments back to world space");
}
