//! Command line arguments

use clap::Parser;
use deferred::{ConfigParseError, SceneConfig};
use std::path::PathBuf;

/// Composite and view precomputed G-buffer datasets
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "gbuffer-viewer", version, about)]
pub struct Args {
    /// G-buffer dataset (directory of .f32 buffers, or .h5 with the hdf5 feature)
    #[arg(value_name = "DATASET")]
    pub dataset: Option<PathBuf>,

    /// Load scene configuration from a TOML file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Render one frame offscreen, write it as PNG and exit
    #[arg(long, short = 'o', value_name = "PNG")]
    pub export: Option<PathBuf>,

    /// Shadow dataset for the next light (repeat once per light)
    #[arg(long, value_name = "PATH")]
    pub shadow: Vec<PathBuf>,

    /// Run N frames, save the last one to output/frame_last.png, then exit
    #[arg(long, value_name = "FRAMES")]
    pub debug_frames: Option<u64>,
}

impl Args {
    /// Scene configuration with command line overrides applied
    pub fn scene_config(&self) -> Result<SceneConfig, ConfigParseError> {
        let mut config = match &self.config {
            Some(path) => SceneConfig::load(path)?,
            None => SceneConfig::default(),
        };

        if let Some(dataset) = &self.dataset {
            config.dataset.path = Some(dataset.clone());
        }
        if !self.shadow.is_empty() {
            config.dataset.shadows = self.shadow.iter().cloned().map(Some).collect();
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::parse_from([
            "gbuffer-viewer",
            "data/A_1.5_20_90_100.h5",
            "--config",
            "scene.toml",
            "--export",
            "out.png",
            "--shadow",
            "s0.h5",
            "--shadow",
            "s1.h5",
            "--debug-frames",
            "10",
        ]);
        assert_eq!(args.dataset, Some(PathBuf::from("data/A_1.5_20_90_100.h5")));
        assert_eq!(args.config, Some(PathBuf::from("scene.toml")));
        assert_eq!(args.export, Some(PathBuf::from("out.png")));
        assert_eq!(
            args.shadow,
            vec![PathBuf::from("s0.h5"), PathBuf::from("s1.h5")]
        );
        assert_eq!(args.debug_frames, Some(10));
    }

    #[test]
    fn test_parse_no_args() {
        let args = Args::parse_from(["gbuffer-viewer"]);
        assert!(args.dataset.is_none());
        assert!(args.shadow.is_empty());
        assert!(args.export.is_none());
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = Args::parse_from(["gbuffer-viewer", "gbuf", "--shadow", "s0"]);
        let config = args.scene_config().unwrap();
        assert_eq!(config.dataset.path, Some(PathBuf::from("gbuf")));
        assert_eq!(config.dataset.shadows, vec![Some(PathBuf::from("s0"))]);
        assert_eq!(config.window.width, 1024);
    }

    #[test]
    fn test_sample_scene_parses() {
        let config = SceneConfig::from_toml_str(include_str!("../scene.toml")).unwrap();
        assert_eq!(config.lighting.lights.len(), 2);
        assert_eq!(
            config.lighting.build_lights(),
            SceneConfig::default().lighting.build_lights()
        );
    }

    #[test]
    fn test_too_many_shadows_rejected() {
        let args = Args::parse_from([
            "gbuffer-viewer",
            "--shadow",
            "a",
            "--shadow",
            "b",
            "--shadow",
            "c",
        ]);
        assert!(args.scene_config().is_err());
    }
}
