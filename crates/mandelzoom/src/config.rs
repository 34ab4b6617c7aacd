//! Startup configuration, read once and immutable for the process lifetime.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Camera state narrower than an `f64` mantissa would defeat the point of
/// the extended-precision representation.
const MIN_PRECISION_BITS: u32 = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub constants: Constants,
    #[serde(default)]
    pub resources: Resources,
    #[serde(default)]
    pub camera: CameraTuning,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Constants {
    /// Iteration limit handed to the shader unchanged.
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resources {
    /// Directory containing the fragment shader.
    #[serde(default = "default_shader_dir")]
    pub shader_dir: PathBuf,
    /// Directory holding overlay assets (fonts etc.); checked at startup for
    /// the external overlay's benefit, not consumed by the core.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraTuning {
    /// Mantissa width for camera state, in bits.
    #[serde(default = "default_precision_bits")]
    pub precision_bits: u32,
    /// Screen-delta divisor for drag panning.
    #[serde(default = "default_drag_sensitivity")]
    pub drag_sensitivity: f64,
    /// Step divisor for scroll and auto-zoom. Deliberately distinct from the
    /// drag divisor; the two interaction paths are tuned separately.
    #[serde(default = "default_zoom_sensitivity")]
    pub zoom_sensitivity: f64,
}

fn default_shader_dir() -> PathBuf {
    PathBuf::from("shaders")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_precision_bits() -> u32 {
    viewer::camera::DEFAULT_PRECISION_BITS
}

fn default_drag_sensitivity() -> f64 {
    viewer::camera::DRAG_SENSITIVITY
}

fn default_zoom_sensitivity() -> f64 {
    viewer::camera::ZOOM_SENSITIVITY
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            shader_dir: default_shader_dir(),
            assets_dir: default_assets_dir(),
        }
    }
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            precision_bits: default_precision_bits(),
            drag_sensitivity: default_drag_sensitivity(),
            zoom_sensitivity: default_zoom_sensitivity(),
        }
    }
}

impl AppConfig {
    /// Reads and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates a configuration document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.constants.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "constants.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.camera.precision_bits < MIN_PRECISION_BITS {
            return Err(ConfigError::Invalid(format!(
                "camera.precision_bits must be at least {MIN_PRECISION_BITS}"
            )));
        }
        if self.camera.drag_sensitivity <= 0.0 || self.camera.zoom_sensitivity <= 0.0 {
            return Err(ConfigError::Invalid(
                "camera sensitivities must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[constants]
max_iterations = 512

[resources]
shader_dir = "shaders"
assets_dir = "assets"

[camera]
precision_bits = 256
drag_sensitivity = 150.0
zoom_sensitivity = 8.0
"#;

    #[test]
    fn parses_sample_config() {
        let config = AppConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.constants.max_iterations, 512);
        assert_eq!(config.resources.shader_dir, PathBuf::from("shaders"));
        assert_eq!(config.camera.precision_bits, 256);
        assert_eq!(config.camera.drag_sensitivity, 150.0);
        assert_eq!(config.camera.zoom_sensitivity, 8.0);
    }

    #[test]
    fn optional_tables_fall_back_to_defaults() {
        let config = AppConfig::from_toml_str("[constants]\nmax_iterations = 100\n")
            .expect("parse minimal config");
        assert_eq!(config.resources.shader_dir, PathBuf::from("shaders"));
        assert_eq!(config.camera.precision_bits, 128);
        assert_eq!(config.camera.drag_sensitivity, 200.0);
        assert_eq!(config.camera.zoom_sensitivity, 10.0);
    }

    #[test]
    fn missing_constants_table_is_an_error() {
        assert!(AppConfig::from_toml_str("[resources]\n").is_err());
    }

    #[test]
    fn zero_iterations_are_rejected() {
        let err = AppConfig::from_toml_str("[constants]\nmax_iterations = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn narrow_precision_is_rejected() {
        let raw = "[constants]\nmax_iterations = 100\n[camera]\nprecision_bits = 32\n";
        assert!(matches!(
            AppConfig::from_toml_str(raw),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn non_positive_sensitivity_is_rejected() {
        let raw = "[constants]\nmax_iterations = 100\n[camera]\nzoom_sensitivity = 0.0\n";
        assert!(matches!(
            AppConfig::from_toml_str(raw),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn loads_from_a_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write config");
        let config = AppConfig::load(file.path()).expect("load config");
        assert_eq!(config.constants.max_iterations, 512);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = AppConfig::load(Path::new("/nonexistent/conf.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/conf.toml"));
    }
}
