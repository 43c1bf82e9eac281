//! Configuration file handling for camsnap.
//!
//! Loads configuration from `<config dir>/camsnap/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::Resolution;
use crate::export::{is_plain_filename, SaveMethod, DEFAULT_FILENAME};
use crate::hotplug::MIN_POLL_INTERVAL;
use crate::native::NativeOptions;
use crate::preview::CharSet;
use crate::session::SessionOptions;
use crate::status::DEFAULT_MAX_ERROR_LINES;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub photo: PhotoConfig,
    #[serde(default)]
    pub hotplug: HotplugConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: Resolution::HD.width,
            height: Resolution::HD.height,
            fps: 30,
            mirror: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PhotoConfig {
    pub filename: String,
    /// Defaults to the user's pictures directory
    pub output_dir: Option<PathBuf>,
    pub jpeg_quality: u8,
    pub save_method: SaveMethod,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            output_dir: None,
            jpeg_quality: 92,
            save_method: SaveMethod::Auto,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HotplugConfig {
    pub enabled: bool,
    pub poll_interval_ms: u64,
}

impl Default for HotplugConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    pub max_error_lines: usize,
    pub charset: CharSet,
    /// Render the live ASCII preview
    pub preview: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            max_error_lines: DEFAULT_MAX_ERROR_LINES,
            charset: CharSet::default(),
            preview: true,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            let config = Self::parse(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?;
            config
                .validate()
                .map_err(|message| ConfigError::Invalid { path, message })?;
            Ok(config)
        } else {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Check values serde alone cannot reject.
    pub fn validate(&self) -> Result<(), String> {
        self.resolution()
            .validate()
            .map_err(|e| format!("[camera] {}", e))?;
        if !is_plain_filename(&self.photo.filename) {
            return Err(format!(
                "[photo] filename '{}' must be a plain name without directories",
                self.photo.filename
            ));
        }
        Ok(())
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.camera.width, self.camera.height)
    }

    /// Directory photos are written to.
    pub fn output_dir(&self) -> PathBuf {
        self.photo
            .output_dir
            .clone()
            .or_else(dirs::picture_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            resolution: self.resolution(),
            filename: self.photo.filename.clone(),
            jpeg_quality: self.photo.jpeg_quality.clamp(1, 100),
            max_error_lines: self.ui.max_error_lines,
        }
    }

    pub fn native_options(&self) -> NativeOptions {
        NativeOptions {
            fps: self.camera.fps.max(1),
            mirror: self.camera.mirror,
            hotplug_interval: self.hotplug.enabled.then(|| {
                Duration::from_millis(self.hotplug.poll_interval_ms).max(MIN_POLL_INTERVAL)
            }),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid config file '{}': {message}", .path.display())]
    Invalid { path: PathBuf, message: String },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("camsnap").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/camsnap/config.toml")
        })
}

/// Contents written by `camsnap config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# camsnap configuration

[camera]
# Requested capture size (the camera may pick the closest it supports)
width = 1280
height = 720
fps = 30
# Mirror horizontally (selfie mode)
mirror = false

[photo]
filename = "myPhoto.jpg"
# output_dir = "~/Pictures"
# JPEG quality, 1-100
jpeg_quality = 92
# auto: write encoded bytes directly; data-url: go through a data: URL
save_method = "auto"

[hotplug]
enabled = true
poll_interval_ms = 2000

[ui]
# Error lines kept on screen
max_error_lines = 5
# Preview charset: standard, blocks, minimal
charset = "standard"
preview = true
"#;
