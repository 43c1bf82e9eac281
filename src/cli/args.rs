//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::camera::Resolution;
use crate::config::Config;
use crate::export::SaveMethod;
use crate::preview::CharSet;

/// Webcam preview and snapshot tool for the terminal
#[derive(Parser, Debug)]
#[command(name = "camsnap")]
#[command(version, about = "Preview a webcam in the terminal and save JPEG snapshots", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Directory photos are saved to
    #[arg(long, short, global = true)]
    pub output_dir: Option<PathBuf>,

    /// File name of the saved photo
    #[arg(long, global = true)]
    pub filename: Option<String>,

    /// JPEG quality (1-100)
    #[arg(long, short, global = true, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Requested capture size, e.g. 1280x720
    #[arg(long, short, global = true)]
    pub resolution: Option<Resolution>,

    /// Mirror camera horizontally
    #[arg(long, global = true)]
    pub mirror: bool,

    /// How photos are written: auto, data-url
    #[arg(long, global = true)]
    pub save_method: Option<SaveMethod>,

    /// ASCII character set for the preview: standard, blocks, minimal
    #[arg(long, global = true)]
    pub charset: Option<CharSet>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras
    ListCameras,
    /// Capture one photo from the first camera and exit
    Snap {
        /// How long to wait for the first frame, in milliseconds
        #[arg(long, default_value = "5000")]
        wait_ms: u64,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

impl Args {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.photo.output_dir = Some(dir.clone());
        }
        if let Some(filename) = &self.filename {
            config.photo.filename = filename.clone();
        }
        if let Some(quality) = self.quality {
            config.photo.jpeg_quality = quality;
        }
        if let Some(resolution) = self.resolution {
            config.camera.width = resolution.width;
            config.camera.height = resolution.height;
        }
        if self.mirror {
            config.camera.mirror = true;
        }
        if let Some(method) = self.save_method {
            config.photo.save_method = method;
        }
        if let Some(charset) = self.charset {
            config.ui.charset = charset;
        }
    }
}
