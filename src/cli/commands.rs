//! Subcommand handlers for list-cameras, snap and config actions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use super::args::ConfigAction;
use crate::camera::{self, CameraError};
use crate::config::{Config, DEFAULT_CONFIG_TOML};
use crate::export::{DiskSaver, PhotoSaver, SavedPhoto};
use crate::media::MediaDevices;
use crate::native::NativeHost;
use crate::session::CameraSession;

/// How often `snap` checks for the first frame.
const FRAME_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    Camera(#[from] CameraError),
    #[error("No camera stream: {0}")]
    NoStream(String),
    #[error("No frame arrived within {0} ms")]
    NoFrame(u64),
    #[error("Photo was not saved: {0}")]
    NotSaved(String),
    #[error("Config file already exists: {}", .0.display())]
    ConfigExists(PathBuf),
    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// List available cameras and print them to stdout.
pub fn list_cameras() -> Result<(), CommandError> {
    let devices = camera::list_devices()?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
        println!("On macOS, grant access in System Settings > Privacy & Security > Camera.");
    } else {
        println!("Available cameras:");
        for device in devices {
            println!("  {}", device);
        }
    }
    Ok(())
}

/// Open the first camera, save one photo and return where it went.
pub async fn snap(config: &Config, wait: Duration) -> Result<PathBuf, CommandError> {
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let mut native = config.native_options();
    native.hotplug_interval = None;

    let host = NativeHost::new(native, tx);
    let saver = DiskSaver::new(config.output_dir(), config.photo.save_method);
    let mut session = CameraSession::new(host, saver, config.session_options());

    let result = snap_once(&mut session, wait).await;
    session.shutdown();
    session.host().finish_pending_stops().await;
    Ok(result?.path)
}

/// Initialise `session`, wait up to `wait` for a frame, capture and save it.
pub async fn snap_once<H: MediaDevices, P: PhotoSaver>(
    session: &mut CameraSession<H, P>,
    wait: Duration,
) -> Result<SavedPhoto, CommandError> {
    session.init().await;
    if !session.state().has_stream() {
        return Err(CommandError::NoStream(last_error(session)));
    }

    let deadline = Instant::now() + wait;
    while !session.capture() {
        if Instant::now() >= deadline {
            return Err(CommandError::NoFrame(wait.as_millis() as u64));
        }
        tokio::time::sleep(FRAME_POLL).await;
    }

    session
        .save_photo()
        .ok_or_else(|| CommandError::NotSaved(last_error(session)))
}

fn last_error<H: MediaDevices, P: PhotoSaver>(session: &CameraSession<H, P>) -> String {
    session
        .status()
        .errors()
        .last()
        .map(|line| line.trim_start_matches("ERROR: ").to_string())
        .unwrap_or_else(|| session.state().to_string())
}

/// Handle config subcommand actions. `path` is where the config lives.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    path: &Path,
) -> Result<(), CommandError> {
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!("  Resolution: {}", config.resolution());
            println!("  FPS: {}", config.camera.fps);
            println!("  Mirror: {}", if config.camera.mirror { "yes" } else { "no" });
            println!("  Photo: {}", config.output_dir().join(&config.photo.filename).display());
            println!("  JPEG quality: {}", config.photo.jpeg_quality);
            println!("  Save method: {:?}", config.photo.save_method);
            match config.native_options().hotplug_interval {
                Some(interval) => println!("  Hot-plug polling: every {} ms", interval.as_millis()),
                None => println!("  Hot-plug polling: off"),
            }
            println!("  Charset: {:?}", config.ui.charset);
            println!("  Error lines: {}", config.ui.max_error_lines);
            println!();

            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found)", path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            init_config(path)?;
            println!("Created config file: {}", path.display());
            Ok(())
        }
    }
}

/// Write the default config to `path`, refusing to overwrite.
pub fn init_config(path: &Path) -> Result<(), CommandError> {
    if path.exists() {
        return Err(CommandError::ConfigExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| CommandError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, DEFAULT_CONFIG_TOML).map_err(|source| CommandError::Io {
        path: path.to_path_buf(),
        source,
    })
}
