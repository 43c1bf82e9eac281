//! Camera capture handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::capture_loop::{run_capture_loop, CaptureCommand};
use super::device::list_devices;
use super::types::{CameraError, CameraSettings, Frame, Resolution};

/// A running native camera.
///
/// The camera is opened inside a background thread which keeps the most
/// recent frame in a shared slot. [`CameraCapture::start`] blocks until the
/// thread reports that the stream is up (or failed), so call it from a
/// blocking context.
pub struct CameraCapture {
    frame_buffer: Arc<Mutex<Option<Frame>>>,
    capture_thread: Option<JoinHandle<()>>,
    command_tx: Option<Sender<CaptureCommand>>,
    stop_signal: Arc<AtomicBool>,
    settings: CameraSettings,
    /// Resolution negotiated with the device
    resolution: Resolution,
    fps: u32,
}

impl std::fmt::Debug for CameraCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("settings", &self.settings)
            .field("resolution", &self.resolution)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraCapture {
    /// Open the camera named by `settings.device_index` and start streaming.
    ///
    /// # Errors
    /// * `CameraError::DeviceNotFound` - no camera with that index
    /// * `CameraError::PermissionDenied` - the OS refused camera access
    /// * `CameraError::OpenFailed` / `StreamFailed` - the device could not stream
    pub fn start(settings: CameraSettings) -> Result<Self, CameraError> {
        let devices = list_devices()?;
        if !devices.iter().any(|d| d.index == settings.device_index) {
            return Err(CameraError::DeviceNotFound(settings.device_index));
        }

        let frame_buffer = Arc::new(Mutex::new(None));
        let stop_signal = Arc::new(AtomicBool::new(false));
        let (command_tx, command_rx) = mpsc::channel();
        let (info_tx, info_rx) = mpsc::channel::<Result<(Resolution, u32), CameraError>>();

        let buffer = Arc::clone(&frame_buffer);
        let stop = Arc::clone(&stop_signal);
        let thread_settings = settings.clone();
        let handle = std::thread::Builder::new()
            .name(format!("camera-{}", settings.device_index))
            .spawn(move || {
                run_capture_loop(thread_settings, buffer, stop, command_rx, info_tx);
            })
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;

        let outcome = info_rx.recv();
        let mut capture = Self {
            frame_buffer,
            capture_thread: Some(handle),
            command_tx: Some(command_tx),
            stop_signal,
            settings,
            resolution: Resolution::default(),
            fps: 0,
        };

        match outcome {
            Ok(Ok((resolution, fps))) => {
                capture.resolution = resolution;
                capture.fps = fps;
                Ok(capture)
            }
            Ok(Err(e)) => {
                capture.stop();
                Err(e)
            }
            Err(_) => {
                capture.stop();
                Err(CameraError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Resolution the device actually streams at.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Stop the capture thread and release the device. Idempotent.
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);

        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(CaptureCommand::Stop);
        }

        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
    }

    /// Latest decoded frame, or `None` before the first frame arrives.
    pub fn latest_frame(&self) -> Option<Frame> {
        let buffer = self.frame_buffer.lock().ok()?;
        buffer.clone()
    }

    /// Whether the capture thread is still delivering frames.
    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
