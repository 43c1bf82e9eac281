//! The camera session controller.
//!
//! [`CameraSession`] owns the device list, the device cursor, the live
//! stream (through its preview surface) and the staged photo. It is driven
//! one event at a time from a single task; every host call is awaited to
//! completion before the next event is handled, so at most one stream
//! request is ever in flight.
//!
//! Failures never escape the session. They are turned into `ERROR:` lines on
//! the [`StatusBoard`] and the session stays usable.

mod state;

pub use state::SessionState;

use crate::camera::Resolution;
use crate::export::{export_photo, PhotoSaver, SavedPhoto, DEFAULT_FILENAME};
use crate::media::{
    DeviceChange, DeviceDescriptor, ListenerId, MediaDevices, MediaError, MediaErrorName,
    MediaStream, StreamConstraints,
};
use crate::status::{StatusBoard, DEFAULT_MAX_ERROR_LINES};
use crate::surface::{PreviewSurface, RasterSurface};

pub const NO_CAMERA_MESSAGE: &str = "Webcam not found.";
pub const UNSUPPORTED_MESSAGE: &str =
    "You are using a platform that does not support the Media Capture API";
pub const NO_ENUMERATION_TOOLTIP: &str =
    "Cannot switch cameras because device enumeration is unsupported on this platform.";
pub const SAVE_HINT: &str = "Photo captured: save it as .jpg";

/// Text shown for a rejected stream request.
pub fn acquisition_error_message(error: &MediaError) -> String {
    match error.name {
        MediaErrorName::NotFound => NO_CAMERA_MESSAGE.to_string(),
        ref name => format!(
            "The following error occurred: \"{}\" Please check your webcam device(s) and try again.",
            name
        ),
    }
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Resolution requested for every stream
    pub resolution: Resolution,
    /// Name the photo is saved under
    pub filename: String,
    pub jpeg_quality: u8,
    pub max_error_lines: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::HD,
            filename: DEFAULT_FILENAME.to_string(),
            jpeg_quality: 92,
            max_error_lines: DEFAULT_MAX_ERROR_LINES,
        }
    }
}

/// User actions the session reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// The preview was activated: grab a still
    Capture,
    /// The staged photo was activated: save it
    Save,
    /// The switch-camera control was activated
    SwitchCamera,
}

pub struct CameraSession<H: MediaDevices, P: PhotoSaver> {
    host: H,
    saver: P,
    options: SessionOptions,
    state: SessionState,
    devices: Vec<DeviceDescriptor>,
    current: Option<usize>,
    preview: PreviewSurface<H::Stream>,
    raster: RasterSurface,
    photo_ready: bool,
    /// Whether activating the raster surface saves the photo
    save_armed: bool,
    listener: Option<ListenerId>,
    status: StatusBoard,
    last_saved: Option<SavedPhoto>,
}

impl<H: MediaDevices, P: PhotoSaver> CameraSession<H, P> {
    pub fn new(host: H, saver: P, options: SessionOptions) -> Self {
        let status = StatusBoard::new(options.max_error_lines);
        Self {
            host,
            saver,
            options,
            state: SessionState::Uninitialized,
            devices: Vec::new(),
            current: None,
            preview: PreviewSurface::default(),
            raster: RasterSurface::default(),
            photo_ready: false,
            save_armed: false,
            listener: None,
            status,
            last_saved: None,
        }
    }

    /// Start the session: enumerate and open the first camera, or fall back
    /// to an unenumerated stream on hosts that cannot list devices.
    pub async fn init(&mut self) {
        let caps = self.host.capabilities();
        if caps.enumerate_devices {
            self.enumerate_devices().await;
        } else if caps.get_user_media {
            log::info!("device enumeration unavailable, opening any camera");
            self.status.set_tooltip(NO_ENUMERATION_TOOLTIP);
            self.acquire(StreamConstraints::any_video()).await;
        } else {
            self.status.append_error(UNSUPPORTED_MESSAGE);
            self.state = SessionState::Unsupported;
        }
    }

    /// Replace the device list with a fresh enumeration and open its first
    /// camera. Always ends with the device-change listener registered.
    pub async fn enumerate_devices(&mut self) {
        self.state = SessionState::Enumerating;
        self.release_stream();
        self.current = None;

        self.devices = match self.host.enumerate_devices().await {
            Ok(all) => all.into_iter().filter(|d| d.is_video_input()).collect(),
            Err(e) => {
                log::error!("device enumeration failed: {}", e);
                Vec::new()
            }
        };
        log::info!("found {} camera(s)", self.devices.len());

        if self.devices.is_empty() {
            self.status.append_error(NO_CAMERA_MESSAGE);
            self.status.set_switch_enabled(false);
            self.state = SessionState::NoDeviceFound;
        } else {
            self.next_camera().await;
            self.status.set_switch_enabled(self.devices.len() > 1);
        }

        if let Some(previous) = self.listener.take() {
            self.host.unwatch_device_changes(previous);
        }
        self.listener = Some(self.host.watch_device_changes());
    }

    /// Release the current camera and open the next one, wrapping to the
    /// first after the last. Opens the first camera when none is selected.
    pub async fn next_camera(&mut self) {
        self.status.set_switch_enabled(false);
        if self.devices.is_empty() {
            return;
        }

        let next = match self.current {
            Some(index) => {
                self.release_stream();
                (index + 1) % self.devices.len()
            }
            None => 0,
        };
        self.current = Some(next);

        let device = self.devices[next].device_id.clone();
        log::info!("switching to camera {} ({})", next, device);
        self.acquire(StreamConstraints::exact(device, self.options.resolution))
            .await;
    }

    async fn acquire(&mut self, constraints: StreamConstraints) {
        self.state = SessionState::StreamRequested;
        match self.host.get_user_media(constraints).await {
            Ok(stream) => {
                if let Some(mut stale) = self.preview.bind(stream) {
                    stale.stop_tracks();
                }
                self.state = SessionState::StreamActive;
                if self.devices.len() > 1 {
                    self.status.set_switch_enabled(true);
                }
            }
            Err(e) => {
                log::error!("stream request failed: {}", e);
                self.status.append_error(&acquisition_error_message(&e));
                self.state = SessionState::AcquisitionFailed;
                // Leave the way open to rotate past a broken camera.
                self.status.set_switch_enabled(self.devices.len() > 1);
            }
        }
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.preview.clear() {
            log::debug!("stopping stream for {}", stream.device_id());
            stream.stop_tracks();
        }
    }

    /// Draw the current preview frame onto the raster surface and stage it
    /// for saving. Returns `false` when there is nothing to capture.
    pub fn capture(&mut self) -> bool {
        if !self.preview.is_bound() {
            return false;
        }
        let Some(frame) = self.preview.current_frame() else {
            log::debug!("capture requested before the first frame arrived");
            return false;
        };
        if !frame.is_complete() {
            log::debug!(
                "ignoring incomplete {} frame ({} bytes)",
                frame.resolution(),
                frame.data.len()
            );
            return false;
        }

        self.save_armed = false;
        self.raster.resize_to(frame.resolution());
        self.raster.draw_frame(&frame);
        self.photo_ready = true;
        self.status.set_hint(SAVE_HINT);
        self.save_armed = true;
        self.state = SessionState::FrameCaptured;
        true
    }

    /// Save the staged photo. A no-op returning `None` when nothing is staged.
    pub fn save_photo(&mut self) -> Option<SavedPhoto> {
        if !self.photo_ready {
            return None;
        }

        match export_photo(
            &self.raster,
            &mut self.saver,
            &self.options.filename,
            self.options.jpeg_quality,
        ) {
            Ok(saved) => {
                self.save_armed = false;
                self.status.clear_hint();
                self.photo_ready = false;
                if self.state == SessionState::FrameCaptured {
                    self.state = SessionState::StreamActive;
                }
                self.last_saved = Some(saved.clone());
                Some(saved)
            }
            Err(e) => {
                self.status.append_error(&format!("Could not save photo: {}", e));
                None
            }
        }
    }

    /// React to a device-change notification. Notifications from a listener
    /// that is no longer registered are dropped; returns whether the devices
    /// were re-enumerated.
    pub async fn on_device_change(&mut self, change: DeviceChange) -> bool {
        if self.listener != Some(change.listener) {
            log::debug!("ignoring stale device change from {:?}", change.listener);
            return false;
        }

        self.host.unwatch_device_changes(change.listener);
        self.listener = None;
        self.devices.clear();
        self.enumerate_devices().await;
        true
    }

    /// Route a user action the way the on-screen controls would.
    pub async fn dispatch(&mut self, action: SessionAction) {
        match action {
            SessionAction::Capture => {
                self.capture();
            }
            SessionAction::Save => {
                if self.save_armed {
                    self.save_photo();
                }
            }
            SessionAction::SwitchCamera => {
                if self.status.switch_enabled() {
                    self.next_camera().await;
                } else {
                    log::debug!("switch ignored: control disabled");
                }
            }
        }
    }

    /// Stop listening for device changes and release the camera.
    pub fn shutdown(&mut self) {
        if let Some(id) = self.listener.take() {
            self.host.unwatch_device_changes(id);
        }
        self.release_stream();
        self.status.set_switch_enabled(false);
        self.state = SessionState::Closed;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_device(&self) -> Option<&DeviceDescriptor> {
        self.devices.get(self.current?)
    }

    pub fn photo_ready(&self) -> bool {
        self.photo_ready
    }

    pub fn save_armed(&self) -> bool {
        self.save_armed
    }

    pub fn listener(&self) -> Option<ListenerId> {
        self.listener
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub fn preview(&self) -> &PreviewSurface<H::Stream> {
        &self.preview
    }

    pub fn raster(&self) -> &RasterSurface {
        &self.raster
    }

    pub fn last_saved(&self) -> Option<&SavedPhoto> {
        self.last_saved.as_ref()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn saver(&self) -> &P {
        &self.saver
    }
}

impl<H: MediaDevices, P: PhotoSaver> Drop for CameraSession<H, P> {
    fn drop(&mut self) {
        self.release_stream();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquisition_error_messages() {
        assert_eq!(
            acquisition_error_message(&MediaError::not_found("gone")),
            "Webcam not found."
        );
        assert_eq!(
            acquisition_error_message(&MediaError::new(MediaErrorName::NotAllowed, "no")),
            "The following error occurred: \"NotAllowedError\" Please check your webcam device(s) and try again."
        );
    }

    #[test]
    fn test_default_options() {
        let options = SessionOptions::default();
        assert_eq!(options.resolution, Resolution::new(1280, 720));
        assert_eq!(options.filename, "myPhoto.jpg");
    }
}
