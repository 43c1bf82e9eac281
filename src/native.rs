//! Native host: [`MediaDevices`] over the nokhwa camera backend.
//!
//! Device ids are the backend camera index rendered as a decimal string.
//! Blocking backend calls run on tokio's blocking pool. That includes
//! stopping a stream, which joins the capture thread: [`NativeStream`]
//! hands the join to the pool and [`NativeHost`] waits for it before the
//! next device is opened.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::camera::{self, CameraCapture, CameraError, CameraInfo, CameraSettings, Frame};
use crate::hotplug::HotplugWatcher;
use crate::media::{
    DeviceChange, DeviceDescriptor, DeviceId, DeviceKind, HostCapabilities, ListenerId,
    MediaDevices, MediaError, MediaErrorName, MediaStream, StreamConstraints,
};

/// Settings for streams opened by [`NativeHost`].
#[derive(Debug, Clone)]
pub struct NativeOptions {
    pub fps: u32,
    pub mirror: bool,
    /// Polling interval for hot-plug detection; `None` disables it
    pub hotplug_interval: Option<Duration>,
}

impl Default for NativeOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            mirror: false,
            hotplug_interval: Some(Duration::from_secs(2)),
        }
    }
}

/// Stream stops still running on the blocking pool.
type PendingStops = Arc<Mutex<Vec<JoinHandle<()>>>>;

pub struct NativeHost {
    options: NativeOptions,
    changes: UnboundedSender<DeviceChange>,
    watcher: Option<HotplugWatcher>,
    next_listener: u64,
    pending_stops: PendingStops,
}

impl NativeHost {
    /// Device-change notifications are delivered on `changes`.
    pub fn new(options: NativeOptions, changes: UnboundedSender<DeviceChange>) -> Self {
        Self {
            options,
            changes,
            watcher: None,
            next_listener: 0,
            pending_stops: PendingStops::default(),
        }
    }

    /// Wait until every stopped stream has released its device.
    pub async fn finish_pending_stops(&self) {
        let handles = std::mem::take(
            &mut *self
                .pending_stops
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(e) = handle.await {
                log::warn!("camera stop task failed: {}", e);
            }
        }
    }

    async fn list_cameras() -> Result<Vec<CameraInfo>, MediaError> {
        tokio::task::spawn_blocking(camera::list_devices)
            .await
            .map_err(|e| MediaError::new(MediaErrorName::Abort, e.to_string()))?
            .map_err(media_error)
    }
}

impl MediaDevices for NativeHost {
    type Stream = NativeStream;

    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities::FULL
    }

    async fn enumerate_devices(&mut self) -> Result<Vec<DeviceDescriptor>, MediaError> {
        let cameras = Self::list_cameras().await?;
        Ok(cameras.into_iter().map(descriptor).collect())
    }

    async fn get_user_media(
        &mut self,
        constraints: StreamConstraints,
    ) -> Result<NativeStream, MediaError> {
        self.finish_pending_stops().await;

        let device_index = match constraints.device_id {
            Some(id) => id
                .as_str()
                .parse::<u32>()
                .map_err(|_| MediaError::not_found(format!("no camera with id '{}'", id)))?,
            None => Self::list_cameras()
                .await?
                .first()
                .map(|c| c.index)
                .ok_or_else(|| MediaError::not_found("no camera attached"))?,
        };

        let settings = CameraSettings {
            device_index,
            resolution: constraints.resolution.unwrap_or_default(),
            fps: self.options.fps,
            mirror: self.options.mirror,
        };
        let capture = tokio::task::spawn_blocking(move || CameraCapture::start(settings))
            .await
            .map_err(|e| MediaError::new(MediaErrorName::Abort, e.to_string()))?
            .map_err(media_error)?;

        Ok(NativeStream {
            device_id: DeviceId::new(device_index.to_string()),
            capture: Some(capture),
            pending_stops: Arc::clone(&self.pending_stops),
        })
    }

    fn watch_device_changes(&mut self) -> ListenerId {
        self.next_listener += 1;
        let listener = ListenerId(self.next_listener);
        if let Some(interval) = self.options.hotplug_interval {
            self.watcher = Some(HotplugWatcher::spawn(
                listener,
                interval,
                camera::list_devices,
                self.changes.clone(),
            ));
        }
        listener
    }

    fn unwatch_device_changes(&mut self, id: ListenerId) {
        if self.watcher.as_ref().is_some_and(|w| w.listener() == id) {
            self.watcher = None;
        }
    }
}

/// A live nokhwa camera. Stopping it never blocks the calling task.
#[derive(Debug)]
pub struct NativeStream {
    device_id: DeviceId,
    /// `None` once stopped
    capture: Option<CameraCapture>,
    pending_stops: PendingStops,
}

impl NativeStream {
    pub fn capture(&self) -> Option<&CameraCapture> {
        self.capture.as_ref()
    }
}

impl MediaStream for NativeStream {
    fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    fn latest_frame(&self) -> Option<Frame> {
        self.capture.as_ref()?.latest_frame()
    }

    fn stop_tracks(&mut self) {
        let Some(capture) = self.capture.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let handle = runtime.spawn_blocking(move || stop_capture(capture));
                self.pending_stops
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(handle);
            }
            Err(_) => stop_capture(capture),
        }
    }

    fn is_live(&self) -> bool {
        self.capture.as_ref().is_some_and(CameraCapture::is_running)
    }
}

fn stop_capture(mut capture: CameraCapture) {
    capture.stop();
}

fn descriptor(camera: CameraInfo) -> DeviceDescriptor {
    DeviceDescriptor {
        device_id: DeviceId::new(camera.index.to_string()),
        kind: DeviceKind::VideoInput,
        label: camera.name,
    }
}

/// Map a backend failure onto the host error vocabulary.
pub fn media_error(error: CameraError) -> MediaError {
    let name = match &error {
        CameraError::DeviceNotFound(_) => MediaErrorName::NotFound,
        CameraError::PermissionDenied => MediaErrorName::NotAllowed,
        CameraError::OpenFailed(_) | CameraError::StreamFailed(_) | CameraError::AlreadyRunning => {
            MediaErrorName::NotReadable
        }
        CameraError::QueryFailed(_) => MediaErrorName::Unknown,
    };
    MediaError::new(name, error.to_string())
}
