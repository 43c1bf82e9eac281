//! In-memory host and saver used by the integration tests.
//!
//! `FakeHost` records every call in a shared [`HostLog`] so tests can check
//! how many enumerations, stream requests and stops the session issued.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use camsnap::camera::Frame;
use camsnap::export::{ExportError, PhotoSaver};
use camsnap::media::{
    DeviceDescriptor, DeviceId, DeviceKind, HostCapabilities, ListenerId, MediaDevices,
    MediaError, MediaStream, StreamConstraints,
};
use camsnap::session::{CameraSession, SessionOptions};

#[derive(Debug, Default)]
pub struct HostLog {
    pub enumerations: usize,
    pub requests: Vec<StreamConstraints>,
    pub stops: Vec<DeviceId>,
    pub live_streams: usize,
    pub watched: Vec<ListenerId>,
    pub unwatched: Vec<ListenerId>,
}

impl HostLog {
    /// Listeners registered and not yet removed.
    pub fn active_listeners(&self) -> Vec<ListenerId> {
        self.watched
            .iter()
            .filter(|id| !self.unwatched.contains(id))
            .copied()
            .collect()
    }

    pub fn requested_ids(&self) -> Vec<Option<String>> {
        self.requests
            .iter()
            .map(|c| c.device_id.as_ref().map(|d| d.as_str().to_string()))
            .collect()
    }
}

pub struct FakeHost {
    pub caps: HostCapabilities,
    pub devices: Vec<DeviceDescriptor>,
    pub enumerate_error: Option<MediaError>,
    /// Per-device rejection, keyed by device id
    pub failing: HashMap<String, MediaError>,
    /// Rejection for requests without a device id
    pub any_error: Option<MediaError>,
    /// Frame every opened stream produces; `None` for streams that never
    /// deliver one
    pub frame: Option<Frame>,
    pub log: Rc<RefCell<HostLog>>,
    next_listener: u64,
}

impl FakeHost {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self {
            caps: HostCapabilities::FULL,
            devices,
            enumerate_error: None,
            failing: HashMap::new(),
            any_error: None,
            frame: Some(test_frame(8, 6)),
            log: Rc::new(RefCell::new(HostLog::default())),
            next_listener: 0,
        }
    }

    /// `n` video inputs with ids "cam0".."cam{n-1}".
    pub fn with_cameras(n: usize) -> Self {
        Self::new(cameras(n))
    }

    pub fn fail_device(mut self, id: &str, error: MediaError) -> Self {
        self.failing.insert(id.to_string(), error);
        self
    }
}

impl MediaDevices for FakeHost {
    type Stream = FakeStream;

    fn capabilities(&self) -> HostCapabilities {
        self.caps
    }

    async fn enumerate_devices(&mut self) -> Result<Vec<DeviceDescriptor>, MediaError> {
        self.log.borrow_mut().enumerations += 1;
        match &self.enumerate_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.devices.clone()),
        }
    }

    async fn get_user_media(
        &mut self,
        constraints: StreamConstraints,
    ) -> Result<FakeStream, MediaError> {
        self.log.borrow_mut().requests.push(constraints.clone());

        let device_id = match constraints.device_id {
            Some(id) => {
                if let Some(e) = self.failing.get(id.as_str()) {
                    return Err(e.clone());
                }
                if !self.devices.iter().any(|d| d.device_id == id) {
                    return Err(MediaError::not_found(format!("no device {}", id)));
                }
                id
            }
            None => {
                if let Some(e) = &self.any_error {
                    return Err(e.clone());
                }
                DeviceId::new("default")
            }
        };

        self.log.borrow_mut().live_streams += 1;
        Ok(FakeStream {
            device_id,
            frame: self.frame.clone(),
            live: true,
            log: Rc::clone(&self.log),
        })
    }

    fn watch_device_changes(&mut self) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.log.borrow_mut().watched.push(id);
        id
    }

    fn unwatch_device_changes(&mut self, id: ListenerId) {
        self.log.borrow_mut().unwatched.push(id);
    }
}

#[derive(Debug)]
pub struct FakeStream {
    device_id: DeviceId,
    frame: Option<Frame>,
    live: bool,
    log: Rc<RefCell<HostLog>>,
}

impl MediaStream for FakeStream {
    fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    fn latest_frame(&self) -> Option<Frame> {
        self.frame.clone()
    }

    fn stop_tracks(&mut self) {
        if self.live {
            self.live = false;
            let mut log = self.log.borrow_mut();
            log.live_streams -= 1;
            log.stops.push(self.device_id.clone());
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// Records saves instead of touching the filesystem.
#[derive(Debug, Default)]
pub struct FakeSaver {
    pub blob: bool,
    pub fail: bool,
    pub blobs: Vec<(String, Vec<u8>)>,
    pub downloads: Vec<(String, String)>,
}

impl FakeSaver {
    pub fn blob() -> Self {
        Self {
            blob: true,
            ..Self::default()
        }
    }

    pub fn download() -> Self {
        Self::default()
    }

    pub fn saves(&self) -> usize {
        self.blobs.len() + self.downloads.len()
    }
}

impl PhotoSaver for FakeSaver {
    fn supports_blob_save(&self) -> bool {
        self.blob
    }

    fn save_blob(&mut self, bytes: &[u8], filename: &str) -> Result<PathBuf, ExportError> {
        if self.fail {
            return Err(ExportError::Encode("disk full".into()));
        }
        self.blobs.push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(filename))
    }

    fn click_download(&mut self, href: &str, filename: &str) -> Result<PathBuf, ExportError> {
        if self.fail {
            return Err(ExportError::UnsupportedHref(href.chars().take(16).collect()));
        }
        self.downloads.push((href.to_string(), filename.to_string()));
        Ok(PathBuf::from(filename))
    }
}

pub fn cameras(n: usize) -> Vec<DeviceDescriptor> {
    (0..n)
        .map(|i| DeviceDescriptor::video(format!("cam{}", i), format!("Camera {}", i)))
        .collect()
}

pub fn audio(id: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        device_id: DeviceId::new(id),
        kind: DeviceKind::AudioInput,
        label: format!("Mic {}", id),
    }
}

/// Horizontal gradient frame.
pub fn test_frame(width: u32, height: u32) -> Frame {
    let data = (0..height)
        .flat_map(|_| (0..width).flat_map(move |x| [(x * 255 / width.max(1)) as u8; 3]))
        .collect();
    Frame::rgb(width, height, data)
}

pub fn session(host: FakeHost, saver: FakeSaver) -> CameraSession<FakeHost, FakeSaver> {
    CameraSession::new(host, saver, SessionOptions::default())
}
