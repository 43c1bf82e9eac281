//! Host media capabilities consumed by the camera session.
//!
//! The session never talks to a camera directly. It goes through
//! [`MediaDevices`] for enumeration, stream acquisition and device-change
//! notifications, and through [`MediaStream`] for the live stream it owns.
//! [`crate::native::NativeHost`] implements these over nokhwa; tests use
//! in-memory hosts.

use std::fmt;
use std::future::Future;

use thiserror::Error;

use crate::camera::{Frame, Resolution};

/// Opaque device identifier. Not guaranteed stable across enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceKind::VideoInput => "videoinput",
            DeviceKind::AudioInput => "audioinput",
            DeviceKind::AudioOutput => "audiooutput",
        })
    }
}

/// One entry of a device enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub device_id: DeviceId,
    pub kind: DeviceKind,
    pub label: String,
}

impl DeviceDescriptor {
    pub fn video(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: DeviceId::new(id),
            kind: DeviceKind::VideoInput,
            label: label.into(),
        }
    }

    pub fn is_video_input(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }
}

/// Constraints for a stream request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamConstraints {
    /// Preferred capture size; the host may negotiate the closest match
    pub resolution: Option<Resolution>,
    /// When set, only this exact device may satisfy the request
    pub device_id: Option<DeviceId>,
}

impl StreamConstraints {
    /// Exactly `device` at `resolution`.
    pub fn exact(device: DeviceId, resolution: Resolution) -> Self {
        Self {
            resolution: Some(resolution),
            device_id: Some(device),
        }
    }

    /// Any video device, host-chosen size.
    pub fn any_video() -> Self {
        Self::default()
    }
}

/// Error names a host reports when a stream request is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaErrorName {
    /// The requested device does not exist (anymore)
    NotFound,
    /// The user or OS refused camera access
    NotAllowed,
    /// The device exists but could not be opened (busy, hardware fault)
    NotReadable,
    /// The request was aborted before it completed
    Abort,
    /// Anything the host could not classify
    Unknown,
}

impl MediaErrorName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaErrorName::NotFound => "NotFoundError",
            MediaErrorName::NotAllowed => "NotAllowedError",
            MediaErrorName::NotReadable => "NotReadableError",
            MediaErrorName::Abort => "AbortError",
            MediaErrorName::Unknown => "UnknownError",
        }
    }
}

impl fmt::Display for MediaErrorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A host-side rejection of an enumeration or stream request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct MediaError {
    pub name: MediaErrorName,
    pub message: String,
}

impl MediaError {
    pub fn new(name: MediaErrorName, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(MediaErrorName::NotFound, message)
    }
}

/// Which capture APIs the host offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    pub enumerate_devices: bool,
    pub get_user_media: bool,
}

impl HostCapabilities {
    pub const FULL: HostCapabilities = HostCapabilities {
        enumerate_devices: true,
        get_user_media: true,
    };
}

/// Handle for one registration of the device-change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Notification that the set of attached devices changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceChange {
    /// Registration that produced this notification
    pub listener: ListenerId,
}

/// Device enumeration and stream acquisition.
pub trait MediaDevices {
    type Stream: MediaStream;

    fn capabilities(&self) -> HostCapabilities;

    /// All devices the host currently knows about, in host order.
    fn enumerate_devices(
        &mut self,
    ) -> impl Future<Output = Result<Vec<DeviceDescriptor>, MediaError>>;

    /// Open a live stream satisfying `constraints`.
    fn get_user_media(
        &mut self,
        constraints: StreamConstraints,
    ) -> impl Future<Output = Result<Self::Stream, MediaError>>;

    /// Start delivering [`DeviceChange`] notifications tagged with the
    /// returned id.
    fn watch_device_changes(&mut self) -> ListenerId;

    /// Stop the registration `id`. Unknown ids are ignored.
    fn unwatch_device_changes(&mut self, id: ListenerId);
}

/// A live capture stream. Dropping a stream without stopping it may leak the
/// device on some hosts, so owners call [`MediaStream::stop_tracks`].
pub trait MediaStream {
    fn device_id(&self) -> &DeviceId;

    /// Most recent frame, if one has arrived yet.
    fn latest_frame(&self) -> Option<Frame>;

    /// Natural size of the frames currently produced.
    fn video_dimensions(&self) -> Option<Resolution> {
        self.latest_frame().map(|f| f.resolution())
    }

    /// Stop every track and release the device.
    fn stop_tracks(&mut self);

    fn is_live(&self) -> bool;
}
