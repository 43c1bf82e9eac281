//! Session lifecycle states.

use std::fmt;

/// Where a [`super::CameraSession`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Enumerating,
    /// Enumeration found no video input
    NoDeviceFound,
    /// A stream request is in flight
    StreamRequested,
    StreamActive,
    /// A still is staged on the raster surface and not yet saved
    FrameCaptured,
    /// The last stream request was rejected
    AcquisitionFailed,
    /// The host offers no capture API at all
    Unsupported,
    Closed,
}

impl SessionState {
    /// Whether a stream is bound to the preview in this state.
    pub fn has_stream(&self) -> bool {
        matches!(self, SessionState::StreamActive | SessionState::FrameCaptured)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Uninitialized => "starting",
            SessionState::Enumerating => "looking for cameras",
            SessionState::NoDeviceFound => "no camera",
            SessionState::StreamRequested => "opening camera",
            SessionState::StreamActive => "live",
            SessionState::FrameCaptured => "photo ready",
            SessionState::AcquisitionFailed => "camera unavailable",
            SessionState::Unsupported => "unsupported",
            SessionState::Closed => "closed",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_stream() {
        assert!(SessionState::StreamActive.has_stream());
        assert!(SessionState::FrameCaptured.has_stream());
        assert!(!SessionState::StreamRequested.has_stream());
        assert!(!SessionState::default().has_stream());
    }
}
