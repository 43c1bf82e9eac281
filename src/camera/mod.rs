//! Native webcam access built on nokhwa.
//!
//! - Device enumeration via [`list_devices`]
//! - Background frame capture via [`CameraCapture`]
//! - Frame and settings types in [`types`]

mod capture;
mod capture_loop;
mod device;
mod frame_utils;
mod types;

pub use capture::CameraCapture;
pub use device::list_devices;
pub use frame_utils::mirror_horizontal;
pub use types::{CameraError, CameraInfo, CameraSettings, Frame, FrameFormat, Resolution};
