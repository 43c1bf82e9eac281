//! Background capture thread implementation.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::frame_utils::{convert_to_rgb, mirror_horizontal};
use super::types::{CameraError, CameraSettings, Frame, Resolution};

/// Consecutive failed grabs after which the device is considered gone.
const MAX_CONSECUTIVE_FAILURES: u32 = 200;

/// Commands sent to the capture thread.
pub enum CaptureCommand {
    Stop,
}

/// Open the camera, report the negotiated format on `info_tx`, then keep
/// the latest decoded frame in `buffer` until asked to stop.
pub fn run_capture_loop(
    settings: CameraSettings,
    buffer: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
    rx: Receiver<CaptureCommand>,
    info_tx: Sender<Result<(Resolution, u32), CameraError>>,
) {
    let index = CameraIndex::Index(settings.device_index);

    let mut camera = match open_camera_with_fallback(&index, &settings) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = info_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = info_tx.send(Err(classify_open_error(&e.to_string(), &settings)));
        return;
    }

    let res = camera.resolution();
    let negotiated = Resolution::new(res.width(), res.height());
    let _ = info_tx.send(Ok((negotiated, camera.frame_rate())));
    log::info!(
        "camera {} streaming at {} ({} fps)",
        settings.device_index,
        negotiated,
        camera.frame_rate()
    );

    let mut failures = 0u32;
    while !stop.load(Ordering::Relaxed) {
        if let Ok(CaptureCommand::Stop) = rx.try_recv() {
            break;
        }

        match camera.frame() {
            Ok(raw) => {
                failures = 0;
                // Undecodable frames are skipped; the next grab usually works.
                if let Some(mut frame) = convert_to_rgb(&raw) {
                    if settings.mirror {
                        mirror_horizontal(&mut frame);
                    }
                    if let Ok(mut buf) = buffer.lock() {
                        *buf = Some(frame);
                    }
                }
            }
            Err(e) => {
                failures += 1;
                if failures >= MAX_CONSECUTIVE_FAILURES {
                    log::warn!(
                        "camera {} stopped delivering frames: {}",
                        settings.device_index,
                        e
                    );
                    break;
                }
            }
        }

        thread::sleep(Duration::from_millis(1));
    }

    let _ = camera.stop_stream();
    log::debug!("camera {} capture thread exited", settings.device_index);
}

/// Try the requested size with NV12, then MJPEG, then whatever the camera
/// offers at its highest resolution.
fn open_camera_with_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CameraError> {
    let wanted = nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height);
    let format_attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::NV12,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = String::from("no format accepted");
    for requested in format_attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => {
                log::debug!("camera {} rejected format: {}", settings.device_index, e);
                last_error = e.to_string();
            }
        }
    }

    Err(classify_open_error(&last_error, settings))
}

fn classify_open_error(message: &str, settings: &CameraSettings) -> CameraError {
    let msg = message.to_lowercase();
    if msg.contains("permission")
        || msg.contains("denied")
        || msg.contains("authorization")
        || msg.contains("access")
    {
        CameraError::PermissionDenied
    } else if msg.contains("not found") || msg.contains("no such device") {
        CameraError::DeviceNotFound(settings.device_index)
    } else {
        CameraError::OpenFailed(message.to_string())
    }
}
