//! Session behaviour against an in-memory host: enumeration, camera
//! rotation, capture and save, and error reporting.

mod common;

use camsnap::camera::{Frame, Resolution};
use camsnap::media::{MediaError, MediaErrorName};
use camsnap::preview::{status_lines, LineKind};
use camsnap::session::{
    CameraSession, SessionAction, SessionOptions, SessionState, NO_CAMERA_MESSAGE, SAVE_HINT,
};
use camsnap::surface::DEFAULT_RASTER_SIZE;
use common::{audio, cameras, session, test_frame, FakeHost, FakeSaver};

fn errors<H, P>(session: &CameraSession<H, P>) -> Vec<String>
where
    H: camsnap::media::MediaDevices,
    P: camsnap::export::PhotoSaver,
{
    session.status().errors().map(str::to_string).collect()
}

// ==================== Enumeration ====================

#[tokio::test]
async fn test_init_opens_first_video_input() {
    let mut devices = vec![audio("mic0")];
    devices.extend(cameras(2));
    devices.push(audio("mic1"));
    let mut session = session(FakeHost::new(devices), FakeSaver::blob());

    session.init().await;

    assert_eq!(session.devices().len(), 2);
    assert!(session.devices().iter().all(|d| d.is_video_input()));
    assert_eq!(session.current_index(), Some(0));
    assert_eq!(session.state(), SessionState::StreamActive);

    let log = session.host().log.borrow();
    assert_eq!(log.enumerations, 1);
    assert_eq!(log.requested_ids(), vec![Some("cam0".to_string())]);
    assert_eq!(log.requests[0].resolution, Some(Resolution::HD));
    assert_eq!(log.live_streams, 1);
}

#[tokio::test]
async fn test_switch_enabled_only_with_several_cameras() {
    let mut one = session(FakeHost::with_cameras(1), FakeSaver::blob());
    one.init().await;
    assert!(!one.status().switch_enabled());

    let mut two = session(FakeHost::with_cameras(2), FakeSaver::blob());
    two.init().await;
    assert!(two.status().switch_enabled());
}

#[tokio::test]
async fn test_no_camera_reports_and_still_listens() {
    let mut session = session(FakeHost::new(vec![audio("mic0")]), FakeSaver::blob());
    session.init().await;

    assert_eq!(session.state(), SessionState::NoDeviceFound);
    assert_eq!(errors(&session), vec![format!("ERROR: {}", NO_CAMERA_MESSAGE)]);
    assert!(!session.status().switch_enabled());
    assert!(session.listener().is_some());
    assert!(session.host().log.borrow().requests.is_empty());
}

#[tokio::test]
async fn test_failed_enumeration_counts_as_no_camera() {
    let mut host = FakeHost::with_cameras(2);
    host.enumerate_error = Some(MediaError::new(MediaErrorName::Unknown, "backend gone"));
    let mut session = session(host, FakeSaver::blob());
    session.init().await;

    assert_eq!(session.state(), SessionState::NoDeviceFound);
    assert_eq!(errors(&session), vec!["ERROR: Webcam not found.".to_string()]);
}

// ==================== Switching ====================

#[tokio::test]
async fn test_switch_rotates_and_wraps() {
    let mut session = session(FakeHost::with_cameras(3), FakeSaver::blob());
    session.init().await;

    for _ in 0..3 {
        session.dispatch(SessionAction::SwitchCamera).await;
    }

    let log = session.host().log.borrow();
    assert_eq!(
        log.requested_ids(),
        vec![
            Some("cam0".to_string()),
            Some("cam1".to_string()),
            Some("cam2".to_string()),
            Some("cam0".to_string()),
        ]
    );
    let stopped: Vec<_> = log.stops.iter().map(|d| d.as_str()).collect();
    assert_eq!(stopped, vec!["cam0", "cam1", "cam2"]);
    assert_eq!(log.live_streams, 1);
    drop(log);
    assert_eq!(session.current_index(), Some(0));
}

#[tokio::test]
async fn test_each_switch_stops_one_and_requests_one() {
    let mut session = session(FakeHost::with_cameras(2), FakeSaver::blob());
    session.init().await;

    let (requests, stops) = {
        let log = session.host().log.borrow();
        (log.requests.len(), log.stops.len())
    };
    session.dispatch(SessionAction::SwitchCamera).await;

    let log = session.host().log.borrow();
    assert_eq!(log.requests.len(), requests + 1);
    assert_eq!(log.stops.len(), stops + 1);
    assert!(session.status().switch_enabled());
}

#[tokio::test]
async fn test_switch_ignored_when_disabled() {
    let mut session = session(FakeHost::with_cameras(1), FakeSaver::blob());
    session.init().await;
    session.dispatch(SessionAction::SwitchCamera).await;

    let log = session.host().log.borrow();
    assert_eq!(log.requests.len(), 1);
    assert!(log.stops.is_empty());
}

// ==================== Capture and save ====================

#[tokio::test]
async fn test_capture_without_stream_is_noop() {
    let mut session = session(FakeHost::with_cameras(0), FakeSaver::blob());
    session.init().await;

    assert!(!session.capture());
    assert!(!session.photo_ready());
    assert!(session.status().hint().is_empty());
    assert_eq!(session.raster().size(), DEFAULT_RASTER_SIZE);
    assert_eq!(session.raster().reallocations(), 0);
}

#[tokio::test]
async fn test_capture_after_failed_switch_keeps_raster() {
    let host = FakeHost::with_cameras(2)
        .fail_device("cam1", MediaError::new(MediaErrorName::NotReadable, "busy"));
    let mut session = session(host, FakeSaver::blob());
    session.init().await;
    assert!(session.capture());
    let size = session.raster().size();
    let pixels = session.raster().pixels().to_vec();
    let reallocations = session.raster().reallocations();

    session.dispatch(SessionAction::SwitchCamera).await;
    assert_eq!(session.state(), SessionState::AcquisitionFailed);
    assert!(!session.preview().is_bound());

    assert!(!session.capture());
    assert_eq!(session.raster().size(), size);
    assert_eq!(session.raster().pixels(), &pixels[..]);
    assert_eq!(session.raster().reallocations(), reallocations);
}

#[tokio::test]
async fn test_incomplete_frame_is_not_captured() {
    let mut host = FakeHost::with_cameras(1);
    host.frame = Some(Frame::rgb(8, 6, vec![0; 10]));
    let mut session = session(host, FakeSaver::blob());
    session.init().await;

    assert!(!session.capture());
    assert!(!session.photo_ready());
    assert!(!session.save_armed());
    assert_eq!(session.raster().size(), DEFAULT_RASTER_SIZE);
}

#[tokio::test]
async fn test_empty_frame_is_not_captured() {
    let mut host = FakeHost::with_cameras(1);
    host.frame = Some(Frame::rgb(0, 0, Vec::new()));
    let mut session = session(host, FakeSaver::blob());
    session.init().await;

    assert!(!session.capture());
    assert!(!session.photo_ready());
    assert!(session.status().hint().is_empty());
    assert_eq!(session.raster().reallocations(), 0);
}

#[tokio::test]
async fn test_capture_before_first_frame_is_noop() {
    let mut host = FakeHost::with_cameras(1);
    host.frame = None;
    let mut session = session(host, FakeSaver::blob());
    session.init().await;

    assert!(!session.capture());
    assert_eq!(session.state(), SessionState::StreamActive);
}

#[tokio::test]
async fn test_capture_then_save_once() {
    let mut session = session(FakeHost::with_cameras(1), FakeSaver::blob());
    session.init().await;

    session.dispatch(SessionAction::Capture).await;
    assert!(session.photo_ready());
    assert!(session.save_armed());
    assert_eq!(session.state(), SessionState::FrameCaptured);
    assert_eq!(session.status().hint(), SAVE_HINT);
    assert_eq!(session.raster().size(), Resolution::new(8, 6));

    session.dispatch(SessionAction::Save).await;
    assert_eq!(session.saver().blobs.len(), 1);
    let (name, bytes) = &session.saver().blobs[0];
    assert_eq!(name, "myPhoto.jpg");
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

    assert!(!session.photo_ready());
    assert!(!session.save_armed());
    assert!(session.status().hint().is_empty());
    assert_eq!(session.state(), SessionState::StreamActive);

    // Nothing staged any more
    session.dispatch(SessionAction::Save).await;
    assert_eq!(session.saver().saves(), 1);
}

#[tokio::test]
async fn test_save_without_capture_is_noop() {
    let mut session = session(FakeHost::with_cameras(1), FakeSaver::blob());
    session.init().await;

    session.dispatch(SessionAction::Save).await;
    assert!(session.save_photo().is_none());
    assert_eq!(session.saver().saves(), 0);
}

#[tokio::test]
async fn test_download_path_uses_data_url() {
    let mut session = session(FakeHost::with_cameras(1), FakeSaver::download());
    session.init().await;
    session.capture();

    let saved = session.save_photo().unwrap();
    assert!(saved.via_data_url);
    let (href, filename) = &session.saver().downloads[0];
    assert!(href.starts_with("data:image/jpeg;base64,"));
    assert_eq!(filename, "myPhoto.jpg");
}

#[tokio::test]
async fn test_failed_save_keeps_photo() {
    let mut saver = FakeSaver::blob();
    saver.fail = true;
    let mut session = session(FakeHost::with_cameras(1), saver);
    session.init().await;
    session.capture();

    assert!(session.save_photo().is_none());
    assert!(session.photo_ready());
    assert!(errors(&session)[0].starts_with("ERROR: Could not save photo"));
}

#[tokio::test]
async fn test_raster_reused_for_same_size() {
    let mut session = session(FakeHost::with_cameras(1), FakeSaver::blob());
    session.init().await;

    session.capture();
    session.capture();
    assert_eq!(session.raster().reallocations(), 1);
    assert_eq!(session.raster().pixels(), test_frame(8, 6).data.as_slice());
}

// ==================== Acquisition errors ====================

#[tokio::test]
async fn test_permission_error_message() {
    let host = FakeHost::with_cameras(1)
        .fail_device("cam0", MediaError::new(MediaErrorName::NotAllowed, "denied"));
    let mut session = session(host, FakeSaver::blob());
    session.init().await;

    assert_eq!(session.state(), SessionState::AcquisitionFailed);
    assert_eq!(
        errors(&session),
        vec![
            "ERROR: The following error occurred: \"NotAllowedError\" Please check your webcam device(s) and try again."
                .to_string()
        ]
    );
    assert!(!session.status().switch_enabled());
    assert!(!session.capture());
}

#[tokio::test]
async fn test_missing_device_reports_not_found() {
    let host = FakeHost::with_cameras(1).fail_device("cam0", MediaError::not_found("unplugged"));
    let mut session = session(host, FakeSaver::blob());
    session.init().await;
    assert_eq!(errors(&session), vec!["ERROR: Webcam not found.".to_string()]);
}

#[tokio::test]
async fn test_can_switch_past_broken_camera() {
    let host = FakeHost::with_cameras(2)
        .fail_device("cam0", MediaError::new(MediaErrorName::NotReadable, "busy"));
    let mut session = session(host, FakeSaver::blob());
    session.init().await;

    assert_eq!(session.state(), SessionState::AcquisitionFailed);
    assert!(session.status().switch_enabled());

    session.dispatch(SessionAction::SwitchCamera).await;
    assert_eq!(session.state(), SessionState::StreamActive);
    assert_eq!(session.current_index(), Some(1));
}

#[tokio::test]
async fn test_error_lines_are_capped() {
    let host = FakeHost::with_cameras(2)
        .fail_device("cam0", MediaError::new(MediaErrorName::NotAllowed, "no"))
        .fail_device("cam1", MediaError::new(MediaErrorName::NotReadable, "busy"));
    let options = SessionOptions {
        max_error_lines: 2,
        ..SessionOptions::default()
    };
    let mut session = CameraSession::new(host, FakeSaver::blob(), options);
    session.init().await;
    session.dispatch(SessionAction::SwitchCamera).await;
    session.dispatch(SessionAction::SwitchCamera).await;

    let lines = errors(&session);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("NotReadableError"));
    assert!(lines[1].contains("NotAllowedError"));
}

// ==================== Teardown and display ====================

#[tokio::test]
async fn test_shutdown_releases_everything() {
    let mut session = session(FakeHost::with_cameras(2), FakeSaver::blob());
    session.init().await;
    let listener = session.listener().unwrap();

    session.shutdown();

    assert_eq!(session.state(), SessionState::Closed);
    assert!(!session.preview().is_bound());
    let log = session.host().log.borrow();
    assert_eq!(log.live_streams, 0);
    assert!(log.unwatched.contains(&listener));
}

#[tokio::test]
async fn test_drop_stops_stream() {
    let host = FakeHost::with_cameras(1);
    let log = std::rc::Rc::clone(&host.log);
    let mut session = session(host, FakeSaver::blob());
    session.init().await;
    assert_eq!(log.borrow().live_streams, 1);

    drop(session);
    assert_eq!(log.borrow().live_streams, 0);
}

#[tokio::test]
async fn test_status_lines_describe_session() {
    let mut session = session(FakeHost::with_cameras(2), FakeSaver::blob());
    session.init().await;
    session.capture();

    let lines = status_lines(&session);
    assert_eq!(lines[0].kind, LineKind::Title);
    assert!(lines[0].text.contains("camera 1/2: Camera 0"));
    assert!(lines.iter().any(|l| l.kind == LineKind::Hint && l.text == SAVE_HINT));
    let help = lines.last().unwrap();
    assert_eq!(help.kind, LineKind::Help);
    assert!(help.text.contains("[n] switch camera"));
    assert!(!help.text.contains("(off)"));
}
