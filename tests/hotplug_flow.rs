//! Device-change handling and the fallback paths for hosts without
//! enumeration or without any capture API.

mod common;

use std::sync::{Arc, Mutex};

use camsnap::hotplug::{HotplugWatcher, MIN_POLL_INTERVAL};
use camsnap::media::{DeviceChange, HostCapabilities, ListenerId, MediaError, MediaErrorName};
use camsnap::session::{
    SessionAction, SessionState, NO_ENUMERATION_TOOLTIP, UNSUPPORTED_MESSAGE,
};
use common::{cameras, session, FakeHost, FakeSaver};

// ==================== Device changes ====================

#[tokio::test]
async fn test_change_reenumerates_once_and_reregisters() {
    let mut session = session(FakeHost::with_cameras(2), FakeSaver::blob());
    session.init().await;
    let first = session.listener().unwrap();

    let handled = session
        .on_device_change(DeviceChange { listener: first })
        .await;
    assert!(handled);

    let second = session.listener().unwrap();
    assert_ne!(first, second);

    let log = session.host().log.borrow();
    assert_eq!(log.enumerations, 2);
    assert_eq!(log.unwatched, vec![first]);
    assert_eq!(log.active_listeners(), vec![second]);
    assert_eq!(log.live_streams, 1);
    assert_eq!(log.stops.len(), 1);
}

#[tokio::test]
async fn test_stale_change_ignored() {
    let mut session = session(FakeHost::with_cameras(2), FakeSaver::blob());
    session.init().await;

    let handled = session
        .on_device_change(DeviceChange {
            listener: ListenerId(999),
        })
        .await;
    assert!(!handled);
    assert_eq!(session.host().log.borrow().enumerations, 1);
}

#[tokio::test]
async fn test_change_resets_to_first_camera() {
    let mut session = session(FakeHost::with_cameras(3), FakeSaver::blob());
    session.init().await;
    session.dispatch(SessionAction::SwitchCamera).await;
    assert_eq!(session.current_index(), Some(1));

    let listener = session.listener().unwrap();
    session.on_device_change(DeviceChange { listener }).await;

    assert_eq!(session.current_index(), Some(0));
    let log = session.host().log.borrow();
    assert_eq!(log.requested_ids().last(), Some(&Some("cam0".to_string())));
}

#[tokio::test]
async fn test_unplug_down_to_one_disables_switch() {
    let mut session = session(FakeHost::with_cameras(2), FakeSaver::blob());
    session.init().await;
    assert!(session.status().switch_enabled());

    session.host_mut().devices = cameras(1);
    let listener = session.listener().unwrap();
    session.on_device_change(DeviceChange { listener }).await;

    assert_eq!(session.devices().len(), 1);
    assert!(!session.status().switch_enabled());
    assert_eq!(session.state(), SessionState::StreamActive);
}

#[tokio::test]
async fn test_unplug_all_then_replug_recovers() {
    let mut session = session(FakeHost::with_cameras(1), FakeSaver::blob());
    session.init().await;

    session.host_mut().devices.clear();
    let listener = session.listener().unwrap();
    session.on_device_change(DeviceChange { listener }).await;

    assert_eq!(session.state(), SessionState::NoDeviceFound);
    assert!(!session.preview().is_bound());
    assert_eq!(session.host().log.borrow().live_streams, 0);

    session.host_mut().devices = cameras(2);
    let listener = session.listener().unwrap();
    session.on_device_change(DeviceChange { listener }).await;

    assert_eq!(session.state(), SessionState::StreamActive);
    assert!(session.status().switch_enabled());
    assert_eq!(session.host().log.borrow().active_listeners().len(), 1);
}

#[tokio::test]
async fn test_watcher_notifies_session() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut session = session(FakeHost::with_cameras(1), FakeSaver::blob());
    session.init().await;

    let attached = Arc::new(Mutex::new(vec![0u32]));
    let attached_now = Arc::clone(&attached);
    let _watcher = HotplugWatcher::spawn(
        session.listener().unwrap(),
        MIN_POLL_INTERVAL,
        move || -> Result<Vec<u32>, String> {
            Ok(attached_now.lock().map_err(|e| e.to_string())?.clone())
        },
        tx,
    );

    session.host_mut().devices = cameras(2);

    // Keep plugging in until a poll sees a list that differs from its baseline.
    let mut change = None;
    for id in 1..=5u32 {
        attached.lock().unwrap().push(id);
        if let Ok(Some(c)) = tokio::time::timeout(MIN_POLL_INTERVAL * 4, rx.recv()).await {
            change = Some(c);
            break;
        }
    }
    let change = change.expect("watcher should report the new camera");
    assert!(session.on_device_change(change).await);
    assert_eq!(session.devices().len(), 2);
}

// ==================== Hosts without full support ====================

#[tokio::test]
async fn test_no_enumeration_opens_any_camera() {
    let mut host = FakeHost::with_cameras(2);
    host.caps = HostCapabilities {
        enumerate_devices: false,
        get_user_media: true,
    };
    let mut session = session(host, FakeSaver::blob());
    session.init().await;

    assert_eq!(session.state(), SessionState::StreamActive);
    assert_eq!(session.status().tooltip(), NO_ENUMERATION_TOOLTIP);
    assert!(!session.status().switch_enabled());
    assert!(session.listener().is_none());
    assert!(session.capture());

    let log = session.host().log.borrow();
    assert_eq!(log.enumerations, 0);
    assert_eq!(log.requested_ids(), vec![None]);
}

#[tokio::test]
async fn test_no_enumeration_reports_rejection() {
    let mut host = FakeHost::with_cameras(1);
    host.caps = HostCapabilities {
        enumerate_devices: false,
        get_user_media: true,
    };
    host.any_error = Some(MediaError::new(MediaErrorName::NotAllowed, "denied"));
    let mut session = session(host, FakeSaver::blob());
    session.init().await;

    assert_eq!(session.state(), SessionState::AcquisitionFailed);
    let errors: Vec<_> = session.status().errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("\"NotAllowedError\""));
}

#[tokio::test]
async fn test_unsupported_platform() {
    let mut host = FakeHost::with_cameras(1);
    host.caps = HostCapabilities {
        enumerate_devices: false,
        get_user_media: false,
    };
    let mut session = session(host, FakeSaver::blob());
    session.init().await;

    assert_eq!(session.state(), SessionState::Unsupported);
    assert_eq!(
        session.status().errors().collect::<Vec<_>>(),
        vec![format!("ERROR: {}", UNSUPPORTED_MESSAGE).as_str()]
    );
    assert!(session.host().log.borrow().requests.is_empty());
    assert!(!session.capture());
}
