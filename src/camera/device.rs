//! Camera device enumeration.

use nokhwa::query;
use nokhwa::utils::ApiBackend;

use super::types::{CameraError, CameraInfo};

/// List the cameras the native backend can see, in backend order.
///
/// An empty vector means no cameras are attached; only a failing backend
/// query is an error.
pub fn list_devices() -> Result<Vec<CameraInfo>, CameraError> {
    let devices = query(ApiBackend::Auto).map_err(|e| CameraError::QueryFailed(e.to_string()))?;

    Ok(devices
        .into_iter()
        .enumerate()
        .map(|(position, d)| CameraInfo {
            index: d.index().as_index().unwrap_or(position as u32),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect())
}
