// SPDX-License-Identifier: GPL-3.0-only

//! Platform capture device enumeration
//!
//! Device labels stay hidden until the user has granted camera access, so
//! enumeration runs in two phases:
//!
//! 1. Permission probe: open a throwaway video-only stream.
//! 2. List devices and keep the video inputs.
//!
//! The probe stream lives in a [`StreamGuard`] for the whole enumeration, so
//! its tracks are stopped exactly once after phase 2 whether or not the
//! listing succeeds.

use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::platform::{BrowserDevice, MediaDevices, MediaError, StreamConstraints, StreamGuard};
use tracing::{debug, info, warn};

/// Enumerate video input devices, probing for permission first
pub async fn enumerate_video_inputs(
    media: &dyn MediaDevices,
) -> DiscoveryResult<Vec<BrowserDevice>> {
    if !media.supports_capture() {
        warn!("Platform reports no media capture support");
        return Err(DiscoveryError::NoCaptureCapability);
    }

    let probe = match media.acquire_stream(&StreamConstraints::any_video()).await {
        Ok(stream) => StreamGuard::new(stream),
        Err(MediaError::NotSupported) => return Err(DiscoveryError::NoCaptureCapability),
        Err(e) => {
            warn!(error = %e, "Permission probe rejected");
            return Err(DiscoveryError::PermissionDenied(e.to_string()));
        }
    };
    debug!(probe = %probe.stream().id(), "Permission probe granted");

    let listed = media.list_capture_devices().await;
    drop(probe);

    let devices: Vec<BrowserDevice> = listed
        .map_err(|e| DiscoveryError::DeviceEnumerationFailed(e.to_string()))?
        .into_iter()
        .filter(BrowserDevice::is_video_input)
        .collect();

    info!(count = devices.len(), "Enumerated video input devices");
    Ok(devices)
}
