// SPDX-License-Identifier: GPL-3.0-only

//! Device correlation
//!
//! Pairs platform capture devices with OS device nodes by position: the Nth
//! video input is assumed to be the Nth `/dev/video*` node.
//!
//! This is a best-effort heuristic, not a cross-reference. Nothing guarantees
//! that the platform and the kernel enumerate devices in the same order, and
//! devices that expose several nodes (capture + metadata) shift the pairing.
//! The pairing is computed once per discovery pass and never revised.

use crate::platform::BrowserDevice;
use crate::system::SystemDevicePath;
use serde::Serialize;

/// A platform device with its best-effort matched OS node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelatedDevice {
    pub browser_device: BrowserDevice,
    pub system_path: Option<SystemDevicePath>,
}

impl CorrelatedDevice {
    pub fn has_system_path(&self) -> bool {
        self.system_path.is_some()
    }
}

/// Zip video inputs with system paths by index
///
/// Devices beyond the number of paths get `None`; surplus paths are unused.
/// Non-video devices are skipped before pairing.
pub fn correlate(
    browser_devices: &[BrowserDevice],
    system_paths: &[SystemDevicePath],
) -> Vec<CorrelatedDevice> {
    browser_devices
        .iter()
        .filter(|d| d.is_video_input())
        .enumerate()
        .map(|(index, device)| CorrelatedDevice {
            browser_device: device.clone(),
            system_path: system_paths.get(index).cloned(),
        })
        .collect()
}
