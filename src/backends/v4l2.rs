// SPDX-License-Identifier: GPL-3.0-only

//! Native V4L2 media platform
//!
//! Implements [`MediaDevices`] directly on top of the kernel's V4L2 nodes so
//! the discovery engine can run outside a browser host. Device ids are opaque
//! (`v4l2-<index>`); opening a node stands in for the permission prompt, and
//! the negotiated capture format stands in for the display surface's settings.
//!
//! All V4L2 calls block, so each one runs on the blocking thread pool.

use crate::constants::devices;
use crate::platform::{
    BrowserDevice, DeviceKind, LiveSettings, MediaDevices, MediaError, MediaStream,
    StreamConstraints,
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use v4l::Device;
use v4l::capability::Flags;
use v4l::video::Capture;

/// [`MediaDevices`] backed by `/dev/video*` nodes
#[derive(Debug, Clone, Default)]
pub struct V4l2MediaDevices;

impl V4l2MediaDevices {
    pub fn new() -> Self {
        Self
    }
}

async fn blocking<T, F>(f: F) -> Result<T, MediaError>
where
    F: FnOnce() -> Result<T, MediaError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| MediaError::Other(format!("V4L2 worker failed: {}", e)))?
}

fn device_id(index: usize) -> String {
    format!("{}{}", devices::V4L2_ID_PREFIX, index)
}

fn parse_device_id(id: &str) -> Option<usize> {
    id.strip_prefix(devices::V4L2_ID_PREFIX)?.parse().ok()
}

fn is_capture(dev: &Device) -> std::io::Result<bool> {
    Ok(dev.query_caps()?.capabilities.contains(Flags::VIDEO_CAPTURE))
}

/// Open the first node that can capture video
fn open_any_capture() -> Result<(usize, Device), MediaError> {
    let mut denied = false;
    for node in v4l::context::enum_devices() {
        match Device::with_path(node.path()) {
            Ok(dev) if is_capture(&dev).unwrap_or(false) => return Ok((node.index(), dev)),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => denied = true,
            Err(e) => debug!(path = %node.path().display(), error = %e, "Skipping node"),
        }
    }
    Err(if denied {
        MediaError::PermissionDenied
    } else {
        MediaError::NotFound
    })
}

/// Try to move the device to the ideal resolution; never fails the request
fn apply_ideal_resolution(dev: &Device, width: u32, height: u32) {
    let result = dev.format().and_then(|mut format| {
        format.width = width;
        format.height = height;
        dev.set_format(&format)
    });
    match result {
        Ok(f) => debug!(width = f.width, height = f.height, "Applied ideal resolution"),
        Err(e) => debug!(error = %e, "Ideal resolution not applied, keeping current format"),
    }
}

#[async_trait]
impl MediaDevices for V4l2MediaDevices {
    fn supports_capture(&self) -> bool {
        Path::new(devices::SYSFS_CLASS).is_dir()
    }

    async fn list_capture_devices(&self) -> Result<Vec<BrowserDevice>, MediaError> {
        blocking(|| {
            let mut listed = Vec::new();
            for node in v4l::context::enum_devices() {
                let caps = match Device::with_path(node.path()).and_then(|d| d.query_caps()) {
                    Ok(caps) => caps,
                    Err(e) => {
                        debug!(path = %node.path().display(), error = %e, "Cannot query node");
                        continue;
                    }
                };
                let kind = if caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                    DeviceKind::VideoInput
                } else {
                    DeviceKind::Other
                };
                listed.push((
                    node.index(),
                    BrowserDevice {
                        device_id: device_id(node.index()),
                        label: caps.card,
                        kind,
                    },
                ));
            }
            // enum_devices follows directory order; present devices by node index
            listed.sort_by_key(|(index, _)| *index);
            Ok(listed.into_iter().map(|(_, device)| device).collect())
        })
        .await
    }

    async fn acquire_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, MediaError> {
        let constraints = constraints.clone();
        let (index, dev) = blocking(move || {
            let (index, dev) = match constraints.device_id.as_deref() {
                Some(id) => {
                    let index = parse_device_id(id).ok_or(MediaError::NotFound)?;
                    (index, Device::new(index)?)
                }
                None => open_any_capture()?,
            };
            if let (Some(w), Some(h)) = (constraints.ideal_width, constraints.ideal_height) {
                apply_ideal_resolution(&dev, w, h);
            }
            Ok((index, dev))
        })
        .await?;

        info!(index, "Opened V4L2 capture device");
        Ok(Box::new(V4l2Stream {
            id: device_id(index),
            device: Arc::new(Mutex::new(Some(dev))),
        }))
    }
}

/// An open V4L2 node; stopping the track closes it
struct V4l2Stream {
    id: String,
    device: Arc<Mutex<Option<Device>>>,
}

#[async_trait]
impl MediaStream for V4l2Stream {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop_tracks(&self) {
        let closed = self
            .device
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if closed.is_some() {
            debug!(stream = %self.id, "Closed V4L2 device");
        }
    }

    async fn live_settings(&self) -> Result<LiveSettings, MediaError> {
        let device = Arc::clone(&self.device);
        blocking(move || {
            let guard = device.lock().unwrap_or_else(|e| e.into_inner());
            let dev = guard
                .as_ref()
                .ok_or_else(|| MediaError::Other("stream already stopped".to_string()))?;

            let format = dev.format()?;
            let mut settings = LiveSettings::from_resolution(format.width, format.height);
            settings.pixel_format = Some(format.fourcc.to_string());

            // Drivers without frame interval support fail this ioctl
            if let Ok(params) = dev.params() {
                let interval = params.interval;
                if interval.numerator > 0 {
                    settings.frame_rate =
                        Some(f64::from(interval.denominator) / f64::from(interval.numerator));
                }
            }
            Ok(settings)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_round_trip() {
        assert_eq!(device_id(3), "v4l2-3");
        assert_eq!(parse_device_id("v4l2-3"), Some(3));
        assert_eq!(parse_device_id("usb-3"), None);
        assert_eq!(parse_device_id("v4l2-x"), None);
    }
}
