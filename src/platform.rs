// SPDX-License-Identifier: GPL-3.0-only

//! Media platform abstraction
//!
//! Models the host's media-device directory: a permission-gated list of
//! capture devices and the ability to open a capture stream against one of
//! them. The host binary implements it over V4L2 (see
//! [`crate::backends::v4l2`]); tests implement it in memory.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Device kind as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// A video capture device
    #[serde(rename = "videoinput")]
    VideoInput,
    /// Anything else (audio inputs, outputs, metadata nodes)
    Other,
}

/// A capture device as seen by the media platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserDevice {
    /// Opaque platform identifier, used to constrain stream requests
    pub device_id: String,
    /// Human readable label (only populated once permission is granted)
    pub label: String,
    pub kind: DeviceKind,
}

impl BrowserDevice {
    pub fn video_input(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
        }
    }

    pub fn is_video_input(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }
}

/// Constraints for a stream request
///
/// Resolution values are *ideal* hints: the platform should get as close as
/// it can but must not fail when it cannot match them exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamConstraints {
    /// Restrict the request to one device, or `None` for any video device
    pub device_id: Option<String>,
    pub ideal_width: Option<u32>,
    pub ideal_height: Option<u32>,
}

impl StreamConstraints {
    /// Video-only request with no preferences (used by the permission probe)
    pub fn any_video() -> Self {
        Self::default()
    }

    /// Request for one specific device with ideal resolution hints
    pub fn for_device(device_id: impl Into<String>, ideal: Option<(u32, u32)>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            ideal_width: ideal.map(|(w, _)| w),
            ideal_height: ideal.map(|(_, h)| h),
        }
    }
}

/// Settings a running stream actually delivers
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LiveSettings {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
    pub aspect_ratio: Option<f64>,
    /// "user", "environment", ... where the platform knows it
    pub facing_mode: Option<String>,
    /// FourCC of the negotiated format, where the platform knows it
    pub pixel_format: Option<String>,
}

impl LiveSettings {
    /// Build settings from a negotiated resolution, deriving the aspect ratio
    pub fn from_resolution(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            aspect_ratio: (height > 0).then(|| f64::from(width) / f64::from(height)),
            ..Default::default()
        }
    }
}

/// Errors reported by the media platform
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("device not found")]
    NotFound,
    #[error("constraints cannot be satisfied: {0}")]
    Overconstrained(String),
    #[error("media capture is not supported")]
    NotSupported,
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => MediaError::PermissionDenied,
            std::io::ErrorKind::NotFound => MediaError::NotFound,
            _ => MediaError::Other(err.to_string()),
        }
    }
}

/// A live capture stream
#[async_trait]
pub trait MediaStream: Send + Sync {
    /// Platform identifier of the stream
    fn id(&self) -> &str;

    /// Stop every track of the stream
    fn stop_tracks(&self);

    /// Attach to a display surface and wait until it reports its settings
    async fn live_settings(&self) -> Result<LiveSettings, MediaError>;
}

/// The host's media-device directory
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Whether the platform offers media capture at all
    fn supports_capture(&self) -> bool;

    /// List every device; labels may be empty until permission is granted
    async fn list_capture_devices(&self) -> Result<Vec<BrowserDevice>, MediaError>;

    /// Open a capture stream matching `constraints`
    async fn acquire_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, MediaError>;
}

/// Owns a stream and stops its tracks when dropped
///
/// Every stream acquired by the engine is wrapped in a guard, so tracks are
/// released exactly once on every exit path.
pub struct StreamGuard {
    stream: Box<dyn MediaStream>,
}

impl StreamGuard {
    pub fn new(stream: Box<dyn MediaStream>) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> &dyn MediaStream {
        self.stream.as_ref()
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stream.stop_tracks();
    }
}

impl std::fmt::Debug for StreamGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamGuard")
            .field("id", &self.stream.id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStream(Arc<AtomicUsize>);

    #[async_trait]
    impl MediaStream for CountingStream {
        fn id(&self) -> &str {
            "counting"
        }

        fn stop_tracks(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        async fn live_settings(&self) -> Result<LiveSettings, MediaError> {
            Ok(LiveSettings::default())
        }
    }

    #[test]
    fn test_guard_stops_once_on_drop() {
        let stops = Arc::new(AtomicUsize::new(0));
        {
            let guard = StreamGuard::new(Box::new(CountingStream(stops.clone())));
            assert_eq!(guard.stream().id(), "counting");
            assert_eq!(stops.load(Ordering::SeqCst), 0);
        }
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_aspect_ratio_from_resolution() {
        let settings = LiveSettings::from_resolution(1920, 1080);
        let ratio = settings.aspect_ratio.unwrap();
        assert!((ratio - 16.0 / 9.0).abs() < 1e-9);
        assert_eq!(LiveSettings::from_resolution(640, 0).aspect_ratio, None);
    }

    #[test]
    fn test_io_error_mapping() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert_eq!(MediaError::from(denied), MediaError::PermissionDenied);
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert_eq!(MediaError::from(missing), MediaError::NotFound);
    }

    #[test]
    fn test_device_kind_serializes_as_platform_name() {
        let json = serde_json::to_string(&DeviceKind::VideoInput).unwrap();
        assert_eq!(json, "\"videoinput\"");
    }
}
