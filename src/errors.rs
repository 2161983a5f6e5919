// SPDX-License-Identifier: GPL-3.0-only

//! Error types for device discovery
//!
//! Failures fall into two scopes. Global errors replace the whole device view
//! with a single status message and halt further device work. Device-scoped
//! errors degrade exactly one card while its siblings carry on.

use crate::command::CommandError;
use crate::platform::MediaError;
use thiserror::Error;

/// Result type alias using DiscoveryError
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Every failure the discovery engine can surface
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscoveryError {
    /// The platform has no media capture support at all
    #[error("This system does not support video capture")]
    NoCaptureCapability,
    /// The permission probe was rejected
    #[error("Camera access was denied: {0}")]
    PermissionDenied(String),
    /// Listing capture devices failed after the probe succeeded
    #[error("Could not enumerate capture devices: {0}")]
    DeviceEnumerationFailed(String),
    /// The OS device node listing failed (logged, never shown globally)
    #[error("System device list unavailable: {0}")]
    DeviceListUnavailable(String),
    /// Opening the per-device capture stream failed
    #[error("Could not open camera stream: {0}")]
    StreamAcquisitionFailed(String),
    /// Running or reading the capability listing failed
    #[error("Could not read supported formats: {0}")]
    CapabilityFetchFailed(String),
    /// Running the detailed diagnostic dump failed
    #[error("Could not read device details: {0}")]
    DetailFetchFailed(String),
}

impl DiscoveryError {
    /// Whether this error replaces the whole view instead of one card
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            DiscoveryError::NoCaptureCapability
                | DiscoveryError::PermissionDenied(_)
                | DiscoveryError::DeviceEnumerationFailed(_)
        )
    }

    pub(crate) fn stream(err: MediaError) -> Self {
        DiscoveryError::StreamAcquisitionFailed(err.to_string())
    }

    pub(crate) fn capabilities(err: CommandError) -> Self {
        DiscoveryError::CapabilityFetchFailed(err.message)
    }

    pub(crate) fn details(err: CommandError) -> Self {
        DiscoveryError::DetailFetchFailed(err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_kinds() {
        assert!(DiscoveryError::NoCaptureCapability.is_global());
        assert!(DiscoveryError::PermissionDenied("denied".into()).is_global());
        assert!(DiscoveryError::DeviceEnumerationFailed("gone".into()).is_global());
        assert!(!DiscoveryError::DeviceListUnavailable("exit 2".into()).is_global());
        assert!(!DiscoveryError::StreamAcquisitionFailed("busy".into()).is_global());
        assert!(!DiscoveryError::CapabilityFetchFailed("exit 1".into()).is_global());
        assert!(!DiscoveryError::DetailFetchFailed("exit 1".into()).is_global());
    }

    #[test]
    fn test_display_carries_cause() {
        let err = DiscoveryError::capabilities(CommandError::new("v4l2-ctl: not found"));
        assert_eq!(
            err.to_string(),
            "Could not read supported formats: v4l2-ctl: not found"
        );
    }
}
