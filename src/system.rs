// SPDX-License-Identifier: GPL-3.0-only

//! OS device node listing
//!
//! Lists `/dev/video*` through the command facility. A failing listing (most
//! often because no node exists and the glob does not expand) is not fatal:
//! discovery continues and every card simply ends up without a system path.

use crate::command::{CommandRunner, ErrorMode, RunOptions};
use crate::errors::DiscoveryError;
use tracing::{debug, warn};

/// Opaque name of an OS device node, e.g. `/dev/video0`
pub type SystemDevicePath = String;

/// List video device nodes in OS enumeration order
pub async fn list_system_devices(
    runner: &dyn CommandRunner,
    argv: &[String],
) -> Vec<SystemDevicePath> {
    let options = RunOptions {
        error_mode: ErrorMode::Message,
        elevate: false,
    };

    match runner.run(argv, options).await {
        Ok(output) => {
            let paths = parse_device_list(&output);
            debug!(count = paths.len(), "Listed system video devices");
            paths
        }
        Err(e) => {
            let err = DiscoveryError::DeviceListUnavailable(e.message);
            warn!(error = %err, "Continuing without system device paths");
            Vec::new()
        }
    }
}

/// One path per non-empty line, order preserved
fn parse_device_list(output: &str) -> Vec<SystemDevicePath> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
