// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Diagnostic tool invocation
pub mod diagnostics {
    /// Tool used for capability listings and detailed dumps
    pub const PROGRAM: &str = "v4l2-ctl";

    /// Selects the device node to query
    pub const DEVICE_ARG: &str = "--device";

    /// Lists pixel formats with every discrete size and interval
    pub const LIST_FORMATS_ARG: &str = "--list-formats-ext";

    /// Dumps every readable property of the device
    pub const ALL_ARG: &str = "--all";

    /// Default ideal resolution hint for per-device streams (720p)
    pub const IDEAL_RESOLUTION: (u32, u32) = (1280, 720);
}

/// OS device node listing
pub mod devices {
    /// Shell used to expand the device glob
    pub const SHELL: &str = "sh";

    /// Lists video nodes one per line; exits non-zero when none exist
    pub const LIST_SCRIPT: &str = "ls -1 /dev/video* 2>/dev/null";

    /// Present whenever the kernel has video capture support loaded
    pub const SYSFS_CLASS: &str = "/sys/class/video4linux";

    /// Prefix of device ids handed out by the native V4L2 backend
    pub const V4L2_ID_PREFIX: &str = "v4l2-";
}

/// Privilege elevation
pub mod elevation {
    /// Default command prefixed to elevated invocations
    pub const DEFAULT_COMMAND: &[&str] = &["pkexec"];
}

/// Config file location, relative to the user config directory
pub const CONFIG_DIR_NAME: &str = "camera-inspector";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Fallback label for devices the platform did not name
pub fn fallback_label(index: usize) -> String {
    format!("Camera {}", index + 1)
}
