// SPDX-License-Identifier: GPL-3.0-only

//! Host platform backends
//!
//! Concrete implementations of the [`crate::platform::MediaDevices`] seam:
//!
//! - [`v4l2`]: native access to `/dev/video*` nodes through the `v4l` crate

pub mod v4l2;

pub use v4l2::V4l2MediaDevices;
