// SPDX-License-Identifier: GPL-3.0-only

//! Camera Inspector - video capture device discovery and capability inspection
//!
//! This library discovers every video capture device on the host, correlates
//! OS device nodes with the devices a media platform exposes, opens a capture
//! stream per device and reads each device's supported formats.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`capabilities`]: `v4l2-ctl --list-formats-ext` parser
//! - [`system`]: OS device node listing
//! - [`enumerator`]: permission-gated platform device enumeration
//! - [`correlate`]: positional pairing of platform devices with OS nodes
//! - [`session`]: per-device stream and diagnostics lifecycle
//! - [`discovery`]: orchestration of a full discovery pass
//! - [`presentation`]: records handed to the presentation layer
//! - [`platform`] and [`command`]: collaborator seams
//! - [`backends`]: native V4L2 implementation of the platform seam
//! - [`config`]: user configuration handling
//!
//! # Example
//!
//! ```ignore
//! let board = Arc::new(ViewBoard::new());
//! let engine = DiscoveryEngine::new(media, runner, board.clone(), &Config::default());
//! let mut discovery = engine.discover().await?;
//! discovery.settle().await;
//! for card in board.cards() {
//!     println!("{}: {:?}", card.label, card.live_settings);
//! }
//! ```

pub mod backends;
pub mod capabilities;
pub mod command;
pub mod config;
pub mod constants;
pub mod correlate;
pub mod discovery;
pub mod enumerator;
pub mod errors;
pub mod platform;
pub mod presentation;
pub mod session;
pub mod system;

// Re-export commonly used types
pub use capabilities::{CapabilityTable, parse_capabilities};
pub use config::Config;
pub use correlate::{CorrelatedDevice, correlate};
pub use discovery::{Discovery, DiscoveryEngine};
pub use errors::{DiscoveryError, DiscoveryResult};
pub use presentation::{DeviceView, ViewBoard};
pub use session::{DetailState, DeviceCard};
