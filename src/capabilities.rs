// SPDX-License-Identifier: GPL-3.0-only

//! Capability table parsing
//!
//! Turns the text printed by `v4l2-ctl --list-formats-ext` into a nested
//! table of pixel format → resolution → frame rates. Both the older layout
//! (`Pixel Format: 'YUYV'`) and the current one (`[0]: 'YUYV' (YUYV 4:2:2)`)
//! are recognised:
//!
//! ```text
//! ioctl: VIDIOC_ENUM_FMT
//!     Type: Video Capture
//!
//!     [0]: 'YUYV' (YUYV 4:2:2)
//!         Size: Discrete 1920x1080
//!             Interval: Discrete 0.033s (30.000 fps)
//!             Interval: Discrete 0.067s (15.000 fps)
//! ```
//!
//! Parsing never fails. Lines that match nothing are skipped, and text with no
//! format lines produces an empty table, which callers treat as "no data".

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Resolution ("WxH") → frame rates, highest first
pub type ResolutionMap = BTreeMap<String, Vec<f64>>;

/// Pixel format → resolution → frame rates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CapabilityTable(BTreeMap<String, ResolutionMap>);

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct pixel formats
    pub fn format_count(&self) -> usize {
        self.0.len()
    }

    pub fn formats(&self) -> impl Iterator<Item = (&str, &ResolutionMap)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, format: &str) -> Option<&ResolutionMap> {
        self.0.get(format)
    }

    /// Frame rates for one (format, resolution) bucket
    pub fn frame_rates(&self, format: &str, size: &str) -> Option<&[f64]> {
        self.0.get(format)?.get(size).map(Vec::as_slice)
    }

    /// Highest frame rate offered for a bucket
    pub fn max_frame_rate(&self, format: &str, size: &str) -> Option<f64> {
        self.frame_rates(format, size)?.first().copied()
    }

    /// Resolutions of a format ordered by pixel count, largest first.
    ///
    /// Keys that are not valid `WxH` tokens sort last in key order.
    pub fn resolutions_by_area(&self, format: &str) -> Vec<&str> {
        let Some(sizes) = self.0.get(format) else {
            return Vec::new();
        };
        let mut keys: Vec<&str> = sizes.keys().map(String::as_str).collect();
        keys.sort_by_key(|k| {
            std::cmp::Reverse(parse_resolution(k).map(|(w, h)| u64::from(w) * u64::from(h)))
        });
        keys
    }

    fn ensure_format(&mut self, format: &str) -> &mut ResolutionMap {
        self.0.entry(format.to_string()).or_default()
    }
}

/// Split a `WxH` token into its dimensions
pub fn parse_resolution(token: &str) -> Option<(u32, u32)> {
    let (w, h) = token.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

/// `<digits>x<digits>`, whether or not the dimensions fit in a `u32`
fn is_size_token(token: &str) -> bool {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    token
        .split_once('x')
        .is_some_and(|(w, h)| digits(w) && digits(h))
}

/// Kind of a recognised line
#[derive(Debug, PartialEq)]
enum Line<'a> {
    Format(&'a str),
    Size(&'a str),
    Interval(&'a str),
}

/// Classify a line, testing format, size and interval patterns in that order
fn classify(line: &str) -> Option<Line<'_>> {
    let trimmed = line.trim();

    if let Some(format) = format_token(trimmed) {
        return Some(Line::Format(format));
    }

    // Format: Size: Discrete 1920x1080
    if let Some(rest) = trimmed.strip_prefix("Size: Discrete ")
        && let Some(size) = rest.split_whitespace().next()
        && is_size_token(size)
    {
        return Some(Line::Size(size));
    }

    // Format: Interval: Discrete 0.033s (30.000 fps)
    if trimmed.starts_with("Interval: ")
        && let Some(open) = trimmed.rfind('(')
        && let Some(fps) = trimmed[open + 1..].strip_suffix(" fps)")
    {
        return Some(Line::Interval(fps));
    }

    None
}

/// Extract the quoted FourCC from either format line layout
fn format_token(trimmed: &str) -> Option<&str> {
    // Format: Pixel Format: 'YUYV'
    let rest = if let Some(rest) = trimmed.strip_prefix("Pixel Format:") {
        rest
    } else {
        // Format: [0]: 'YUYV' (YUYV 4:2:2)
        let (index, rest) = trimmed.strip_prefix('[')?.split_once("]:")?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest
    };

    let quoted = rest.trim_start().strip_prefix('\'')?;
    let end = quoted.find('\'')?;
    let token = quoted[..end].trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Parse diagnostic listing text into a capability table
pub fn parse_capabilities(text: &str) -> CapabilityTable {
    let mut table = CapabilityTable::new();
    let mut current_format: Option<&str> = None;
    let mut current_size: Option<&str> = None;

    for line in text.lines() {
        match classify(line) {
            Some(Line::Format(format)) => {
                table.ensure_format(format);
                current_format = Some(format);
                current_size = None;
            }
            Some(Line::Size(size)) => {
                if let Some(format) = current_format {
                    table
                        .ensure_format(format)
                        .entry(size.to_string())
                        .or_default();
                    current_size = Some(size);
                }
            }
            Some(Line::Interval(fps)) => {
                if let (Some(format), Some(size)) = (current_format, current_size) {
                    match fps.trim().parse::<f64>() {
                        Ok(rate) if rate.is_finite() => table
                            .ensure_format(format)
                            .entry(size.to_string())
                            .or_default()
                            .push(rate),
                        _ => debug!(fps, "Discarding non-numeric frame rate"),
                    }
                }
            }
            None => {}
        }
    }

    for sizes in table.0.values_mut() {
        for rates in sizes.values_mut() {
            rates.sort_by(|a, b| b.total_cmp(a));
        }
    }

    debug!(formats = table.format_count(), "Parsed capability table");
    table
}
