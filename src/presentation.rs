// SPDX-License-Identifier: GPL-3.0-only

//! Presentation-facing records
//!
//! The engine never renders anything itself. It pushes [`CardUpdate`]s and a
//! global status to a [`Presenter`], which turns them into device cards.
//! [`ViewBoard`] is the in-process presenter: it folds updates into an ordered
//! list of [`DeviceView`] records that hosts can render or serialize.

use crate::capabilities::CapabilityTable;
use crate::constants::fallback_label;
use crate::correlate::CorrelatedDevice;
use crate::errors::DiscoveryError;
use crate::platform::LiveSettings;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// One change to one device card
#[derive(Debug, Clone, PartialEq)]
pub enum CardUpdate {
    /// The card's stream is live and reports these settings
    LiveSettings(LiveSettings),
    /// The capability table was read (possibly empty: "no data")
    Capabilities(CapabilityTable),
    /// The detailed diagnostic dump is available
    Details(String),
    /// The details panel was shown or hidden
    DetailsVisible(bool),
    /// A device-scoped failure
    Error(DiscoveryError),
}

/// Receives everything the engine wants shown
pub trait Presenter: Send + Sync {
    /// Replace the view with one status message (global failures)
    fn show_status(&self, message: &str);

    /// Lay out one empty card per correlated device, in order
    fn show_devices(&self, devices: &[CorrelatedDevice]);

    /// Apply an update to the card at `index`
    fn update_card(&self, index: usize, update: CardUpdate);
}

/// Per-device record handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DeviceView {
    pub index: usize,
    pub label: String,
    pub device_id: String,
    pub system_path: Option<String>,
    pub has_system_path: bool,
    pub live_settings: Option<LiveSettings>,
    pub capabilities: Option<CapabilityTable>,
    pub details: Option<String>,
    pub details_visible: bool,
    pub errors: Vec<String>,
}

impl DeviceView {
    fn from_device(index: usize, device: &CorrelatedDevice) -> Self {
        let label = if device.browser_device.label.is_empty() {
            fallback_label(index)
        } else {
            device.browser_device.label.clone()
        };

        Self {
            index,
            label,
            device_id: device.browser_device.device_id.clone(),
            system_path: device.system_path.clone(),
            has_system_path: device.has_system_path(),
            ..Default::default()
        }
    }

    fn apply(&mut self, update: CardUpdate) {
        match update {
            CardUpdate::LiveSettings(settings) => self.live_settings = Some(settings),
            CardUpdate::Capabilities(table) => self.capabilities = Some(table),
            CardUpdate::Details(text) => self.details = Some(text),
            CardUpdate::DetailsVisible(visible) => self.details_visible = visible,
            CardUpdate::Error(err) => self.errors.push(err.to_string()),
        }
    }

    /// Whether the card has an error
    pub fn is_errored(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Default)]
struct BoardState {
    status: Option<String>,
    cards: Vec<DeviceView>,
}

/// In-memory presenter accumulating ordered device views
#[derive(Debug, Clone, Default)]
pub struct ViewBoard {
    state: Arc<Mutex<BoardState>>,
}

impl ViewBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global status message, if a global failure replaced the view
    pub fn status(&self) -> Option<String> {
        self.lock().status.clone()
    }

    /// Snapshot of all cards in device order
    pub fn cards(&self) -> Vec<DeviceView> {
        self.lock().cards.clone()
    }

    pub fn card(&self, index: usize) -> Option<DeviceView> {
        self.lock().cards.get(index).cloned()
    }

    // A poisoned lock only means a presenter call panicked mid-update; the
    // records are still usable.
    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Presenter for ViewBoard {
    fn show_status(&self, message: &str) {
        let mut state = self.lock();
        state.cards.clear();
        state.status = Some(message.to_string());
    }

    fn show_devices(&self, devices: &[CorrelatedDevice]) {
        let mut state = self.lock();
        state.status = None;
        state.cards = devices
            .iter()
            .enumerate()
            .map(|(i, d)| DeviceView::from_device(i, d))
            .collect();
    }

    fn update_card(&self, index: usize, update: CardUpdate) {
        if let Some(card) = self.lock().cards.get_mut(index) {
            card.apply(update);
        }
    }
}
