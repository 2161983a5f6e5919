// SPDX-License-Identifier: GPL-3.0-only

//! Per-device stream lifecycle
//!
//! A [`DeviceCard`] owns everything discovery does for one correlated device:
//!
//! - its capture stream ([`DeviceCard::open_stream`]), which is released when
//!   superseded or on teardown
//! - its capability table ([`DeviceCard::load_capabilities`]), fetched once
//!   and cached
//! - its detailed diagnostic dump ([`DeviceCard::toggle_details`]), fetched on
//!   the first toggle only
//!
//! Every failure here is device-scoped: it is published to this card and
//! never affects sibling cards.

use crate::capabilities::{CapabilityTable, parse_capabilities};
use crate::command::{CommandError, CommandRunner, RunOptions};
use crate::constants::diagnostics;
use crate::correlate::CorrelatedDevice;
use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::platform::{LiveSettings, MediaDevices, StreamConstraints, StreamGuard};
use crate::presentation::{CardUpdate, Presenter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Settings shared by every card of a discovery pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSettings {
    /// Diagnostic tool, normally `v4l2-ctl`
    pub diagnostic_program: String,
    /// Ideal (non-mandatory) stream resolution
    pub ideal_resolution: Option<(u32, u32)>,
}

impl Default for CardSettings {
    fn default() -> Self {
        Self {
            diagnostic_program: diagnostics::PROGRAM.to_string(),
            ideal_resolution: Some(diagnostics::IDEAL_RESOLUTION),
        }
    }
}

impl CardSettings {
    fn capability_argv(&self, path: &str) -> Vec<String> {
        vec![
            self.diagnostic_program.clone(),
            diagnostics::DEVICE_ARG.to_string(),
            path.to_string(),
            diagnostics::LIST_FORMATS_ARG.to_string(),
        ]
    }

    fn details_argv(&self, path: &str) -> Vec<String> {
        vec![
            self.diagnostic_program.clone(),
            diagnostics::DEVICE_ARG.to_string(),
            path.to_string(),
            diagnostics::ALL_ARG.to_string(),
        ]
    }
}

/// State of the on-demand detailed dump
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetailState {
    #[default]
    NotFetched,
    /// A fetch is in flight; toggles are no-ops until it settles
    Fetching,
    /// Raw dump text, reused by every later toggle
    Fetched(String),
    /// The single fetch failed; it is not retried
    Failed(String),
}

/// A live stream together with the settings it reported
#[derive(Debug)]
pub struct StreamSession {
    guard: StreamGuard,
    settings: LiveSettings,
}

impl StreamSession {
    pub fn stream_id(&self) -> &str {
        self.guard.stream().id()
    }

    pub fn settings(&self) -> &LiveSettings {
        &self.settings
    }
}

/// Stream and diagnostics lifecycle for one correlated device
pub struct DeviceCard {
    index: usize,
    device: CorrelatedDevice,
    settings: CardSettings,
    media: Arc<dyn MediaDevices>,
    runner: Arc<dyn CommandRunner>,
    presenter: Arc<dyn Presenter>,
    session: Mutex<Option<StreamSession>>,
    capabilities: OnceCell<CapabilityTable>,
    details: Mutex<DetailState>,
    details_visible: AtomicBool,
    closed: AtomicBool,
}

impl DeviceCard {
    pub fn new(
        index: usize,
        device: CorrelatedDevice,
        settings: CardSettings,
        media: Arc<dyn MediaDevices>,
        runner: Arc<dyn CommandRunner>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            index,
            device,
            settings,
            media,
            runner,
            presenter,
            session: Mutex::new(None),
            capabilities: OnceCell::new(),
            details: Mutex::new(DetailState::NotFetched),
            details_visible: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn device(&self) -> &CorrelatedDevice {
        &self.device
    }

    fn label(&self) -> &str {
        &self.device.browser_device.label
    }

    fn publish(&self, update: CardUpdate) {
        self.presenter.update_card(self.index, update);
    }

    fn fail(&self, err: DiscoveryError) -> DiscoveryError {
        warn!(device = %self.label(), error = %err, "Device card error");
        self.publish(CardUpdate::Error(err.clone()));
        err
    }

    /// Acquire this device's capture stream and publish its live settings
    ///
    /// A stream the card already held is superseded and released. Streams
    /// that finish opening after [`release`] are stopped right away.
    ///
    /// [`release`]: DeviceCard::release
    pub async fn open_stream(&self) -> DiscoveryResult<LiveSettings> {
        let constraints = StreamConstraints::for_device(
            self.device.browser_device.device_id.clone(),
            self.settings.ideal_resolution,
        );

        let guard = match self.media.acquire_stream(&constraints).await {
            Ok(stream) => StreamGuard::new(stream),
            Err(e) => return Err(self.fail(DiscoveryError::stream(e))),
        };

        let settings = match guard.stream().live_settings().await {
            Ok(settings) => settings,
            Err(e) => return Err(self.fail(DiscoveryError::stream(e))),
        };

        info!(
            device = %self.label(),
            stream = %guard.stream().id(),
            width = ?settings.width,
            height = ?settings.height,
            frame_rate = ?settings.frame_rate,
            "Stream live"
        );

        let superseded = {
            let mut session = self.lock_session();
            if self.closed.load(Ordering::SeqCst) {
                debug!(device = %self.label(), "Card closed while stream was opening");
                return Err(DiscoveryError::StreamAcquisitionFailed(
                    "device card was closed".to_string(),
                ));
            }
            session.replace(StreamSession {
                guard,
                settings: settings.clone(),
            })
        };
        drop(superseded);

        self.publish(CardUpdate::LiveSettings(settings.clone()));
        Ok(settings)
    }

    /// Fetch, parse and publish the capability table
    ///
    /// Returns `Ok(None)` when the card has no system path to query. The
    /// table is cached after the first successful fetch.
    pub async fn load_capabilities(&self) -> DiscoveryResult<Option<CapabilityTable>> {
        let Some(path) = self.device.system_path.as_deref() else {
            debug!(device = %self.label(), "No system path, skipping capability listing");
            return Ok(None);
        };

        let argv = self.settings.capability_argv(path);
        let table = self
            .capabilities
            .get_or_try_init(|| async {
                let text = self.runner.run(&argv, RunOptions::elevated()).await?;
                Ok::<_, CommandError>(parse_capabilities(&text))
            })
            .await
            .map_err(|e| self.fail(DiscoveryError::capabilities(e)))?
            .clone();

        if table.is_empty() {
            debug!(path, "Capability listing contained no formats");
        }
        self.publish(CardUpdate::Capabilities(table.clone()));
        Ok(Some(table))
    }

    /// Cached capability table, if it has been fetched
    pub fn capabilities(&self) -> Option<&CapabilityTable> {
        self.capabilities.get()
    }

    /// Show or hide the detailed dump, fetching it on first use
    ///
    /// The dump command runs at most once per card. A toggle while the fetch
    /// is in flight changes nothing.
    pub async fn toggle_details(&self) -> DetailState {
        let Some(path) = self.device.system_path.as_deref() else {
            debug!(device = %self.label(), "No system path, details unavailable");
            return DetailState::NotFetched;
        };

        let fetch = {
            let mut state = self.lock_details();
            match &*state {
                DetailState::Fetching => return DetailState::Fetching,
                DetailState::NotFetched => {
                    *state = DetailState::Fetching;
                    true
                }
                DetailState::Fetched(_) | DetailState::Failed(_) => false,
            }
        };

        let visible = !self.details_visible.fetch_xor(true, Ordering::SeqCst);
        self.publish(CardUpdate::DetailsVisible(visible));

        if !fetch {
            return self.detail_state();
        }

        let pending = PendingDetails {
            card: self,
            settled: false,
        };
        let argv = self.settings.details_argv(path);
        let next = match self.runner.run(&argv, RunOptions::elevated()).await {
            Ok(text) => {
                self.publish(CardUpdate::Details(text.clone()));
                DetailState::Fetched(text)
            }
            Err(e) => DetailState::Failed(self.fail(DiscoveryError::details(e)).to_string()),
        };

        pending.finish(next)
    }

    pub fn detail_state(&self) -> DetailState {
        self.lock_details().clone()
    }

    pub fn details_visible(&self) -> bool {
        self.details_visible.load(Ordering::SeqCst)
    }

    /// Settings of the current stream, if one is live
    pub fn live_settings(&self) -> Option<LiveSettings> {
        self.lock_session().as_ref().map(|s| s.settings.clone())
    }

    pub fn has_stream(&self) -> bool {
        self.lock_session().is_some()
    }

    /// Stop every track of the card's stream; safe to call repeatedly
    pub fn release(&self) {
        let released = {
            let mut session = self.lock_session();
            self.closed.store(true, Ordering::SeqCst);
            session.take()
        };
        if let Some(session) = released {
            debug!(device = %self.label(), stream = %session.stream_id(), "Releasing stream");
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<StreamSession>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_details(&self) -> MutexGuard<'_, DetailState> {
        self.details.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Owns a card's `Fetching` state until the detail fetch settles
///
/// Dropped unfinished (the toggle future was cancelled), it parks the cell in
/// `Failed` so the card does not stay `Fetching` forever.
struct PendingDetails<'a> {
    card: &'a DeviceCard,
    settled: bool,
}

impl PendingDetails<'_> {
    fn finish(mut self, next: DetailState) -> DetailState {
        *self.card.lock_details() = next.clone();
        self.settled = true;
        next
    }
}

impl Drop for PendingDetails<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!(device = %self.card.label(), "Detail fetch cancelled");
        let cancelled = DetailState::Failed("detail fetch was cancelled".to_string());
        *self.card.lock_details() = cancelled;
    }
}

impl std::fmt::Debug for DeviceCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCard")
            .field("index", &self.index)
            .field("device", &self.device)
            .field("has_stream", &self.has_stream())
            .field("details", &self.detail_state())
            .finish()
    }
}
