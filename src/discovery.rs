// SPDX-License-Identifier: GPL-3.0-only

//! Discovery pass orchestration
//!
//! ```text
//!  System Device Lister ──┐
//!                         ├─► Device Correlator ─► DeviceCard × N
//!  Platform Enumerator  ──┘                          ├─ open_stream
//!   (probe → list)                                   └─ load_capabilities
//! ```
//!
//! The lister and the permission probe run concurrently. Once correlated,
//! every card's stream and capability work is spawned as an independent task;
//! completion order across cards is unspecified.

use crate::command::CommandRunner;
use crate::config::Config;
use crate::correlate::correlate;
use crate::enumerator::enumerate_video_inputs;
use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::platform::MediaDevices;
use crate::presentation::Presenter;
use crate::session::{CardSettings, DetailState, DeviceCard};
use crate::system::list_system_devices;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Runs discovery passes against a set of collaborators
pub struct DiscoveryEngine {
    media: Arc<dyn MediaDevices>,
    runner: Arc<dyn CommandRunner>,
    presenter: Arc<dyn Presenter>,
    settings: CardSettings,
    device_list_argv: Vec<String>,
}

impl DiscoveryEngine {
    pub fn new(
        media: Arc<dyn MediaDevices>,
        runner: Arc<dyn CommandRunner>,
        presenter: Arc<dyn Presenter>,
        config: &Config,
    ) -> Self {
        Self {
            media,
            runner,
            presenter,
            settings: config.card_settings(),
            device_list_argv: config.device_list_command.clone(),
        }
    }

    /// Discover devices, lay out one card each and launch per-card work
    ///
    /// Global failures replace the view with a status message and are
    /// returned; per-card failures are only published to their card.
    pub async fn discover(&self) -> DiscoveryResult<Discovery> {
        let (paths, devices) = tokio::join!(
            list_system_devices(self.runner.as_ref(), &self.device_list_argv),
            enumerate_video_inputs(self.media.as_ref()),
        );

        let devices = devices.inspect_err(|e| report_halt(self.presenter.as_ref(), e))?;

        let correlated = correlate(&devices, &paths);
        info!(
            devices = correlated.len(),
            system_paths = paths.len(),
            "Correlated devices by position"
        );
        self.presenter.show_devices(&correlated);

        let cards: Vec<Arc<DeviceCard>> = correlated
            .into_iter()
            .enumerate()
            .map(|(index, device)| {
                Arc::new(DeviceCard::new(
                    index,
                    device,
                    self.settings.clone(),
                    Arc::clone(&self.media),
                    Arc::clone(&self.runner),
                    Arc::clone(&self.presenter),
                ))
            })
            .collect();

        let mut tasks = JoinSet::new();
        for card in &cards {
            let stream_card = Arc::clone(card);
            tasks.spawn(async move {
                // Failures are already published to the card
                let _ = stream_card.open_stream().await;
            });

            let caps_card = Arc::clone(card);
            tasks.spawn(async move {
                let _ = caps_card.load_capabilities().await;
            });
        }

        Ok(Discovery { cards, tasks })
    }
}

/// Only global errors replace the view; anything else stays in the log
fn report_halt(presenter: &dyn Presenter, error: &DiscoveryError) {
    if error.is_global() {
        warn!(error = %error, "Discovery halted");
        presenter.show_status(&error.to_string());
    } else {
        warn!(error = %error, "Discovery stopped on a device-scoped error");
    }
}

/// Result of one discovery pass
///
/// Dropping it (or calling [`Discovery::teardown`]) releases every card's
/// stream. Tasks still in flight are left to finish; they are never
/// cancelled.
pub struct Discovery {
    cards: Vec<Arc<DeviceCard>>,
    tasks: JoinSet<()>,
}

impl Discovery {
    pub fn cards(&self) -> &[Arc<DeviceCard>] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&Arc<DeviceCard>> {
        self.cards.get(index)
    }

    /// Wait for every launched task. For synchronisation only: it says
    /// nothing about the order in which cards completed.
    pub async fn settle(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Device task did not complete");
            }
        }
    }

    /// Toggle the detailed dump of one card
    pub async fn toggle_details(&self, index: usize) -> Option<DetailState> {
        let card = self.cards.get(index)?;
        Some(card.toggle_details().await)
    }

    /// Release every stream acquired during this pass
    pub fn teardown(self) {
        info!(cards = self.cards.len(), "Tearing down discovery");
    }
}

impl Drop for Discovery {
    fn drop(&mut self) {
        self.tasks.detach_all();
        for card in &self.cards {
            card.release();
        }
        debug!("Released all device streams");
    }
}
