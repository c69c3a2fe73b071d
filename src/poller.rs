//! Periodic refresh from GET /files. The server snapshot is the source of
//! truth for anything it has acknowledged; each tick lands in the registry
//! as one `Reconcile` action.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::api::client::FileLister;
use crate::api::error::ApiError;
use crate::registry::RegistryAction;
use crate::worker::AppEvent;

#[derive(Clone)]
pub struct Poller {
    lister: Arc<dyn FileLister>,
    events: Sender<AppEvent>,
}

impl Poller {
    pub fn new(lister: Arc<dyn FileLister>, events: Sender<AppEvent>) -> Self {
        Self { lister, events }
    }

    /// One fetch-and-reconcile. A failed poll keeps the local registry
    /// untouched; the next tick retries. Returns false once the event
    /// receiver is gone and polling has no audience left.
    pub async fn poll_once(&self) -> bool {
        match self.lister.list_files().await {
            Ok(files) => {
                debug!(count = files.len(), "poll snapshot received");
                self.events
                    .send(AppEvent::Registry(RegistryAction::Reconcile(files)))
                    .is_ok()
            }
            Err(err) if err.is_network() => {
                warn!(%err, "backend unreachable; keeping local records");
                true
            }
            Err(ApiError::Server { status, message }) => {
                warn!(status, %message, "poll failed; retrying next tick");
                true
            }
            Err(err) => {
                warn!(%err, "poll failed; retrying next tick");
                true
            }
        }
    }

    /// Tick loop; the first poll fires immediately so the dashboard fills
    /// on startup. Ends when the UI side disappears, and is cancelled
    /// outright when the worker runtime shuts down.
    pub async fn run(self, every: Duration) {
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            if !self.poll_once().await {
                debug!("event channel closed; poller stopping");
                return;
            }
        }
    }
}
