//! Bounded upload pool. Every dropped file becomes a spawned job, but a
//! semaphore keeps at most `max_concurrent` multipart POSTs in flight;
//! the rest sit in queued state until a slot frees up.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::api::client::UploadTransport;
use crate::registry::RegistryAction;
use crate::worker::AppEvent;

/// One file to push to the backend, tied to the registry record created
/// for it at drop time.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub record_id: String,
    pub name: String,
    pub path: PathBuf,
}

pub struct UploadPool {
    transport: Arc<dyn UploadTransport>,
    permits: Arc<Semaphore>,
    events: Sender<AppEvent>,
}

impl UploadPool {
    pub fn new(
        transport: Arc<dyn UploadTransport>,
        max_concurrent: usize,
        events: Sender<AppEvent>,
    ) -> Self {
        Self {
            transport,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            events,
        }
    }

    /// Spawns the job and returns immediately. Must be called from inside
    /// the worker runtime. The job reports back through registry actions:
    /// `MarkUploading` once it holds a slot, then `Promote` or `Fail`.
    pub fn submit(&self, job: UploadJob) {
        let transport = Arc::clone(&self.transport);
        let permits = Arc::clone(&self.permits);
        let events = self.events.clone();

        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                // semaphore closed; the pool is shutting down
                Err(_) => return,
            };

            debug!(name = %job.name, "upload slot acquired");
            let _ = events.send(AppEvent::Registry(RegistryAction::MarkUploading {
                id: job.record_id.clone(),
            }));

            let action = match run_upload(transport.as_ref(), &job).await {
                Ok(server_id) => {
                    debug!(name = %job.name, ?server_id, "upload accepted");
                    RegistryAction::Promote {
                        id: job.record_id.clone(),
                        server_id,
                    }
                }
                Err(message) => {
                    warn!(name = %job.name, %message, "upload failed");
                    RegistryAction::Fail {
                        id: job.record_id.clone(),
                        message,
                    }
                }
            };
            let _ = events.send(AppEvent::Registry(action));
        });
    }
}

async fn run_upload(transport: &dyn UploadTransport, job: &UploadJob) -> Result<Option<String>, String> {
    let bytes = tokio::fs::read(&job.path)
        .await
        .map_err(|err| format!("failed to read {}: {err}", job.path.display()))?;
    transport
        .upload(&job.name, bytes)
        .await
        .map_err(|err| err.to_string())
}
