//! Background half of the app. The UI thread owns no sockets; it sends
//! [`WorkerCommand`]s over an unbounded channel and drains [`AppEvent`]s
//! each frame. One worker thread hosts a private tokio runtime running the
//! poll loop, the upload pool and one-shot backend calls.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc as async_mpsc;
use tracing::{debug, error, info, warn};

use crate::api::client::ApiClient;
use crate::api::types::AnalyzeRequest;
use crate::config::Config;
use crate::poller::Poller;
use crate::registry::RegistryAction;
use crate::uploader::{UploadJob, UploadPool};

/// Everything the worker can tell the UI.
#[derive(Debug)]
pub enum AppEvent {
    Registry(RegistryAction),
    /// Outcome of POST /analyze: the analysis text, or a display message.
    Analysis(Result<String, String>),
}

#[derive(Debug)]
pub enum WorkerCommand {
    Upload(Vec<UploadJob>),
    Delete { id: String },
    Analyze(AnalyzeRequest),
    PollNow,
}

pub struct WorkerHandle {
    commands: Option<async_mpsc::UnboundedSender<WorkerCommand>>,
    events: Receiver<AppEvent>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn spawn(config: Config) -> anyhow::Result<Self> {
        let client = ApiClient::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        let (command_tx, command_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = channel();

        let thread = std::thread::Builder::new()
            .name("backend-worker".to_string())
            .spawn(move || run_worker(client, config, command_rx, event_tx))
            .context("failed to spawn worker thread")?;

        Ok(Self {
            commands: Some(command_tx),
            events: event_rx,
            thread: Some(thread),
        })
    }

    pub fn send(&self, command: WorkerCommand) {
        match &self.commands {
            Some(tx) => {
                if tx.send(command).is_err() {
                    warn!("worker is gone; dropping command");
                }
            }
            None => warn!("worker already shut down; dropping command"),
        }
    }

    /// Non-blocking; the UI calls this in a loop every frame.
    pub fn try_recv(&self) -> Option<AppEvent> {
        self.events.try_recv().ok()
    }

    /// Closes the command channel and joins the thread. Dropping the
    /// runtime cancels the poll interval and any in-flight uploads.
    pub fn shutdown(&mut self) {
        self.commands.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("worker thread panicked during shutdown");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    client: ApiClient,
    config: Config,
    mut commands: async_mpsc::UnboundedReceiver<WorkerCommand>,
    events: Sender<AppEvent>,
) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(%err, "failed to start worker runtime");
            return;
        }
    };

    runtime.block_on(async move {
        let pool = UploadPool::new(
            Arc::new(client.clone()),
            config.max_concurrent_uploads,
            events.clone(),
        );
        let poller = Poller::new(Arc::new(client.clone()), events.clone());

        // The interval loop runs beside the command loop; both end when
        // the UI side goes away.
        let interval_poller = poller.clone();
        let every = Duration::from_secs(config.poll_interval_secs);
        tokio::spawn(async move { interval_poller.run(every).await });

        info!(
            base_url = %config.base_url,
            poll_secs = config.poll_interval_secs,
            slots = config.max_concurrent_uploads,
            "worker started"
        );

        while let Some(command) = commands.recv().await {
            match command {
                WorkerCommand::Upload(jobs) => {
                    debug!(count = jobs.len(), "dispatching uploads");
                    for job in jobs {
                        pool.submit(job);
                    }
                }
                WorkerCommand::Delete { id } => {
                    let client = client.clone();
                    let poller = poller.clone();
                    tokio::spawn(async move {
                        if let Err(err) = client.delete_file(&id).await {
                            warn!(%err, id = %id, "delete failed; the next poll restores the record");
                        }
                        // server truth after the delete, success or not
                        poller.poll_once().await;
                    });
                }
                WorkerCommand::Analyze(request) => {
                    let client = client.clone();
                    let events = events.clone();
                    tokio::spawn(async move {
                        let result = client
                            .analyze(&request)
                            .await
                            .map(|resp| resp.analysis)
                            .map_err(|err| err.to_string());
                        let _ = events.send(AppEvent::Analysis(result));
                    });
                }
                WorkerCommand::PollNow => {
                    poller.poll_once().await;
                }
            }
        }
        debug!("command channel closed; worker stopping");
    });
}
