mod state;
mod ui;

use std::path::PathBuf;

use eframe::{egui, App};
use tracing::debug;

pub use state::{PendingDelete, Tab, ViewState};

use crate::api::types::AnalyzeRequest;
use crate::config::Config;
use crate::pdf;
use crate::registry::{Registry, RegistryAction, UploadRecord};
use crate::uploader::UploadJob;
use crate::worker::{AppEvent, WorkerCommand, WorkerHandle};

pub struct DashboardApp {
    config: Config,
    registry: Registry,
    view: ViewState,
    worker: WorkerHandle,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: Config, worker: WorkerHandle) -> Self {
        Self {
            config,
            registry: Registry::default(),
            view: ViewState::default(),
            worker,
        }
    }

    /// Drains worker events into the registry and analysis panel. Runs
    /// first thing every frame so the UI always renders current state.
    fn pump_events(&mut self, ctx: &egui::Context) {
        ctx.request_repaint();
        while let Some(event) = self.worker.try_recv() {
            match event {
                AppEvent::Registry(action) => self.registry.apply(action),
                AppEvent::Analysis(outcome) => self.view.analysis.finish(outcome),
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }
        let paths: Vec<PathBuf> = dropped.into_iter().filter_map(|file| file.path).collect();
        self.ingest_paths(paths);
    }

    /// Filters a drop or pick down to PDFs, creates a queued record per
    /// file, and hands the batch to the worker. The record exists before
    /// any network traffic happens.
    pub fn ingest_paths(&mut self, paths: Vec<PathBuf>) {
        let jobs = stage_paths(&mut self.registry, &mut self.view, paths);
        if jobs.is_empty() {
            return;
        }
        debug!(count = jobs.len(), "queueing uploads");
        self.worker.send(WorkerCommand::Upload(jobs));
    }

    pub fn request_delete(&mut self, id: String, name: String) {
        self.view.pending_delete = Some(PendingDelete { id, name });
    }

    /// Removes the record right away; the worker issues the DELETE and
    /// forces a poll, so a failed delete reappears on reconcile.
    pub fn confirm_delete(&mut self) {
        if let Some(pending) = self.view.pending_delete.take() {
            self.registry.apply(RegistryAction::Remove {
                id: pending.id.clone(),
            });
            self.worker.send(WorkerCommand::Delete { id: pending.id });
        }
    }

    pub fn cancel_delete(&mut self) {
        self.view.pending_delete = None;
    }

    pub fn submit_analysis(&mut self) {
        if !self.view.analysis.can_submit() {
            return;
        }
        let request = AnalyzeRequest {
            notes: self.view.analysis.notes.clone(),
            incident_id: self.view.analysis.incident_id.clone(),
        };
        self.view.analysis.begin();
        self.worker.send(WorkerCommand::Analyze(request));
    }
}

/// Applies one drop or pick to the registry and view: non-PDFs feed the
/// skip notice, every accepted file becomes a queued record, and the
/// matching jobs come back for the worker.
fn stage_paths(
    registry: &mut Registry,
    view: &mut ViewState,
    paths: Vec<PathBuf>,
) -> Vec<UploadJob> {
    let outcome = pdf::collect_pdfs(paths);
    view.rejected_notice = (outcome.rejected > 0).then_some(outcome.rejected);
    let mut jobs = Vec::with_capacity(outcome.accepted.len());
    for path in outcome.accepted {
        let (record, job) = record_for_path(path);
        jobs.push(job);
        registry.apply(RegistryAction::Add(record));
    }
    jobs
}

/// Builds the optimistic record and its matching upload job. Size comes
/// from filesystem metadata; an unreadable file gets size 0 here and fails
/// later in the pool with a proper message.
fn record_for_path(path: PathBuf) -> (UploadRecord, UploadJob) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    let record = UploadRecord::new_local(name.clone(), size);
    let job = UploadJob {
        record_id: record.id.clone(),
        name,
        path,
    };
    (record, job)
}

impl App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump_events(ctx);
        self.handle_dropped_files(ctx);
        self.render(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        debug!("shutting down worker");
        self.worker.shutdown();
    }
}
