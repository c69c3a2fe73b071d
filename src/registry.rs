//! In-memory store of every document the dashboard knows about.
//!
//! All mutation goes through [`Registry::apply`] so each transition is a
//! named action, whether it came from the UI thread or the worker. Server
//! snapshots land as a single `Reconcile` action that merges by id instead
//! of clobbering records whose uploads the server has not seen yet.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::api::types::{RemoteFile, RemoteStatus};

/// Where a document is in its life. `Error` carries the message shown
/// next to the record, so a record is in error exactly when it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// Accepted locally, waiting for an upload slot.
    Queued,
    /// The multipart POST is in flight.
    Uploading,
    /// The backend has the bytes and is embedding them.
    Processing,
    Completed,
    Error(String),
}

impl UploadStatus {
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            UploadStatus::Queued | UploadStatus::Uploading | UploadStatus::Processing
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Error(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            UploadStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UploadStatus::Queued => "queued",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Processing => "processing",
            UploadStatus::Completed => "completed",
            UploadStatus::Error(_) => "error",
        }
    }

    fn from_remote(status: RemoteStatus, message: Option<&str>) -> Self {
        match status {
            RemoteStatus::Uploading => UploadStatus::Uploading,
            RemoteStatus::Processing => UploadStatus::Processing,
            RemoteStatus::Completed => UploadStatus::Completed,
            RemoteStatus::Error => UploadStatus::Error(
                message
                    .filter(|m| !m.trim().is_empty())
                    .map(str::to_owned)
                    .unwrap_or_else(|| "processing failed".to_string()),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub upload_date: DateTime<Utc>,
    pub status: UploadStatus,
    /// Server-generated snippet, shown in the table once ingestion ran.
    pub preview: Option<String>,
}

impl UploadRecord {
    /// A freshly dropped document. Carries a temporary id until the backend
    /// assigns one at upload time.
    pub fn new_local(name: impl Into<String>, size: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            size,
            upload_date: Utc::now(),
            status: UploadStatus::Queued,
            preview: None,
        }
    }

    fn from_remote(remote: &RemoteFile) -> Self {
        Self {
            id: remote.id.clone(),
            name: remote.name.clone(),
            size: remote.size,
            upload_date: remote.upload_date.unwrap_or_else(Utc::now),
            status: UploadStatus::from_remote(remote.status, remote.error_message.as_deref()),
            preview: remote.preview.clone(),
        }
    }

    /// Server truth for a record we already track. Terminal statuses only
    /// move when the snapshot is itself terminal; a stale snapshot must not
    /// walk a finished record backwards.
    fn merged_with(&self, remote: &RemoteFile) -> Self {
        let incoming = UploadStatus::from_remote(remote.status, remote.error_message.as_deref());
        let status = if self.status.is_terminal() && incoming.is_pending() {
            self.status.clone()
        } else {
            incoming
        };
        Self {
            id: self.id.clone(),
            name: remote.name.clone(),
            size: remote.size,
            upload_date: remote.upload_date.unwrap_or(self.upload_date),
            status,
            preview: remote.preview.clone().or_else(|| self.preview.clone()),
        }
    }
}

/// Counts backing the dashboard stat cards. `processing` covers everything
/// still moving: queued, uploading and processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordStats {
    pub total: usize,
    pub completed: usize,
    pub processing: usize,
    pub errors: usize,
}

/// Every way the registry can change.
#[derive(Debug, Clone)]
pub enum RegistryAction {
    /// Optimistic insert at drop time, before any network traffic.
    Add(UploadRecord),
    /// An upload slot opened and the POST is starting.
    MarkUploading { id: String },
    /// The upload was accepted; adopt the server id when one is assigned.
    Promote { id: String, server_id: Option<String> },
    /// The upload failed client-side or was rejected by the backend.
    Fail { id: String, message: String },
    /// Optimistic removal when the user confirms a delete.
    Remove { id: String },
    /// A full GET /files snapshot to merge in.
    Reconcile(Vec<RemoteFile>),
}

#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<UploadRecord>,
}

impl Registry {
    pub fn apply(&mut self, action: RegistryAction) {
        match action {
            RegistryAction::Add(record) => {
                if self.records.iter().any(|r| r.id == record.id) {
                    warn!(id = %record.id, "ignoring add with duplicate id");
                    return;
                }
                self.records.push(record);
            }
            RegistryAction::MarkUploading { id } => {
                if let Some(record) = self.get_mut(&id) {
                    if record.status == UploadStatus::Queued {
                        record.status = UploadStatus::Uploading;
                    }
                }
            }
            RegistryAction::Promote { id, server_id } => self.promote(&id, server_id),
            RegistryAction::Fail { id, message } => {
                if let Some(record) = self.get_mut(&id) {
                    if !record.status.is_terminal() {
                        record.status = UploadStatus::Error(message);
                    }
                }
            }
            RegistryAction::Remove { id } => self.records.retain(|r| r.id != id),
            RegistryAction::Reconcile(snapshot) => self.reconcile(&snapshot),
        }
    }

    pub fn records(&self) -> &[UploadRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&UploadRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> RecordStats {
        let mut stats = RecordStats {
            total: self.records.len(),
            ..RecordStats::default()
        };
        for record in &self.records {
            match record.status {
                UploadStatus::Completed => stats.completed += 1,
                UploadStatus::Error(_) => stats.errors += 1,
                _ => stats.processing += 1,
            }
        }
        stats
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut UploadRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    fn promote(&mut self, id: &str, server_id: Option<String>) {
        // If a poll already brought in the server's copy, the temporary
        // record is redundant rather than promotable.
        if let Some(new_id) = &server_id {
            if new_id != id && self.records.iter().any(|r| &r.id == new_id) {
                self.records.retain(|r| r.id != id);
                return;
            }
        }
        if let Some(record) = self.get_mut(id) {
            if record.status.is_terminal() {
                return;
            }
            if let Some(new_id) = server_id {
                record.id = new_id;
            }
            record.status = UploadStatus::Processing;
        }
    }

    /// Merge a server snapshot by id. Server order wins for known files;
    /// local records the server has not acknowledged yet (still queued or
    /// uploading) survive at the end of the list. Anything else missing
    /// from the snapshot was deleted server-side and drops out.
    fn reconcile(&mut self, snapshot: &[RemoteFile]) {
        let mut merged: Vec<UploadRecord> = Vec::with_capacity(snapshot.len());
        for remote in snapshot {
            match self.records.iter().find(|r| r.id == remote.id) {
                Some(local) => merged.push(local.merged_with(remote)),
                None => merged.push(UploadRecord::from_remote(remote)),
            }
        }
        for local in &self.records {
            let unacknowledged = matches!(
                local.status,
                UploadStatus::Queued | UploadStatus::Uploading
            );
            if unacknowledged && !snapshot.iter().any(|r| r.id == local.id) {
                merged.push(local.clone());
            }
        }
        self.records = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: &str, status: RemoteStatus) -> RemoteFile {
        RemoteFile {
            id: id.to_string(),
            name: format!("{id}.pdf"),
            size: 1024,
            upload_date: None,
            status,
            error_message: None,
            preview: None,
        }
    }

    fn remote_error(id: &str, message: &str) -> RemoteFile {
        RemoteFile {
            error_message: Some(message.to_string()),
            ..remote(id, RemoteStatus::Error)
        }
    }

    fn add_local(registry: &mut Registry, name: &str) -> String {
        let record = UploadRecord::new_local(name, 2048);
        let id = record.id.clone();
        registry.apply(RegistryAction::Add(record));
        id
    }

    #[test]
    fn dropped_batch_yields_one_record_per_file() {
        let mut registry = Registry::default();
        let ids: Vec<String> = (0..4)
            .map(|i| add_local(&mut registry, &format!("doc-{i}.pdf")))
            .collect();

        assert_eq!(registry.len(), 4);
        for id in &ids {
            assert_eq!(registry.get(id).unwrap().status, UploadStatus::Queued);
        }
        // ids are unique
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
    }

    #[test]
    fn records_progress_independently() {
        let mut registry = Registry::default();
        let a = add_local(&mut registry, "a.pdf");
        let b = add_local(&mut registry, "b.pdf");
        let c = add_local(&mut registry, "c.pdf");

        registry.apply(RegistryAction::MarkUploading { id: a.clone() });
        registry.apply(RegistryAction::Promote { id: a.clone(), server_id: Some("srv-a".into()) });
        registry.apply(RegistryAction::MarkUploading { id: b.clone() });
        registry.apply(RegistryAction::Fail { id: b.clone(), message: "disk full".into() });

        assert_eq!(registry.get("srv-a").unwrap().status, UploadStatus::Processing);
        assert_eq!(
            registry.get(&b).unwrap().status,
            UploadStatus::Error("disk full".into())
        );
        assert_eq!(registry.get(&c).unwrap().status, UploadStatus::Queued);
    }

    #[test]
    fn failed_upload_keeps_its_message_and_never_completes() {
        let mut registry = Registry::default();
        let id = add_local(&mut registry, "broken.pdf");
        registry.apply(RegistryAction::MarkUploading { id: id.clone() });
        registry.apply(RegistryAction::Fail { id: id.clone(), message: "disk full".into() });

        let message = registry.get(&id).unwrap().status.error_message().unwrap();
        assert_eq!(message, "disk full");
        assert!(!message.is_empty());

        // a late acceptance must not resurrect the record
        registry.apply(RegistryAction::Promote { id: id.clone(), server_id: Some("srv-x".into()) });
        assert_eq!(registry.get(&id).unwrap().status.label(), "error");
        assert!(registry.get("srv-x").is_none());
    }

    #[test]
    fn promote_swaps_to_server_id_exactly_once() {
        let mut registry = Registry::default();
        let temp = add_local(&mut registry, "swap.pdf");
        registry.apply(RegistryAction::MarkUploading { id: temp.clone() });
        registry.apply(RegistryAction::Promote { id: temp.clone(), server_id: Some("srv-9".into()) });

        assert!(registry.get(&temp).is_none());
        assert_eq!(registry.get("srv-9").unwrap().status, UploadStatus::Processing);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn promote_without_server_id_keeps_the_temporary_id() {
        let mut registry = Registry::default();
        let temp = add_local(&mut registry, "keep.pdf");
        registry.apply(RegistryAction::MarkUploading { id: temp.clone() });
        registry.apply(RegistryAction::Promote { id: temp.clone(), server_id: None });

        assert_eq!(registry.get(&temp).unwrap().status, UploadStatus::Processing);
    }

    #[test]
    fn promote_drops_temp_record_when_poll_won_the_race() {
        let mut registry = Registry::default();
        let temp = add_local(&mut registry, "race.pdf");
        registry.apply(RegistryAction::MarkUploading { id: temp.clone() });
        // a poll lands first and already carries the server's copy
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-5", RemoteStatus::Processing)]));
        registry.apply(RegistryAction::Promote { id: temp.clone(), server_id: Some("srv-5".into()) });

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&temp).is_none());
        assert_eq!(registry.get("srv-5").unwrap().status, UploadStatus::Processing);
    }

    #[test]
    fn mark_uploading_only_moves_queued_records() {
        let mut registry = Registry::default();
        let id = add_local(&mut registry, "twice.pdf");
        registry.apply(RegistryAction::MarkUploading { id: id.clone() });
        registry.apply(RegistryAction::Promote { id: id.clone(), server_id: None });
        registry.apply(RegistryAction::MarkUploading { id: id.clone() });

        assert_eq!(registry.get(&id).unwrap().status, UploadStatus::Processing);
    }

    #[test]
    fn actions_on_unknown_ids_are_noops() {
        let mut registry = Registry::default();
        add_local(&mut registry, "only.pdf");

        registry.apply(RegistryAction::MarkUploading { id: "ghost".into() });
        registry.apply(RegistryAction::Promote { id: "ghost".into(), server_id: Some("srv".into()) });
        registry.apply(RegistryAction::Fail { id: "ghost".into(), message: "boom".into() });
        registry.apply(RegistryAction::Remove { id: "ghost".into() });

        assert_eq!(registry.len(), 1);
        assert!(registry.get("srv").is_none());
    }

    #[test]
    fn stats_partition_the_records() {
        let mut registry = Registry::default();
        let a = add_local(&mut registry, "a.pdf");
        let b = add_local(&mut registry, "b.pdf");
        add_local(&mut registry, "c.pdf");

        registry.apply(RegistryAction::MarkUploading { id: a.clone() });
        registry.apply(RegistryAction::Fail { id: b, message: "nope".into() });
        registry.apply(RegistryAction::Reconcile(vec![
            remote("srv-1", RemoteStatus::Completed),
            remote("srv-2", RemoteStatus::Processing),
        ]));

        // srv-1 completed, srv-2 processing, a uploading, c queued; b was
        // terminal-error and not in the snapshot, so reconcile dropped it
        let stats = registry.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.processing, 3);
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.completed + stats.processing + stats.errors, stats.total);
    }

    #[test]
    fn reconcile_adopts_server_truth_for_known_ids() {
        let mut registry = Registry::default();
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-1", RemoteStatus::Processing)]));
        assert_eq!(registry.get("srv-1").unwrap().status, UploadStatus::Processing);

        registry.apply(RegistryAction::Reconcile(vec![remote("srv-1", RemoteStatus::Completed)]));
        assert_eq!(registry.get("srv-1").unwrap().status, UploadStatus::Completed);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reconcile_keeps_unacknowledged_local_records() {
        let mut registry = Registry::default();
        let queued = add_local(&mut registry, "queued.pdf");
        let uploading = add_local(&mut registry, "uploading.pdf");
        registry.apply(RegistryAction::MarkUploading { id: uploading.clone() });

        registry.apply(RegistryAction::Reconcile(Vec::new()));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&queued).unwrap().status, UploadStatus::Queued);
        assert_eq!(registry.get(&uploading).unwrap().status, UploadStatus::Uploading);
    }

    #[test]
    fn reconcile_drops_acknowledged_records_missing_from_snapshot() {
        let mut registry = Registry::default();
        registry.apply(RegistryAction::Reconcile(vec![
            remote("srv-1", RemoteStatus::Completed),
            remote("srv-2", RemoteStatus::Processing),
        ]));
        assert_eq!(registry.len(), 2);

        // srv-1 was deleted on the server between polls
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-2", RemoteStatus::Processing)]));
        assert!(registry.get("srv-1").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn delete_is_visible_within_one_poll_and_failed_delete_comes_back() {
        let mut registry = Registry::default();
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-1", RemoteStatus::Completed)]));

        // optimistic removal on confirm
        registry.apply(RegistryAction::Remove { id: "srv-1".into() });
        assert!(registry.is_empty());

        // the DELETE failed; the next snapshot still carries the file
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-1", RemoteStatus::Completed)]));
        assert_eq!(registry.get("srv-1").unwrap().status, UploadStatus::Completed);

        // the DELETE worked; the snapshot no longer carries it
        registry.apply(RegistryAction::Remove { id: "srv-1".into() });
        registry.apply(RegistryAction::Reconcile(Vec::new()));
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_snapshot_cannot_regress_a_completed_record() {
        let mut registry = Registry::default();
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-1", RemoteStatus::Completed)]));
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-1", RemoteStatus::Processing)]));

        assert_eq!(registry.get("srv-1").unwrap().status, UploadStatus::Completed);
    }

    #[test]
    fn terminal_snapshot_overrides_terminal_local() {
        let mut registry = Registry::default();
        registry.apply(RegistryAction::Reconcile(vec![remote_error("srv-1", "bad header")]));
        assert_eq!(registry.get("srv-1").unwrap().status.label(), "error");

        // the backend finished a retry; its terminal truth wins
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-1", RemoteStatus::Completed)]));
        assert_eq!(registry.get("srv-1").unwrap().status, UploadStatus::Completed);
    }

    #[test]
    fn snapshot_error_message_reaches_the_record() {
        let mut registry = Registry::default();
        registry.apply(RegistryAction::Reconcile(vec![remote_error("srv-1", "unsupported encoding")]));
        assert_eq!(
            registry.get("srv-1").unwrap().status.error_message(),
            Some("unsupported encoding")
        );

        // error status with no message still yields a non-empty message
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-2", RemoteStatus::Error)]));
        let fallback = registry.get("srv-2").unwrap().status.error_message().unwrap();
        assert!(!fallback.is_empty());
    }

    #[test]
    fn reconcile_keeps_local_upload_date_when_snapshot_omits_it() {
        let mut registry = Registry::default();
        let id = add_local(&mut registry, "dated.pdf");
        let original_date = registry.get(&id).unwrap().upload_date;

        registry.apply(RegistryAction::MarkUploading { id: id.clone() });
        registry.apply(RegistryAction::Promote { id: id.clone(), server_id: Some("srv-1".into()) });
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-1", RemoteStatus::Processing)]));

        assert_eq!(registry.get("srv-1").unwrap().upload_date, original_date);

        let mut dated = remote("srv-1", RemoteStatus::Completed);
        let server_date = "2024-01-15T10:30:00Z".parse().unwrap();
        dated.upload_date = Some(server_date);
        registry.apply(RegistryAction::Reconcile(vec![dated]));
        assert_eq!(registry.get("srv-1").unwrap().upload_date, server_date);
    }

    #[test]
    fn delete_during_upload_stays_deleted_until_server_reports_it() {
        let mut registry = Registry::default();
        let id = add_local(&mut registry, "gone.pdf");
        registry.apply(RegistryAction::MarkUploading { id: id.clone() });
        registry.apply(RegistryAction::Remove { id: id.clone() });

        // the in-flight upload finishes against a record that no longer exists
        registry.apply(RegistryAction::Promote { id: id.clone(), server_id: Some("srv-1".into()) });
        assert!(registry.is_empty());

        // the server ends up owning the file; the next poll brings it back
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-1", RemoteStatus::Processing)]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn preview_text_survives_reconcile() {
        let mut registry = Registry::default();
        let mut with_preview = remote("srv-1", RemoteStatus::Completed);
        with_preview.preview = Some("Q4 swing telemetry summary...".to_string());
        registry.apply(RegistryAction::Reconcile(vec![with_preview]));
        assert_eq!(
            registry.get("srv-1").unwrap().preview.as_deref(),
            Some("Q4 swing telemetry summary...")
        );

        // a later snapshot without the snippet keeps the known one
        registry.apply(RegistryAction::Reconcile(vec![remote("srv-1", RemoteStatus::Completed)]));
        assert_eq!(
            registry.get("srv-1").unwrap().preview.as_deref(),
            Some("Q4 swing telemetry summary...")
        );
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut registry = Registry::default();
        let record = UploadRecord::new_local("dup.pdf", 1);
        registry.apply(RegistryAction::Add(record.clone()));
        registry.apply(RegistryAction::Add(record));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reconcile_orders_server_records_first() {
        let mut registry = Registry::default();
        let local = add_local(&mut registry, "local.pdf");
        registry.apply(RegistryAction::Reconcile(vec![
            remote("srv-1", RemoteStatus::Completed),
            remote("srv-2", RemoteStatus::Processing),
        ]));

        let ids: Vec<&str> = registry.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["srv-1", "srv-2", local.as_str()]);
    }
}
