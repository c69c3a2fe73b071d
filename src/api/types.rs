use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle stage the backend reports for a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Uploading,
    Processing,
    Completed,
    Error,
}

/// One entry from GET /files. `error_message` is only meaningful when
/// `status` is `Error`; `upload_date` is optional because older backends
/// omit it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub upload_date: Option<DateTime<Utc>>,
    pub status: RemoteStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
}

/// Body of POST /upload. The backend signals rejection with `success:
/// false` and a human-readable `error` even on a 200.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub notes: String,
    pub incident_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
}
