use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::api::error::ApiError;
use crate::api::types::{AnalyzeRequest, AnalyzeResponse, RemoteFile, UploadResponse};

/// Upload side of the backend, as seen by the upload pool. Tests swap in
/// scripted transports; production uses [`ApiClient`].
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Returns the server-assigned id when the backend provides one.
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<Option<String>, ApiError>;
}

/// Listing side of the backend, as seen by the poller.
#[async_trait]
pub trait FileLister: Send + Sync {
    async fn list_files(&self) -> Result<Vec<RemoteFile>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_files(&self) -> Result<Vec<RemoteFile>, ApiError> {
        let resp = self.http.get(self.url("/files")).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Multipart POST of one document under the `file` field. A 2xx with
    /// `success: false` surfaces as [`ApiError::Rejected`] carrying the
    /// backend's message.
    pub async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<Option<String>, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let resp = self.http.post(self.url("/upload")).multipart(form).send().await?;
        let resp = check_status(resp).await?;
        let body: UploadResponse = resp.json().await?;
        if body.success {
            Ok(body.file_id)
        } else {
            let message = body
                .error
                .or(body.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "upload failed".to_string());
            Err(ApiError::Rejected(message))
        }
    }

    pub async fn delete_file(&self, id: &str) -> Result<(), ApiError> {
        let resp = self.http.delete(self.url(&format!("/files/{id}"))).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, ApiError> {
        let resp = self
            .http
            .post(self.url("/analyze"))
            .json(request)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Single-record variant of the listing; the backend exposes it but the
    /// dashboard reconciles through `list_files` instead.
    #[allow(dead_code)]
    pub async fn file_status(&self, id: &str) -> Result<RemoteFile, ApiError> {
        let resp = self.http.get(self.url(&format!("/status/{id}"))).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl UploadTransport for ApiClient {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<Option<String>, ApiError> {
        ApiClient::upload(self, name, bytes).await
    }
}

#[async_trait]
impl FileLister for ApiClient {
    async fn list_files(&self) -> Result<Vec<RemoteFile>, ApiError> {
        ApiClient::list_files(self).await
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ApiError::Server {
        status: status.as_u16(),
        message: server_error_message(status.as_u16(), &body),
    })
}

/// Pulls the human-readable message out of an error body, preferring the
/// backend's `error` field, then `message`, then a status fallback.
fn server_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.trim().is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    format!("backend returned status {status}")
}
