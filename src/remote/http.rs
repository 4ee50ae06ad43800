//! HTTP client for the memory server.
//!
//! - `GET    {base}/memories`       → 200, JSON array of records
//! - `POST   {base}/memories`       → 201, JSON record (multipart upload)
//! - `DELETE {base}/memories/{id}`  → 204

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;

use super::{PhotoPayload, RemoteClient};
use crate::config::ServerConfig;
use crate::error::RemoteError;
use crate::memory::codec::WireRecord;

/// Form fields sent with a new memory, in upload order.
const FORM_FIELDS: [&str; 5] = ["name", "notes", "rating", "latitude", "longitude"];
const PHOTO_FIELD: &str = "image";
const PHOTO_FILE_NAME: &str = "photo.jpg";

pub struct HttpRemoteClient {
    client: Client,
    base_url: Url,
}

impl HttpRemoteClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid server base_url: {}", config.base_url))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "server base_url cannot be a base: {base_url}"
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidResponse(format!("bad base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn fetch_all(&self) -> Result<Vec<Value>, RemoteError> {
        let url = self.endpoint(&["memories"])?;
        tracing::debug!(%url, "fetching memories");

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let response = expect_status(response, StatusCode::OK)?;

        match read_json(response).await? {
            Value::Array(records) => Ok(records),
            other => Err(RemoteError::InvalidResponse(format!(
                "expected a JSON array of memories, got {}",
                truncate(&other.to_string(), 80)
            ))),
        }
    }

    async fn add(&self, record: &WireRecord, photo: &PhotoPayload) -> Result<Value, RemoteError> {
        let url = self.endpoint(&["memories"])?;
        tracing::debug!(%url, bytes = photo.bytes.len(), "uploading memory");

        let mut form = Form::new();
        for field in FORM_FIELDS {
            form = form.text(field, form_text(record, field));
        }
        let part = Part::bytes(photo.bytes.clone())
            .file_name(PHOTO_FILE_NAME)
            .mime_str(&photo.content_type)
            .map_err(|e| RemoteError::InvalidResponse(format!("bad photo content type: {e}")))?;
        form = form.part(PHOTO_FIELD, part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_status(response, StatusCode::CREATED)?;
        read_json(response).await
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let url = self.endpoint(&["memories", id])?;
        tracing::debug!(%url, "deleting memory");

        let response = self.client.delete(url).send().await.map_err(transport_error)?;
        expect_status(response, StatusCode::NO_CONTENT)?;
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_decode() {
        RemoteError::InvalidResponse(e.to_string())
    } else {
        RemoteError::NetworkUnavailable(e.to_string())
    }
}

fn expect_status(response: Response, expected: StatusCode) -> Result<Response, RemoteError> {
    let status = response.status();
    if status == expected {
        Ok(response)
    } else {
        tracing::warn!(status = status.as_u16(), expected = expected.as_u16(), url = %response.url(), "unexpected server status");
        Err(RemoteError::ServerError(status.as_u16()))
    }
}

async fn read_json(response: Response) -> Result<Value, RemoteError> {
    let body = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
}

/// Render a wire field as multipart text: strings verbatim, numbers in JSON form.
fn form_text(record: &WireRecord, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
