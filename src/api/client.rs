//! Blocking HTTP client for the model backend.
//!
//! Every call is a single request/response. Failures are classified into
//! [`ClientError`] and handed back to the caller for display; nothing is retried.

use std::time::Duration;

use reqwest::blocking::{Client, Response, multipart};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::domain::{FeatureValue, ModelId, ModelMetadata, PredictRequest};

/// Response body kept for display: JSON when it parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Json(serde_json::Value),
    Text(String),
}

impl ApiBody {
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text),
        }
    }

    /// Pretty-printed form for terminals.
    pub fn pretty(&self) -> String {
        match self {
            Self::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Self::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach the API: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("API returned status {status}")]
    Status { status: u16, body: ApiBody },

    #[error("unexpected response from the API: {0}")]
    Malformed(String),

    #[error("could not build request: {0}")]
    Request(String),
}

/// Where an upload takes its metadata from.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataPayload {
    /// Raw contents of a `.meta` / `.json` file, sent as `meta_file`.
    File(Vec<u8>),
    /// Metadata entered by hand, sent as `description` + `input_features_json`.
    Inline(ModelMetadata),
}

/// A validated upload, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub model_name: String,
    pub model_bytes: Vec<u8>,
    pub metadata: MetadataPayload,
}

pub struct ModelApiClient {
    client: Client,
    base_url: Url,
}

impl ModelApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        // Uploads of large artifacts may take a while; the backend decides when to give up.
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| ClientError::Request(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /models`. An empty list means nothing is registered yet.
    pub fn list_models(&self) -> Result<Vec<ModelId>, ClientError> {
        let url = self.endpoint(&["models"])?;
        debug!(%url, "listing models");
        let resp = self.client.get(url).send().map_err(ClientError::Connection)?;
        read_json(expect_status(resp, StatusCode::OK)?)
    }

    /// `GET /models/{id}`.
    pub fn get_metadata(&self, id: &str) -> Result<ModelMetadata, ClientError> {
        let url = self.endpoint(&["models", id])?;
        debug!(%url, "fetching model metadata");
        let resp = self.client.get(url).send().map_err(ClientError::Connection)?;
        read_json(expect_status(resp, StatusCode::OK)?)
    }

    /// `POST /predict/{id}` with `{"features": [...]}`.
    pub fn predict(
        &self,
        id: &str,
        features: &[FeatureValue],
    ) -> Result<serde_json::Value, ClientError> {
        let url = self.endpoint(&["predict", id])?;
        debug!(%url, n_features = features.len(), "requesting prediction");
        let resp = self
            .client
            .post(url)
            .json(&PredictRequest { features })
            .send()
            .map_err(ClientError::Connection)?;
        read_json(expect_status(resp, StatusCode::OK)?)
    }

    /// Multipart `POST /upload`. Only `201 Created` counts as success.
    pub fn upload(&self, req: &UploadRequest) -> Result<ApiBody, ClientError> {
        let url = self.endpoint(&["upload"])?;
        let form = build_upload_form(req)?;
        debug!(%url, model = %req.model_name, bytes = req.model_bytes.len(), "uploading model");
        let resp = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .map_err(ClientError::Connection)?;
        let resp = expect_status(resp, StatusCode::CREATED)?;
        let text = resp.text().map_err(ClientError::Connection)?;
        Ok(ApiBody::from_text(text))
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Request(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn build_upload_form(req: &UploadRequest) -> Result<multipart::Form, ClientError> {
    let model_part = multipart::Part::bytes(req.model_bytes.clone())
        .file_name(format!("{}.onnx", req.model_name))
        .mime_str("application/octet-stream")
        .map_err(|e| ClientError::Request(e.to_string()))?;

    let mut form = multipart::Form::new()
        .text("model_name", req.model_name.clone())
        .part("model_file", model_part);

    match &req.metadata {
        MetadataPayload::File(bytes) => {
            let meta_part = multipart::Part::bytes(bytes.clone())
                .file_name(format!("{}.meta", req.model_name))
                .mime_str("application/json")
                .map_err(|e| ClientError::Request(e.to_string()))?;
            form = form.part("meta_file", meta_part);
        }
        MetadataPayload::Inline(meta) => {
            let features = serde_json::to_string(&meta.input_features)
                .map_err(|e| ClientError::Request(format!("could not encode features: {e}")))?;
            form = form
                .text("description", meta.description.clone())
                .text("input_features_json", features);
        }
    }

    Ok(form)
}

fn expect_status(resp: Response, expected: StatusCode) -> Result<Response, ClientError> {
    let status = resp.status();
    if status == expected {
        return Ok(resp);
    }
    let url = resp.url().clone();
    warn!(%url, status = status.as_u16(), "API returned failure status");
    Err(ClientError::Status {
        status: status.as_u16(),
        body: failure_body(resp.text()),
    })
}

/// Body of a failure response; a body that cannot be read is noted, not dropped.
fn failure_body<E: std::fmt::Display>(read: Result<String, E>) -> ApiBody {
    match read {
        Ok(text) => ApiBody::from_text(text),
        Err(e) => {
            warn!(error = %e, "could not read failure response body");
            ApiBody::Text(format!("(response body could not be read: {e})"))
        }
    }
}

fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let text = resp.text().map_err(ClientError::Connection)?;
    serde_json::from_str(&text).map_err(|e| ClientError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ModelApiClient {
        ModelApiClient::new(&ApiConfig::new(base).unwrap()).unwrap()
    }

    #[test]
    fn endpoint_keeps_prefix_and_encodes_ids() {
        let c = client("http://localhost:9000/api/");
        let url = c.endpoint(&["models", "sales v1/beta"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/api/models/sales%20v1%2Fbeta");
    }

    #[test]
    fn endpoint_without_trailing_slash() {
        let c = client("http://localhost:9000");
        let url = c.endpoint(&["upload"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/upload");
    }

    #[test]
    fn unreadable_failure_body_is_noted() {
        let body = failure_body::<String>(Err("connection reset".into()));
        assert_eq!(
            body,
            ApiBody::Text("(response body could not be read: connection reset)".into())
        );
        assert_eq!(failure_body::<String>(Ok("{\"detail\":\"x\"}".into())).pretty(), "{\n  \"detail\": \"x\"\n}");
    }

    #[test]
    fn non_json_bodies_are_kept_as_text() {
        let body = ApiBody::from_text("Internal Server Error".into());
        assert_eq!(body, ApiBody::Text("Internal Server Error".into()));
        assert_eq!(body.pretty(), "Internal Server Error");
    }

    #[test]
    fn json_bodies_pretty_print() {
        let body = ApiBody::from_text(r#"{"detail":"bad"}"#.into());
        assert!(body.pretty().contains("\"detail\": \"bad\""));
    }
}
