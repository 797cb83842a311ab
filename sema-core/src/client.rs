//! Remote service client.
//!
//! Every exchange with the GrFN, expression-tree and semantic-analysis services
//! goes through [`RemoteService::invoke`]. Transport errors, non-success
//! statuses and undecodable JSON all come back as an [`Outcome`] with
//! `ok == false`; callers decide whether a failure ends the run.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::PipelineError;

/// Boxed future returned by [`RemoteService::invoke`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote endpoints the pipeline talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    GraphTranslate,
    ExprTreeExtract,
    SemanticBaseModel,
    SemanticQuery,
    SemanticAnnotatedModel,
    /// Stand-alone GrFN to SADL translation.
    SemanticAnnotator,
}

impl Endpoint {
    /// The GrFN and expression-tree services authenticate with an `apikey` header.
    pub fn uses_api_key(self) -> bool {
        matches!(self, Endpoint::GraphTranslate | Endpoint::ExprTreeExtract)
    }

    /// `Accept` header sent to the endpoint, if any.
    pub fn accept(self) -> Option<&'static str> {
        match self {
            Endpoint::GraphTranslate
            | Endpoint::ExprTreeExtract
            | Endpoint::SemanticAnnotator => None,
            _ => Some("text/plain"),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::GraphTranslate => "GrFN",
            Endpoint::ExprTreeExtract => "ExpTree",
            Endpoint::SemanticBaseModel => "Semantic analysis base model",
            Endpoint::SemanticQuery => "Semantic analysis query",
            Endpoint::SemanticAnnotatedModel => "Semantic analysis annotations model",
            Endpoint::SemanticAnnotator => "SemAnnotator",
        };
        f.write_str(name)
    }
}

/// Request body for a remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// JSON document sent as `application/json`.
    Json(Value),
    /// File contents uploaded as the multipart field `file`.
    File { file_name: String, bytes: Vec<u8> },
}

/// How the response body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Json(Value),
}

impl ResponseBody {
    /// Body as text; JSON bodies are re-serialized.
    pub fn into_text(self) -> String {
        match self {
            ResponseBody::Text(text) => text,
            ResponseBody::Json(value) => value.to_string(),
        }
    }
}

/// Result of a single remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub ok: bool,
    /// HTTP status, absent when the request never completed.
    pub status: Option<u16>,
    /// Status reason phrase or transport error description.
    pub reason: String,
    pub body: ResponseBody,
}

impl Outcome {
    pub fn success(status: u16, body: ResponseBody) -> Self {
        Self {
            ok: true,
            status: Some(status),
            reason: reason_phrase(status),
            body,
        }
    }

    pub fn failure(status: Option<u16>, reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            ok: false,
            status,
            reason: reason.into(),
            body: ResponseBody::Text(body.into()),
        }
    }

    /// The parsed JSON body of a successful call.
    pub fn into_json(self) -> Option<Value> {
        match self.body {
            ResponseBody::Json(value) if self.ok => Some(value),
            _ => None,
        }
    }

    /// Convert a failed outcome into a pipeline error for `endpoint`.
    pub fn into_error(self, endpoint: Endpoint) -> PipelineError {
        PipelineError::RemoteCall {
            endpoint,
            reason: self.reason,
            body: self.body.into_text(),
        }
    }
}

fn reason_phrase(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
        .to_string()
}

/// A remote service the pipeline can call.
///
/// Implemented by [`HttpServiceClient`] for real runs; tests substitute an
/// in-memory service.
pub trait RemoteService: Send + Sync {
    /// Perform one request/response exchange. Never retries.
    fn invoke<'a>(
        &'a self,
        endpoint: Endpoint,
        payload: Payload,
        format: ResponseFormat,
    ) -> BoxFuture<'a, Outcome>;
}

impl<T: RemoteService + ?Sized> RemoteService for &T {
    fn invoke<'a>(
        &'a self,
        endpoint: Endpoint,
        payload: Payload,
        format: ResponseFormat,
    ) -> BoxFuture<'a, Outcome> {
        (**self).invoke(endpoint, payload, format)
    }
}

/// HTTP implementation of [`RemoteService`].
#[derive(Clone)]
pub struct HttpServiceClient {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl HttpServiceClient {
    /// Create a client bound to an immutable service configuration.
    pub fn new(config: ServiceConfig) -> Self {
        if config.api_key.is_none() {
            warn!("No API key configured; GrFN and ExpTree requests will be sent without one");
        }
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    async fn send(&self, endpoint: Endpoint, payload: Payload, format: ResponseFormat) -> Outcome {
        let url = self.config.url(endpoint);
        debug!("POST {} ({})", url, endpoint);

        let mut request = self.client.post(&url);
        if endpoint.uses_api_key() {
            if let Some(key) = &self.config.api_key {
                request = request.header("apikey", key);
            }
        }
        if let Some(accept) = endpoint.accept() {
            request = request.header(ACCEPT, accept);
        }
        request = match payload {
            Payload::Json(value) => request.json(&value),
            Payload::File { file_name, bytes } => {
                let part = Part::bytes(bytes).file_name(file_name);
                request.multipart(Form::new().part("file", part))
            }
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("{} transport error: {}", endpoint, e);
                return Outcome::failure(None, e.to_string(), "");
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return Outcome::failure(
                    Some(status),
                    format!("failed to read response body: {}", e),
                    "",
                )
            }
        };

        if !(200..300).contains(&status) {
            return Outcome::failure(Some(status), reason_phrase(status), text);
        }

        match format {
            ResponseFormat::Text => Outcome::success(status, ResponseBody::Text(text)),
            ResponseFormat::Json => match serde_json::from_str(&text) {
                Ok(value) => Outcome::success(status, ResponseBody::Json(value)),
                Err(e) => Outcome::failure(Some(status), format!("invalid JSON response: {}", e), text),
            },
        }
    }
}

impl RemoteService for HttpServiceClient {
    fn invoke<'a>(
        &'a self,
        endpoint: Endpoint,
        payload: Payload,
        format: ResponseFormat,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(self.send(endpoint, payload, format))
    }
}
