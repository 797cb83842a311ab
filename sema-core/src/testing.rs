//! In-memory remote service for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::client::{BoxFuture, Endpoint, Outcome, Payload, RemoteService, ResponseBody, ResponseFormat};

/// Canned responses per endpoint, with a log of every call made.
pub(crate) struct FakeService {
    routes: HashMap<Endpoint, Outcome>,
    calls: Mutex<Vec<(Endpoint, Payload)>>,
}

impl FakeService {
    pub(crate) fn new() -> Self {
        Self {
            routes: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every endpoint succeeds with small, recognizable bodies.
    pub(crate) fn all_ok() -> Self {
        Self::new()
            .ok_json(
                Endpoint::GraphTranslate,
                json!({"grfn": {"functions": ["main"]}, "source": "foo.c"}),
            )
            .ok_json(Endpoint::ExprTreeExtract, json!([{"node": "x + 1"}]))
            .ok_text(Endpoint::SemanticBaseModel, "base model")
            .ok_text(Endpoint::SemanticQuery, "var,role\nx,counter\n")
            .ok_text(Endpoint::SemanticAnnotatedModel, "annotated model")
            .ok_text(Endpoint::SemanticAnnotator, "annotator model")
    }

    pub(crate) fn respond(mut self, endpoint: Endpoint, outcome: Outcome) -> Self {
        self.routes.insert(endpoint, outcome);
        self
    }

    pub(crate) fn ok_json(self, endpoint: Endpoint, value: Value) -> Self {
        self.respond(endpoint, Outcome::success(200, ResponseBody::Json(value)))
    }

    pub(crate) fn ok_text(self, endpoint: Endpoint, text: &str) -> Self {
        self.respond(endpoint, Outcome::success(200, ResponseBody::Text(text.to_string())))
    }

    pub(crate) fn fail(self, endpoint: Endpoint, status: u16, body: &str) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown");
        self.respond(endpoint, Outcome::failure(Some(status), reason, body))
    }

    pub(crate) fn calls(&self) -> Vec<(Endpoint, Payload)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn endpoints(&self) -> Vec<Endpoint> {
        self.calls().into_iter().map(|(e, _)| e).collect()
    }

    pub(crate) fn count(&self, endpoint: Endpoint) -> usize {
        self.calls().iter().filter(|(e, _)| *e == endpoint).count()
    }
}

impl RemoteService for FakeService {
    fn invoke<'a>(
        &'a self,
        endpoint: Endpoint,
        payload: Payload,
        _format: ResponseFormat,
    ) -> BoxFuture<'a, Outcome> {
        self.calls.lock().unwrap().push((endpoint, payload));
        let outcome = self
            .routes
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| Outcome::failure(Some(404), "Not Found", ""));
        Box::pin(async move { outcome })
    }
}
