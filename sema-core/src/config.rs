//! Remote service configuration.
//!
//! A `ServiceConfig` is built once (from defaults, a config file, or flags) and
//! handed to the HTTP client at construction. Nothing reads endpoint locations
//! from process-wide state.

use serde::Deserialize;

use crate::client::Endpoint;

/// Default GrFN translation endpoint.
pub const DEFAULT_GRFN_URL: &str = "http://hopper.sista.arizona.edu/api/v1/translate";

/// Default expression-tree extraction endpoint.
pub const DEFAULT_EXPTREE_URL: &str = "http://hopper.sista.arizona.edu/api/v1/extract/expr_trees";

/// Default base URL of the semantic-analysis service.
pub const DEFAULT_SEMANTIC_URL: &str = "http://localhost:8080";

/// Endpoint locations and credentials for every remote service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Full URL of the GrFN translate endpoint.
    #[serde(default = "default_grfn_url")]
    pub grfn_url: String,

    /// Full URL of the expression-tree extraction endpoint.
    #[serde(default = "default_exptree_url")]
    pub exptree_url: String,

    /// Base URL of the semantic-analysis service (scheme, host and port).
    ///
    /// The semantic-analysis and annotator endpoints are derived from it.
    #[serde(default = "default_semantic_url")]
    pub semantic_url: String,

    /// API key sent in the `apikey` header to the GrFN and expression-tree services.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_grfn_url() -> String {
    DEFAULT_GRFN_URL.to_string()
}

fn default_exptree_url() -> String {
    DEFAULT_EXPTREE_URL.to_string()
}

fn default_semantic_url() -> String {
    DEFAULT_SEMANTIC_URL.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            grfn_url: default_grfn_url(),
            exptree_url: default_exptree_url(),
            semantic_url: default_semantic_url(),
            api_key: None,
        }
    }
}

impl ServiceConfig {
    /// Resolve the URL for an endpoint.
    pub fn url(&self, endpoint: Endpoint) -> String {
        let semantic = self.semantic_url.trim_end_matches('/');
        match endpoint {
            Endpoint::GraphTranslate => self.grfn_url.clone(),
            Endpoint::ExprTreeExtract => self.exptree_url.clone(),
            Endpoint::SemanticBaseModel => {
                format!("{}/SemanticAnalysis/generateBaseModel", semantic)
            }
            Endpoint::SemanticQuery => format!("{}/SemanticAnalysis/queryService", semantic),
            Endpoint::SemanticAnnotatedModel => {
                format!("{}/SemanticAnalysis/generateAnnotationsModel", semantic)
            }
            Endpoint::SemanticAnnotator => format!("{}/SemanticAnnotator/translate", semantic),
        }
    }

    /// Builder: set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builder: point the semantic endpoints at another host.
    pub fn with_semantic_url(mut self, url: impl Into<String>) -> Self {
        self.semantic_url = url.into();
        self
    }
}
