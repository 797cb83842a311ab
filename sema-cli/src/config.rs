//! sema configuration loading from `.semarc.toml`.
//!
//! The file is optional. Anything it leaves out falls back to built-in
//! defaults, and command-line flags or `SEMA_*` environment variables take
//! precedence over what it sets.
//!
//! # Example Configuration
//!
//! ```toml
//! [services]
//! grfn_url = "http://hopper.sista.arizona.edu/api/v1/translate"
//! exptree_url = "http://hopper.sista.arizona.edu/api/v1/extract/expr_trees"
//! semantic_url = "http://localhost:8080"
//! api_key = "..."
//!
//! [output]
//! format = "table"
//! color = true
//! ```

use serde::Deserialize;
use std::path::Path;

use sema_core::ServiceConfig;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".semarc.toml";

/// Root configuration structure loaded from `.semarc.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct SemaConfig {
    /// Remote service locations and credentials.
    #[serde(default)]
    pub services: ServiceConfig,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Output configuration for report display.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Default output format ("table" or "json").
    #[serde(default)]
    pub format: Option<String>,

    /// Force colors on or off. Unset means auto-detect.
    #[serde(default)]
    pub color: Option<bool>,
}

impl SemaConfig {
    /// Load configuration from `.semarc.toml` in the given directory.
    ///
    /// A missing file yields defaults. A file that cannot be read or parsed
    /// is reported with a warning and also yields defaults.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILE, e);
                }
            }
        }
        Self::default()
    }

    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SemaConfig::default();
        assert_eq!(config.services, ServiceConfig::default());
        assert!(config.services.api_key.is_none());
        assert!(config.default_format().is_none());
        assert!(config.use_color().is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[services]
grfn_url = "http://grfn.local/translate"
exptree_url = "http://grfn.local/expr_trees"
semantic_url = "http://sadl.local:9090"
api_key = "secret"

[output]
format = "json"
color = false
"#;
        let config: SemaConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.services.grfn_url, "http://grfn.local/translate");
        assert_eq!(config.services.exptree_url, "http://grfn.local/expr_trees");
        assert_eq!(config.services.semantic_url, "http://sadl.local:9090");
        assert_eq!(config.services.api_key.as_deref(), Some("secret"));
        assert_eq!(config.default_format(), Some("json"));
        assert_eq!(config.use_color(), Some(false));
    }

    #[test]
    fn test_partial_services_keep_defaults() {
        let config: SemaConfig = toml::from_str(
            r#"
[services]
semantic_url = "http://sadl.local:9090"
"#,
        )
        .unwrap();

        assert_eq!(config.services.semantic_url, "http://sadl.local:9090");
        assert_eq!(config.services.grfn_url, ServiceConfig::default().grfn_url);
        assert!(config.services.api_key.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = SemaConfig::load(dir.path());
        assert_eq!(config.services, ServiceConfig::default());
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[services\nbroken").unwrap();

        let config = SemaConfig::load(dir.path());
        assert_eq!(config.services, ServiceConfig::default());
        assert!(config.default_format().is_none());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[output]\nformat = \"json\"\n",
        )
        .unwrap();

        let config = SemaConfig::load(dir.path());
        assert_eq!(config.default_format(), Some("json"));
    }
}
