//! Input classification by file name.
//!
//! Runs before any file is opened: a bad invocation never reaches the network
//! or the filesystem.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Stage suffixes stripped from JSON stems so reruns target the same artifact names.
const STAGE_SUFFIXES: &[&str] = &["_combined", "_GrFN"];

/// Recognized input file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// C translation unit (`.c`).
    Source,
    /// Pre-computed JSON artifact (`.json`).
    Json,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("c") => Ok(InputKind::Source),
            Some("json") => Ok(InputKind::Json),
            _ => Err(PipelineError::InputType {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// A classified pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineInput {
    /// Full run from a C source file.
    Source { path: PathBuf },
    /// A single pre-computed JSON artifact (graph, envelope or combined).
    Artifact { path: PathBuf },
    /// Separate graph and expression-tree documents.
    Pair { graph: PathBuf, expr_trees: PathBuf },
}

impl PipelineInput {
    /// Classify one or two input paths.
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self> {
        match paths {
            [] => Err(PipelineError::Usage {
                message: "an input file is required".to_string(),
            }),
            [path] => match InputKind::from_path(path)? {
                InputKind::Source => Ok(PipelineInput::Source { path: path.clone() }),
                InputKind::Json => Ok(PipelineInput::Artifact { path: path.clone() }),
            },
            [graph, expr_trees] => {
                for path in [graph, expr_trees] {
                    if InputKind::from_path(path)? != InputKind::Json {
                        return Err(PipelineError::Usage {
                            message: format!(
                                "two inputs must both be .json files (graph, expression trees), got '{}'",
                                path.display()
                            ),
                        });
                    }
                }
                Ok(PipelineInput::Pair {
                    graph: graph.clone(),
                    expr_trees: expr_trees.clone(),
                })
            }
            _ => Err(PipelineError::Usage {
                message: format!("expected one or two input files, got {}", paths.len()),
            }),
        }
    }

    /// The file whose name determines artifact names.
    pub fn primary_path(&self) -> &Path {
        match self {
            PipelineInput::Source { path } | PipelineInput::Artifact { path } => path,
            PipelineInput::Pair { graph, .. } => graph,
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            PipelineInput::Source { path } | PipelineInput::Artifact { path } => vec![path.clone()],
            PipelineInput::Pair { graph, expr_trees } => vec![graph.clone(), expr_trees.clone()],
        }
    }

    /// Base name for this run's artifacts.
    pub fn base_name(&self) -> PathBuf {
        derive_base(self.primary_path())
    }
}

/// Strip the recognized extension (and, for JSON, a trailing stage suffix).
///
/// `dir/foo.c`, `dir/foo.json`, `dir/foo_combined.json` and
/// `dir/foo_GrFN.json` all map to `dir/foo`.
pub fn derive_base(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = match InputKind::from_path(path) {
        Ok(InputKind::Json) => STAGE_SUFFIXES
            .iter()
            .find_map(|suffix| stem.strip_suffix(suffix).filter(|rest| !rest.is_empty()))
            .map(str::to_string)
            .unwrap_or(stem),
        _ => stem,
    };

    path.with_file_name(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_single_source() {
        let input = PipelineInput::from_paths(&paths(&["foo.c"])).unwrap();
        assert_eq!(
            input,
            PipelineInput::Source {
                path: PathBuf::from("foo.c")
            }
        );
        assert_eq!(input.base_name(), PathBuf::from("foo"));
    }

    #[test]
    fn test_single_json() {
        let input = PipelineInput::from_paths(&paths(&["out/foo.json"])).unwrap();
        assert!(matches!(input, PipelineInput::Artifact { .. }));
        assert_eq!(input.base_name(), PathBuf::from("out/foo"));
    }

    #[test]
    fn test_pair() {
        let input = PipelineInput::from_paths(&paths(&["graph.json", "expr.json"])).unwrap();
        assert_eq!(input.primary_path(), Path::new("graph.json"));
        assert_eq!(input.paths().len(), 2);
        assert_eq!(input.base_name(), PathBuf::from("graph"));
    }

    #[test]
    fn test_unknown_extension_is_input_type_error() {
        let err = PipelineInput::from_paths(&paths(&["bar.txt"])).unwrap_err();
        assert!(matches!(err, PipelineError::InputType { .. }));
        assert!(err.is_usage());

        let err = PipelineInput::from_paths(&paths(&["Makefile"])).unwrap_err();
        assert!(matches!(err, PipelineError::InputType { .. }));
    }

    #[test]
    fn test_pair_requires_json() {
        let err = PipelineInput::from_paths(&paths(&["foo.c", "expr.json"])).unwrap_err();
        assert!(matches!(err, PipelineError::Usage { .. }));
    }

    #[test]
    fn test_wrong_arity() {
        assert!(PipelineInput::from_paths(&[]).unwrap_err().is_usage());
        let err = PipelineInput::from_paths(&paths(&["a.json", "b.json", "c.json"])).unwrap_err();
        assert!(matches!(err, PipelineError::Usage { .. }));
    }

    #[test]
    fn test_derive_base_strips_stage_suffixes() {
        assert_eq!(derive_base(Path::new("foo_combined.json")), PathBuf::from("foo"));
        assert_eq!(derive_base(Path::new("src/foo_GrFN.json")), PathBuf::from("src/foo"));
        assert_eq!(derive_base(Path::new("_combined.json")), PathBuf::from("_combined"));
        // Suffixes only apply to JSON inputs.
        assert_eq!(derive_base(Path::new("foo_GrFN.c")), PathBuf::from("foo_GrFN"));
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(InputKind::from_path(Path::new("X.JSON")).unwrap(), InputKind::Json);
    }
}
