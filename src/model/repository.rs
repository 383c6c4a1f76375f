//! The top-level `Repository` document and its best-effort error log.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::module::Module;
use super::node::Node;

/// The constant `ASTVersion` every emitted document carries.
pub const AST_VERSION: &str = "v0.1.3";

/// A non-fatal failure recorded during collection: unreadable file, missing
/// definition, duplicate identity, and the like. Never causes collection to
/// abort; accumulated here so a consumer can audit what was skipped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionError {
    #[serde(rename = "Stage")]
    pub stage: String,
    #[serde(rename = "Path", skip_serializing_if = "Option::is_none", default)]
    pub path: Option<String>,
    #[serde(rename = "Message")]
    pub message: String,
}

impl CollectionError {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            path: None,
            message: message.into(),
        }
    }

    pub fn at(stage: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            path: Some(path.into()),
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Repository {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "ASTVersion")]
    pub ast_version: String,
    #[serde(rename = "ToolVersion")]
    pub tool_version: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Modules", default)]
    pub modules: HashMap<String, Module>,
    #[serde(rename = "Graph", default)]
    pub graph: HashMap<String, Node>,
    /// A best-effort diagnostic log so downstream consumers can audit what
    /// was skipped without failing the whole run.
    #[serde(rename = "errors", default)]
    pub errors: Vec<CollectionError>,
}

impl Repository {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ast_version: AST_VERSION.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            path: path.into(),
            modules: HashMap::new(),
            graph: HashMap::new(),
            errors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_repository_has_ast_version_and_no_modules() {
        let repo = Repository::new("repo-0", "/tmp/repo");
        assert_eq!(repo.ast_version, AST_VERSION);
        assert!(repo.modules.is_empty());
        assert!(repo.graph.is_empty());
    }
}
