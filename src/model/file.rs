//! `File` and `Import` records.

use serde::{Deserialize, Serialize};

/// Either a bare path string or an aliased `{alias, path}` pair, matching
/// the import-line shape a language's source surfaces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Import {
    Bare(String),
    Aliased { alias: Option<String>, path: String },
}

impl Import {
    pub fn bare(path: impl Into<String>) -> Self {
        Self::Bare(path.into())
    }

    pub fn aliased(alias: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Aliased {
            alias: Some(alias.into()),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Import::Bare(p) => p,
            Import::Aliased { path, .. } => path,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            Import::Bare(_) => None,
            Import::Aliased { alias, .. } => alias.as_deref(),
        }
    }
}

/// A source file, addressed by its path relative to the repository root.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct File {
    #[serde(rename = "Path", default)]
    pub path: String,
    #[serde(rename = "Imports", default)]
    pub imports: Vec<Import>,
    #[serde(rename = "Package", default)]
    pub package: String,
}

impl File {
    pub fn new(path: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            imports: Vec::new(),
            package: package.into(),
        }
    }
}
