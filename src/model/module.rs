//! `Module` and `Package` containers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::file::File;
use super::function::Function;
use super::ty::Type;
use super::var::Var;

/// A namespace inside a `Module`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Package {
    #[serde(rename = "IsMain", default)]
    pub is_main: bool,
    #[serde(rename = "IsTest", default)]
    pub is_test: bool,
    #[serde(rename = "PkgPath", default)]
    pub pkg_path: String,
    #[serde(rename = "Functions", default)]
    pub functions: HashMap<String, Function>,
    #[serde(rename = "Types", default)]
    pub types: HashMap<String, Type>,
    #[serde(rename = "Vars", default)]
    pub vars: HashMap<String, Var>,
}

impl Package {
    pub fn new(pkg_path: impl Into<String>) -> Self {
        Self {
            pkg_path: pkg_path.into(),
            ..Default::default()
        }
    }
}

/// A compilation unit: Rust crate, Python top-level package, npm package,
/// Java repo, or the synthesized "current" workspace for C/C++.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Module {
    #[serde(rename = "Language", default)]
    pub language: String,
    #[serde(rename = "Version", default)]
    pub version: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Repository-relative directory; `""` iff this module is external.
    #[serde(rename = "Dir", default)]
    pub dir: String,
    #[serde(rename = "Packages", default)]
    pub packages: HashMap<String, Package>,
    /// `name -> "name@ver"`.
    #[serde(rename = "Dependencies", default)]
    pub dependencies: HashMap<String, String>,
    #[serde(rename = "Files", default)]
    pub files: HashMap<String, File>,
}

impl Module {
    pub fn new(name: impl Into<String>, language: impl Into<String>, dir: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            name: name.into(),
            dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn is_external(&self) -> bool {
        self.dir.is_empty()
    }

    pub fn package_mut(&mut self, pkg_path: &str) -> &mut Package {
        self.packages
            .entry(pkg_path.to_string())
            .or_insert_with(|| Package::new(pkg_path))
    }
}
