//! `Var` records: package-level and const/static variables.

use serde::{Deserialize, Serialize};

use super::dependency::Dependency;
use super::identity::Identity;
use super::location::FileLine;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Var {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(flatten)]
    pub location: FileLine,

    #[serde(rename = "IsExported", default)]
    pub is_exported: bool,
    #[serde(rename = "IsConst", default)]
    pub is_const: bool,
    #[serde(rename = "IsPointer", default)]
    pub is_pointer: bool,
    #[serde(rename = "Content", default)]
    pub content: String,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none", default)]
    pub type_identity: Option<Identity>,
    #[serde(rename = "Dependencies", default)]
    pub dependencies: Vec<Dependency>,

    /// Other variables declared in the same statement (`let a, b = ...`).
    #[serde(rename = "Groups", default)]
    pub groups: Vec<Identity>,
}

impl Var {
    pub fn new(identity: Identity, location: FileLine) -> Self {
        Self {
            identity,
            location,
            ..Default::default()
        }
    }
}
