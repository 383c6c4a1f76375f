//! `Type` records: structs, interfaces, typedefs, enums.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::identity::Identity;
use super::location::FileLine;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Struct,
    Interface,
    Typedef,
    Enum,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Type {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(flatten)]
    pub location: FileLine,

    #[serde(rename = "Exported", default)]
    pub exported: bool,
    #[serde(rename = "TypeKind", default)]
    pub type_kind: TypeKind,
    #[serde(rename = "Content", default)]
    pub content: String,

    /// Field types declared by value (composition).
    #[serde(rename = "SubStruct", default)]
    pub sub_struct: Vec<Identity>,
    /// Anonymous/inline nested type declarations. Spec-listed but not
    /// currently populated by any `Spec` implementation's admission path —
    /// always empty until a language's collector gains that dissection.
    #[serde(rename = "InlineStruct", default)]
    pub inline_struct: Vec<Identity>,

    /// Method name → the method's own `Identity` (already mangled).
    #[serde(rename = "Methods", default)]
    pub methods: HashMap<String, Identity>,
    /// Interfaces this type implements (Rust traits, Java/TS interfaces).
    #[serde(rename = "Implements", default)]
    pub implements: Vec<Identity>,
}

impl Default for TypeKind {
    fn default() -> Self {
        TypeKind::Struct
    }
}

impl Type {
    pub fn new(identity: Identity, location: FileLine, kind: TypeKind) -> Self {
        Self {
            identity,
            location,
            type_kind: kind,
            ..Default::default()
        }
    }
}
