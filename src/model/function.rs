//! `Function` and the lightweight `Receiver`/`Param` helpers it carries.

use serde::{Deserialize, Serialize};

use super::dependency::Dependency;
use super::identity::Identity;
use super::location::FileLine;

/// The receiver a method is attached to (Rust `impl` block, Python/Java/C++
/// `self`/`this`, or the equivalent).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    #[serde(rename = "Type")]
    pub type_identity: Identity,
    /// Set when the method is recorded against a trait/interface as well as
    /// its receiver type (see `Identity::mangle::trait_qualified`).
    #[serde(rename = "Interface", skip_serializing_if = "Option::is_none", default)]
    pub interface: Option<Identity>,
    #[serde(rename = "IsPointer", default)]
    pub is_pointer: bool,
}

/// A single function parameter or result, named or positional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Type", default)]
    pub type_name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Function {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(flatten)]
    pub location: FileLine,

    #[serde(rename = "Exported", default)]
    pub exported: bool,
    #[serde(rename = "IsMethod", default)]
    pub is_method: bool,
    #[serde(rename = "IsInterfaceMethod", default)]
    pub is_interface_method: bool,
    #[serde(rename = "Content", default)]
    pub content: String,
    #[serde(rename = "Signature", skip_serializing_if = "Option::is_none", default)]
    pub signature: Option<String>,
    #[serde(rename = "Receiver", skip_serializing_if = "Option::is_none", default)]
    pub receiver: Option<Receiver>,
    /// The trait method this one implements, for a trait-qualified method
    /// (`mangle::trait_qualified`) — the method-level counterpart of
    /// `Type.Implements`.
    #[serde(rename = "Implements", skip_serializing_if = "Vec::is_empty", default)]
    pub implements: Vec<Identity>,

    #[serde(rename = "Params", skip_serializing_if = "Vec::is_empty", default)]
    pub params: Vec<Param>,
    #[serde(rename = "Results", skip_serializing_if = "Vec::is_empty", default)]
    pub results: Vec<Param>,

    /// First-occurrence order, deduplicated by `Identity::full()`.
    #[serde(rename = "FunctionCalls", default)]
    pub function_calls: Vec<Dependency>,
    #[serde(rename = "MethodCalls", default)]
    pub method_calls: Vec<Dependency>,
    #[serde(rename = "Types", default)]
    pub types: Vec<Dependency>,
    #[serde(rename = "GlobalVars", default)]
    pub global_vars: Vec<Dependency>,
}

impl Function {
    pub fn new(identity: Identity, location: FileLine) -> Self {
        Self {
            identity,
            location,
            ..Default::default()
        }
    }

    /// Append `dep` to `calls` unless an entry with the same target identity
    /// is already present (first-occurrence-wins dedup per spec).
    pub fn push_dedup(calls: &mut Vec<Dependency>, dep: Dependency) {
        if !calls.iter().any(|d| d.identity == dep.identity) {
            calls.push(dep);
        }
    }
}
