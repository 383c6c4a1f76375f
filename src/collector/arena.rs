//! The Collector's in-flight symbol table: pointer-keyed during collection
//! (here, keyed by `SymbolRef` arena index), translated to canonical
//! `Identity` only at export time.

use crate::model::{FileLine, Identity, Param, SymbolRef, TypeKind};

/// An outgoing edge recorded during collection. `External` covers both the
/// "definition outside the loaded set, `LoadExternalSymbol=false`" case and
/// genuinely unresolvable definitions — both get a degraded placeholder
/// identity rather than blocking collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DepTarget {
    Resolved(SymbolRef),
    External(Identity),
}

#[derive(Clone, Debug)]
pub struct PendingDependency {
    pub target: DepTarget,
    pub location: Option<FileLine>,
}

impl PendingDependency {
    pub fn resolved(target: SymbolRef, location: Option<FileLine>) -> Self {
        Self {
            target: DepTarget::Resolved(target),
            location,
        }
    }

    pub fn external(identity: Identity, location: Option<FileLine>) -> Self {
        Self {
            target: DepTarget::External(identity),
            location,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PendingFunction {
    pub is_method: bool,
    pub is_interface_method: bool,
    pub receiver: Option<SymbolRef>,
    pub interface: Option<SymbolRef>,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    /// Everything from an impl block's opener up to the first method's
    /// start; spliced back around the method body when exported.
    pub impl_head: Option<String>,
    /// `(trait's own SymbolRef, mangled trait-method name)` for a
    /// trait-qualified method (`mangle::trait_qualified`); resolved to the
    /// trait method's own `Identity` at export time via the trait type's
    /// `methods` map, once every method on both sides has been admitted.
    pub trait_method: Option<(SymbolRef, String)>,
    pub function_calls: Vec<PendingDependency>,
    pub method_calls: Vec<PendingDependency>,
    pub types: Vec<PendingDependency>,
    pub global_vars: Vec<PendingDependency>,
}

#[derive(Clone, Debug, Default)]
pub struct PendingType {
    pub kind: TypeKind,
    pub sub_struct: Vec<DepTarget>,
    /// Never pushed to during admission — see `Type::inline_struct`.
    pub inline_struct: Vec<DepTarget>,
    pub methods: std::collections::HashMap<String, SymbolRef>,
    pub implements: Vec<DepTarget>,
}

#[derive(Clone, Debug, Default)]
pub struct PendingVar {
    pub is_const: bool,
    pub is_pointer: bool,
    pub type_ref: Option<SymbolRef>,
    pub dependencies: Vec<PendingDependency>,
    pub groups: Vec<SymbolRef>,
}

#[derive(Clone, Debug)]
pub enum PendingKind {
    Function(PendingFunction),
    Type(PendingType),
    Var(PendingVar),
    /// A placeholder for a dependency target the Collector has not (yet)
    /// admitted from its own declaration — created on first reference,
    /// overwritten in place if the real declaration is later visited.
    Unknown,
}

#[derive(Clone, Debug)]
pub struct PendingSymbol {
    pub name: String,
    pub uri: String,
    pub mod_path: String,
    pub pkg_path: String,
    pub location: FileLine,
    pub content: String,
    pub exported: bool,
    pub kind: PendingKind,
}

/// Append `target` to `list` unless an equal target is already present.
pub fn push_dedup_target(list: &mut Vec<DepTarget>, target: DepTarget) {
    if !list.contains(&target) {
        list.push(target);
    }
}

/// Append a `PendingDependency` unless its target is already present.
pub fn push_dedup_dep(list: &mut Vec<PendingDependency>, target: DepTarget, location: Option<FileLine>) {
    if !list.iter().any(|d| d.target == target) {
        list.push(PendingDependency { target, location });
    }
}

impl PendingSymbol {
    pub fn as_function_mut(&mut self) -> Option<&mut PendingFunction> {
        match &mut self.kind {
            PendingKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_type_mut(&mut self) -> Option<&mut PendingType> {
        match &mut self.kind {
            PendingKind::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_var_mut(&mut self) -> Option<&mut PendingVar> {
        match &mut self.kind {
            PendingKind::Var(v) => Some(v),
            _ => None,
        }
    }
}
