//! The `(ModPath, PkgPath, Name)` triple that addresses every symbol.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Uniquely addresses a symbol across the whole repository.
///
/// `ModPath = ""` is reserved for built-ins / standard-library symbols of a
/// language that has no module identity of its own.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "ModPath", default)]
    pub mod_path: String,
    #[serde(rename = "PkgPath", default)]
    pub pkg_path: String,
    #[serde(rename = "Name", default)]
    pub name: String,
}

impl Identity {
    pub fn new(mod_path: impl Into<String>, pkg_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mod_path: mod_path.into(),
            pkg_path: pkg_path.into(),
            name: name.into(),
        }
    }

    /// `"{mod}?{pkg}#{name}"`
    pub fn full(&self) -> String {
        format!("{}?{}#{}", self.mod_path, self.pkg_path, self.name)
    }

    /// `"{pkg}#{name}"`
    pub fn string(&self) -> String {
        format!("{}#{}", self.pkg_path, self.name)
    }

    /// `"{lastSegment(pkg)}.{name}"`
    pub fn call_name(&self) -> String {
        // `:` covers Rust's `::` module separator; splitting on the lone
        // char still lands on the right-most segment since `::` just
        // produces an empty component between the two colons.
        let last = self.pkg_path.rsplit(['/', '.', ':']).next().unwrap_or(&self.pkg_path);
        format!("{last}.{}", self.name)
    }

    /// Inverse of `full()`. Returns `None` when the string does not carry
    /// both separators in the expected order.
    pub fn from_full(s: &str) -> Option<Self> {
        let (mod_path, rest) = s.split_once('?')?;
        let (pkg_path, name) = rest.split_once('#')?;
        Some(Self::new(mod_path, pkg_path, name))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full())
    }
}

/// Centralizes the three method-name mangling shapes from the data model.
/// Every call site that attaches a receiver to a function name must go
/// through one of these three constructors rather than concatenating
/// strings ad hoc.
pub mod mangle {
    /// Instance method: `"{Type}.{Method}"`
    pub fn instance(type_name: &str, method: &str) -> String {
        format!("{type_name}.{method}")
    }

    /// Type-associated (static) method: `"{Type}::{Method}"`
    pub fn associated(type_name: &str, method: &str) -> String {
        format!("{type_name}::{method}")
    }

    /// Trait/interface-qualified method: `"{Iface}<{Type}>.{Method}"`
    pub fn trait_qualified(iface: &str, type_name: &str, method: &str) -> String {
        format!("{iface}<{type_name}>.{method}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_and_string_forms() {
        let id = Identity::new("crate_name", "crate_name::mod_a", "add");
        assert_eq!(id.full(), "crate_name?crate_name::mod_a#add");
        assert_eq!(id.string(), "crate_name::mod_a#add");
    }

    #[test]
    fn call_name_uses_last_pkg_segment() {
        let id = Identity::new("regex", "regex", "Regex::new");
        assert_eq!(id.call_name(), "regex.Regex::new");
    }

    #[test]
    fn call_name_splits_a_rust_module_path() {
        let id = Identity::new("crate_name", "crate_name::mod_a", "add");
        assert_eq!(id.call_name(), "mod_a.add");
    }

    #[test]
    fn round_trips_through_full() {
        let id = Identity::new("m", "p", "n");
        let parsed = Identity::from_full(&id.full()).expect("parses");
        assert_eq!(id, parsed);
    }

    #[test]
    fn mangling_shapes() {
        assert_eq!(mangle::instance("S", "m"), "S.m");
        assert_eq!(mangle::associated("S", "new"), "S::new");
        assert_eq!(mangle::trait_qualified("T", "S", "f"), "T<S>.f");
    }
}
