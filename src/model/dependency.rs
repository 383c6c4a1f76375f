//! Edges between symbols: the `Dependency` record and graph `Relation`s.

use serde::{Deserialize, Serialize};

use super::identity::Identity;
use super::location::FileLine;

/// An outgoing edge recorded on a `Function`/`Type`/`Var`: the target
/// identity plus the *reference* site (not the definition site).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "Identity")]
    pub identity: Identity,
    #[serde(rename = "Location", skip_serializing_if = "Option::is_none", default)]
    pub location: Option<FileLine>,
}

impl Dependency {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            location: None,
        }
    }

    pub fn at(identity: Identity, location: FileLine) -> Self {
        Self {
            identity,
            location: Some(location),
        }
    }
}

/// The kind of a typed relation between two graph `Node`s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    Dependency,
    Reference,
    Implement,
    Inherit,
    Group,
}

/// One entry in a `Node`'s typed relation list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(rename = "Identity")]
    pub identity: Identity,
    #[serde(rename = "Kind")]
    pub kind: RelationKind,
}

impl Relation {
    pub fn new(identity: Identity, kind: RelationKind) -> Self {
        Self { identity, kind }
    }
}
