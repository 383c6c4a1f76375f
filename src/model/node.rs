//! Graph `Node`s: the materialized, bidirectional symbol graph.

use serde::{Deserialize, Serialize};

use super::dependency::{Relation, RelationKind};
use super::identity::Identity;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "FUNC")]
    Func,
    #[serde(rename = "TYPE")]
    Type,
    #[serde(rename = "VAR")]
    Var,
    #[default]
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(rename = "Type", default)]
    pub node_type: NodeType,

    #[serde(rename = "Dependencies", default)]
    pub dependencies: Vec<Relation>,
    #[serde(rename = "References", default)]
    pub references: Vec<Relation>,
    #[serde(rename = "Implements", default)]
    pub implements: Vec<Relation>,
    #[serde(rename = "Inherits", default)]
    pub inherits: Vec<Relation>,
    #[serde(rename = "Groups", default)]
    pub groups: Vec<Relation>,
}

impl Node {
    pub fn new(identity: Identity, node_type: NodeType) -> Self {
        Self {
            identity,
            node_type,
            ..Default::default()
        }
    }

    /// Upgrade this node's `node_type` from `Unknown` to a concrete kind.
    /// Once a node has a concrete kind it never regresses to `Unknown`.
    pub fn fill_type(&mut self, kind: NodeType) {
        if self.node_type == NodeType::Unknown {
            self.node_type = kind;
        }
    }

    fn push_relation(list: &mut Vec<Relation>, identity: Identity, kind: RelationKind) {
        if !list.iter().any(|r| r.identity == identity) {
            list.push(Relation::new(identity, kind));
        }
    }

    pub fn add_dependency(&mut self, target: Identity) {
        Self::push_relation(&mut self.dependencies, target, RelationKind::Dependency);
    }

    pub fn add_reference(&mut self, source: Identity) {
        Self::push_relation(&mut self.references, source, RelationKind::Reference);
    }

    pub fn add_implement(&mut self, target: Identity) {
        Self::push_relation(&mut self.implements, target, RelationKind::Implement);
    }

    pub fn add_inherit(&mut self, target: Identity) {
        Self::push_relation(&mut self.inherits, target, RelationKind::Inherit);
    }

    pub fn add_group(&mut self, target: Identity) {
        Self::push_relation(&mut self.groups, target, RelationKind::Group);
    }
}
