//! The UniAST data model: identities, locations, entities, and the
//! top-level repository document.
//!
//! Every public type here derives `Serialize`/`Deserialize` and defaults
//! every field added after the `v0.1.3` baseline, so older snapshots keep
//! deserializing.

mod dependency;
mod file;
mod function;
mod identity;
mod location;
mod module;
mod node;
mod repository;
mod symbol_ref;
mod ty;
mod var;

pub use dependency::{Dependency, Relation, RelationKind};
pub use file::{File, Import};
pub use function::{Function, Param, Receiver};
pub use identity::{Identity, mangle};
pub use location::FileLine;
pub use module::{Module, Package};
pub use node::{Node, NodeType};
pub use repository::{AST_VERSION, CollectionError, Repository};
pub use symbol_ref::{SymbolArena, SymbolRef};
pub use ty::{Type, TypeKind};
pub use var::Var;
