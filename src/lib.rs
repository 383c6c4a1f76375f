//! # uniast
//!
//! Universal AST extraction over the Language Server Protocol.
//!
//! `uniast` drives a real language server (rust-analyzer, pyright,
//! typescript-language-server, jdtls, clangd) across a repository and
//! snapshots what it reports — symbols, definitions, references, type
//! hierarchies — into a single language-agnostic document: entities keyed
//! by `{ModPath, PkgPath, Name}` identity triples, wired together by a
//! bidirectional dependency graph.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,no_run
//! use uniast::spec::{self, Language};
//! use std::path::Path;
//!
//! let spec = spec::for_language(Language::Rust);
//! let modules = spec.workspace(Path::new(".")).unwrap();
//! println!("discovered {} modules", modules.len());
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! uniast parse rust . -o ast.json
//! uniast parse python ./service --exclude "tests/**"
//! ```

pub mod cli;
pub mod collector;
pub mod config;
pub mod errors;
pub mod export;
pub mod lsp;
pub mod model;
pub mod spec;
