//! The Collector: walks a repository, drives a single `LspClient` across
//! every source file, and builds up an in-flight symbol table keyed by
//! `SymbolRef` (pointer-keyed during collection; translated to `Identity`
//! only when the Exporter runs).
//!
//! Implements the ten-step algorithm from the collection design: workspace
//! discovery, lexicographic enumeration, per-file `didOpen` +
//! `documentSymbol` + `semanticTokens`, symbol admission, content capture,
//! function/impl dissection, dependency resolution (memoized), variable
//! typing, `typeHierarchy`-based implements for non-impl-block languages,
//! and a best-effort error log rather than a hard abort on any single
//! file, symbol, or request.

mod arena;
mod offsets;
mod option;
mod tokens;
mod walk;

pub use arena::{DepTarget, PendingDependency, PendingFunction, PendingKind, PendingSymbol, PendingType, PendingVar};
pub use option::CollectOption;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use lsp_types::{DocumentSymbol, SemanticTokensLegend};
use serde_json::Value;

use crate::errors::LspError;
use crate::lsp::LspClient;
use crate::model::{CollectionError, FileLine, Identity, Param, SymbolArena, SymbolRef, TypeKind, mangle};
use crate::model::File as FileRecord;
use crate::spec::{Spec, Symbol, SymbolKind, Token};

use arena::{push_dedup_dep, push_dedup_target};
use offsets::LineIndex;

/// What a dangling reference token, once resolved, gets pushed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RefCategory {
    FunctionCall,
    MethodCall,
    TypeRef,
    GlobalVar,
    VarType,
    VarDependency,
    SubStruct,
    Implements,
}

/// A reference site whose `textDocument/definition` request has not yet
/// been issued. Deferred so forward references within or across files
/// still resolve once their target has been admitted.
struct PendingRef {
    owner: SymbolRef,
    category: RefCategory,
    uri: String,
    line: u32,
    character: u32,
    token: Token,
    site: FileLine,
}

#[derive(Clone)]
struct FileCtx {
    uri: String,
    rel_path: String,
    mod_name: String,
    mod_path: String,
    pkg_path: String,
    /// `(type's SymbolRef, type's name, is the enclosing type an interface)`.
    enclosing_type: Option<(SymbolRef, String, bool)>,
}

pub struct Collector {
    root: PathBuf,
    spec: Box<dyn Spec>,
    modules: HashMap<String, PathBuf>,

    arena: SymbolArena<PendingSymbol>,
    type_index: HashMap<(String, String), SymbolRef>,
    declared_at: HashMap<(String, u32, u32), SymbolRef>,
    positions: HashMap<SymbolRef, (String, u32, u32)>,
    pending_refs: Vec<PendingRef>,
    pending_files: Vec<(String, FileRecord)>,
    main_packages: HashSet<(String, String)>,
    test_packages: HashSet<(String, String)>,
    /// Best-effort bodies for external symbols read eagerly when
    /// `CollectOption::load_external_symbol` is set (see
    /// `resolve_pending_refs`). Keyed by the placeholder's degraded
    /// `Identity` since it has no `SymbolRef` of its own.
    external_bodies: HashMap<Identity, String>,
    errors: Vec<CollectionError>,
}

impl Collector {
    pub fn new(root: PathBuf, spec: Box<dyn Spec>, modules: HashMap<String, PathBuf>) -> Self {
        Self {
            root,
            spec,
            modules,
            arena: SymbolArena::new(),
            type_index: HashMap::new(),
            declared_at: HashMap::new(),
            positions: HashMap::new(),
            pending_refs: Vec::new(),
            pending_files: Vec::new(),
            main_packages: HashSet::new(),
            test_packages: HashSet::new(),
            external_bodies: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn external_body(&self, identity: &Identity) -> Option<&str> {
        self.external_bodies.get(identity).map(|s| s.as_str())
    }

    pub fn spec(&self) -> &dyn Spec {
        self.spec.as_ref()
    }

    pub fn modules(&self) -> &HashMap<String, PathBuf> {
        &self.modules
    }

    pub fn arena(&self) -> &SymbolArena<PendingSymbol> {
        &self.arena
    }

    pub fn files(&self) -> &[(String, FileRecord)] {
        &self.pending_files
    }

    pub fn is_main_package(&self, mod_name: &str, pkg_path: &str) -> bool {
        self.main_packages.contains(&(mod_name.to_string(), pkg_path.to_string()))
    }

    pub fn is_test_package(&self, mod_name: &str, pkg_path: &str) -> bool {
        self.test_packages.contains(&(mod_name.to_string(), pkg_path.to_string()))
    }

    pub fn errors(&self) -> &[CollectionError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<CollectionError> {
        self.errors
    }

    /// Resolve a `SymbolRef` produced during collection to its final
    /// `Identity`. Used by the Exporter once every module has been walked.
    pub fn identity_of(&self, r: SymbolRef) -> Option<Identity> {
        self.arena.get(r).map(|sym| Identity::new(sym.mod_path.clone(), sym.pkg_path.clone(), sym.name.clone()))
    }

    pub fn resolve_target(&self, target: &DepTarget) -> Option<Identity> {
        match target {
            DepTarget::Resolved(r) => self.identity_of(*r),
            DepTarget::External(id) => Some(id.clone()),
        }
    }

    /// Looks up `method_name` on the trait/interface `interface_ref` points
    /// to, resolving to that method's own `Identity`. Deferred to export
    /// time (rather than resolved at admission) since the trait's own
    /// declaration may be admitted after the `impl` block that implements it.
    pub fn interface_method_identity(&self, interface_ref: SymbolRef, method_name: &str) -> Option<Identity> {
        let iface_sym = self.arena.get(interface_ref)?;
        let PendingKind::Type(t) = &iface_sym.kind else {
            return None;
        };
        let method_ref = *t.methods.get(method_name)?;
        self.identity_of(method_ref)
    }

    pub async fn run(&mut self, lsp: &LspClient, legend: &SemanticTokensLegend, option: &CollectOption) {
        let excludes = walk::build_exclude_set(&option.excludes);
        let mut mod_names: Vec<String> = self.modules.keys().cloned().collect();
        mod_names.sort();

        'modules: for mod_name in mod_names {
            let mod_dir = self.modules.get(&mod_name).cloned().expect("module listed in mod_names");
            let files = match walk::gather_files(&mod_dir, self.spec.as_ref(), &excludes) {
                Ok(files) => files,
                Err(e) => {
                    self.errors.push(CollectionError::at("walk", mod_dir.display().to_string(), e.to_string()));
                    continue;
                }
            };
            for file in files {
                if option.cancel.is_cancelled() {
                    self.errors.push(CollectionError::new("collect", "cancelled; returning partial state"));
                    break 'modules;
                }
                self.collect_file(lsp, legend, option, &mod_name, &file).await;
            }
        }

        if !option.cancel.is_cancelled() {
            self.resolve_pending_refs(lsp, option).await;
            self.resolve_type_hierarchy(lsp, option).await;
        }
    }

    async fn collect_file(&mut self, lsp: &LspClient, legend: &SemanticTokensLegend, option: &CollectOption, mod_name: &str, file: &Path) {
        let rel_path = file.strip_prefix(&self.root).unwrap_or(file).display().to_string();

        if option.not_need_test && looks_like_test_path(&rel_path) {
            return;
        }

        let contents = match std::fs::read_to_string(file) {
            Ok(c) => c,
            Err(source) => {
                self.errors.push(CollectionError::at("read-file", rel_path, source.to_string()));
                return;
            }
        };

        let uri = file_uri(file);
        if let Err(e) = lsp.open_file(&uri, &contents).await {
            self.errors.push(CollectionError::at("lsp-open", rel_path, e.to_string()));
            return;
        }

        let doc_symbols: Vec<DocumentSymbol> = match lsp.document_symbol(&uri).await {
            Ok(value) => serde_json::from_value(value).unwrap_or_default(),
            Err(e) => {
                self.push_non_fatal_lsp_error("document-symbol", &rel_path, e);
                Vec::new()
            }
        };

        let tokens = match lsp.semantic_tokens_full(&uri).await {
            Ok(value) => {
                let data: Vec<u32> = value.get("data").and_then(|d| serde_json::from_value(d.clone()).ok()).unwrap_or_default();
                tokens::decode_semantic_tokens(&data, legend)
            }
            Err(e) => {
                self.push_non_fatal_lsp_error("semantic-tokens", &rel_path, e);
                Vec::new()
            }
        };

        let (mod_path, pkg_path) = match self.spec.namespace(&self.root, file) {
            Ok(ns) => ns,
            Err(e) => {
                self.errors.push(CollectionError::at("namespace", rel_path, e.to_string()));
                return;
            }
        };

        if looks_like_test_path(&rel_path) {
            self.test_packages.insert((mod_name.to_string(), pkg_path.clone()));
        }

        let imports = self.spec.file_imports(&contents);
        self.pending_files.push((mod_name.to_string(), FileRecord {
            path: rel_path.clone(),
            imports,
            package: pkg_path.clone(),
        }));

        let lines = LineIndex::new(&contents);
        let symbols = tokens::build_symbol_tree(&doc_symbols, &tokens);

        let ctx = FileCtx {
            uri,
            rel_path,
            mod_name: mod_name.to_string(),
            mod_path,
            pkg_path,
            enclosing_type: None,
        };

        self.admit_symbols(&symbols, &contents, &lines, &tokens, option, &ctx);
    }

    fn push_non_fatal_lsp_error(&mut self, stage: &str, path: &str, e: LspError) {
        self.errors.push(CollectionError::at(stage, path, e.to_string()));
    }

    fn admit_symbols(&mut self, symbols: &[Symbol], contents: &str, lines: &LineIndex, file_tokens: &[Token], option: &CollectOption, ctx: &FileCtx) {
        // Sibling `Var`s declared on the same source line (e.g. TypeScript's
        // `let a = 1, b = 2;`) belong to one `Group`; tracked per call since
        // each is scoped to one statement list (one file, one nesting level).
        let mut same_line_vars: HashMap<u32, Vec<SymbolRef>> = HashMap::new();

        for sym in symbols {
            if self.spec.has_impl_symbol() && looks_like_impl_block(sym) {
                self.admit_impl_block(sym, contents, lines, file_tokens, option, ctx);
                continue;
            }

            if !self.spec.is_entity_symbol(sym) {
                self.admit_symbols(&sym.children, contents, lines, file_tokens, option, ctx);
                continue;
            }

            if matches!(sym.kind, SymbolKind::VARIABLE | SymbolKind::CONSTANT) {
                let var_ref = self.admit_var(sym, contents, lines, file_tokens, option, ctx);
                same_line_vars.entry(sym.range.start.line).or_default().push(var_ref);
            } else {
                self.admit_entity(sym, contents, lines, file_tokens, option, ctx);
            }
        }

        self.link_same_line_groups(&same_line_vars);
    }

    fn link_same_line_groups(&mut self, same_line_vars: &HashMap<u32, Vec<SymbolRef>>) {
        for refs in same_line_vars.values() {
            if refs.len() < 2 {
                continue;
            }
            for &r in refs {
                let peers: Vec<SymbolRef> = refs.iter().copied().filter(|&o| o != r).collect();
                if let Some(psym) = self.arena.get_mut(r) {
                    if let Some(v) = psym.as_var_mut() {
                        for peer in peers {
                            if !v.groups.contains(&peer) {
                                v.groups.push(peer);
                            }
                        }
                    }
                }
            }
        }
    }

    fn admit_entity(&mut self, sym: &Symbol, contents: &str, lines: &LineIndex, file_tokens: &[Token], option: &CollectOption, ctx: &FileCtx) {
        match sym.kind {
            SymbolKind::FUNCTION => {
                self.admit_function(sym, contents, lines, file_tokens, option, ctx, None, None, false, false);
            }
            SymbolKind::METHOD => {
                let is_interface_method = ctx.enclosing_type.as_ref().map(|(_, _, is_iface)| *is_iface).unwrap_or(false);
                let receiver = ctx.enclosing_type.clone().map(|(r, name, _)| (r, name));
                // Non-Rust class-based languages reach this branch only for
                // true instance/interface methods; `impl`-block dispatch
                // (which can hold static/associated functions too) goes
                // through `admit_impl_block` instead.
                self.admit_function(sym, contents, lines, file_tokens, option, ctx, receiver, None, is_interface_method, true);
            }
            SymbolKind::STRUCT | SymbolKind::CLASS | SymbolKind::ENUM | SymbolKind::INTERFACE => {
                let type_ref = self.admit_type(sym, contents, lines, file_tokens, option, ctx);
                let mut nested_ctx = ctx.clone();
                nested_ctx.enclosing_type = Some((type_ref, sym.name.clone(), sym.kind == SymbolKind::INTERFACE));
                self.admit_symbols(&sym.children, contents, lines, file_tokens, option, &nested_ctx);
            }
            // Top-level VARIABLE/CONSTANT siblings are admitted in
            // `admit_symbols` itself so same-line declarations can be
            // grouped; only struct/class FIELDs reach this arm.
            SymbolKind::FIELD => {
                self.admit_var(sym, contents, lines, file_tokens, option, ctx);
            }
            _ => {
                self.admit_symbols(&sym.children, contents, lines, file_tokens, option, ctx);
            }
        }
    }

    fn admit_type(&mut self, sym: &Symbol, contents: &str, lines: &LineIndex, file_tokens: &[Token], option: &CollectOption, ctx: &FileCtx) -> SymbolRef {
        let kind = match sym.kind {
            SymbolKind::INTERFACE => TypeKind::Interface,
            SymbolKind::ENUM => TypeKind::Enum,
            _ => TypeKind::Struct,
        };
        let key = (ctx.pkg_path.clone(), sym.name.clone());
        let location = symbol_location(sym, contents, lines, file_tokens, &ctx.rel_path, option, self.spec.as_ref());
        let content = contents.get(location.start_offset..location.end_offset).unwrap_or_default().to_string();
        let exported = self.spec.is_public_symbol(sym);
        let identifier_pos = (ctx.uri.clone(), sym.selection_range.start.line, sym.selection_range.start.character);

        let type_ref = if let Some(&existing) = self.type_index.get(&key) {
            if let Some(psym) = self.arena.get_mut(existing) {
                psym.location = location;
                psym.content = content;
                psym.exported = exported;
                psym.uri = ctx.uri.clone();
                if let Some(t) = psym.as_type_mut() {
                    t.kind = kind;
                }
            }
            existing
        } else {
            let pending = PendingSymbol {
                name: sym.name.clone(),
                uri: ctx.uri.clone(),
                mod_path: ctx.mod_path.clone(),
                pkg_path: ctx.pkg_path.clone(),
                location,
                content,
                exported,
                kind: PendingKind::Type(PendingType {
                    kind,
                    ..Default::default()
                }),
            };
            let r = self.arena.push(pending);
            self.type_index.insert(key, r);
            r
        };

        self.declared_at.insert(identifier_pos.clone(), type_ref);
        self.positions.insert(type_ref, identifier_pos);

        let declare_idx = self.spec.declare_token_of_symbol(sym);
        for (i, token) in sym.tokens.iter().enumerate() {
            if Some(i) == declare_idx {
                continue;
            }
            let Some(category) = classify_token(self.spec.as_ref(), option, token) else {
                continue;
            };
            if !matches!(category, RefCategory::TypeRef) {
                continue;
            }
            self.pending_refs.push(PendingRef {
                owner: type_ref,
                category: RefCategory::SubStruct,
                uri: ctx.uri.clone(),
                line: token.range.start.line,
                character: token.range.start.character,
                token: token.clone(),
                site: token_site(contents, lines, &ctx.rel_path, token),
            });
        }

        type_ref
    }

    fn admit_var(&mut self, sym: &Symbol, contents: &str, lines: &LineIndex, file_tokens: &[Token], option: &CollectOption, ctx: &FileCtx) -> SymbolRef {
        let location = symbol_location(sym, contents, lines, file_tokens, &ctx.rel_path, option, self.spec.as_ref());
        let content = contents.get(location.start_offset..location.end_offset).unwrap_or_default().to_string();
        let exported = self.spec.is_public_symbol(sym);
        let is_const = sym.kind == SymbolKind::CONSTANT || content.trim_start().starts_with("const");
        let is_pointer = content.contains('*') || content.contains('&');
        let identifier_pos = (ctx.uri.clone(), sym.selection_range.start.line, sym.selection_range.start.character);

        let pending = PendingSymbol {
            name: sym.name.clone(),
            uri: ctx.uri.clone(),
            mod_path: ctx.mod_path.clone(),
            pkg_path: ctx.pkg_path.clone(),
            location,
            content,
            exported,
            kind: PendingKind::Var(PendingVar {
                is_const,
                is_pointer,
                type_ref: None,
                dependencies: Vec::new(),
                groups: Vec::new(),
            }),
        };
        let var_ref = self.arena.push(pending);
        self.declared_at.insert(identifier_pos.clone(), var_ref);
        self.positions.insert(var_ref, identifier_pos);

        let declare_idx = self.spec.declare_token_of_symbol(sym);
        let mut type_assigned = false;
        for (i, token) in sym.tokens.iter().enumerate() {
            if Some(i) == declare_idx {
                continue;
            }
            let Some(category) = classify_token(self.spec.as_ref(), option, token) else {
                continue;
            };
            let category = if !type_assigned && matches!(category, RefCategory::TypeRef) {
                type_assigned = true;
                RefCategory::VarType
            } else {
                RefCategory::VarDependency
            };
            self.pending_refs.push(PendingRef {
                owner: var_ref,
                category,
                uri: ctx.uri.clone(),
                line: token.range.start.line,
                character: token.range.start.character,
                token: token.clone(),
                site: token_site(contents, lines, &ctx.rel_path, token),
            });
        }

        var_ref
    }

    fn admit_function(
        &mut self,
        sym: &Symbol,
        contents: &str,
        lines: &LineIndex,
        file_tokens: &[Token],
        option: &CollectOption,
        ctx: &FileCtx,
        receiver: Option<(SymbolRef, String)>,
        interface: Option<(SymbolRef, String)>,
        is_interface_method: bool,
        has_self: bool,
    ) -> SymbolRef {
        let dissection = self.spec.function_symbol(sym, contents);
        let location = symbol_location(sym, contents, lines, file_tokens, &ctx.rel_path, option, self.spec.as_ref());
        let content = contents.get(location.start_offset..location.end_offset).unwrap_or_default().to_string();
        let exported = self.spec.is_public_symbol(sym);

        if self.spec.is_main_function(sym) {
            self.main_packages.insert((ctx.mod_name.clone(), ctx.pkg_path.clone()));
        }

        // A receiver type alone isn't enough: an `impl` block can also hold
        // type-associated functions (`fn new() -> Self`) that take no
        // `self`. Only those the spec's per-function dissection actually
        // confirms have a receiver get instance/trait-qualified mangling
        // and `IsMethod`; the rest mangle as `Type::name` and stay
        // associated functions.
        let is_method = receiver.is_some() && has_self;
        let name = match (&receiver, &interface, has_self) {
            (Some((_, recv)), Some((_, iface)), true) => mangle::trait_qualified(iface, recv, &sym.name),
            (Some((_, recv)), None, true) => mangle::instance(recv, &sym.name),
            (Some((_, recv)), _, false) => mangle::associated(recv, &sym.name),
            (None, _, _) => sym.name.clone(),
        };
        // A trait-impl method (`T<S>.f`) implements the trait's own
        // declaration of that method (`T.f`), a method-to-method edge
        // `Type.Implements` alone doesn't carry.
        let trait_method = match (&receiver, &interface, has_self) {
            (Some(_), Some((iface_ref, iface)), true) => Some((*iface_ref, mangle::instance(iface, &sym.name))),
            _ => None,
        };

        let params = build_params(contents, lines, &sym.tokens, &dissection.input_idxs, self.spec.as_ref());
        let mut results = build_params(contents, lines, &sym.tokens, &dissection.output_idxs, self.spec.as_ref());
        if results.is_empty() {
            if let Some(type_name) = &dissection.output_type_text {
                results.push(Param {
                    name: String::new(),
                    type_name: type_name.clone(),
                });
            }
        }

        let pending_fn = PendingFunction {
            is_method,
            is_interface_method,
            receiver: receiver.as_ref().map(|(r, _)| *r),
            interface: interface.as_ref().map(|(r, _)| *r),
            params,
            results,
            impl_head: None,
            trait_method,
            function_calls: Vec::new(),
            method_calls: Vec::new(),
            types: Vec::new(),
            global_vars: Vec::new(),
        };

        let identifier_pos = (ctx.uri.clone(), sym.selection_range.start.line, sym.selection_range.start.character);
        let pending = PendingSymbol {
            name: name.clone(),
            uri: ctx.uri.clone(),
            mod_path: ctx.mod_path.clone(),
            pkg_path: ctx.pkg_path.clone(),
            location,
            content,
            exported,
            kind: PendingKind::Function(pending_fn),
        };
        let func_ref = self.arena.push(pending);
        self.declared_at.insert(identifier_pos.clone(), func_ref);
        self.positions.insert(func_ref, identifier_pos);

        if let Some((recv_ref, _)) = &receiver {
            if let Some(tsym) = self.arena.get_mut(*recv_ref) {
                if let Some(t) = tsym.as_type_mut() {
                    t.methods.insert(name.clone(), func_ref);
                }
            }
        }

        let mut skip: HashSet<usize> = dissection.input_idxs.iter().chain(dissection.output_idxs.iter()).chain(dissection.type_param_idxs.iter()).copied().collect();
        if let Some(r) = dissection.receiver_idx {
            skip.insert(r);
        }
        if let Some(d) = self.spec.declare_token_of_symbol(sym) {
            skip.insert(d);
        }

        for (i, token) in sym.tokens.iter().enumerate() {
            if skip.contains(&i) {
                continue;
            }
            let Some(category) = classify_token(self.spec.as_ref(), option, token) else {
                continue;
            };
            self.pending_refs.push(PendingRef {
                owner: func_ref,
                category,
                uri: ctx.uri.clone(),
                line: token.range.start.line,
                character: token.range.start.character,
                token: token.clone(),
                site: token_site(contents, lines, &ctx.rel_path, token),
            });
        }

        func_ref
    }

    fn admit_impl_block(&mut self, sym: &Symbol, contents: &str, lines: &LineIndex, file_tokens: &[Token], option: &CollectOption, ctx: &FileCtx) {
        let dissection = self.spec.impl_symbol(sym);
        let receiver_name = dissection.receiver_idx.and_then(|i| sym.tokens.get(i)).map(|t| token_text(contents, lines, t).to_string());
        let interface_name = dissection.interface_idx.and_then(|i| sym.tokens.get(i)).map(|t| token_text(contents, lines, t).to_string());

        let Some(receiver_name) = receiver_name else {
            self.errors.push(CollectionError::at("impl-block", ctx.rel_path.clone(), format!("impl block `{}` has no recoverable receiver type", sym.name)));
            self.admit_symbols(&sym.children, contents, lines, file_tokens, option, ctx);
            return;
        };

        let receiver_ref = self.type_ref_or_placeholder(&ctx.mod_path, &ctx.pkg_path, &receiver_name, &ctx.uri);
        let interface_ref = interface_name.as_ref().map(|n| self.type_ref_or_placeholder(&ctx.mod_path, &ctx.pkg_path, n, &ctx.uri));

        if let Some(iref) = interface_ref {
            if let Some(tsym) = self.arena.get_mut(receiver_ref) {
                if let Some(t) = tsym.as_type_mut() {
                    push_dedup_target(&mut t.implements, DepTarget::Resolved(iref));
                }
            }
        }

        let methods: Vec<&Symbol> = sym.children.iter().filter(|c| matches!(c.kind, SymbolKind::METHOD | SymbolKind::FUNCTION)).collect();

        // Per spec, a method's recovered `Content` is the `impl S { ... }`
        // scaffold around its own body, not the bare body alone. Recover
        // that scaffold once per block, up to where the first child's own
        // declaration begins.
        let block_location = symbol_location(sym, contents, lines, file_tokens, &ctx.rel_path, option, self.spec.as_ref());
        let impl_head = dissection.first_method_idx.and(methods.first().copied()).map(|first| {
            let first_location = symbol_location(first, contents, lines, file_tokens, &ctx.rel_path, option, self.spec.as_ref());
            contents.get(block_location.start_offset..first_location.start_offset).unwrap_or_default().to_string()
        });

        for child in methods {
            let receiver = Some((receiver_ref, receiver_name.clone()));
            let interface = interface_ref.zip(interface_name.clone());
            let has_self = self.spec.function_symbol(child, contents).receiver_idx.is_some();
            let func_ref = self.admit_function(child, contents, lines, file_tokens, option, ctx, receiver, interface, false, has_self);
            if let Some(head) = &impl_head {
                if let Some(psym) = self.arena.get_mut(func_ref) {
                    if let Some(f) = psym.as_function_mut() {
                        f.impl_head = Some(head.clone());
                    }
                }
            }
        }
    }

    fn type_ref_or_placeholder(&mut self, mod_path: &str, pkg_path: &str, name: &str, uri: &str) -> SymbolRef {
        let key = (pkg_path.to_string(), name.to_string());
        if let Some(&r) = self.type_index.get(&key) {
            return r;
        }
        let placeholder = PendingSymbol {
            name: name.to_string(),
            uri: uri.to_string(),
            mod_path: mod_path.to_string(),
            pkg_path: pkg_path.to_string(),
            location: FileLine::default(),
            content: String::new(),
            exported: false,
            kind: PendingKind::Type(PendingType::default()),
        };
        let r = self.arena.push(placeholder);
        self.type_index.insert(key, r);
        r
    }

    /// Step 7: resolve every deferred reference token via
    /// `textDocument/definition`, memoized by `(uri, line, character)` of
    /// the reference site.
    async fn resolve_pending_refs(&mut self, lsp: &LspClient, option: &CollectOption) {
        let refs = std::mem::take(&mut self.pending_refs);
        let mut memo: HashMap<(String, u32, u32), Option<(String, u32, u32)>> = HashMap::new();

        for pref in refs {
            let key = (pref.uri.clone(), pref.line, pref.character);
            let target_loc = if let Some(cached) = memo.get(&key) {
                cached.clone()
            } else {
                let resolved = match lsp.definition(&pref.uri, pref.line, pref.character).await {
                    Ok(value) => extract_location(&value),
                    Err(e) => {
                        self.errors.push(CollectionError::at("definition", pref.uri.clone(), e.to_string()));
                        None
                    }
                };
                memo.insert(key, resolved.clone());
                resolved
            };

            let Some((turi, tline, tchar)) = target_loc else {
                self.errors.push(CollectionError::at(
                    "definition",
                    pref.uri.clone(),
                    format!("no definition found at {}:{}:{}", pref.uri, pref.line, pref.character),
                ));
                continue;
            };

            let target = if let Some(&owner) = self.declared_at.get(&(turi.clone(), tline, tchar)) {
                DepTarget::Resolved(owner)
            } else {
                // Definition sits outside the loaded set. The edge still
                // links to a node even when we don't recurse into the
                // external file: record a degraded-identity placeholder
                // (ModPath="") rather than dropping the edge. When
                // `load_external_symbol` is set, additionally read the
                // external file's full text so the placeholder carries a
                // body instead of staying empty.
                let def_loc = FileLine::new(turi.clone(), tline + 1, 0, 0);
                let name = self.spec.get_unloaded_symbol(&pref.token, &def_loc).unwrap_or_else(|_| format!("{turi}:{tline}"));
                let identity = Identity::new("", "", name);
                if option.load_external_symbol {
                    if let Some(path) = uri_to_path(&turi) {
                        if let Ok(content) = std::fs::read_to_string(&path) {
                            self.external_bodies.insert(identity.clone(), content);
                        }
                    }
                }
                DepTarget::External(identity)
            };

            self.apply_resolved(pref.owner, pref.category, target, pref.site);
        }
    }

    fn apply_resolved(&mut self, owner: SymbolRef, category: RefCategory, target: DepTarget, site: FileLine) {
        let Some(sym) = self.arena.get_mut(owner) else { return };
        match (category, &mut sym.kind) {
            (RefCategory::FunctionCall, PendingKind::Function(f)) => push_dedup_dep(&mut f.function_calls, target, Some(site)),
            (RefCategory::MethodCall, PendingKind::Function(f)) => push_dedup_dep(&mut f.method_calls, target, Some(site)),
            (RefCategory::TypeRef, PendingKind::Function(f)) => push_dedup_dep(&mut f.types, target, Some(site)),
            (RefCategory::GlobalVar, PendingKind::Function(f)) => push_dedup_dep(&mut f.global_vars, target, Some(site)),
            (RefCategory::VarDependency, PendingKind::Var(v)) => push_dedup_dep(&mut v.dependencies, target, Some(site)),
            (RefCategory::VarType, PendingKind::Var(v)) => {
                if v.type_ref.is_none() {
                    if let DepTarget::Resolved(r) = target {
                        v.type_ref = Some(r);
                    }
                }
            }
            (RefCategory::SubStruct, PendingKind::Type(t)) => push_dedup_target(&mut t.sub_struct, target),
            (RefCategory::Implements, PendingKind::Type(t)) => push_dedup_target(&mut t.implements, target),
            _ => {}
        }
    }

    /// Step 10: for languages without explicit impl blocks, discover
    /// `implements`/`inherits` edges through `typeHierarchy/supertypes`.
    async fn resolve_type_hierarchy(&mut self, lsp: &LspClient, option: &CollectOption) {
        if self.spec.has_impl_symbol() {
            return;
        }

        let candidates: Vec<(SymbolRef, String, u32, u32)> = self
            .arena
            .iter()
            .filter(|(_, sym)| matches!(sym.kind, PendingKind::Type(_)))
            .filter_map(|(r, _)| self.positions.get(&r).map(|(uri, line, ch)| (r, uri.clone(), *line, *ch)))
            .collect();

        for (type_ref, uri, line, character) in candidates {
            let prepared = match lsp.prepare_type_hierarchy(&uri, line, character).await {
                Ok(v) => v,
                Err(_) => continue,
            };
            let Some(item) = prepared.as_array().and_then(|a| a.first()).cloned() else {
                continue;
            };
            let supertypes = match lsp.supertypes(item).await {
                Ok(v) => v,
                Err(_) => continue,
            };
            let Some(items) = supertypes.as_array() else { continue };

            for sup in items {
                let Some((turi, tline, tchar)) = extract_type_hierarchy_location(sup) else { continue };
                let target = if let Some(&owner) = self.declared_at.get(&(turi.clone(), tline, tchar)) {
                    DepTarget::Resolved(owner)
                } else if option.load_external_symbol {
                    let name = sup.get("name").and_then(|n| n.as_str()).unwrap_or("unknown").to_string();
                    DepTarget::External(Identity::new("", "", name))
                } else {
                    continue;
                };
                self.apply_resolved(type_ref, RefCategory::Implements, target, FileLine::default());
            }
        }
    }
}

fn looks_like_impl_block(sym: &Symbol) -> bool {
    sym.name.trim_start().starts_with("impl ")
}

fn looks_like_test_path(rel_path: &str) -> bool {
    let lower = rel_path.to_lowercase();
    lower.contains("/tests/") || lower.starts_with("tests/") || lower.contains("/test/") || lower.ends_with("_test.rs") || lower.ends_with("test.py") || lower.contains(".test.")
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn uri_to_path(uri: &str) -> Option<PathBuf> {
    uri.strip_prefix("file://").map(PathBuf::from)
}

fn token_text<'a>(contents: &'a str, lines: &LineIndex, token: &Token) -> &'a str {
    let start = lines.offset(contents, token.range.start);
    let end = lines.offset(contents, token.range.end);
    contents.get(start..end).unwrap_or_default()
}

fn token_site(contents: &str, lines: &LineIndex, rel_path: &str, token: &Token) -> FileLine {
    let start = lines.offset(contents, token.range.start);
    let end = lines.offset(contents, token.range.end);
    FileLine::new(rel_path, lines.line_number(start), start, end)
}

/// Slice a symbol's declaration span, expanding backward over a contiguous
/// run of doc-comment-only lines unless `no_need_comment` is set.
fn symbol_location(sym: &Symbol, contents: &str, lines: &LineIndex, file_tokens: &[Token], rel_path: &str, option: &CollectOption, spec: &dyn Spec) -> FileLine {
    let mut start_offset = lines.offset(contents, sym.range.start);
    let end_offset = lines.offset(contents, sym.range.end);

    if !option.no_need_comment {
        let mut probe_line = sym.range.start.line;
        while probe_line > 0 {
            let candidate_line = probe_line - 1;
            let is_doc_line = file_tokens.iter().any(|t| t.range.start.line == candidate_line && spec.is_doc_token(t));
            if !is_doc_line {
                break;
            }
            probe_line = candidate_line;
        }
        if probe_line < sym.range.start.line {
            start_offset = lines.offset(contents, lsp_types::Position { line: probe_line, character: 0 });
        }
    }

    let line = lines.line_number(start_offset);
    FileLine::new(rel_path, line, start_offset, end_offset)
}

/// Builds one `Param` per token index, in order, skipping an index whose
/// identifier text has already been emitted. A semantic-tokens stream marks
/// every occurrence of a parameter with the `parameter` token type,
/// including its uses inside the function body, not just its binding in the
/// signature — without this dedup a parameter referenced `N` times in the
/// body would produce `N` duplicate `Param` entries.
fn build_params(contents: &str, lines: &LineIndex, tokens: &[Token], idxs: &[usize], spec: &dyn Spec) -> Vec<Param> {
    let mut seen: HashSet<String> = HashSet::new();
    idxs.iter()
        .filter_map(|&i| tokens.get(i))
        .filter_map(|t| {
            let name = token_text(contents, lines, t).to_string();
            if !seen.insert(name.clone()) {
                return None;
            }
            let type_name = tokens
                .iter()
                .find(|u| {
                    u.range.start.line == t.range.start.line
                        && u.range.start.character > t.range.start.character
                        && spec.is_entity_token(u)
                        && matches!(
                            spec.token_kind(u),
                            SymbolKind::STRUCT | SymbolKind::ENUM | SymbolKind::INTERFACE | SymbolKind::CLASS | SymbolKind::TYPE_PARAMETER
                        )
                })
                .map(|u| token_text(contents, lines, u).to_string())
                .unwrap_or_default();
            Some(Param { name, type_name })
        })
        .collect()
}

fn classify_token(spec: &dyn Spec, option: &CollectOption, token: &Token) -> Option<RefCategory> {
    if !spec.is_entity_token(token) || spec.is_doc_token(token) {
        return None;
    }
    if spec.is_std_token(token) && !option.need_std_symbol {
        return None;
    }
    match spec.token_kind(token) {
        SymbolKind::FUNCTION => Some(RefCategory::FunctionCall),
        SymbolKind::METHOD => Some(RefCategory::MethodCall),
        SymbolKind::STRUCT | SymbolKind::CLASS | SymbolKind::ENUM | SymbolKind::INTERFACE => Some(RefCategory::TypeRef),
        SymbolKind::VARIABLE | SymbolKind::CONSTANT | SymbolKind::FIELD => Some(RefCategory::GlobalVar),
        _ => None,
    }
}

fn extract_location(value: &Value) -> Option<(String, u32, u32)> {
    let obj = match value.as_array() {
        Some(arr) => arr.first()?,
        None => value,
    };
    if let Some(uri) = obj.get("uri").and_then(|u| u.as_str()) {
        let start = obj.get("range")?.get("start")?;
        return Some((uri.to_string(), start.get("line")?.as_u64()? as u32, start.get("character")?.as_u64()? as u32));
    }
    if let Some(uri) = obj.get("targetUri").and_then(|u| u.as_str()) {
        let start = obj.get("targetRange")?.get("start")?;
        return Some((uri.to_string(), start.get("line")?.as_u64()? as u32, start.get("character")?.as_u64()? as u32));
    }
    None
}

fn extract_type_hierarchy_location(item: &Value) -> Option<(String, u32, u32)> {
    let uri = item.get("uri")?.as_str()?.to_string();
    let start = item.get("range")?.get("start")?;
    Some((uri, start.get("line")?.as_u64()? as u32, start.get("character")?.as_u64()? as u32))
}
