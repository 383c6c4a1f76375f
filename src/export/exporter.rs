//! Snapshots a finished `Collector` into the canonical, identity-keyed
//! `Repository` document. Pointer-keyed edges (`SymbolRef`, `DepTarget`)
//! are translated to `Identity` here and only here; everything downstream
//! of this module sees the data model exclusively through `Identity`.

use std::path::Path;

use crate::collector::{Collector, PendingKind};
use crate::model::{Dependency, Function, Identity, Module, Receiver, Repository, Type, Var};

use super::manifest;

/// Snapshot the collector's in-flight state into a `Repository`.
pub fn export(collector: &Collector, repo_id: impl Into<String>, root: &Path) -> Repository {
    let mut repo = Repository::new(repo_id, root.display().to_string());

    let mut mod_names: Vec<&String> = collector.modules().keys().collect();
    mod_names.sort();
    for mod_name in mod_names {
        let mod_dir = &collector.modules()[mod_name];
        // Root-level internal modules (the common case: one crate/package
        // per repository) strip to an empty relative path; use "." to keep
        // `Dir==""` reserved exclusively for external modules.
        let dir = mod_dir.strip_prefix(root).unwrap_or(mod_dir).display().to_string().replace('\\', "/");
        let dir = if dir.is_empty() { ".".to_string() } else { dir };

        let info = manifest::read(mod_dir, collector.spec().language());
        let mut module = Module::new(mod_name.clone(), collector.spec().language().as_str(), dir);
        module.version = info.version;
        module.dependencies = info.dependencies;
        repo.modules.insert(mod_name.clone(), module);
    }

    for (mod_name, file) in collector.files() {
        if let Some(module) = repo.modules.get_mut(mod_name) {
            module.package_mut(&file.package);
            module.files.insert(file.path.clone(), file.clone());
        }
    }

    for (_sym_ref, sym) in collector.arena().iter() {
        let identity = Identity::new(sym.mod_path.clone(), sym.pkg_path.clone(), sym.name.clone());
        // Every admitted symbol belongs to a module `run()` already walked,
        // so this entry always already exists; `or_insert_with` only
        // guards against a spec bug surfacing a symbol outside its own
        // workspace listing rather than dropping it silently.
        let module = repo
            .modules
            .entry(sym.mod_path.clone())
            .or_insert_with(|| Module::new(sym.mod_path.clone(), collector.spec().language().as_str(), ""));
        if collector.is_main_package(&sym.mod_path, &sym.pkg_path) {
            module.package_mut(&sym.pkg_path).is_main = true;
        }
        if collector.is_test_package(&sym.mod_path, &sym.pkg_path) {
            module.package_mut(&sym.pkg_path).is_test = true;
        }
        let package = module.package_mut(&sym.pkg_path);

        match &sym.kind {
            PendingKind::Function(f) => {
                let mut func = Function::new(identity.clone(), sym.location.clone());
                func.exported = sym.exported;
                // A method's recovered body is just its own span; the
                // `impl S { ... }` scaffold around it (when one was
                // recovered) is spliced back in here, on export, per the
                // offset/content consistency rule for impl-block methods.
                func.content = match &f.impl_head {
                    Some(head) => format!("{head}{}}}", sym.content),
                    None => sym.content.clone(),
                };
                func.is_method = f.is_method;
                func.is_interface_method = f.is_interface_method;
                func.params = f.params.clone();
                func.results = f.results.clone();
                if let Some((iface_ref, method_name)) = &f.trait_method {
                    if let Some(id) = collector.interface_method_identity(*iface_ref, method_name) {
                        func.implements.push(id);
                    }
                }
                if let Some(receiver_ref) = f.receiver {
                    if let Some(type_identity) = collector.identity_of(receiver_ref) {
                        let interface = f.interface.and_then(|r| collector.identity_of(r));
                        func.receiver = Some(Receiver {
                            type_identity,
                            interface,
                            is_pointer: false,
                        });
                    }
                }
                for (src, dst) in [
                    (&f.function_calls, &mut func.function_calls),
                    (&f.method_calls, &mut func.method_calls),
                    (&f.types, &mut func.types),
                    (&f.global_vars, &mut func.global_vars),
                ] {
                    for dep in src {
                        if let Some(target) = collector.resolve_target(&dep.target) {
                            Function::push_dedup(dst, Dependency { identity: target, location: dep.location.clone() });
                        }
                    }
                }
                // Interface/trait methods live only in their interface
                // Type's `Methods` map (populated below from `t.methods`),
                // never in the package's own function table.
                if !func.is_interface_method {
                    package.functions.insert(identity.name.clone(), func);
                }
            }
            PendingKind::Type(t) => {
                let mut ty = Type::new(identity.clone(), sym.location.clone(), t.kind);
                ty.exported = sym.exported;
                ty.content = sym.content.clone();
                for target in &t.sub_struct {
                    if let Some(id) = collector.resolve_target(target) {
                        push_dedup(&mut ty.sub_struct, id);
                    }
                }
                for target in &t.inline_struct {
                    if let Some(id) = collector.resolve_target(target) {
                        push_dedup(&mut ty.inline_struct, id);
                    }
                }
                for target in &t.implements {
                    if let Some(id) = collector.resolve_target(target) {
                        push_dedup(&mut ty.implements, id);
                    }
                }
                for (name, method_ref) in &t.methods {
                    if let Some(id) = collector.identity_of(*method_ref) {
                        ty.methods.insert(name.clone(), id);
                    }
                }
                package.types.insert(identity.name.clone(), ty);
            }
            PendingKind::Var(v) => {
                let mut var = Var::new(identity.clone(), sym.location.clone());
                var.is_exported = sym.exported;
                var.content = sym.content.clone();
                var.is_const = v.is_const;
                var.is_pointer = v.is_pointer;
                var.type_identity = v.type_ref.and_then(|r| collector.identity_of(r));
                for dep in &v.dependencies {
                    if let Some(id) = collector.resolve_target(&dep.target) {
                        var.dependencies.push(Dependency { identity: id, location: dep.location.clone() });
                    }
                }
                for group_ref in &v.groups {
                    if let Some(id) = collector.identity_of(*group_ref) {
                        var.groups.push(id);
                    }
                }
                package.vars.insert(identity.name.clone(), var);
            }
            PendingKind::Unknown => {}
        }
    }

    repo.errors = collector.errors().to_vec();
    super::graph_builder::build_graph(&mut repo);
    repo
}

fn push_dedup(list: &mut Vec<Identity>, id: Identity) {
    if !list.contains(&id) {
        list.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::spec::{Language, for_language};

    fn dummy_collector(root: &Path) -> Collector {
        let spec = for_language(Language::Rust);
        let mut modules = HashMap::new();
        modules.insert("demo".to_string(), root.to_path_buf());
        Collector::new(root.to_path_buf(), spec, modules)
    }

    #[test]
    fn empty_collection_still_registers_its_workspace_module() {
        let dir = tempfile::tempdir().unwrap();
        let collector = dummy_collector(dir.path());
        let repo = export(&collector, "repo-0", dir.path());
        assert!(repo.modules.contains_key("demo"));
        assert_eq!(repo.modules["demo"].dir, ".");
        assert!(!repo.modules["demo"].is_external());
    }
}
