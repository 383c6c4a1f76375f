//! Materializes `Repository.Graph`: walks every `Function`/`Type`/`Var` in
//! every internal module and assembles the bidirectional relation graph.
//! Runs as the Exporter's final pass, which only ever appends relations —
//! it never rewrites or removes an entity already snapshotted.

use std::collections::HashMap;

use crate::model::{Identity, Node, NodeType, Repository, TypeKind};

pub fn build_graph(repo: &mut Repository) {
    let mut kinds: HashMap<Identity, NodeType> = HashMap::new();
    let mut type_kinds: HashMap<Identity, TypeKind> = HashMap::new();
    for module in repo.modules.values() {
        if module.is_external() {
            continue;
        }
        for package in module.packages.values() {
            for func in package.functions.values() {
                kinds.insert(func.identity.clone(), NodeType::Func);
            }
            for ty in package.types.values() {
                kinds.insert(ty.identity.clone(), NodeType::Type);
                type_kinds.insert(ty.identity.clone(), ty.type_kind);
            }
            for var in package.vars.values() {
                kinds.insert(var.identity.clone(), NodeType::Var);
            }
        }
    }

    let mut graph: HashMap<String, Node> = HashMap::new();

    for module in repo.modules.values() {
        // "External modules (Module.Dir=="") are skipped in the outer
        // loop; nodes they host still appear in the graph if referenced
        // from within" — they're created lazily by `ensure_node` below.
        if module.is_external() {
            continue;
        }
        for package in module.packages.values() {
            for func in package.functions.values() {
                let src = &func.identity;
                ensure_node(&mut graph, src).fill_type(NodeType::Func);
                for dep in func
                    .function_calls
                    .iter()
                    .chain(func.method_calls.iter())
                    .chain(func.types.iter())
                    .chain(func.global_vars.iter())
                {
                    add_dependency(&mut graph, &kinds, src, &dep.identity);
                }
                // A trait-impl method (`T<S>.f`) implements the trait's own
                // declaration of that method (`T.f`); unlike `Type.Implements`
                // this is always an `Implement`, never an `Inherit`.
                for dst in &func.implements {
                    add_implement(&mut graph, &kinds, src, dst);
                }
            }

            for ty in package.types.values() {
                let src = &ty.identity;
                ensure_node(&mut graph, src).fill_type(NodeType::Type);
                for dst in ty.sub_struct.iter().chain(ty.inline_struct.iter()) {
                    add_dependency(&mut graph, &kinds, src, dst);
                }
                for dst in &ty.implements {
                    // `Type.Implements` carries both interface and
                    // parent-class targets (the latter from
                    // `typeHierarchy/supertypes` on languages without
                    // `impl` blocks); the concrete relation kind is
                    // decided here by the target's own `TypeKind`.
                    if type_kinds.get(dst) == Some(&TypeKind::Interface) {
                        add_implement(&mut graph, &kinds, src, dst);
                    } else {
                        add_inherit(&mut graph, &kinds, src, dst);
                    }
                }
            }

            for var in package.vars.values() {
                let src = &var.identity;
                ensure_node(&mut graph, src).fill_type(NodeType::Var);
                if let Some(dst) = &var.type_identity {
                    add_dependency(&mut graph, &kinds, src, dst);
                }
                for dep in &var.dependencies {
                    add_dependency(&mut graph, &kinds, src, &dep.identity);
                }
                for dst in &var.groups {
                    add_group(&mut graph, &kinds, src, dst);
                }
            }
        }
    }

    repo.graph = graph;
}

fn ensure_node<'g>(graph: &'g mut HashMap<String, Node>, id: &Identity) -> &'g mut Node {
    graph.entry(id.full()).or_insert_with(|| Node::new(id.clone(), NodeType::Unknown))
}

/// Appends `{dst, Dependency}` to `src` and `{src, Reference}` to `dst`,
/// creating either node as needed and filling `dst`'s kind from the
/// entity table.
fn add_dependency(graph: &mut HashMap<String, Node>, kinds: &HashMap<Identity, NodeType>, src: &Identity, dst: &Identity) {
    ensure_node(graph, src).add_dependency(dst.clone());
    let dst_node = ensure_node(graph, dst);
    if let Some(kind) = kinds.get(dst) {
        dst_node.fill_type(*kind);
    }
    dst_node.add_reference(src.clone());
}

fn add_implement(graph: &mut HashMap<String, Node>, kinds: &HashMap<Identity, NodeType>, src: &Identity, dst: &Identity) {
    ensure_node(graph, src).add_implement(dst.clone());
    let dst_node = ensure_node(graph, dst);
    if let Some(kind) = kinds.get(dst) {
        dst_node.fill_type(*kind);
    }
}

fn add_inherit(graph: &mut HashMap<String, Node>, kinds: &HashMap<Identity, NodeType>, src: &Identity, dst: &Identity) {
    ensure_node(graph, src).add_inherit(dst.clone());
    let dst_node = ensure_node(graph, dst);
    if let Some(kind) = kinds.get(dst) {
        dst_node.fill_type(*kind);
    }
}

fn add_group(graph: &mut HashMap<String, Node>, kinds: &HashMap<Identity, NodeType>, src: &Identity, dst: &Identity) {
    ensure_node(graph, src).add_group(dst.clone());
    let dst_node = ensure_node(graph, dst);
    if let Some(kind) = kinds.get(dst) {
        dst_node.fill_type(*kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileLine, Function, Module, Package, Var};

    fn repo_with(functions: Vec<(&str, Vec<&str>)>) -> Repository {
        let mut repo = Repository::new("repo-0", "/tmp/repo");
        let mut module = Module::new("demo", "rust", ".");
        let mut package = Package::new("demo");
        for (name, calls) in &functions {
            let identity = Identity::new("demo", "demo", *name);
            let mut func = Function::new(identity.clone(), FileLine::new("src/lib.rs", 1, 0, 0));
            for callee in calls {
                let callee_identity = Identity::new("demo", "demo", *callee);
                func.function_calls.push(crate::model::Dependency::new(callee_identity));
            }
            package.functions.insert(name.to_string(), func);
        }
        module.packages.insert("demo".to_string(), package);
        repo.modules.insert("demo".to_string(), module);
        repo
    }

    #[test]
    fn dependency_and_reference_are_mutually_consistent() {
        let mut repo = repo_with(vec![("caller", vec!["callee"]), ("callee", vec![])]);
        build_graph(&mut repo);

        let caller = Identity::new("demo", "demo", "caller");
        let callee = Identity::new("demo", "demo", "callee");

        let caller_node = &repo.graph[&caller.full()];
        assert!(caller_node.dependencies.iter().any(|r| r.identity == callee));
        assert_eq!(caller_node.node_type, NodeType::Func);

        let callee_node = &repo.graph[&callee.full()];
        assert!(callee_node.references.iter().any(|r| r.identity == caller));
        assert_eq!(callee_node.node_type, NodeType::Func);
    }

    #[test]
    fn call_to_an_unadmitted_symbol_still_gets_an_unknown_node() {
        let mut repo = repo_with(vec![("caller", vec!["vendored::external_fn"])]);
        build_graph(&mut repo);

        let target = Identity::new("demo", "demo", "vendored::external_fn");
        let node = &repo.graph[&target.full()];
        assert_eq!(node.node_type, NodeType::Unknown);
    }

    #[test]
    fn var_groups_record_a_group_relation_without_reference_mirroring() {
        let mut repo = Repository::new("repo-0", "/tmp/repo");
        let mut module = Module::new("demo", "rust", ".");
        let mut package = Package::new("demo");
        let a = Identity::new("demo", "demo", "a");
        let b = Identity::new("demo", "demo", "b");
        let mut var_a = Var::new(a.clone(), FileLine::new("src/lib.rs", 1, 0, 0));
        var_a.groups.push(b.clone());
        package.vars.insert("a".to_string(), var_a);
        package.vars.insert("b".to_string(), Var::new(b.clone(), FileLine::new("src/lib.rs", 1, 0, 0)));
        module.packages.insert("demo".to_string(), package);
        repo.modules.insert("demo".to_string(), module);

        build_graph(&mut repo);

        let node_a = &repo.graph[&a.full()];
        assert!(node_a.groups.iter().any(|r| r.identity == b));
        assert!(node_a.references.is_empty());
    }
}
