//! End-to-end CLI tests driving the published `uniast` binary.
//!
//! Tests that exercise a real `parse` run need an actual language server on
//! `PATH` (rust-analyzer for these fixtures); they skip themselves rather
//! than fail when one isn't installed on the machine running the suite.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn uniast() -> Command {
    Command::cargo_bin("uniast").expect("uniast binary built by this workspace")
}

fn rust_analyzer_available() -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join("rust-analyzer").is_file()))
        .unwrap_or(false)
}

mod cli_basics {
    use super::*;

    #[test]
    fn shows_help() {
        uniast()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("uniast"))
            .stdout(predicate::str::contains("parse"));
    }

    #[test]
    fn shows_help_with_no_arguments() {
        uniast().assert().success().stdout(predicate::str::contains("Usage"));
    }

    #[test]
    fn shows_version() {
        uniast()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        uniast().arg("scan").assert().failure().code(1);
    }
}

mod parse_argument_validation {
    use super::*;

    #[test]
    fn rejects_missing_repo_path() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");

        uniast()
            .args(["parse", "rust", missing.to_str().unwrap()])
            .assert()
            .failure()
            .code(1);
    }

    #[test]
    fn rejects_unsupported_language() {
        uniast().args(["parse", "haskell", "."]).assert().failure().code(1);
    }

    #[test]
    fn rejects_go_as_unsupported_core() {
        let fixture = fixtures_path().join("simple_rust");

        uniast()
            .args(["parse", "go", fixture.to_str().unwrap()])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("out of scope"));
    }

    #[test]
    fn rejects_explicit_missing_lsp_binary() {
        let fixture = fixtures_path().join("simple_rust");

        uniast()
            .args([
                "parse",
                "rust",
                fixture.to_str().unwrap(),
                "--lsp",
                "definitely-not-a-real-binary-xyz",
            ])
            .assert()
            .failure()
            .code(2);
    }
}

mod write_stub {
    use super::*;

    #[test]
    fn write_is_not_implemented() {
        let temp = TempDir::new().unwrap();
        let ast_path = temp.path().join("ast.json");
        std::fs::write(&ast_path, "{}").unwrap();

        uniast()
            .args(["write", ast_path.to_str().unwrap()])
            .assert()
            .failure()
            .code(3);
    }
}

mod parse_live_run {
    use super::*;

    #[test]
    fn extracts_a_uniast_document_from_the_rust_fixture() {
        if !rust_analyzer_available() {
            eprintln!("skipping: rust-analyzer not found on PATH");
            return;
        }

        let fixture = fixtures_path().join("simple_rust");
        let out = TempDir::new().unwrap();
        let ast_path = out.path().join("ast.json");

        uniast()
            .args(["parse", "rust", fixture.to_str().unwrap(), "-o", ast_path.to_str().unwrap()])
            .assert()
            .success();

        let document = std::fs::read_to_string(&ast_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&document).unwrap();
        assert!(value.get("Modules").is_some());

        let modules = value["Modules"].as_object().unwrap();
        let fixture_module = modules.get("simple_rust_fixture").expect("fixture module present");
        let packages = fixture_module["Packages"].as_object().unwrap();
        // `RustSpec::namespace` collapses `src/lib.rs` to the bare crate
        // name, not a synthetic "." root package.
        let root_pkg = packages.get("simple_rust_fixture").expect("root package present");
        let functions = root_pkg["Functions"].as_object().unwrap();
        assert!(functions.contains_key("run"));

        // `greeting.rs` ships a plain function, an associated (static)
        // function, and an instance method on the same type — exactly the
        // shape that would catch a mangling or IsMethod regression. It
        // lives in its own `simple_rust_fixture::greeting` package, not the
        // crate root, per `RustSpec::namespace`.
        let greeting_pkg = packages.get("simple_rust_fixture::greeting").expect("greeting package present");
        let functions = greeting_pkg["Functions"].as_object().unwrap();
        let types = greeting_pkg["Types"].as_object().unwrap();
        let greeter = types.get("Greeter").expect("Greeter type present");
        let methods = greeter["Methods"].as_object().unwrap();
        assert!(methods.contains_key("Greeter::new"), "methods: {methods:?}");
        assert!(methods.contains_key("Greeter.greet_default"), "methods: {methods:?}");

        let new_fn = functions.get("Greeter::new").expect("Greeter::new function present");
        assert_eq!(new_fn["IsMethod"], false);
        assert_eq!(new_fn["IsInterfaceMethod"], false);
        assert!(new_fn["Content"].as_str().unwrap().contains("impl Greeter {"));

        let greet_default_fn = functions.get("Greeter.greet_default").expect("Greeter.greet_default function present");
        assert_eq!(greet_default_fn["IsMethod"], true);
        assert!(greet_default_fn["Content"].as_str().unwrap().contains("impl Greeter {"));
    }
}
