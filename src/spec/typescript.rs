//! The TypeScript `Spec`: `package.json`-rooted modules, re-export capture
//! left intentionally partial (see DESIGN.md).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::errors::{CollectError, ConfigError};
use crate::model::{FileLine, Import};

use super::{FunctionDissection, ImplDissection, Language, Spec, Symbol, SymbolKind, Token};

static IMPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*import\s+(?:type\s+)?(?:\{[^}]*\}|\*\s+as\s+\w+|\w+)\s+from\s+['"]([^'"]+)['"]"#).unwrap());
static REEXPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*export\s+(?:\*|\{[^}]*\})\s+from\s+['"]([^'"]+)['"]"#).unwrap());

pub struct TypeScriptSpec;

impl TypeScriptSpec {
    pub fn new() -> Self {
        Self
    }

    fn package_root(&self, root: &Path, file: &Path) -> PathBuf {
        let mut dir = file.parent().unwrap_or(root).to_path_buf();
        loop {
            if dir.join("package.json").is_file() {
                return dir;
            }
            if dir == root || !dir.pop() {
                return root.to_path_buf();
            }
        }
    }
}

impl Default for TypeScriptSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl Spec for TypeScriptSpec {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn workspace(&self, root: &Path) -> Result<HashMap<String, PathBuf>, ConfigError> {
        let mut modules = HashMap::new();
        for entry in WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.file_name() != "node_modules" && e.file_name() != ".git")
            .filter_map(Result::ok)
        {
            if entry.file_name() != "package.json" {
                continue;
            }
            let Ok(contents) = std::fs::read_to_string(entry.path()) else {
                continue;
            };
            let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&contents) else {
                continue;
            };
            let name = parsed
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or("current")
                .to_string();
            let dir = entry.path().parent().unwrap_or(root).to_path_buf();
            modules.insert(name, dir);
        }
        if modules.is_empty() {
            modules.insert("current".to_string(), root.to_path_buf());
        }
        Ok(modules)
    }

    fn namespace(&self, root: &Path, file: &Path) -> Result<(String, String), CollectError> {
        let pkg_root = self.package_root(root, file);
        let mod_name = std::fs::read_to_string(pkg_root.join("package.json"))
            .ok()
            .and_then(|c| serde_json::from_str::<serde_json::Value>(&c).ok())
            .and_then(|v| v.get("name").and_then(|n| n.as_str()).map(|s| s.to_string()))
            .unwrap_or_else(|| "current".to_string());
        let rel = file.strip_prefix(&pkg_root).unwrap_or(file).with_extension("");
        let pkg_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");
        Ok((mod_name, pkg_path))
    }

    fn should_skip(&self, path: &Path) -> bool {
        if path
            .components()
            .any(|c| matches!(c.as_os_str().to_str(), Some("node_modules" | "dist" | "build")))
        {
            return true;
        }
        !matches!(path.extension().and_then(|e| e.to_str()), Some("ts" | "tsx"))
    }

    fn file_imports(&self, contents: &str) -> Vec<Import> {
        let mut imports: Vec<Import> = IMPORT_LINE
            .captures_iter(contents)
            .map(|cap| Import::bare(cap[1].to_string()))
            .collect();
        // Re-export linkage is intentionally left partial: the re-export
        // is recorded as an Import on the re-exporting file, not walked
        // through to its ultimate origin identity.
        imports.extend(REEXPORT_LINE.captures_iter(contents).map(|cap| Import::bare(cap[1].to_string())));
        imports
    }

    fn is_entity_token(&self, token: &Token) -> bool {
        matches!(
            token.token_type.as_str(),
            "function" | "method" | "variable" | "parameter" | "class" | "interface" | "enum" | "property" | "typeParameter"
        )
    }

    fn is_entity_symbol(&self, sym: &Symbol) -> bool {
        matches!(
            sym.kind,
            SymbolKind::FUNCTION | SymbolKind::METHOD | SymbolKind::VARIABLE | SymbolKind::CLASS | SymbolKind::INTERFACE | SymbolKind::ENUM | SymbolKind::PROPERTY
        )
    }

    fn is_doc_token(&self, token: &Token) -> bool {
        token.token_type == "comment"
    }

    fn is_std_token(&self, token: &Token) -> bool {
        token.has_modifier("defaultLibrary")
    }

    fn token_kind(&self, token: &Token) -> SymbolKind {
        match token.token_type.as_str() {
            "function" => SymbolKind::FUNCTION,
            "method" => SymbolKind::METHOD,
            "class" => SymbolKind::CLASS,
            "interface" => SymbolKind::INTERFACE,
            "enum" => SymbolKind::ENUM,
            "property" => SymbolKind::PROPERTY,
            _ => SymbolKind::VARIABLE,
        }
    }

    fn declare_token_of_symbol(&self, sym: &Symbol) -> Option<usize> {
        sym.tokens.iter().position(|t| !self.is_doc_token(t) && t.has_modifier("declaration"))
    }

    fn is_public_symbol(&self, sym: &Symbol) -> bool {
        sym.detail.as_deref().map(|d| !d.contains("private")).unwrap_or(true)
    }

    fn is_main_function(&self, sym: &Symbol) -> bool {
        sym.kind == SymbolKind::FUNCTION && (sym.name == "main" || sym.name == "default")
    }

    fn has_impl_symbol(&self) -> bool {
        false
    }

    fn impl_symbol(&self, _sym: &Symbol) -> ImplDissection {
        ImplDissection::default()
    }

    fn function_symbol(&self, sym: &Symbol, _contents: &str) -> FunctionDissection {
        let receiver_idx = sym
            .tokens
            .iter()
            .position(|t| t.token_type == "parameter" && t.has_modifier("thisParameter"));
        let input_idxs = sym
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.token_type == "parameter" && !t.has_modifier("thisParameter"))
            .map(|(i, _)| i)
            .collect();
        FunctionDissection {
            receiver_idx,
            type_param_idxs: Vec::new(),
            input_idxs,
            output_idxs: Vec::new(),
            output_type_text: None,
        }
    }

    fn get_unloaded_symbol(&self, _from_token: &Token, define_loc: &FileLine) -> Result<String, CollectError> {
        Path::new(&define_loc.file)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| CollectError::UnrecoverableExternalName {
                uri: define_loc.file.clone(),
            })
    }

    fn protected_symbol_kinds(&self) -> Vec<SymbolKind> {
        vec![SymbolKind::FUNCTION, SymbolKind::CLASS, SymbolKind::INTERFACE]
    }

    fn warm_up_file(&self, root: &Path) -> Option<PathBuf> {
        for candidate in ["src/index.ts", "index.ts"] {
            let path = root.join(candidate);
            if path.is_file() {
                return Some(path);
            }
        }
        let mut candidates: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.file_name() != "node_modules")
            .filter_map(Result::ok)
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("ts"))
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    }

    fn default_lsp_binary(&self) -> &'static str {
        "typescript-language-server"
    }
}
