//! The Python `Spec`: dotted module paths, `pyproject.toml`/`setup.py`
//! workspace roots, underscore-prefix visibility.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::errors::CollectError;
use crate::model::{FileLine, Import};

use super::{FunctionDissection, ImplDissection, Language, Spec, Symbol, SymbolKind, Token};

static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*import\s+([\w.]+)(?:\s+as\s+(\w+))?\s*$").unwrap());
static FROM_IMPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*from\s+([\w.]+)\s+import\s+([\w, *]+)\s*$").unwrap());

pub struct PythonSpec;

impl PythonSpec {
    pub fn new() -> Self {
        Self
    }

    fn package_root(&self, root: &Path, file: &Path) -> PathBuf {
        let mut dir = file.parent().unwrap_or(root).to_path_buf();
        loop {
            if dir.join("pyproject.toml").is_file() || dir.join("setup.py").is_file() {
                return dir;
            }
            if dir == root || !dir.pop() {
                return root.to_path_buf();
            }
        }
    }
}

impl Default for PythonSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl Spec for PythonSpec {
    fn language(&self) -> Language {
        Language::Python
    }

    fn workspace(&self, root: &Path) -> Result<HashMap<String, PathBuf>, crate::errors::ConfigError> {
        let mut modules = HashMap::new();
        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("current")
            .to_string();
        modules.insert(name, root.to_path_buf());
        Ok(modules)
    }

    fn namespace(&self, root: &Path, file: &Path) -> Result<(String, String), CollectError> {
        let pkg_root = self.package_root(root, file);
        let mod_name = root.file_name().and_then(|n| n.to_str()).unwrap_or("current").to_string();
        let rel = file.strip_prefix(&pkg_root).unwrap_or(file).with_extension("");
        let mut segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if segments.last().map(|s| s == "__init__").unwrap_or(false) {
            segments.pop();
        }
        Ok((mod_name, segments.join(".")))
    }

    fn should_skip(&self, path: &Path) -> bool {
        if path
            .components()
            .any(|c| matches!(c.as_os_str().to_str(), Some("__pycache__" | ".venv" | "venv" | "site-packages")))
        {
            return true;
        }
        path.extension().and_then(|e| e.to_str()) != Some("py")
    }

    fn file_imports(&self, contents: &str) -> Vec<Import> {
        let mut imports = Vec::new();
        for cap in IMPORT_LINE.captures_iter(contents) {
            match cap.get(2) {
                Some(alias) => imports.push(Import::aliased(alias.as_str().to_string(), cap[1].to_string())),
                None => imports.push(Import::bare(cap[1].to_string())),
            }
        }
        for cap in FROM_IMPORT_LINE.captures_iter(contents) {
            imports.push(Import::bare(format!("{}.{}", &cap[1], cap[2].trim())));
        }
        imports
    }

    fn is_entity_token(&self, token: &Token) -> bool {
        matches!(
            token.token_type.as_str(),
            "function" | "method" | "variable" | "parameter" | "class" | "property" | "decorator"
        )
    }

    fn is_entity_symbol(&self, sym: &Symbol) -> bool {
        matches!(
            sym.kind,
            SymbolKind::FUNCTION | SymbolKind::METHOD | SymbolKind::VARIABLE | SymbolKind::CLASS | SymbolKind::CONSTANT | SymbolKind::PROPERTY
        )
    }

    fn is_doc_token(&self, token: &Token) -> bool {
        token.token_type == "comment" || token.token_type == "string.doc"
    }

    fn is_std_token(&self, token: &Token) -> bool {
        token.has_modifier("defaultLibrary")
    }

    fn token_kind(&self, token: &Token) -> SymbolKind {
        match token.token_type.as_str() {
            "function" => SymbolKind::FUNCTION,
            "method" => SymbolKind::METHOD,
            "class" => SymbolKind::CLASS,
            "property" => SymbolKind::PROPERTY,
            _ => SymbolKind::VARIABLE,
        }
    }

    fn declare_token_of_symbol(&self, sym: &Symbol) -> Option<usize> {
        sym.tokens.iter().position(|t| !self.is_doc_token(t) && t.has_modifier("declaration"))
    }

    fn is_public_symbol(&self, sym: &Symbol) -> bool {
        !sym.name.starts_with('_')
    }

    fn is_main_function(&self, sym: &Symbol) -> bool {
        sym.kind == SymbolKind::FUNCTION && sym.name == "main"
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
            .position(|t| t.token_type == "parameter" && t.has_modifier("selfParameter"));
        let input_idxs = sym
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.token_type == "parameter" && !t.has_modifier("selfParameter"))
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
        vec![SymbolKind::FUNCTION, SymbolKind::CLASS]
    }

    fn warm_up_file(&self, root: &Path) -> Option<PathBuf> {
        let mut candidates: Vec<PathBuf> = WalkDir::new(root)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("py"))
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    }

    fn default_lsp_binary(&self) -> &'static str {
        "pylsp"
    }
}
