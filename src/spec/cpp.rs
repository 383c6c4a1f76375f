//! The C/C++ `Spec`: since C/C++ has no package-manifest convention to
//! derive modules from, every file collapses into a single synthesized
//! `"current"` module.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::errors::{CollectError, ConfigError};
use crate::model::{FileLine, Import};

use super::{FunctionDissection, ImplDissection, Language, Spec, Symbol, SymbolKind, Token};

static INCLUDE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^\s*#include\s*[<"]([^>"]+)[>"]"#).unwrap());

pub struct CppSpec;

impl CppSpec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CppSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl Spec for CppSpec {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn workspace(&self, root: &Path) -> Result<HashMap<String, PathBuf>, ConfigError> {
        let mut modules = HashMap::new();
        modules.insert("current".to_string(), root.to_path_buf());
        Ok(modules)
    }

    fn namespace(&self, root: &Path, file: &Path) -> Result<(String, String), CollectError> {
        let rel = file.strip_prefix(root).unwrap_or(file).with_extension("");
        let segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Ok(("current".to_string(), segments.join("/")))
    }

    fn should_skip(&self, path: &Path) -> bool {
        if path.components().any(|c| matches!(c.as_os_str().to_str(), Some("build" | "cmake-build-debug"))) {
            return true;
        }
        !matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("c" | "cc" | "cpp" | "cxx" | "h" | "hpp")
        )
    }

    fn file_imports(&self, contents: &str) -> Vec<Import> {
        INCLUDE_LINE.captures_iter(contents).map(|cap| Import::bare(cap[1].to_string())).collect()
    }

    fn is_entity_token(&self, token: &Token) -> bool {
        matches!(
            token.token_type.as_str(),
            "function" | "method" | "variable" | "parameter" | "class" | "struct" | "enum" | "typeParameter"
        )
    }

    fn is_entity_symbol(&self, sym: &Symbol) -> bool {
        matches!(
            sym.kind,
            SymbolKind::FUNCTION | SymbolKind::METHOD | SymbolKind::VARIABLE | SymbolKind::CLASS | SymbolKind::STRUCT | SymbolKind::ENUM
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
            "struct" => SymbolKind::STRUCT,
            "enum" => SymbolKind::ENUM,
            _ => SymbolKind::VARIABLE,
        }
    }

    fn declare_token_of_symbol(&self, sym: &Symbol) -> Option<usize> {
        sym.tokens.iter().position(|t| !self.is_doc_token(t) && t.has_modifier("declaration"))
    }

    fn is_public_symbol(&self, sym: &Symbol) -> bool {
        sym.detail.as_deref().map(|d| !d.contains("static")).unwrap_or(true)
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
        let input_idxs = sym
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.token_type == "parameter")
            .map(|(i, _)| i)
            .collect();
        FunctionDissection {
            receiver_idx: None,
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
        vec![SymbolKind::FUNCTION, SymbolKind::CLASS, SymbolKind::STRUCT]
    }

    fn warm_up_file(&self, root: &Path) -> Option<PathBuf> {
        let mut candidates: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .map(|e| e.into_path())
            .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("c" | "cpp")))
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    }

    fn default_lsp_binary(&self) -> &'static str {
        "clangd"
    }
}
