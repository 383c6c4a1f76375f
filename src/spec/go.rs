//! Go support is intentionally out of scope for the LSP-driven collection
//! path this crate implements. `workspace()` always returns a
//! configuration error so the CLI can report it uniformly instead of
//! silently mis-collecting a Go repository through an LSP it was never
//! given.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::{CollectError, ConfigError};
use crate::model::{FileLine, Import};

use super::{FunctionDissection, ImplDissection, Language, Spec, Symbol, SymbolKind, Token};

pub struct GoSpec;

impl GoSpec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GoSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl Spec for GoSpec {
    fn language(&self) -> Language {
        Language::Go
    }

    fn workspace(&self, _root: &Path) -> Result<HashMap<String, PathBuf>, ConfigError> {
        Err(ConfigError::GoNotSupported)
    }

    fn namespace(&self, _root: &Path, _file: &Path) -> Result<(String, String), CollectError> {
        unreachable!("workspace() always errors before namespace() is reached")
    }

    fn should_skip(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) != Some("go")
    }

    fn file_imports(&self, _contents: &str) -> Vec<Import> {
        Vec::new()
    }

    fn is_entity_token(&self, _token: &Token) -> bool {
        false
    }

    fn is_entity_symbol(&self, _sym: &Symbol) -> bool {
        false
    }

    fn is_doc_token(&self, _token: &Token) -> bool {
        false
    }

    fn is_std_token(&self, _token: &Token) -> bool {
        false
    }

    fn token_kind(&self, _token: &Token) -> SymbolKind {
        SymbolKind::VARIABLE
    }

    fn declare_token_of_symbol(&self, _sym: &Symbol) -> Option<usize> {
        None
    }

    fn is_public_symbol(&self, _sym: &Symbol) -> bool {
        false
    }

    fn is_main_function(&self, _sym: &Symbol) -> bool {
        false
    }

    fn has_impl_symbol(&self) -> bool {
        false
    }

    fn impl_symbol(&self, _sym: &Symbol) -> ImplDissection {
        ImplDissection::default()
    }

    fn function_symbol(&self, _sym: &Symbol, _contents: &str) -> FunctionDissection {
        FunctionDissection::default()
    }

    fn get_unloaded_symbol(&self, _from_token: &Token, define_loc: &FileLine) -> Result<String, CollectError> {
        Err(CollectError::UnrecoverableExternalName {
            uri: define_loc.file.clone(),
        })
    }

    fn protected_symbol_kinds(&self) -> Vec<SymbolKind> {
        Vec::new()
    }

    fn warm_up_file(&self, _root: &Path) -> Option<PathBuf> {
        None
    }

    fn default_lsp_binary(&self) -> &'static str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_always_errors() {
        let spec = GoSpec::new();
        let err = spec.workspace(Path::new("/tmp")).unwrap_err();
        assert!(matches!(err, ConfigError::GoNotSupported));
    }
}
