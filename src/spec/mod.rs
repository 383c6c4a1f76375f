//! The per-language `Spec` strategy abstraction and the shared token/symbol
//! shapes the Collector feeds into it.

mod cpp;
mod go;
mod java;
mod python;
mod rust_lang;
mod typescript;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use lsp_types::SymbolKind;

use crate::errors::{CollectError, ConfigError};
use crate::model::{FileLine, Import};

pub use cpp::CppSpec;
pub use go::GoSpec;
pub use java::JavaSpec;
pub use python::PythonSpec;
pub use rust_lang::RustSpec;
pub use typescript::TypeScriptSpec;

/// The languages the CLI accepts. `Go` is accepted for forward
/// compatibility but resolves to `GoSpec`, which always errors out of
/// `workspace()` — see `Spec::for_language`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    TypeScript,
    Java,
    Cpp,
    Go,
}

impl Language {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "rust" => Ok(Language::Rust),
            "python" => Ok(Language::Python),
            "typescript" => Ok(Language::TypeScript),
            "java" => Ok(Language::Java),
            "cpp" => Ok(Language::Cpp),
            "go" => Ok(Language::Go),
            other => Err(ConfigError::UnsupportedLanguage(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::Go => "go",
        }
    }
}

/// A semantic-tokens entry: a range, a token type name, and its modifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub range: lsp_types::Range,
    pub token_type: String,
    pub modifiers: Vec<String>,
}

impl Token {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

/// A hierarchical document symbol, annotated with the semantic tokens whose
/// range lies inside it (populated by the Collector during file merge).
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub detail: Option<String>,
    pub kind: SymbolKind,
    pub range: lsp_types::Range,
    pub selection_range: lsp_types::Range,
    pub children: Vec<Symbol>,
    pub tokens: Vec<Token>,
}

/// Token indices dissected out of an impl-style block (`ImplSymbol`).
#[derive(Clone, Copy, Debug, Default)]
pub struct ImplDissection {
    pub interface_idx: Option<usize>,
    pub receiver_idx: Option<usize>,
    pub first_method_idx: Option<usize>,
}

/// Token indices dissected out of a function's own token stream
/// (`FunctionSymbol`).
#[derive(Clone, Debug, Default)]
pub struct FunctionDissection {
    pub receiver_idx: Option<usize>,
    pub type_param_idxs: Vec<usize>,
    pub input_idxs: Vec<usize>,
    pub output_idxs: Vec<usize>,
    /// Fallback return-type text for a result that carries no semantic
    /// token of its own (a builtin/primitive type name, typically), used
    /// only when `output_idxs` resolves to nothing.
    pub output_type_text: Option<String>,
}

/// The per-language strategy plug-in the generic Collector cannot derive
/// on its own.
pub trait Spec: Send + Sync {
    fn language(&self) -> Language;

    /// Discover internal modules within the repository: `ModuleName -> AbsDir`.
    fn workspace(&self, root: &Path) -> Result<HashMap<String, PathBuf>, ConfigError>;

    /// Given an absolute file path, derive `(ModPath, PkgPath)`.
    fn namespace(&self, root: &Path, file: &Path) -> Result<(String, String), CollectError>;

    /// True for files outside the language or inside an excluded directory.
    fn should_skip(&self, path: &Path) -> bool;

    /// Surface import declarations from a file's header.
    fn file_imports(&self, contents: &str) -> Vec<Import>;

    fn is_entity_token(&self, token: &Token) -> bool;
    fn is_entity_symbol(&self, sym: &Symbol) -> bool;
    fn is_doc_token(&self, token: &Token) -> bool;
    fn is_std_token(&self, token: &Token) -> bool;
    fn token_kind(&self, token: &Token) -> SymbolKind;

    /// Index into `sym.tokens` carrying the `declaration` modifier, skipping
    /// doc tokens. `None` if absent.
    fn declare_token_of_symbol(&self, sym: &Symbol) -> Option<usize>;

    fn is_public_symbol(&self, sym: &Symbol) -> bool;
    fn is_main_function(&self, sym: &Symbol) -> bool;

    /// True when the language has explicit `impl`-style blocks (Rust).
    fn has_impl_symbol(&self) -> bool;
    fn impl_symbol(&self, sym: &Symbol) -> ImplDissection;
    /// `contents` is the full file text the symbol's token ranges were
    /// decoded against, needed by languages that recover result types from
    /// raw signature text rather than from a dedicated semantic token.
    fn function_symbol(&self, sym: &Symbol, contents: &str) -> FunctionDissection;

    /// Recover a name for a symbol whose definition sits in a file the
    /// Collector will not load.
    fn get_unloaded_symbol(&self, from_token: &Token, define_loc: &FileLine) -> Result<String, CollectError>;

    /// Symbol kinds the Collector must always keep even if unreachable.
    fn protected_symbol_kinds(&self) -> Vec<SymbolKind>;

    /// The file opened via `didOpen` to settle the language server before
    /// issuing real requests. Deterministic, lexicographically-first choice
    /// among qualifying candidates.
    fn warm_up_file(&self, root: &Path) -> Option<PathBuf>;

    /// Default language-server binary name looked up on `PATH`.
    fn default_lsp_binary(&self) -> &'static str;
}

/// Construct the `Spec` for a language. `Go` always succeeds here (the
/// stub itself fails inside `workspace()`, matching the "configuration
/// error" contract rather than failing construction).
pub fn for_language(language: Language) -> Box<dyn Spec> {
    match language {
        Language::Rust => Box::new(RustSpec::new()),
        Language::Python => Box::new(PythonSpec::new()),
        Language::TypeScript => Box::new(TypeScriptSpec::new()),
        Language::Java => Box::new(JavaSpec::new()),
        Language::Cpp => Box::new(CppSpec::new()),
        Language::Go => Box::new(GoSpec::new()),
    }
}
