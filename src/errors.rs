//! Structured error types for the three fatal-vs-logged error classes.
//!
//! `ConfigError` and the handshake-class variants of `LspError` are fatal
//! (they map to a non-zero exit code in `main`); `CollectError` is the
//! non-fatal, per-file/per-symbol/data-model class that gets accumulated
//! into `Repository.errors` rather than aborting the run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("repository path does not exist: {0}")]
    RepositoryNotFound(String),
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("language server binary not found for {language} (looked for `{binary}` on PATH)")]
    LspBinaryNotFound { language: String, binary: String },
    #[error("the Go direct-parser path is out of scope for this core; use a Go-specific tool")]
    GoNotSupported,
    #[error("failed to parse config file {path}: {source}")]
    InvalidConfig {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum LspError {
    #[error("failed to spawn language server `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`initialize` handshake timed out after {0:?}")]
    InitializeTimeout(std::time::Duration),
    #[error("language server exited before processing started (status: {0:?})")]
    ServerExited(Option<i32>),
    #[error("malformed JSON-RPC frame: {0}")]
    Protocol(String),
    #[error("request `{method}` (id {id}) timed out")]
    RequestTimeout { method: String, id: u64 },
    #[error("request `{method}` (id {id}) returned a JSON-RPC error: {message}")]
    RequestFailed { method: String, id: u64, message: String },
    #[error("I/O error talking to the language server: {0}")]
    Io(#[from] std::io::Error),
}

impl LspError {
    /// Handshake-class failures are fatal (exit code 2); everything else is
    /// caught by the Collector and downgraded to a logged `CollectError`.
    pub fn is_handshake_fatal(&self) -> bool {
        matches!(
            self,
            LspError::Spawn { .. } | LspError::InitializeTimeout(_) | LspError::ServerExited(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("unreadable file {path}: {source}")]
    UnreadableFile { path: String, source: std::io::Error },
    #[error("definition not found for token at {uri}:{line}:{col}")]
    DefinitionNotFound { uri: String, line: u32, col: u32 },
    #[error("could not recover a name for the unloaded symbol referenced from {uri}")]
    UnrecoverableExternalName { uri: String },
    #[error("duplicate identity produced: {0}")]
    DuplicateIdentity(String),
    #[error("missing receiver for method {0}")]
    MissingReceiver(String),
    #[error(transparent)]
    Lsp(#[from] LspError),
}
