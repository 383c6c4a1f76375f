//! `CollectOption`: the knobs the CLI/config layer feeds into a run.

use tokio_util::sync::CancellationToken;

use crate::spec::Language;

#[derive(Clone, Debug)]
pub struct CollectOption {
    pub language: Language,
    pub load_external_symbol: bool,
    pub need_std_symbol: bool,
    pub no_need_comment: bool,
    pub not_need_test: bool,
    pub excludes: Vec<String>,
    /// Spec-listed toggle for per-package (rather than whole-workspace)
    /// collection. Not read anywhere in the Collector yet — every run walks
    /// the full workspace regardless of this flag.
    pub load_by_packages: bool,
    pub lsp_binary: Option<String>,
    pub lsp_args: Vec<String>,
    /// Threaded through every LSP call and file-loop iteration. On
    /// cancellation the Collector stops after the in-flight file and
    /// returns its partial state; the caller decides whether to serialize
    /// it.
    pub cancel: CancellationToken,
}

impl CollectOption {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            load_external_symbol: false,
            need_std_symbol: false,
            no_need_comment: false,
            not_need_test: false,
            excludes: Vec::new(),
            load_by_packages: false,
            lsp_binary: None,
            lsp_args: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }
}
