//! Owns a language-server subprocess and speaks a minimal LSP 3.x client
//! dialect over its stdio.

use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::time::timeout;

use crate::errors::LspError;

use super::wire::{read_message, write_notification, write_request, InboundMessage};

const LIGHT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const HEAVY_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

type Waiter = oneshot::Sender<Result<Value, LspError>>;

/// `Starting -> Initializing -> Ready -> ShuttingDown -> Exited`, with a
/// terminal `Error` state reachable from any point that fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Starting,
    Initializing,
    Ready,
    ShuttingDown,
    Exited,
    Error,
}

/// A minimal, concurrency-safe LSP client. Cheap to clone: the subprocess
/// handle and file cache are shared via `Arc`.
pub struct LspClient {
    child: Arc<Mutex<Child>>,
    stdin: Arc<Mutex<ChildStdin>>,
    pending: Arc<DashMap<u64, Waiter>>,
    next_id: AtomicU64,
    file_cache: Arc<DashMap<String, String>>,
    state: Arc<Mutex<ClientState>>,
}

impl LspClient {
    /// Spawn `command` with `args`, rooted at `cwd`. Starts the background
    /// demultiplexer task before returning.
    pub async fn spawn(command: &str, args: &[String], cwd: &Path) -> Result<Self, LspError> {
        let mut child = Command::new(command)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LspError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");
        let stderr = child.stderr.take().expect("piped stderr");

        let pending: Arc<DashMap<u64, Waiter>> = Arc::new(DashMap::new());
        let client = Self {
            child: Arc::new(Mutex::new(child)),
            stdin: Arc::new(Mutex::new(stdin)),
            pending: pending.clone(),
            next_id: AtomicU64::new(1),
            file_cache: Arc::new(DashMap::new()),
            state: Arc::new(Mutex::new(ClientState::Starting)),
        };

        client.spawn_reader(stdout);
        client.spawn_stderr_logger(stderr);
        Ok(client)
    }

    fn spawn_reader(&self, stdout: tokio::process::ChildStdout) {
        let pending = self.pending.clone();
        let state = self.state.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            loop {
                match read_message(&mut reader).await {
                    Ok(Some(msg)) => dispatch(msg, &pending),
                    Ok(None) => {
                        tracing::debug!("language server closed stdout");
                        *state.lock().await = ClientState::Exited;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "malformed frame from language server");
                    }
                }
            }
        });
    }

    fn spawn_stderr_logger(&self, stderr: tokio::process::ChildStderr) {
        tokio::spawn(async move {
            use tokio::io::AsyncBufReadExt;
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(target: "lsp::stderr", "{line}");
            }
        });
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Issue a typed request and await its response (or the given timeout).
    /// Late responses with an id nobody is waiting on are discarded by the
    /// reader task, which simply finds no entry in `pending`.
    pub async fn call(&self, method: &str, params: Value, heavy: bool) -> Result<Value, LspError> {
        let id = self.allocate_id();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        {
            let mut stdin = self.stdin.lock().await;
            write_request(&mut *stdin, id, method, params).await?;
        }

        let budget = if heavy { HEAVY_REQUEST_TIMEOUT } else { LIGHT_REQUEST_TIMEOUT };
        match timeout(budget, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_canceled)) => Err(LspError::RequestFailed {
                method: method.to_string(),
                id,
                message: "waiter dropped".to_string(),
            }),
            Err(_) => {
                self.pending.remove(&id);
                Err(LspError::RequestTimeout {
                    method: method.to_string(),
                    id,
                })
            }
        }
    }

    pub async fn notify(&self, method: &str, params: Value) -> Result<(), LspError> {
        let mut stdin = self.stdin.lock().await;
        write_notification(&mut *stdin, method, params).await?;
        Ok(())
    }

    /// Perform the `initialize`/`initialized` handshake, then open the
    /// language's warm-up file and wait the settle duration before
    /// returning `Ready`. Returns the server's raw `initialize` result so
    /// the caller can read `capabilities.semanticTokensProvider.legend`.
    pub async fn initialize(&self, root: &Path, warm_up_file: Option<(&Path, &str)>) -> Result<Value, LspError> {
        *self.state.lock().await = ClientState::Initializing;

        let root_uri = format!("file://{}", root.display());
        let params = json!({
            "processId": std::process::id(),
            "rootUri": root_uri,
            "capabilities": {
                "workspace": { "workspaceFolders": true, "symbol": { "dynamicRegistration": false } },
                "textDocument": {
                    "documentSymbol": { "hierarchicalDocumentSymbolSupport": true },
                    "definition": { "dynamicRegistration": false },
                    "references": { "dynamicRegistration": false },
                    "implementation": { "dynamicRegistration": false },
                    "hover": { "dynamicRegistration": false },
                    "semanticTokens": { "requests": { "full": true } },
                    "typeHierarchy": { "dynamicRegistration": false },
                }
            },
            "workspaceFolders": [{ "uri": root_uri, "name": "root" }],
        });

        let init_budget = Duration::from_secs(60);
        let result = match timeout(init_budget, self.call("initialize", params, true)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                *self.state.lock().await = ClientState::Error;
                return Err(e);
            }
            Err(_) => {
                *self.state.lock().await = ClientState::Error;
                return Err(LspError::InitializeTimeout(init_budget));
            }
        };

        self.notify("initialized", json!({})).await?;

        if let Some((path, text)) = warm_up_file {
            let uri = format!("file://{}", path.display());
            self.open_file(&uri, text).await?;
            let settle = settle_duration(text.len());
            tokio::time::sleep(settle).await;
        }

        *self.state.lock().await = ClientState::Ready;
        Ok(result)
    }

    pub async fn open_file(&self, uri: &str, text: &str) -> Result<(), LspError> {
        self.file_cache.insert(uri.to_string(), text.to_string());
        self.notify(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": uri,
                    "languageId": "plaintext",
                    "version": 1,
                    "text": text,
                }
            }),
        )
        .await
    }

    /// Read cached file bytes for a location already opened via
    /// `open_file`. Deterministic within a run: content never changes.
    pub fn locate(&self, uri: &str) -> Option<String> {
        self.file_cache.get(uri).map(|v| v.value().clone())
    }

    pub async fn document_symbol(&self, uri: &str) -> Result<Value, LspError> {
        self.call(
            "textDocument/documentSymbol",
            json!({ "textDocument": { "uri": uri } }),
            true,
        )
        .await
    }

    pub async fn semantic_tokens_full(&self, uri: &str) -> Result<Value, LspError> {
        self.call(
            "textDocument/semanticTokens/full",
            json!({ "textDocument": { "uri": uri } }),
            true,
        )
        .await
    }

    pub async fn definition(&self, uri: &str, line: u32, character: u32) -> Result<Value, LspError> {
        self.call(
            "textDocument/definition",
            json!({ "textDocument": { "uri": uri }, "position": { "line": line, "character": character } }),
            false,
        )
        .await
    }

    pub async fn references(
        &self,
        uri: &str,
        line: u32,
        character: u32,
        include_declaration: bool,
    ) -> Result<Value, LspError> {
        self.call(
            "textDocument/references",
            json!({
                "textDocument": { "uri": uri },
                "position": { "line": line, "character": character },
                "context": { "includeDeclaration": include_declaration },
            }),
            false,
        )
        .await
    }

    pub async fn implementation(&self, uri: &str, line: u32, character: u32) -> Result<Value, LspError> {
        self.call(
            "textDocument/implementation",
            json!({ "textDocument": { "uri": uri }, "position": { "line": line, "character": character } }),
            false,
        )
        .await
    }

    pub async fn hover(&self, uri: &str, line: u32, character: u32) -> Result<Value, LspError> {
        self.call(
            "textDocument/hover",
            json!({ "textDocument": { "uri": uri }, "position": { "line": line, "character": character } }),
            false,
        )
        .await
    }

    pub async fn prepare_type_hierarchy(&self, uri: &str, line: u32, character: u32) -> Result<Value, LspError> {
        self.call(
            "textDocument/prepareTypeHierarchy",
            json!({ "textDocument": { "uri": uri }, "position": { "line": line, "character": character } }),
            false,
        )
        .await
    }

    pub async fn supertypes(&self, item: Value) -> Result<Value, LspError> {
        self.call("typeHierarchy/supertypes", json!({ "item": item }), false).await
    }

    pub async fn subtypes(&self, item: Value) -> Result<Value, LspError> {
        self.call("typeHierarchy/subtypes", json!({ "item": item }), false).await
    }

    pub async fn workspace_symbol(&self, query: &str) -> Result<Value, LspError> {
        self.call("workspace/symbol", json!({ "query": query }), false).await
    }

    /// Graceful shutdown: `shutdown` + `exit`, then wait bounded, then
    /// SIGKILL (via `kill_on_drop` / explicit `start_kill`).
    pub async fn shutdown(&self) {
        *self.state.lock().await = ClientState::ShuttingDown;
        let _ = timeout(SHUTDOWN_TIMEOUT, self.call("shutdown", Value::Null, false)).await;
        let _ = self.notify("exit", Value::Null).await;

        let mut child = self.child.lock().await;
        match timeout(SHUTDOWN_TIMEOUT, child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                let _ = child.start_kill();
            }
        }
        *self.state.lock().await = ClientState::Exited;
    }
}

fn dispatch(msg: InboundMessage, pending: &DashMap<u64, Waiter>) {
    if let Some(id_value) = &msg.id {
        let Some(id) = id_value.as_u64() else {
            tracing::warn!("response with non-integer id, dropping");
            return;
        };
        if let Some((_, waiter)) = pending.remove(&id) {
            let outcome = if let Some(err) = msg.error {
                Err(LspError::RequestFailed {
                    method: msg.method.unwrap_or_default(),
                    id,
                    message: err.message,
                })
            } else {
                Ok(msg.result.unwrap_or(Value::Null))
            };
            let _ = waiter.send(outcome);
        }
        // Unknown id: a late or canceled response. Discard.
        return;
    }

    if let Some(method) = msg.method {
        match method.as_str() {
            "window/logMessage" => {
                if let Some(params) = msg.params {
                    tracing::info!(target: "lsp::window", "{params}");
                }
            }
            "$/progress" => {
                tracing::debug!(target: "lsp::progress", ?msg.params, "progress notification");
            }
            other => tracing::debug!(target: "lsp::notification", method = other, "unhandled notification"),
        }
    }
}

/// Extract `capabilities.semanticTokensProvider.legend` from an
/// `initialize` result. Servers that advertise no semantic-tokens support
/// yield an empty legend; the Collector then simply decodes zero tokens
/// per file rather than failing the run.
pub fn semantic_tokens_legend(initialize_result: &Value) -> lsp_types::SemanticTokensLegend {
    initialize_result
        .get("capabilities")
        .and_then(|c| c.get("semanticTokensProvider"))
        .and_then(|p| p.get("legend"))
        .and_then(|l| serde_json::from_value(l.clone()).ok())
        .unwrap_or(lsp_types::SemanticTokensLegend {
            token_types: Vec::new(),
            token_modifiers: Vec::new(),
        })
}

/// `2s + 1s per 1024 bytes`, capped at 5s.
fn settle_duration(byte_len: usize) -> Duration {
    let extra = Duration::from_secs((byte_len as u64).div_ceil(1024));
    let total = Duration::from_secs(2) + extra;
    total.min(Duration::from_secs(5))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_duration_is_capped_at_five_seconds() {
        assert_eq!(settle_duration(0), Duration::from_secs(2));
        assert_eq!(settle_duration(1024), Duration::from_secs(3));
        assert_eq!(settle_duration(1024 * 10), Duration::from_secs(5));
    }
}
