//! The `uniast` entrypoint: argument parsing, logging init, and dispatch
//! to the `parse`/`write` subcommands, matching the exit-code contract
//! (0 success, 1 usage, 2 LSP handshake failure, 3 collection failure).

use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use uniast::cli::{self, Command, ParseArgs, WriteArgs};
use uniast::collector::{CollectOption, Collector};
use uniast::config::UniastConfig;
use uniast::errors::ConfigError;
use uniast::export;
use uniast::lsp::{semantic_tokens_legend, LspClient};
use uniast::model::Repository;
use uniast::spec::Spec;

const EXIT_SUCCESS: u8 = 0;
const EXIT_USAGE: u8 = 1;
const EXIT_LSP: u8 = 2;
const EXIT_COLLECT: u8 = 3;

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let command = match cli::parse_args(&argv) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("uniast: {message}");
            eprintln!();
            eprint!("{}", cli::format_usage());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match command {
        Command::Help => {
            print!("{}", cli::format_usage());
            ExitCode::from(EXIT_SUCCESS)
        }
        Command::Version => {
            println!("uniast {}", env!("CARGO_PKG_VERSION"));
            ExitCode::from(EXIT_SUCCESS)
        }
        Command::Write(args) => run_write(args),
        Command::Parse(args) => run_parse(args),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("UNIAST_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}

/// Materializing a UniAST document back into source files is an external
/// collaborator's job, not this core's — stubbed here so the CLI surface
/// is complete without implementing a writer/patcher.
fn run_write(args: WriteArgs) -> ExitCode {
    init_logging(false);
    eprintln!(
        "uniast: `write` (materializing {} to {}) is not implemented by this core",
        args.ast_path.display(),
        args.output_dir.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "stdout".to_string())
    );
    ExitCode::from(EXIT_COLLECT)
}

fn run_parse(args: ParseArgs) -> ExitCode {
    init_logging(args.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("uniast: failed to start async runtime: {e}");
            return ExitCode::from(EXIT_COLLECT);
        }
    };
    runtime.block_on(run_parse_async(args))
}

async fn run_parse_async(args: ParseArgs) -> ExitCode {
    if !args.repo_path.is_dir() {
        eprintln!("uniast: {}", ConfigError::RepositoryNotFound(args.repo_path.display().to_string()));
        return ExitCode::from(EXIT_USAGE);
    }
    let root = args.repo_path.canonicalize().unwrap_or_else(|_| args.repo_path.clone());

    let config = UniastConfig::load(&root);

    let spec = uniast::spec::for_language(args.language);
    let modules = match spec.workspace(&root) {
        Ok(modules) => modules,
        Err(e) => {
            eprintln!("uniast: {e}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let lsp_override = config.lsp_override(args.language.as_str()).cloned();
    let lsp_binary = match resolve_lsp_binary(&args, lsp_override.as_ref(), spec.as_ref()) {
        Ok(binary) => binary,
        Err(e) => {
            eprintln!("uniast: {e}");
            return ExitCode::from(EXIT_LSP);
        }
    };
    let lsp_args = lsp_override.map(|o| o.args).unwrap_or_default();

    let client = match LspClient::spawn(&lsp_binary, &lsp_args, &root).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("uniast: {e}");
            return ExitCode::from(EXIT_LSP);
        }
    };

    let warm_up_path = spec.warm_up_file(&root);
    let warm_up_text = warm_up_path.as_deref().and_then(|p| std::fs::read_to_string(p).ok());
    let warm_up = warm_up_path.as_deref().zip(warm_up_text.as_deref());

    let init_result = match client.initialize(&root, warm_up).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("uniast: {e}");
            client.shutdown().await;
            // Spawn/timeout/exit failures mean the server never came up at
            // all (exit 2); anything else during the handshake (a malformed
            // `initialize` response, say) is closer to a collection-time
            // failure than a handshake one.
            let code = if e.is_handshake_fatal() { EXIT_LSP } else { EXIT_COLLECT };
            return ExitCode::from(code);
        }
    };
    let legend = semantic_tokens_legend(&init_result);

    let mut excludes = args.excludes.clone();
    excludes.extend(config.exclude.iter().cloned());

    let mut option = CollectOption::new(args.language);
    option.load_external_symbol = args.load_external_symbol || config.load_external_symbol;
    option.need_std_symbol = args.need_std_symbol || config.need_std_symbol;
    option.no_need_comment = args.no_need_comment || config.no_need_comment;
    option.not_need_test = args.not_need_test || config.not_need_test;
    option.excludes = excludes;
    option.lsp_binary = Some(lsp_binary);
    option.lsp_args = lsp_args;

    let cancel = option.cancel.clone();
    let ctrlc_watch = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received interrupt; finishing the in-flight file and returning partial state");
            cancel.cancel();
        }
    });

    let mut collector = Collector::new(root.clone(), spec, modules);
    collector.run(&client, &legend, &option).await;
    client.shutdown().await;
    ctrlc_watch.abort();

    let repository = export::export(&collector, uuid::Uuid::new_v4().to_string(), &root);

    for err in &repository.errors {
        tracing::warn!(stage = %err.stage, path = ?err.path, message = %err.message, "non-fatal collection error");
    }

    match write_output(&repository, args.output.as_deref()) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("uniast: failed to write output: {e}");
            ExitCode::from(EXIT_COLLECT)
        }
    }
}

/// Resolution order: `--lsp` flag, then `.uniast/config.toml`'s
/// per-language override, then a `PATH` lookup of the language's default
/// binary name.
fn resolve_lsp_binary(args: &ParseArgs, lsp_override: Option<&uniast::config::LspOverride>, spec: &dyn Spec) -> Result<String, ConfigError> {
    if let Some(explicit) = &args.lsp_binary {
        return Ok(explicit.clone());
    }
    if let Some(path) = lsp_override.and_then(|o| o.path.clone()) {
        return Ok(path);
    }
    let default_binary = spec.default_lsp_binary();
    if binary_on_path(default_binary) {
        Ok(default_binary.to_string())
    } else {
        Err(ConfigError::LspBinaryNotFound {
            language: spec.language().as_str().to_string(),
            binary: default_binary.to_string(),
        })
    }
}

fn binary_on_path(binary: &str) -> bool {
    std::env::var_os("PATH").is_some_and(|paths| std::env::split_paths(&paths).any(|dir| dir.join(binary).is_file()))
}

fn write_output(repository: &Repository, output: Option<&Path>) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(repository).expect("Repository always serializes");
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, json)
        }
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")
        }
    }
}
