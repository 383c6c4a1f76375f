//! Hand-rolled argument parser for the `uniast` binary — no external
//! argv-parsing crate, just a flat loop over `argv` with
//! `match`-on-flag-string dispatch and `Result<_, String>` errors printed
//! verbatim by `main`.

use std::path::PathBuf;

use crate::spec::Language;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            other => Err(format!("invalid --color value `{other}` (expected auto|always|never)")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParseArgs {
    pub language: Language,
    pub repo_path: PathBuf,
    pub output: Option<PathBuf>,
    pub lsp_binary: Option<String>,
    pub load_external_symbol: bool,
    pub need_std_symbol: bool,
    pub no_need_comment: bool,
    pub not_need_test: bool,
    pub excludes: Vec<String>,
    pub verbose: bool,
    pub color: ColorMode,
}

#[derive(Clone, Debug)]
pub struct WriteArgs {
    pub ast_path: PathBuf,
    pub output_dir: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub enum Command {
    Parse(ParseArgs),
    Write(WriteArgs),
    Help,
    Version,
}

pub fn format_usage() -> &'static str {
    "uniast - Universal AST extraction over the Language Server Protocol\n\n\
Usage:\n  \
  uniast parse <lang> <repo-path> [options]   Extract a UniAST document\n  \
  uniast write <ast.json> [-o <out-dir>]      Materialize sources from a UniAST document\n\n\
<lang>: rust | python | typescript | java | cpp | go\n\n\
Parse options:\n  \
  -o, --output <path>        Write JSON here instead of stdout\n  \
  --lsp <path>               Explicit language-server binary\n  \
  --load-external-symbol     Resolve and attach full bodies for out-of-repo symbols\n  \
  --need-std-symbol          Keep references into the language's standard library\n  \
  --no-need-comment          Do not prepend leading doc comments to Content\n  \
  --not-need-test            Skip files that look like tests\n  \
  --exclude <glob>           Exclude matching paths (repeatable)\n  \
  --verbose                  Verbose logging (equivalent to UNIAST_LOG=debug)\n  \
  --color <auto|always|never>  Colorize diagnostic output (default: auto)\n\n\
  -h, --help                 Show this message\n  \
  --version                  Show version\n"
}

/// Parse `argv` (excluding the program name): a single pass over the
/// tokens, `Result<_, String>` so `main` can print the error and exit
/// non-zero.
pub fn parse_args(argv: &[String]) -> Result<Command, String> {
    let mut iter = argv.iter().peekable();

    let Some(first) = iter.next() else {
        return Ok(Command::Help);
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "--version" | "version" => Ok(Command::Version),
        "parse" => parse_parse_args(iter),
        "write" => parse_write_args(iter),
        other => Err(format!("unknown subcommand `{other}` (expected `parse` or `write`)")),
    }
}

fn parse_parse_args(mut iter: std::iter::Peekable<std::slice::Iter<'_, String>>) -> Result<Command, String> {
    let lang_raw = iter.next().ok_or("`parse` requires a <lang> argument")?;
    let language = Language::parse(lang_raw).map_err(|e| e.to_string())?;
    let repo_path = PathBuf::from(iter.next().ok_or("`parse` requires a <repo-path> argument")?);

    let mut args = ParseArgs {
        language,
        repo_path,
        output: None,
        lsp_binary: None,
        load_external_symbol: false,
        need_std_symbol: false,
        no_need_comment: false,
        not_need_test: false,
        excludes: Vec::new(),
        verbose: false,
        color: ColorMode::Auto,
    };

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "-o" | "--output" => {
                let path = iter.next().ok_or("--output requires a path")?;
                args.output = Some(PathBuf::from(path));
            }
            "--lsp" => {
                let path = iter.next().ok_or("--lsp requires a path")?;
                args.lsp_binary = Some(path.clone());
            }
            "--load-external-symbol" => args.load_external_symbol = true,
            "--need-std-symbol" => args.need_std_symbol = true,
            "--no-need-comment" => args.no_need_comment = true,
            "--not-need-test" => args.not_need_test = true,
            "--exclude" => {
                let glob = iter.next().ok_or("--exclude requires a glob pattern")?;
                args.excludes.push(glob.clone());
            }
            "--verbose" => args.verbose = true,
            "--color" => {
                let raw = iter.next().ok_or("--color requires a value")?;
                args.color = ColorMode::parse(raw)?;
            }
            other if other.starts_with("--color=") => {
                args.color = ColorMode::parse(&other["--color=".len()..])?;
            }
            "-h" | "--help" => return Ok(Command::Help),
            other => return Err(format!("unrecognized flag `{other}` for `parse`")),
        }
    }

    Ok(Command::Parse(args))
}

fn parse_write_args(mut iter: std::iter::Peekable<std::slice::Iter<'_, String>>) -> Result<Command, String> {
    let ast_path = PathBuf::from(iter.next().ok_or("`write` requires an <ast.json> argument")?);
    let mut args = WriteArgs { ast_path, output_dir: None };

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "-o" | "--output" => {
                let path = iter.next().ok_or("--output requires a path")?;
                args.output_dir = Some(PathBuf::from(path));
            }
            "-h" | "--help" => return Ok(Command::Help),
            other => return Err(format!("unrecognized flag `{other}` for `write`")),
        }
    }

    Ok(Command::Write(args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_parse_invocation() {
        let argv: Vec<String> = ["parse", "rust", "."].iter().map(|s| s.to_string()).collect();
        let Command::Parse(args) = parse_args(&argv).unwrap() else {
            panic!("expected Command::Parse");
        };
        assert_eq!(args.language, Language::Rust);
        assert_eq!(args.repo_path, PathBuf::from("."));
        assert!(!args.load_external_symbol);
    }

    #[test]
    fn parses_flags_and_repeated_excludes() {
        let argv: Vec<String> = [
            "parse",
            "python",
            "/repo",
            "--load-external-symbol",
            "--exclude",
            "vendor/**",
            "--exclude",
            "*.pyc",
            "-o",
            "out.json",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let Command::Parse(args) = parse_args(&argv).unwrap() else {
            panic!("expected Command::Parse");
        };
        assert!(args.load_external_symbol);
        assert_eq!(args.excludes, vec!["vendor/**".to_string(), "*.pyc".to_string()]);
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        let argv: Vec<String> = ["scan"].iter().map(|s| s.to_string()).collect();
        assert!(parse_args(&argv).is_err());
    }

    #[test]
    fn write_without_ast_path_is_an_error() {
        let argv: Vec<String> = ["write"].iter().map(|s| s.to_string()).collect();
        assert!(parse_args(&argv).is_err());
    }

    #[test]
    fn help_with_no_arguments() {
        let argv: Vec<String> = Vec::new();
        assert!(matches!(parse_args(&argv), Ok(Command::Help)));
    }
}
