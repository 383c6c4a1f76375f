//! The Rust `Spec`: crate/module discovery via `Cargo.toml`, `impl`-block
//! dissection, and `pub`-based visibility.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::errors::{CollectError, ConfigError};
use crate::model::{FileLine, Import};

use super::{FunctionDissection, ImplDissection, Language, Spec, Symbol, SymbolKind, Token};

static USE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+([a-zA-Z0-9_:{}, \*]+?)\s*;").unwrap()
});
static USE_ALIAS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*)\s+as\s+(\w+)$").unwrap());

#[derive(Default)]
pub struct RustSpec;

impl RustSpec {
    pub fn new() -> Self {
        Self
    }

    fn crate_name_for(&self, root: &Path, file: &Path) -> Option<(String, PathBuf)> {
        let mut dir = file.parent()?.to_path_buf();
        loop {
            let candidate = dir.join("Cargo.toml");
            let name = (|| {
                let contents = std::fs::read_to_string(&candidate).ok()?;
                let parsed = contents.parse::<toml::Table>().ok()?;
                parsed.get("package")?.get("name")?.as_str().map(str::to_string)
            })();
            if let Some(name) = name {
                return Some((name, dir));
            }
            if dir == root || !dir.pop() {
                return None;
            }
        }
    }
}

impl Spec for RustSpec {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn workspace(&self, root: &Path) -> Result<HashMap<String, PathBuf>, ConfigError> {
        let mut modules = HashMap::new();
        for entry in WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.file_name() != "target" && e.file_name() != ".git")
            .filter_map(Result::ok)
        {
            if entry.file_name() != "Cargo.toml" {
                continue;
            }
            let Ok(contents) = std::fs::read_to_string(entry.path()) else {
                continue;
            };
            let Ok(parsed) = contents.parse::<toml::Table>() else {
                continue;
            };
            if let Some(name) = parsed.get("package").and_then(|p| p.get("name")).and_then(|n| n.as_str()) {
                let dir = entry.path().parent().unwrap_or(root).to_path_buf();
                modules.insert(name.to_string(), dir);
            }
        }
        Ok(modules)
    }

    fn namespace(&self, root: &Path, file: &Path) -> Result<(String, String), CollectError> {
        let Some((crate_name, crate_dir)) = self.crate_name_for(root, file) else {
            return Ok((String::new(), String::new()));
        };
        let src_dir = crate_dir.join("src");
        let rel = file.strip_prefix(&src_dir).unwrap_or_else(|_| file.strip_prefix(&crate_dir).unwrap_or(file));
        let mut segments: Vec<String> = rel
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if let Some(last) = segments.last()
            && (last == "mod" || last == "lib" || last == "main")
        {
            segments.pop();
        }
        let pkg_path = if segments.is_empty() {
            crate_name.clone()
        } else {
            format!("{crate_name}::{}", segments.join("::"))
        };
        Ok((crate_name, pkg_path))
    }

    fn should_skip(&self, path: &Path) -> bool {
        if path.components().any(|c| c.as_os_str() == "target") {
            return true;
        }
        path.extension().and_then(|e| e.to_str()) != Some("rs")
    }

    fn file_imports(&self, contents: &str) -> Vec<Import> {
        let mut imports = Vec::new();
        for cap in USE_LINE.captures_iter(contents) {
            let raw = cap[1].trim().trim_end_matches(',');
            if let Some(alias_cap) = USE_ALIAS.captures(raw) {
                imports.push(Import::aliased(alias_cap[2].to_string(), alias_cap[1].trim().to_string()));
            } else {
                imports.push(Import::bare(raw.to_string()));
            }
        }
        imports
    }

    fn is_entity_token(&self, token: &Token) -> bool {
        matches!(
            token.token_type.as_str(),
            "function" | "method" | "variable" | "parameter" | "property" | "class" | "interface" | "enum" | "struct" | "typeParameter" | "enumMember" | "macro"
        )
    }

    fn is_entity_symbol(&self, sym: &Symbol) -> bool {
        matches!(
            sym.kind,
            SymbolKind::FUNCTION
                | SymbolKind::METHOD
                | SymbolKind::VARIABLE
                | SymbolKind::CONSTANT
                | SymbolKind::STRUCT
                | SymbolKind::INTERFACE
                | SymbolKind::ENUM
                | SymbolKind::ENUM_MEMBER
                | SymbolKind::PROPERTY
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
            "function" | "macro" => SymbolKind::FUNCTION,
            "method" => SymbolKind::METHOD,
            "variable" | "parameter" => SymbolKind::VARIABLE,
            "property" => SymbolKind::PROPERTY,
            "struct" => SymbolKind::STRUCT,
            "interface" => SymbolKind::INTERFACE,
            "enum" => SymbolKind::ENUM,
            "enumMember" => SymbolKind::ENUM_MEMBER,
            "typeParameter" => SymbolKind::TYPE_PARAMETER,
            _ => SymbolKind::VARIABLE,
        }
    }

    fn declare_token_of_symbol(&self, sym: &Symbol) -> Option<usize> {
        sym.tokens
            .iter()
            .enumerate()
            .find(|(_, t)| !self.is_doc_token(t) && t.has_modifier("declaration"))
            .map(|(idx, _)| idx)
    }

    fn is_public_symbol(&self, sym: &Symbol) -> bool {
        sym.detail
            .as_deref()
            .map(|d| d.trim_start().starts_with("pub"))
            .unwrap_or(false)
    }

    fn is_main_function(&self, sym: &Symbol) -> bool {
        sym.kind == SymbolKind::FUNCTION && sym.name == "main"
    }

    fn has_impl_symbol(&self) -> bool {
        true
    }

    fn impl_symbol(&self, sym: &Symbol) -> ImplDissection {
        let interface_idx = sym.tokens.iter().position(|t| t.token_type == "interface");
        let receiver_idx = sym
            .tokens
            .iter()
            .position(|t| matches!(t.token_type.as_str(), "struct" | "enum"));
        let first_method_idx = sym.tokens.iter().position(|t| t.token_type == "method");
        ImplDissection {
            interface_idx,
            receiver_idx,
            first_method_idx,
        }
    }

    fn function_symbol(&self, sym: &Symbol, contents: &str) -> FunctionDissection {
        let receiver_idx = sym
            .tokens
            .iter()
            .position(|t| t.token_type == "parameter" && t.has_modifier("selfParameter"));
        let type_param_idxs = sym
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.token_type == "typeParameter")
            .map(|(i, _)| i)
            .collect();
        let input_idxs = sym
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.token_type == "parameter" && !t.has_modifier("selfParameter"))
            .map(|(i, _)| i)
            .collect();
        let (output_idxs, output_type_text) = return_type_dissection(sym, contents);
        FunctionDissection {
            receiver_idx,
            type_param_idxs,
            input_idxs,
            output_idxs,
            output_type_text,
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
        vec![SymbolKind::FUNCTION, SymbolKind::STRUCT, SymbolKind::INTERFACE]
    }

    fn warm_up_file(&self, root: &Path) -> Option<PathBuf> {
        for candidate in ["src/lib.rs", "src/main.rs"] {
            let path = root.join(candidate);
            if path.is_file() {
                return Some(path);
            }
        }
        None
    }

    fn default_lsp_binary(&self) -> &'static str {
        "rust-analyzer"
    }
}

/// Locates the `-> Ret` region of a function signature textually (semantic
/// tokens carry no "this is the return type" marker of their own) and
/// collects any entity-kind tokens inside it. `output_type_text` is a
/// fallback for a result type with no semantic token at all, e.g. a builtin
/// like `i32`, for which `output_idxs` would otherwise resolve to nothing.
fn return_type_dissection(sym: &Symbol, contents: &str) -> (Vec<usize>, Option<String>) {
    let sig_start = position_to_offset(contents, sym.range.start);
    let sig_end = position_to_offset(contents, sym.range.end);
    let Some(signature) = contents.get(sig_start..sig_end) else {
        return (Vec::new(), None);
    };
    let Some(arrow_rel) = signature.find("->") else {
        return (Vec::new(), None);
    };
    let after_arrow = arrow_rel + 2;
    let end_rel = signature[after_arrow..]
        .find(['{', ';'])
        .map(|i| after_arrow + i)
        .unwrap_or(signature.len());
    let arrow_offset = sig_start + after_arrow;
    let end_offset = sig_start + end_rel;
    if end_offset <= arrow_offset {
        return (Vec::new(), None);
    }

    let output_idxs: Vec<usize> = sym
        .tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| {
            matches!(
                t.token_type.as_str(),
                "struct" | "enum" | "interface" | "typeParameter"
            )
        })
        .filter(|(_, t)| {
            let off = position_to_offset(contents, t.range.start);
            off >= arrow_offset && off < end_offset
        })
        .map(|(i, _)| i)
        .collect();

    let raw = signature[after_arrow..end_rel].trim();
    let output_type_text = if output_idxs.is_empty() && !raw.is_empty() && raw != "()" {
        Some(raw.to_string())
    } else {
        None
    };

    (output_idxs, output_type_text)
}

/// Byte offset of an LSP `Position` within `contents`. Self-contained
/// rather than reusing the Collector's `LineIndex` so this module stays
/// free of any dependency on collector-internal types.
fn position_to_offset(contents: &str, pos: lsp_types::Position) -> usize {
    let mut offset = 0usize;
    for (i, line) in contents.split_inclusive('\n').enumerate() {
        if i as u32 == pos.line {
            let mut utf16_count = 0u32;
            let mut byte_offset = 0usize;
            for c in line.chars() {
                if utf16_count >= pos.character {
                    break;
                }
                utf16_count += c.len_utf16() as u32;
                byte_offset += c.len_utf8();
            }
            return offset + byte_offset;
        }
        offset += line.len();
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bare_and_aliased_use_lines() {
        let spec = RustSpec::new();
        let src = "use std::collections::HashMap;\nuse regex::Regex as Re;\n";
        let imports = spec.file_imports(src);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].path(), "std::collections::HashMap");
        assert_eq!(imports[1].alias(), Some("Re"));
    }

    #[test]
    fn should_skip_non_rust_and_target_dir() {
        let spec = RustSpec::new();
        assert!(spec.should_skip(Path::new("README.md")));
        assert!(spec.should_skip(Path::new("target/debug/build/foo.rs")));
        assert!(!spec.should_skip(Path::new("src/lib.rs")));
    }
}
