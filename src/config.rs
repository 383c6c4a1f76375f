//! Optional `.uniast/config.toml` repository-local overrides.
//!
//! A missing file silently yields the default, a malformed file logs a
//! warning and falls back to the default — never fatal.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Per-language override of the language-server binary and its arguments.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LspOverride {
    pub path: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct UniastConfig {
    /// Extra glob patterns excluded in addition to `Spec::should_skip`.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Per-language `[lsp.rust]`, `[lsp.python]`, ... binary overrides.
    #[serde(default)]
    pub lsp: HashMap<String, LspOverride>,
    /// Default `CollectOption` toggles, overridable by CLI flags.
    #[serde(default)]
    pub load_external_symbol: bool,
    #[serde(default)]
    pub need_std_symbol: bool,
    #[serde(default)]
    pub no_need_comment: bool,
    #[serde(default)]
    pub not_need_test: bool,
}

impl UniastConfig {
    /// Load `.uniast/config.toml` under `root`. Missing file: default.
    /// Malformed file: log a warning, return default.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(".uniast").join("config.toml");
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
                Self::default()
            }
        }
    }

    pub fn lsp_override(&self, language: &str) -> Option<&LspOverride> {
        self.lsp.get(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_default() {
        let temp = TempDir::new().expect("temp dir");
        let config = UniastConfig::load(temp.path());
        assert!(config.exclude.is_empty());
        assert!(!config.need_std_symbol);
    }

    #[test]
    fn loads_valid_config() {
        let temp = TempDir::new().expect("temp dir");
        let dir = temp.path().join(".uniast");
        std::fs::create_dir_all(&dir).expect("create .uniast");
        std::fs::write(
            dir.join("config.toml"),
            r#"
exclude = ["vendor/**"]
need_std_symbol = true

[lsp.rust]
path = "/opt/bin/rust-analyzer"
args = ["--log-file", "/tmp/ra.log"]
"#,
        )
        .expect("write config");

        let config = UniastConfig::load(temp.path());
        assert_eq!(config.exclude, vec!["vendor/**".to_string()]);
        assert!(config.need_std_symbol);
        let rust = config.lsp_override("rust").expect("rust override");
        assert_eq!(rust.path.as_deref(), Some("/opt/bin/rust-analyzer"));
    }

    #[test]
    fn malformed_config_falls_back_to_default() {
        let temp = TempDir::new().expect("temp dir");
        let dir = temp.path().join(".uniast");
        std::fs::create_dir_all(&dir).expect("create .uniast");
        std::fs::write(dir.join("config.toml"), "not = [valid toml").expect("write config");

        let config = UniastConfig::load(temp.path());
        assert!(config.exclude.is_empty());
    }
}
