//! Best-effort `Module.Version`/`Dependencies` discovery from each
//! language's own manifest file, read directly rather than through `Spec`
//! (no per-language manifest-parsing hook exists on that trait). Mirrors
//! `analyzer/manifests.rs`'s per-manifest-kind reader shape, trimmed down
//! to the two fields the data model actually carries.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value as JsonValue;
use toml::Value as TomlValue;

use crate::spec::Language;

#[derive(Clone, Debug, Default)]
pub struct ManifestInfo {
    pub version: String,
    pub dependencies: HashMap<String, String>,
}

/// No lockfile parsing: `Version` is populated only when the manifest
/// itself pins an exact version, left `""` otherwise.
pub fn read(mod_dir: &Path, language: Language) -> ManifestInfo {
    match language {
        Language::Rust => read_cargo_toml(mod_dir),
        Language::Python => read_pyproject_toml(mod_dir),
        Language::TypeScript => read_package_json(mod_dir),
        Language::Java | Language::Cpp | Language::Go => ManifestInfo::default(),
    }
}

fn read_cargo_toml(dir: &Path) -> ManifestInfo {
    let mut info = ManifestInfo::default();
    let Ok(content) = std::fs::read_to_string(dir.join("Cargo.toml")) else {
        return info;
    };
    let Ok(toml) = content.parse::<TomlValue>() else {
        return info;
    };
    let Some(table) = toml.as_table() else {
        return info;
    };

    if let Some(version) = table.get("package").and_then(|v| v.as_table()).and_then(|p| p.get("version")).and_then(|v| v.as_str()) {
        info.version = format!("v{version}");
    }

    for section in ["dependencies", "dev-dependencies", "build-dependencies"] {
        let Some(deps) = table.get(section).and_then(|v| v.as_table()) else {
            continue;
        };
        for (name, spec) in deps {
            let version = match spec {
                TomlValue::String(s) => s.clone(),
                TomlValue::Table(t) => t.get("version").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                _ => String::new(),
            };
            if !version.is_empty() {
                info.dependencies.insert(name.clone(), format!("{name}@{version}"));
            }
        }
    }
    info
}

fn read_pyproject_toml(dir: &Path) -> ManifestInfo {
    let mut info = ManifestInfo::default();
    let Ok(content) = std::fs::read_to_string(dir.join("pyproject.toml")) else {
        return info;
    };
    let Ok(toml) = content.parse::<TomlValue>() else {
        return info;
    };
    let Some(table) = toml.as_table() else {
        return info;
    };
    let Some(project) = table.get("project").and_then(|v| v.as_table()) else {
        return info;
    };

    if let Some(version) = project.get("version").and_then(|v| v.as_str()) {
        info.version = format!("v{version}");
    }

    if let Some(deps) = project.get("dependencies").and_then(|v| v.as_array()) {
        for dep in deps.iter().filter_map(|v| v.as_str()) {
            let split_at = dep.find(|c: char| "=<>!~".contains(c));
            let (name, rest) = match split_at {
                Some(idx) => (dep[..idx].trim(), dep[idx..].trim()),
                None => (dep.trim(), ""),
            };
            if !name.is_empty() {
                info.dependencies.insert(name.to_string(), format!("{name}@{rest}"));
            }
        }
    }
    info
}

fn read_package_json(dir: &Path) -> ManifestInfo {
    let mut info = ManifestInfo::default();
    let Ok(content) = std::fs::read_to_string(dir.join("package.json")) else {
        return info;
    };
    let Ok(json) = serde_json::from_str::<JsonValue>(&content) else {
        return info;
    };

    if let Some(version) = json.get("version").and_then(|v| v.as_str()) {
        info.version = format!("v{version}");
    }

    for section in ["dependencies", "devDependencies"] {
        let Some(deps) = json.get(section).and_then(|v| v.as_object()) else {
            continue;
        };
        for (name, version) in deps {
            if let Some(version) = version.as_str() {
                info.dependencies.insert(name.clone(), format!("{name}@{version}"));
            }
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_cargo_toml_version_and_pinned_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("Cargo.toml")).unwrap();
        writeln!(f, "[package]\nname = \"demo\"\nversion = \"1.2.3\"\n\n[dependencies]\nregex = \"1.10\"").unwrap();
        let info = read_cargo_toml(dir.path());
        assert_eq!(info.version, "v1.2.3");
        assert_eq!(info.dependencies.get("regex"), Some(&"regex@1.10".to_string()));
    }

    #[test]
    fn missing_manifest_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let info = read_cargo_toml(dir.path());
        assert_eq!(info.version, "");
        assert!(info.dependencies.is_empty());
    }
}
