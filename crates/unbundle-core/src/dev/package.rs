//! Package entry resolution for `/@modules/{pkg}` requests.
//!
//! Locates a package under the modules directory, reads its `package.json`
//! and loads the ES module entry it declares. Nothing is cached: the
//! manifest and entry file are read fresh for every request, manifest first.

use crate::error::DevError;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The parts of `package.json` needed to find an ES module entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    /// ES module entry (`"module": "dist/pkg.esm.js"`).
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub exports: Option<Value>,
}

impl PackageManifest {
    /// The declared ES module entry path, relative to the package root.
    ///
    /// `module` wins; otherwise the `import` condition of `exports` is used.
    #[must_use]
    pub fn module_entry(&self) -> Option<String> {
        if let Some(module) = self.module.as_deref().filter(|m| !m.is_empty()) {
            return Some(module.to_string());
        }
        self.exports.as_ref().and_then(import_condition)
    }
}

/// Pick the `import` target out of an `exports` value.
fn import_condition(exports: &Value) -> Option<String> {
    let map = exports.as_object()?;
    if let Some(root) = map.get(".") {
        return import_condition(root);
    }
    match map.get("import")? {
        Value::String(target) => Some(target.clone()),
        Value::Object(nested) => nested
            .get("default")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// A package entry loaded from disk.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    /// Package name (`vue`, `@scope/pkg`).
    pub name: String,
    /// Installed package directory.
    pub root: PathBuf,
    /// Resolved entry file.
    pub entry_path: PathBuf,
    /// Raw entry file text (not yet rewritten).
    pub source: String,
}

/// Split `@scope/name/sub/path` into (`@scope/name`, `Some("sub/path")`).
#[must_use]
pub fn split_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    let name_segments = if specifier.starts_with('@') { 2 } else { 1 };
    let mut split_at = None;
    for (seen, (idx, _)) in specifier.match_indices('/').enumerate() {
        if seen + 1 == name_segments {
            split_at = Some(idx);
            break;
        }
    }
    match split_at {
        Some(idx) => {
            let sub = &specifier[idx + 1..];
            (&specifier[..idx], (!sub.is_empty()).then_some(sub))
        }
        None => (specifier, None),
    }
}

/// Resolves package specifiers against a modules directory.
#[derive(Debug, Clone)]
pub struct PackageResolver {
    modules_dir: PathBuf,
}

impl PackageResolver {
    /// Create a resolver over the given `node_modules` directory.
    #[must_use]
    pub fn new(modules_dir: PathBuf) -> Self {
        Self { modules_dir }
    }

    /// Resolve a specifier (the part after `/@modules/`) to its entry source.
    pub async fn resolve(&self, specifier: &str) -> Result<ResolvedPackage, DevError> {
        let specifier = specifier.trim_end_matches('/');
        let (name, subpath) = split_package_specifier(specifier);

        if name.is_empty() || specifier.split('/').any(|seg| seg == ".." || seg == ".") {
            return Err(DevError::PackageNotFound {
                name: specifier.to_string(),
            });
        }

        let root = self.modules_dir.join(name);
        if !is_dir(&root).await {
            return Err(DevError::PackageNotFound {
                name: name.to_string(),
            });
        }

        let Some(subpath) = subpath else {
            return load_manifest_entry(name, &root).await;
        };

        let sub_root = root.join(subpath);
        if is_file(&sub_root.join("package.json")).await {
            return load_manifest_entry(specifier, &sub_root).await;
        }

        for candidate in [
            sub_root.clone(),
            with_suffix(&sub_root, ".js"),
            with_suffix(&sub_root, ".mjs"),
        ] {
            if is_file(&candidate).await {
                let source = read_entry(&candidate).await?;
                return Ok(ResolvedPackage {
                    name: name.to_string(),
                    root,
                    entry_path: candidate,
                    source,
                });
            }
        }

        Err(DevError::EntryFileMissing { path: sub_root })
    }
}

/// Read `root/package.json`, then the entry it declares.
async fn load_manifest_entry(name: &str, root: &Path) -> Result<ResolvedPackage, DevError> {
    let manifest_path = root.join("package.json");
    let text = tokio::fs::read_to_string(&manifest_path)
        .await
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => DevError::ManifestMissing {
                path: manifest_path.clone(),
            },
            _ => DevError::Io {
                path: manifest_path.clone(),
                source,
            },
        })?;

    let manifest: PackageManifest =
        serde_json::from_str(&text).map_err(|source| DevError::ManifestInvalid {
            path: manifest_path.clone(),
            source,
        })?;

    let entry = manifest.module_entry().ok_or_else(|| DevError::NoModuleEntry {
        name: name.to_string(),
    })?;

    let entry_path = root.join(&entry);
    debug!(package = name, entry = %entry_path.display(), "resolved package entry");
    let source = read_entry(&entry_path).await?;

    Ok(ResolvedPackage {
        name: name.to_string(),
        root: root.to_path_buf(),
        entry_path,
        source,
    })
}

async fn read_entry(path: &Path) -> Result<String, DevError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => DevError::EntryFileMissing {
                path: path.to_path_buf(),
            },
            _ => DevError::Io {
                path: path.to_path_buf(),
                source,
            },
        })
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}
