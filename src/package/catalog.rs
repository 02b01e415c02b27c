use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use super::manifest::{MANIFEST_FILE, Manifest};
use crate::runtime::{Runtime, is_path_under, normalize_path};

/// A package found in the source directory whose entry file could be
/// resolved, but which has not been versioned yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageCandidate {
    /// Directory name, or `@scope/name` for scoped packages.
    pub name: String,
    pub package_dir: PathBuf,
    pub declared_version: Option<String>,
    /// Entry file path relative to `package_dir`, never empty.
    pub entry_import_path: String,
}

impl PackageCandidate {
    pub fn entry_path(&self) -> PathBuf {
        normalize_path(&self.package_dir.join(&self.entry_import_path))
    }
}

/// Scan the source directory for packages.
///
/// Directory structure: `<source>/<name>/package.json` and
/// `<source>/@<scope>/<name>/package.json`.
///
/// Failing to list `source` is an error; every per-package problem is logged
/// and the package is left out.
#[tracing::instrument(skip(runtime, source))]
pub fn scan<R: Runtime + ?Sized>(runtime: &R, source: &Path) -> Result<Vec<PackageCandidate>> {
    let entries = runtime
        .read_dir(source)
        .with_context(|| format!("Failed to list package directory {}", source.display()))?;

    let mut candidates = Vec::new();
    for path in entries {
        if !runtime.is_dir(&path) {
            continue;
        }
        let Some(dir_name) = file_name(&path) else {
            continue;
        };

        if dir_name.starts_with('@') {
            let scoped = match runtime.read_dir(&path) {
                Ok(scoped) => scoped,
                Err(e) => {
                    warn!("{}: {:#}", dir_name, e);
                    continue;
                }
            };
            for package_dir in scoped {
                if !runtime.is_dir(&package_dir) {
                    continue;
                }
                if let Some(name) = file_name(&package_dir) {
                    let name = format!("{}/{}", dir_name, name);
                    candidates.extend(inspect(runtime, name, package_dir));
                }
            }
        } else {
            candidates.extend(inspect(runtime, dir_name, path));
        }
    }

    debug!("Found {} package(s) in {}", candidates.len(), source.display());
    Ok(candidates)
}

/// Read one package's manifest and resolve its entry file.
fn inspect<R: Runtime + ?Sized>(
    runtime: &R,
    name: String,
    package_dir: PathBuf,
) -> Option<PackageCandidate> {
    let manifest_path = package_dir.join(MANIFEST_FILE);
    if !runtime.exists(&manifest_path) {
        debug!("No manifest in {}, skipping", package_dir.display());
        return None;
    }

    let manifest = match Manifest::load(runtime, &manifest_path) {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!("{}: {:#}", name, e);
            return None;
        }
    };

    let Some(entry_import_path) = manifest.entry_import_path() else {
        warn!("(skip) {}", manifest_path.display());
        return None;
    };

    if !is_path_under(&package_dir.join(entry_import_path), &package_dir) {
        warn!(
            "{}: entry {:?} points outside the package directory, skipping",
            name, entry_import_path
        );
        return None;
    }

    Some(PackageCandidate {
        declared_version: manifest.declared_version().map(str::to_string),
        entry_import_path: entry_import_path.to_string(),
        name,
        package_dir,
    })
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
