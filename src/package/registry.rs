use std::collections::BTreeMap;
use std::path::PathBuf;

use super::catalog::PackageCandidate;

/// A cataloged package with its final version.
///
/// The version is fixed when the value is built by the version resolver;
/// there is no way to change it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageInfo {
    candidate: PackageCandidate,
    resolved_version: String,
}

impl PackageInfo {
    pub(crate) fn new(candidate: PackageCandidate, resolved_version: String) -> Self {
        Self {
            candidate,
            resolved_version,
        }
    }

    pub fn name(&self) -> &str {
        &self.candidate.name
    }

    /// Location of the entry file on disk.
    pub fn entry_path(&self) -> PathBuf {
        self.candidate.entry_path()
    }

    pub fn resolved_version(&self) -> &str {
        &self.resolved_version
    }
}

/// Immutable name -> package lookup, complete before any file is rewritten.
///
/// Iteration follows package name order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    packages: BTreeMap<String, PackageInfo>,
}

impl Registry {
    pub fn new(packages: impl IntoIterator<Item = PackageInfo>) -> Self {
        Self {
            packages: packages
                .into_iter()
                .map(|info| (info.name().to_string(), info))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PackageInfo> {
        self.packages.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageInfo> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
