use anyhow::{Result, bail};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::runtime::Runtime;

/// File name of a package's manifest inside its directory.
pub const MANIFEST_FILE: &str = "package.json";

/// The subset of `package.json` the catalog cares about.
///
/// Fields are kept as raw JSON values: a manifest whose `version` is a number
/// or whose `exports` is a plain string is still a valid manifest, those
/// fields just don't count.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default)]
    pub exports: Option<Value>,
    #[serde(default)]
    pub module: Option<Value>,
}

impl Manifest {
    /// Parse a manifest document. The document must be a JSON object.
    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        if !value.is_object() {
            bail!("manifest is not a JSON object");
        }
        Ok(serde_json::from_value(value)?)
    }

    #[tracing::instrument(skip(runtime, path))]
    pub fn load<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        Self::parse(&content)
    }

    /// The declared version, if it is a non-empty string.
    pub fn declared_version(&self) -> Option<&str> {
        non_empty_str(self.version.as_ref())
    }

    /// Resolve the ES module entry point, first match wins:
    ///
    /// 1. `exports.import`
    /// 2. `exports["."].import`, only consulted when `exports.import` is not
    ///    a string at all
    /// 3. `module`
    ///
    /// An empty `exports.import` string goes straight to `module`.
    pub fn entry_import_path(&self) -> Option<&str> {
        let exports = self.exports.as_ref();
        let exports_import = match exports.and_then(|e| e.get("import")).and_then(Value::as_str) {
            Some(import) => Some(import),
            None => exports
                .and_then(|e| e.get("."))
                .and_then(|dot| dot.get("import"))
                .and_then(Value::as_str),
        };
        exports_import
            .filter(|s| !s.is_empty())
            .or_else(|| non_empty_str(self.module.as_ref()))
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
