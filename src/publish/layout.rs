use std::fmt;
use std::path::{Path, PathBuf};

use crate::runtime::to_slash;

/// Compression applied to published files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    /// Gzip at best compression; served with `Content-Encoding: gzip`.
    Gzip,
}

impl Compression {
    pub fn is_enabled(self) -> bool {
        self != Compression::None
    }

    /// Suffix appended after `.js`.
    pub fn suffix(self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => ".gz",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
        }
    }
}

/// Where published files go and what they are called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    dir: PathBuf,
    compression: Compression,
}

impl OutputLayout {
    pub fn new(dir: PathBuf, compression: Compression) -> Self {
        Self { dir, compression }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// `<name>@<version>.js`, plus the compression suffix.
    pub fn file_name(&self, name: &str, version: &str) -> String {
        format!("{}@{}.js{}", name, version, self.compression.suffix())
    }

    /// Path of the output file on disk. Scoped names (`@scope/pkg`) land in
    /// a `@scope` subdirectory.
    pub fn output_path(&self, name: &str, version: &str) -> PathBuf {
        self.dir.join(self.file_name(name, version))
    }

    /// Absolute URL path the static server exposes the file under, always
    /// `/`-separated.
    pub fn public_path(&self, name: &str, version: &str) -> String {
        let dir = to_slash(&self.dir);
        let file_name = self.file_name(name, version);
        if dir.is_empty() {
            format!("/{}", file_name)
        } else {
            format!("/{}/{}", dir, file_name)
        }
    }
}
