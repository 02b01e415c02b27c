//! Runtime abstraction for file system operations.
//!
//! Every read of the package source directory and every write into the
//! output directory goes through the [`Runtime`] trait, so the catalog,
//! version resolver and publisher can be exercised against a mock.
//!
//! # Structure
//!
//! - `fs` - File system operations (read, write, directory)
//! - `path` - Lexical path helpers (normalize, containment, slash form)

mod fs;
pub mod path;

use anyhow::Result;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub use path::{is_path_under, normalize_path, to_slash};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// List the entries of a directory, sorted by path so scans are stable
    /// across platforms and file systems.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Create (or truncate) a file for streaming writes.
    fn create_file(&self, path: &Path) -> Result<Box<dyn Write + Send>>;

    /// Open a file for streaming reads.
    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.rename_impl(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        self.canonicalize_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn create_file(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        self.create_file_impl(path)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        self.open_impl(path)
    }
}
