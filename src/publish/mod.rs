//! Content-addressed output files.
//!
//! [`OutputLayout`] owns the naming scheme (`<name>@<version>.js`, with a
//! `.gz` suffix when compressing) and is shared by the import rewriter, which
//! needs public URLs, and the [`Publisher`], which needs file paths.

mod layout;

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use log::{debug, warn};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub use layout::{Compression, OutputLayout};

/// One produced output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub package: String,
    pub path: PathBuf,
    pub compressed: bool,
}

impl OutputArtifact {
    /// The output path with `/` separators on every platform.
    pub fn display_path(&self) -> String {
        let path = self.path.to_string_lossy();
        if std::path::MAIN_SEPARATOR == '/' {
            path.into_owned()
        } else {
            path.replace(std::path::MAIN_SEPARATOR, "/")
        }
    }
}

pub struct Publisher<'a, R: Runtime + ?Sized> {
    runtime: &'a R,
    layout: &'a OutputLayout,
}

impl<'a, R: Runtime + ?Sized> Publisher<'a, R> {
    pub fn new(runtime: &'a R, layout: &'a OutputLayout) -> Self {
        Self { runtime, layout }
    }

    /// Write one package's output file.
    ///
    /// `write_content` streams the content into the writer it is handed; when
    /// compression is on, that writer is a gzip encoder. The file is written
    /// under a temporary name and only renamed to its final name once the
    /// whole stream succeeded, so a failure never leaves a file that looks
    /// like a valid output.
    #[tracing::instrument(skip(self, write_content))]
    pub fn publish<F>(&self, name: &str, version: &str, write_content: F) -> Result<OutputArtifact>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let path = self.layout.output_path(name, version);
        if let Some(parent) = path.parent() {
            self.runtime.create_dir_all(parent)?;
        }

        let temp_path = partial_path(&path);
        if let Err(e) = self.write_to(&temp_path, write_content) {
            self.discard(&temp_path);
            return Err(e);
        }
        if let Err(e) = self.runtime.rename(&temp_path, &path) {
            self.discard(&temp_path);
            return Err(e);
        }

        debug!("Published {} to {}", name, path.display());
        Ok(OutputArtifact {
            package: name.to_string(),
            path,
            compressed: self.layout.compression().is_enabled(),
        })
    }

    fn write_to<F>(&self, path: &Path, write_content: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let file = self.runtime.create_file(path)?;
        let mut writer = BufWriter::new(file);

        match self.layout.compression() {
            Compression::None => {
                write_content(&mut writer)?;
            }
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(&mut writer, flate2::Compression::best());
                write_content(&mut encoder)?;
                encoder
                    .finish()
                    .with_context(|| format!("Failed to finish gzip stream {}", path.display()))?;
            }
        }

        writer
            .flush()
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn discard(&self, temp_path: &Path) {
        if !self.runtime.exists(temp_path) {
            return;
        }
        if let Err(e) = self.runtime.remove_file(temp_path) {
            warn!("Failed to remove {}: {:#}", temp_path.display(), e);
        }
    }
}

/// Hidden sibling used while an output file is being written.
fn partial_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", file_name))
}
