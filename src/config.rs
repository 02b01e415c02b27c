use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::publish::{Compression, OutputLayout};

pub const DEFAULT_SOURCE_DIR: &str = "node_modules";
pub const DEFAULT_OUTPUT_DIR: &str = "esmodules";

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one subdirectory per package.
    pub source_dir: PathBuf,
    /// Directory the published files are written to.
    pub output_dir: PathBuf,
    pub compression: Compression,
    /// Remove the output directory before publishing instead of overwriting
    /// files in place.
    pub clean: bool,
    /// Upper bound on packages rewritten at the same time.
    pub jobs: NonZeroUsize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            compression: Compression::None,
            clean: false,
            jobs: default_jobs(),
        }
    }
}

impl Config {
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(self.output_dir.clone(), self.compression)
    }
}

pub fn default_jobs() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source_dir, PathBuf::from("node_modules"));
        assert_eq!(config.output_dir, PathBuf::from("esmodules"));
        assert_eq!(config.compression, Compression::None);
        assert!(!config.clean);
        assert!(config.jobs.get() >= 1);
    }

    #[test]
    fn test_layout_follows_config() {
        let config = Config {
            output_dir: PathBuf::from("static/js"),
            compression: Compression::Gzip,
            ..Config::default()
        };
        let layout = config.layout();
        assert_eq!(layout.dir(), PathBuf::from("static/js").as_path());
        assert_eq!(layout.public_path("a", "1"), "/static/js/a@1.js.gz");
    }
}
