use anyhow::Result;
use clap::Parser;
use node2esm::config::{Config, default_jobs};
use node2esm::publish::Compression;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

/// node2esm - publish node_modules as browser ES modules
///
/// Reads every package under the source directory, pins it to its declared
/// version (or a digest of its entry file), rewrites imports between packages
/// to the published URLs and writes `<name>@<version>.js` files.
///
/// Examples:
///   node2esm                        # node_modules -> esmodules
///   node2esm --dir static/js --gzip # gzipped output for Content-Encoding: gzip
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// The directory to write the output files to
    #[arg(long = "dir", env = "NODE2ESM_DIR", value_name = "PATH", default_value = "esmodules")]
    pub output_dir: PathBuf,

    /// Gzip output files so they can be served directly with Content-Encoding: gzip
    #[arg(long, env = "NODE2ESM_GZIP")]
    pub gzip: bool,

    /// The package directory to read from
    #[arg(
        long = "source",
        short = 's',
        env = "NODE2ESM_SOURCE",
        value_name = "PATH",
        default_value = "node_modules"
    )]
    pub source_dir: PathBuf,

    /// Remove the output directory before writing
    #[arg(long)]
    pub clean: bool,

    /// Number of packages to rewrite in parallel (defaults to the number of CPUs)
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<NonZeroUsize>,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            source_dir: cli.source_dir,
            output_dir: cli.output_dir,
            compression: if cli.gzip {
                Compression::Gzip
            } else {
                Compression::None
            },
            clean: cli.clean,
            jobs: cli.jobs.unwrap_or_else(default_jobs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config = Config::from(Cli::parse());
    let runtime = Arc::new(node2esm::runtime::RealRuntime);

    let report = node2esm::pipeline::run(runtime, &config).await?;
    for artifact in &report.published {
        println!("{}", artifact.display_path());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["node2esm"]).unwrap();
        assert_eq!(cli.output_dir, PathBuf::from("esmodules"));
        assert_eq!(cli.source_dir, PathBuf::from("node_modules"));
        assert!(!cli.gzip);
        assert!(!cli.clean);
        assert_eq!(cli.jobs, None);
    }

    #[test]
    fn test_cli_gzip_and_dir_parsing() {
        let cli = Cli::try_parse_from(["node2esm", "--dir", "static/js", "--gzip"]).unwrap();
        let config = Config::from(cli);
        assert_eq!(config.output_dir, PathBuf::from("static/js"));
        assert_eq!(config.compression, Compression::Gzip);
    }

    #[test]
    fn test_cli_source_clean_and_jobs_parsing() {
        let cli =
            Cli::try_parse_from(["node2esm", "-s", "vendor", "--clean", "-j", "2"]).unwrap();
        let config = Config::from(cli);
        assert_eq!(config.source_dir, PathBuf::from("vendor"));
        assert!(config.clean);
        assert_eq!(config.jobs.get(), 2);
    }

    #[test]
    fn test_cli_zero_jobs_fails() {
        let result = Cli::try_parse_from(["node2esm", "--jobs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_positional_fails() {
        let result = Cli::try_parse_from(["node2esm", "node_modules"]);
        assert!(result.is_err());
    }
}
