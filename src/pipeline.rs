//! The conversion run.
//!
//! Two phases: discovery builds and freezes the [`Registry`], then every
//! registered package is rewritten and published on a blocking worker. The
//! registry is shared read-only; workers never touch the same output path.

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::io::BufReader;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};

use crate::{
    config::Config,
    package::{self, PackageInfo, Registry},
    publish::{OutputArtifact, OutputLayout, Publisher},
    rewrite::{ImportRewriter, RewriteStats},
    runtime::{Runtime, is_path_under},
};

/// A package that was registered but could not be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFailure {
    pub package: String,
    pub error: String,
}

/// Outcome of a run, in registry order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub published: Vec<OutputArtifact>,
    pub failed: Vec<PackageFailure>,
}

/// Convert every package under `config.source_dir`.
///
/// Only an unreadable source directory or an output directory that cannot be
/// prepared is an error; per-package problems are logged and reported.
#[tracing::instrument(skip(runtime, config))]
pub async fn run<R: Runtime + 'static>(runtime: Arc<R>, config: &Config) -> Result<RunReport> {
    let candidates = package::scan(runtime.as_ref(), &config.source_dir)?;
    prepare_output_dir(runtime.as_ref(), config)?;

    let registry = Arc::new(package::resolve_all(runtime.as_ref(), candidates));
    info!(
        "Publishing {} package(s) to {} (compression: {}, jobs: {})",
        registry.len(),
        config.output_dir.display(),
        config.compression,
        config.jobs
    );

    let layout = Arc::new(config.layout());
    let semaphore = Arc::new(Semaphore::new(config.jobs.get()));
    let mut tasks = JoinSet::new();
    let mut workers: HashMap<task::Id, (usize, String)> = HashMap::with_capacity(registry.len());

    for (index, package) in registry.iter().enumerate() {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let package = package.clone();
        let name = package.name().to_string();
        let runtime = Arc::clone(&runtime);
        let registry = Arc::clone(&registry);
        let layout = Arc::clone(&layout);

        let handle = tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = publish_package(runtime.as_ref(), &registry, &layout, &package);
            (index, package.name().to_string(), result)
        });
        workers.insert(handle.id(), (index, name));
    }

    let mut outcomes = Vec::with_capacity(registry.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => match workers.remove(&e.id()) {
                Some((index, name)) => {
                    outcomes.push((index, name, Err(anyhow!("Worker failed: {}", e))))
                }
                None => warn!("Worker failed: {}", e),
            },
        }
    }
    outcomes.sort_by_key(|(index, _, _)| *index);

    let mut report = RunReport::default();
    for (_, name, result) in outcomes {
        match result {
            Ok((artifact, stats)) => {
                debug!(
                    "{}: {} line(s), {} import(s) rewritten",
                    name, stats.lines, stats.rewritten
                );
                report.published.push(artifact);
            }
            Err(e) => {
                warn!("{}: {:#}", name, e);
                report.failed.push(PackageFailure {
                    package: name,
                    error: format!("{:#}", e),
                });
            }
        }
    }

    info!(
        "Published {} file(s), {} package(s) failed",
        report.published.len(),
        report.failed.len()
    );
    Ok(report)
}

fn prepare_output_dir<R: Runtime + ?Sized>(runtime: &R, config: &Config) -> Result<()> {
    let output_dir = &config.output_dir;

    if config.clean && runtime.exists(output_dir) {
        // Compare resolved paths when both exist, lexical ones otherwise
        let (source, output) = match (
            runtime.canonicalize(&config.source_dir),
            runtime.canonicalize(output_dir),
        ) {
            (Ok(source), Ok(output)) => (source, output),
            _ => (config.source_dir.clone(), output_dir.clone()),
        };
        if is_path_under(&source, &output) {
            bail!(
                "Refusing to clean {}: it contains the package source directory {}",
                output_dir.display(),
                config.source_dir.display()
            );
        }
        debug!("Cleaning output directory {}", output_dir.display());
        runtime
            .remove_dir_all(output_dir)
            .context("Failed to clean output directory")?;
    }

    runtime
        .create_dir_all(output_dir)
        .context("Failed to create output directory")
}

/// Rewrite one package's entry file straight into its output file.
fn publish_package<R: Runtime + ?Sized>(
    runtime: &R,
    registry: &Registry,
    layout: &OutputLayout,
    package: &PackageInfo,
) -> Result<(OutputArtifact, RewriteStats)> {
    let entry = package.entry_path();
    let reader = BufReader::new(runtime.open(&entry)?);
    let rewriter = ImportRewriter::new(registry, layout);

    let mut stats = RewriteStats::default();
    let artifact = Publisher::new(runtime, layout).publish(
        package.name(),
        package.resolved_version(),
        |writer| {
            stats = rewriter
                .rewrite(reader, writer)
                .with_context(|| format!("Failed to rewrite {}", entry.display()))?;
            Ok(())
        },
    )?;

    Ok((artifact, stats))
}
