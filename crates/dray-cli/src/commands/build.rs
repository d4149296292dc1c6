//! `dray build`: drive one full bundler run.
//!
//! The CLI registers every source file under the configured root with its
//! raw contents. No parsing happens here; module ids and dependency lists
//! come from external tracing tooling through the library API.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use walkdir::WalkDir;

use dray_bundler::{
    Bundler, ConfigValidator, FileBundleFactory, FsPackageAnalyzer, FsValidator, SourceFile,
};

use crate::cli::BuildArgs;
use crate::error::{CliError, Result};
use crate::{config, ui};

/// Trace cache file written into the build target with `--emit-trace`.
const TRACE_FILE: &str = "dray-trace.json";

pub async fn execute(args: BuildArgs) -> Result<()> {
    let started = Instant::now();

    let build_config = config::load_build_config(&args)?;
    FsValidator::new(&args.dir).validate(&build_config)?;

    let root = build_config.root.clone();
    let dependencies = build_config.dependencies.clone();

    let analyzer = Arc::new(FsPackageAnalyzer::new(
        &args.dir,
        args.dir.join(&args.packages),
    ));
    let mut bundler = Bundler::create(build_config, analyzer, &FileBundleFactory).await?;

    let sources = scan_sources(&args.dir, &root)?;
    info!(files = sources.len(), root = %root.display(), "registering sources");
    for file in sources {
        bundler.add_file(file, None)?;
    }

    // Top-level dependencies are configured one at a time; per-bundle
    // dependencies follow during each bundle's transform.
    for dependency in dependencies {
        bundler.configure_dependency(dependency).await?;
    }

    bundler.build().await?;

    let target = bundler
        .config()
        .targets
        .first()
        .cloned()
        .ok_or(CliError::Bundler(dray_bundler::Error::NoTargets))?;
    bundler.write().await?;

    if args.emit_trace {
        emit_trace(&bundler, &target).await?;
    }

    ui::success(&format!(
        "wrote {} bundles to {} in {} ms",
        bundler.bundles().len(),
        target.display(),
        started.elapsed().as_millis()
    ));
    ui::detail("items", bundler.item_count());
    ui::detail("environment", &bundler.config().environment);

    let orphans = bundler.orphans();
    if !orphans.is_empty() {
        ui::warn(&format!(
            "{} item(s) were not accepted by any bundle",
            orphans.len()
        ));
    }

    Ok(())
}

/// Collect `.js` files under the source root, keyed relative to the project
/// directory so bundle globs like `src/**` match.
fn scan_sources(project_dir: &Path, root: &Path) -> Result<Vec<SourceFile>> {
    let source_dir = if root.is_absolute() {
        root.to_path_buf()
    } else {
        project_dir.join(root)
    };

    let mut sources = Vec::new();
    for entry in WalkDir::new(&source_dir).sort_by_file_name() {
        let entry = entry.map_err(|source| CliError::Scan {
            path: source_dir.clone(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|ext| ext.to_str()) != Some("js") {
            continue;
        }

        let contents = std::fs::read_to_string(entry.path())?;
        let registered = entry
            .path()
            .strip_prefix(project_dir)
            .unwrap_or(entry.path())
            .to_path_buf();
        debug!(path = %registered.display(), "scanned source file");
        sources.push(SourceFile::new(registered).with_contents(contents));
    }
    Ok(sources)
}

async fn emit_trace(bundler: &Bundler, target: &Path) -> Result<()> {
    let trace = bundler.trace_cache();
    let json = serde_json::to_vec_pretty(&trace)?;
    tokio::fs::write(target.join(TRACE_FILE), json).await?;
    info!(entries = trace.len(), file = TRACE_FILE, "trace cache written");
    Ok(())
}
