use super::entrypoint::{EntrypointContext, symbol_name};
use super::feedback::FeedbackAnalyzer;
use super::staleness::needs_rebuild;
use super::workspace::{find_collision, materialize, workspace_id};
use crate::config::Settings;
use crate::error::{BuildError, Result};
use crate::manifest::InstallManifest;
use crate::sources::{SourceManifest, scan_sources};
use crate::targets::{FlagMapping, TargetDescriptor, TargetScan, scan_targets};
use crate::ui;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One enabled target and what the run has to do with it.
#[derive(Debug, Clone)]
pub struct BuildJob {
    pub target: TargetDescriptor,
    pub binary: PathBuf,
    pub needs_build: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Built,
    UpToDate,
    Failed,
}

impl BuildStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BuildStatus::Built => "built",
            BuildStatus::UpToDate => "up-to-date",
            BuildStatus::Failed => "failed",
        }
    }
}

/// Outcome of one job, produced by exactly one task.
#[derive(Debug)]
pub struct BuildResult {
    pub name: String,
    pub built: bool,
    pub error: Option<BuildError>,
}

impl BuildResult {
    pub fn status(&self) -> BuildStatus {
        match (&self.error, self.built) {
            (Some(_), _) => BuildStatus::Failed,
            (None, true) => BuildStatus::Built,
            (None, false) => BuildStatus::UpToDate,
        }
    }
}

/// Everything the scan phase learned, before any compilation.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub scan: TargetScan,
    pub sources: SourceManifest,
    pub jobs: Vec<BuildJob>,
}

#[derive(Debug)]
pub struct BuildReport {
    pub results: Vec<BuildResult>,
    pub manifest: PathBuf,
}

/// Scan declarations and sources and decide which targets are stale.
/// Every failure here aborts the run before anything is compiled.
pub fn plan(settings: &Settings) -> Result<BuildPlan> {
    let scan = scan_targets(settings)?;
    let sources = scan_sources(&settings.src_dir)?;
    sources.require_entries(scan.enabled())?;
    let jobs = plan_jobs(settings, &scan, &sources)?;
    Ok(BuildPlan {
        scan,
        sources,
        jobs,
    })
}

/// Staleness of every enabled target, in discovery order.
pub fn plan_jobs(
    settings: &Settings,
    scan: &TargetScan,
    sources: &SourceManifest,
) -> Result<Vec<BuildJob>> {
    let mut jobs = Vec::new();
    for target in scan.enabled() {
        let entry = sources.entry(&target.name).ok_or_else(|| {
            BuildError::Source(format!("no entry file for target '{}'", target.name))
        })?;
        let binary = settings.binary_path(&target.name);

        let inputs = std::iter::once(entry.as_path())
            .chain(sources.shared_files.iter().map(PathBuf::as_path))
            .chain(settings.descriptors.iter().map(PathBuf::as_path));
        let needs_build = needs_rebuild(&binary, inputs)?;

        debug!(name = %target.name, needs_build, "planned");
        jobs.push(BuildJob {
            target: target.clone(),
            binary,
            needs_build,
        });
    }
    Ok(jobs)
}

/// Full run: plan, compile stale targets in parallel, report, and write the
/// install manifest when every target is good.
pub fn build_all(settings: &Settings) -> Result<BuildReport> {
    let start_time = Instant::now();

    fs::create_dir_all(&settings.build_dir).map_err(|source| BuildError::Io {
        path: settings.build_dir.clone(),
        source,
    })?;

    let plan = plan(settings)?;
    info!(
        targets = plan.jobs.len(),
        stale = plan.jobs.iter().filter(|j| j.needs_build).count(),
        platform = %settings.platform,
        "starting build"
    );

    let results = run_jobs(settings, &plan.jobs, &plan.scan.flags, &plan.sources)?;
    for result in &results {
        ui::print_status(&result.name, result.status());
    }

    if results.iter().any(|r| r.error.is_some()) {
        let errors = results.into_iter().filter_map(|r| r.error).collect();
        return Err(BuildError::BuildFailed(errors));
    }

    println!(
        "\n{} build completed in {:.2?}",
        "✓".green(),
        start_time.elapsed()
    );

    let manifest = InstallManifest::for_targets(&settings.dest_root, plan.scan.enabled());
    let manifest_path = settings.manifest_path();
    manifest.write(&manifest_path)?;
    debug!(path = %manifest_path.display(), rules = manifest.rules.len(), "wrote install manifest");

    Ok(BuildReport {
        results,
        manifest: manifest_path,
    })
}

/// Dispatch one task per job and collect results in dispatch order.
///
/// Stale jobs run concurrently on a pool with one thread per stale job;
/// up-to-date jobs never reach the pool. A failing job never cancels its
/// siblings.
pub fn run_jobs(
    settings: &Settings,
    jobs: &[BuildJob],
    flags: &FlagMapping,
    sources: &SourceManifest,
) -> Result<Vec<BuildResult>> {
    let symbols: Vec<String> = jobs.iter().map(|j| symbol_name(&j.target.name)).collect();
    if let Some((first, second)) = find_collision(symbols.iter().map(String::as_str)) {
        let owners: Vec<&str> = jobs
            .iter()
            .zip(&symbols)
            .filter(|(_, s)| s.as_str() == first || s.as_str() == second)
            .map(|(j, _)| j.target.name.as_str())
            .collect();
        return Err(BuildError::build(
            owners.join(", "),
            format!(
                "targets collide on workspace {} ({} / {})",
                workspace_id(second),
                first,
                second
            ),
        ));
    }

    let stale: Vec<&BuildJob> = jobs.iter().filter(|j| j.needs_build).collect();
    let pb = progress_bar(stale.len() as u64);

    // One leaf per stale job so no two compiles share a worker.
    let compile_stale = || -> Vec<BuildResult> {
        stale
            .par_iter()
            .with_max_len(1)
            .map(|job| {
                pb.set_message(format!("Compiling {}", job.target.name));
                let outcome = compile(settings, job, flags, sources);
                pb.inc(1);
                match outcome {
                    Ok(()) => BuildResult {
                        name: job.target.name.clone(),
                        built: true,
                        error: None,
                    },
                    Err(e) => BuildResult {
                        name: job.target.name.clone(),
                        built: false,
                        error: Some(e),
                    },
                }
            })
            .collect()
    };

    let compiled = if stale.is_empty() {
        Vec::new()
    } else {
        match ThreadPoolBuilder::new()
            .num_threads(stale.len())
            .thread_name(|i| format!("mb-build-{}", i))
            .build()
        {
            Ok(pool) => pool.install(compile_stale),
            Err(e) => {
                warn!(error = %e, "unable to size build pool, using the global pool");
                compile_stale()
            }
        }
    };

    let mut compiled = compiled.into_iter();
    let results = jobs
        .iter()
        .filter_map(|job| {
            if job.needs_build {
                compiled.next()
            } else {
                Some(BuildResult {
                    name: job.target.name.clone(),
                    built: false,
                    error: None,
                })
            }
        })
        .collect();

    pb.finish_and_clear();
    Ok(results)
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Materialize the workspace of one job and run the toolchain once.
fn compile(
    settings: &Settings,
    job: &BuildJob,
    flags: &FlagMapping,
    sources: &SourceManifest,
) -> Result<()> {
    let name = &job.target.name;
    let ctx = EntrypointContext::new(name, settings, flags);
    let entrypoint = ctx
        .render()
        .map_err(|e| BuildError::build(name, format!("unable to render entrypoint: {}", e)))?;

    let workspace = settings.workspace_root().join(workspace_id(&ctx.symbol));
    let entry = sources.entry(name).unwrap_or(&job.target.entry_path);
    let inputs = materialize(
        &workspace,
        &entrypoint,
        sources
            .shared_files
            .iter()
            .map(PathBuf::as_path)
            .chain(std::iter::once(entry.as_path())),
    )
    .map_err(|e| BuildError::build(name, e))?;

    debug!(name = %name, workspace = %workspace.display(), "invoking toolchain");
    let output = toolchain_command(settings, &job.binary, &inputs)
        .output()
        .map_err(|e| {
            let message = format!("failed to spawn {}: {}", settings.toolchain, e);
            BuildError::build(name, with_hint(message, &ctx.symbol))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = format!(
            "{} build exited with {}\n{}",
            settings.toolchain,
            output.status,
            stderr.trim_end()
        );
        return Err(BuildError::build(name, with_hint(message, &ctx.symbol)));
    }

    Ok(())
}

fn toolchain_command(settings: &Settings, binary: &Path, inputs: &[PathBuf]) -> Command {
    let mut cmd = Command::new(&settings.toolchain);
    cmd.arg("build")
        .args(&settings.build_flags)
        .arg("-o")
        .arg(binary)
        .args(inputs)
        .env("GOOS", &settings.platform)
        .current_dir(&settings.root);
    cmd
}

fn with_hint(message: String, symbol: &str) -> String {
    match FeedbackAnalyzer::analyze(&message, symbol) {
        Some(hint) => format!("{}\n{} {}", message, "hint:".cyan(), hint),
        None => message,
    }
}
