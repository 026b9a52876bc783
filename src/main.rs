//! # mb CLI Entry Point
//!
//! `mb` takes at most one positional argument:
//! - `build` (default) - compile every stale enabled target and write the
//!   install manifest
//! - `plan` - show enabled targets, their flags and what `build` would do
//!
//! Settings come from `mb.toml` in the current directory and from the
//! `OS`, `BUILDDIR`, `DESTDIR`, `GO` and `MB_CONFIG_DIR` environment
//! variables. Set `RUST_LOG=mb=debug` for diagnostics.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use tracing_subscriber::EnvFilter;

use mb::build;
use mb::config;
use mb::ui;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser)]
#[command(name = "mb")]
#[command(about = "Incremental parallel builder for a suite of Go tools", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// What to do [default: build]
    #[arg(value_enum)]
    mode: Option<Mode>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Compile stale targets and write the install manifest
    Build,
    /// Show what a build would do without compiling anything
    Plan,
}

fn main() -> Result<()> {
    enable_windows_utf8_console();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();

    let root = std::env::current_dir().context("Failed to resolve current directory")?;
    let settings = config::load_settings(&root).context("Failed to load settings")?;

    match cli.mode.unwrap_or(Mode::Build) {
        Mode::Build => {
            build::build_all(&settings).context("build failed")?;
            Ok(())
        }
        Mode::Plan => print_plan(&settings),
    }
}

fn print_plan(settings: &config::Settings) -> Result<()> {
    let plan = build::plan(settings).context("plan failed")?;

    println!(
        "{} {} enabled target(s) for {}",
        "→".blue(),
        plan.jobs.len(),
        settings.platform.bold()
    );

    let mut table = ui::Table::new(&["Target", "Flags", "Action"]);
    for job in &plan.jobs {
        let action = if job.needs_build {
            "build".yellow().to_string()
        } else {
            "up-to-date".cyan().to_string()
        };
        table.add_row(vec![
            job.target.name.bold().to_string(),
            job.target.flags.join(", "),
            action,
        ]);
    }
    table.print();

    let disabled: Vec<&str> = plan
        .scan
        .targets
        .iter()
        .filter(|t| !t.enabled)
        .map(|t| t.name.as_str())
        .collect();
    if !disabled.is_empty() {
        println!("{} disabled: {}", "!".yellow(), disabled.join(", "));
    }

    Ok(())
}
