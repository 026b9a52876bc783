//! Run settings.
//!
//! Everything a run needs is assembled once into [`Settings`] and passed by
//! reference to every phase. Values are layered: built-in defaults, then the
//! optional project file `mb.toml`, then environment variables.

use crate::error::{BuildError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROJECT_FILE: &str = "mb.toml";
pub const MODULE_FILE: &str = "go.mod";
pub const DECLARATION_EXT: &str = ".json";
pub const ENTRY_SUFFIX: &str = ".app.go";
pub const SOURCE_EXT: &str = "go";
pub const DEFAULT_DEST_ROOT: &str = "$(HOME)/.local/bin";
pub const DEFAULT_ENABLE_MARKER: &str = "all";

pub const DEFAULT_BUILD_FLAGS: &[&str] = &[
    "-trimpath",
    "-buildmode=pie",
    "-mod=vendor",
    "-modcacherw",
    "-buildvcs=false",
];

/// Optional `mb.toml` overrides. Every field may be omitted.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub config_dir: Option<PathBuf>,
    pub src_dir: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    pub toolchain: Option<String>,
    pub build_flags: Option<Vec<String>>,
    pub enable_marker: Option<String>,
    pub platform_guard: Option<bool>,
}

/// Immutable settings for one orchestrator run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Project root; relative paths below are resolved against it.
    pub root: PathBuf,
    /// Directory of `<target>.json` declaration files.
    pub config_dir: PathBuf,
    pub src_dir: PathBuf,
    /// Output directory for binaries, workspaces and the install manifest.
    pub build_dir: PathBuf,
    /// Install root written into the manifest.
    pub dest_root: String,
    /// Target platform identifier in Go naming (`linux`, `darwin`, ...).
    pub platform: String,
    pub toolchain: String,
    pub build_flags: Vec<String>,
    pub enable_marker: String,
    pub platform_guard: bool,
    /// Files whose modification invalidates every target.
    pub descriptors: Vec<PathBuf>,
}

impl Settings {
    /// Defaults for a project rooted at `root`, ignoring `mb.toml` and the
    /// environment.
    pub fn new(root: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_dir: config_dir.into(),
            src_dir: root.join("src"),
            build_dir: root.join("build"),
            dest_root: DEFAULT_DEST_ROOT.to_string(),
            platform: host_platform().to_string(),
            toolchain: "go".to_string(),
            build_flags: DEFAULT_BUILD_FLAGS.iter().map(|f| f.to_string()).collect(),
            enable_marker: DEFAULT_ENABLE_MARKER.to_string(),
            platform_guard: true,
            descriptors: vec![root.join(MODULE_FILE)],
            root,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.build_dir.join("Makefile")
    }

    pub fn binary_path(&self, target: &str) -> PathBuf {
        self.build_dir.join(target)
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.build_dir.join(".work")
    }

    /// Declaration file of `target`, as the generated program will read it.
    pub fn declaration_path(&self, target: &str) -> PathBuf {
        self.config_dir.join(format!("{}{}", target, DECLARATION_EXT))
    }
}

/// Load settings for the project at `root` from `mb.toml` and the process
/// environment.
pub fn load_settings(root: &Path) -> Result<Settings> {
    load_settings_with(root, |key| std::env::var(key).ok())
}

/// Same as [`load_settings`] with an explicit environment lookup.
pub fn load_settings_with<F>(root: &Path, env: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let project_file = root.join(PROJECT_FILE);
    let project = if project_file.exists() {
        let content = fs::read_to_string(&project_file)
            .map_err(|e| BuildError::config(&project_file, e.to_string()))?;
        toml::from_str::<ProjectConfig>(&content)
            .map_err(|e| BuildError::config(&project_file, e.to_string()))?
    } else {
        ProjectConfig::default()
    };

    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let config_dir = match non_empty("MB_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => match &project.config_dir {
            Some(dir) => resolve(root, dir),
            None => default_config_dir(&env)?,
        },
    };

    let mut settings = Settings::new(root, config_dir);

    if let Some(dir) = &project.src_dir {
        settings.src_dir = resolve(root, dir);
    }
    if let Some(dir) = non_empty("BUILDDIR") {
        settings.build_dir = resolve(root, Path::new(&dir));
    } else if let Some(dir) = &project.build_dir {
        settings.build_dir = resolve(root, dir);
    }
    if let Some(dest) = non_empty("DESTDIR") {
        settings.dest_root = dest;
    }
    if let Some(os) = non_empty("OS") {
        settings.platform = os;
    }
    if let Some(go) = non_empty("GO") {
        settings.toolchain = go;
    } else if let Some(tc) = project.toolchain {
        settings.toolchain = tc;
    }
    if let Some(flags) = project.build_flags {
        settings.build_flags = flags;
    }
    if let Some(marker) = project.enable_marker {
        settings.enable_marker = marker;
    }
    if let Some(guard) = project.platform_guard {
        settings.platform_guard = guard;
    }
    if project_file.exists() {
        settings.descriptors.push(project_file);
    }

    Ok(settings)
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn default_config_dir<F>(env: &F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let home = env("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .ok_or_else(|| BuildError::config(PROJECT_FILE, "unable to locate home directory"))?;
    Ok(home.join(".config").join("tooling"))
}

/// The host platform in the naming the Go toolchain uses for `GOOS`.
pub fn host_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}
