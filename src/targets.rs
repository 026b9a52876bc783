//! Target declarations.
//!
//! Each `<target>.json` file in the declaration directory describes one
//! potential target. Only its `Flags` list matters here:
//!
//! ```json
//! { "Flags": ["all", "linux"], "Settings": { ... } }
//! ```
//!
//! A target is enabled when its flags contain the always-marker (`all` by
//! default) or the active platform identifier. Every scanned target, enabled
//! or not, contributes its full flag list to the [`FlagMapping`].

use crate::config::{DECLARATION_EXT, ENTRY_SUFFIX, Settings};
use crate::error::{BuildError, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::debug;

/// Target name to its complete, ordered flag list.
pub type FlagMapping = BTreeMap<String, Vec<String>>;

static TARGET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("target name pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub name: String,
    pub enabled: bool,
    pub flags: Vec<String>,
    pub entry_path: PathBuf,
}

/// Result of scanning the declaration directory.
#[derive(Debug, Clone)]
pub struct TargetScan {
    /// Every declared target, in file-name order.
    pub targets: Vec<TargetDescriptor>,
    pub flags: FlagMapping,
}

impl TargetScan {
    pub fn enabled(&self) -> impl Iterator<Item = &TargetDescriptor> {
        self.targets.iter().filter(|t| t.enabled)
    }
}

/// Names that would clash with files the build writes next to the binaries.
const RESERVED_NAMES: &[&str] = &["Makefile"];

pub fn is_valid_target_name(name: &str) -> bool {
    TARGET_NAME.is_match(name) && !RESERVED_NAMES.contains(&name)
}

/// Enablement predicate: the always-marker or the active platform.
pub fn is_enabled(flags: &[String], marker: &str, platform: &str) -> bool {
    flags.iter().any(|f| f == marker || f == platform)
}

/// Extract the `Flags` list from one declaration document.
pub fn parse_flags(content: &str) -> std::result::Result<Vec<String>, String> {
    let doc: Value = serde_json::from_str(content).map_err(|e| format!("invalid JSON: {}", e))?;
    let obj = doc
        .as_object()
        .ok_or_else(|| "expected a JSON object".to_string())?;
    let flags = obj
        .get("Flags")
        .ok_or_else(|| "no Flags field".to_string())?
        .as_array()
        .ok_or_else(|| "Flags is not a list".to_string())?;

    flags
        .iter()
        .map(|f| match f {
            Value::String(s) => Ok(s.clone()),
            other => Err(format!("flag {} is not a string", other)),
        })
        .collect()
}

/// Scan the declaration directory and fail when nothing is enabled.
pub fn scan_targets(settings: &Settings) -> Result<TargetScan> {
    let dir = &settings.config_dir;
    let entries = fs::read_dir(dir).map_err(|e| BuildError::config(dir, e.to_string()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::config(dir, e.to_string()))?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        if let Some(name) = file_name.strip_suffix(DECLARATION_EXT) {
            files.push((name.to_string(), entry.path()));
        }
    }
    files.sort();

    let mut targets = Vec::with_capacity(files.len());
    let mut flags = FlagMapping::new();

    for (name, path) in files {
        if !is_valid_target_name(&name) {
            return Err(BuildError::config(
                &path,
                format!("'{}' is not a valid target name", name),
            ));
        }
        let content =
            fs::read_to_string(&path).map_err(|e| BuildError::config(&path, e.to_string()))?;
        let target_flags =
            parse_flags(&content).map_err(|reason| BuildError::config(&path, reason))?;
        let enabled = is_enabled(&target_flags, &settings.enable_marker, &settings.platform);

        debug!(name = %name, enabled, flags = ?target_flags, "scanned declaration");

        flags.insert(name.clone(), target_flags.clone());
        targets.push(TargetDescriptor {
            entry_path: settings.src_dir.join(format!("{}{}", name, ENTRY_SUFFIX)),
            name,
            enabled,
            flags: target_flags,
        });
    }

    let scan = TargetScan { targets, flags };
    if scan.enabled().next().is_none() {
        return Err(BuildError::NoTargets {
            platform: settings.platform.clone(),
            scanned: scan.targets.len(),
        });
    }
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn settings_for(decl: &Path, platform: &str) -> Settings {
        let mut settings = Settings::new(decl.join("project"), decl);
        settings.platform = platform.to_string();
        settings
    }

    fn declare(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(format!("{}.json", name)), body).unwrap();
    }

    #[test]
    fn test_parse_flags_keeps_order() {
        let flags = parse_flags(r#"{"Flags": ["linux", "all", "beta"], "Settings": {"x": 1}}"#).unwrap();
        assert_eq!(flags, vec!["linux", "all", "beta"]);
    }

    #[test]
    fn test_parse_flags_errors() {
        assert!(parse_flags("{").unwrap_err().contains("invalid JSON"));
        assert_eq!(parse_flags(r#"{"Settings": {}}"#).unwrap_err(), "no Flags field");
        assert_eq!(parse_flags(r#"{"Flags": "all"}"#).unwrap_err(), "Flags is not a list");
        assert!(parse_flags(r#"{"Flags": ["all", 3]}"#).unwrap_err().contains("not a string"));
        assert_eq!(parse_flags("[1]").unwrap_err(), "expected a JSON object");
    }

    #[test]
    fn test_enablement_predicate() {
        let flags = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(is_enabled(&flags(&["all"]), "all", "linux"));
        assert!(is_enabled(&flags(&["darwin", "linux"]), "all", "linux"));
        assert!(!is_enabled(&flags(&["darwin"]), "all", "linux"));
        assert!(!is_enabled(&flags(&["enabled"]), "all", "linux"));
        assert!(!is_enabled(&[], "all", "linux"));
    }

    #[test]
    fn test_target_names() {
        assert!(is_valid_target_name("git-uncommitted"));
        assert!(is_valid_target_name("vm_2"));
        assert!(!is_valid_target_name("2fast"));
        assert!(!is_valid_target_name("bad name"));
        assert!(!is_valid_target_name(""));
        assert!(!is_valid_target_name("Makefile"));
    }

    #[test]
    fn test_scan_keeps_full_mapping_for_disabled_targets() {
        let dir = tempfile::tempdir().unwrap();
        declare(dir.path(), "remotes", r#"{"Flags": ["all"]}"#);
        declare(dir.path(), "vm", r#"{"Flags": ["darwin", "gui"]}"#);
        declare(dir.path(), "git-uncommitted", r#"{"Flags": ["linux"]}"#);
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let scan = scan_targets(&settings_for(dir.path(), "linux")).unwrap();

        let enabled: Vec<_> = scan.enabled().map(|t| t.name.as_str()).collect();
        assert_eq!(enabled, vec!["git-uncommitted", "remotes"]);
        assert_eq!(scan.targets.len(), 3);
        assert_eq!(scan.flags["vm"], vec!["darwin", "gui"]);
        assert_eq!(
            scan.targets[0].entry_path,
            dir.path().join("project").join("src").join("git-uncommitted.app.go")
        );
    }

    #[test]
    fn test_scan_without_enabled_targets_fails() {
        let dir = tempfile::tempdir().unwrap();
        declare(dir.path(), "vm", r#"{"Flags": ["darwin"]}"#);

        let err = scan_targets(&settings_for(dir.path(), "linux")).unwrap_err();
        assert!(matches!(err, BuildError::NoTargets { scanned: 1, .. }));
    }

    #[test]
    fn test_scan_rejects_missing_flags() {
        let dir = tempfile::tempdir().unwrap();
        declare(dir.path(), "remotes", r#"{"Flags": ["all"]}"#);
        declare(dir.path(), "broken", r#"{"Settings": {}}"#);

        let err = scan_targets(&settings_for(dir.path(), "linux")).unwrap_err();
        match err {
            BuildError::Config { path, reason } => {
                assert!(path.ends_with("broken.json"));
                assert_eq!(reason, "no Flags field");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scan_rejects_invalid_names() {
        let dir = tempfile::tempdir().unwrap();
        declare(dir.path(), "has space", r#"{"Flags": ["all"]}"#);

        let err = scan_targets(&settings_for(dir.path(), "linux")).unwrap_err();
        assert!(err.to_string().contains("not a valid target name"));
    }
}
