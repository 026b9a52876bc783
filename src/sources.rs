//! Source directory partitioning.
//!
//! `<name>.app.go` files are per-target entries; every other regular file
//! is shared and compiled into every target.

use crate::config::ENTRY_SUFFIX;
use crate::error::{BuildError, Result};
use crate::targets::TargetDescriptor;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceManifest {
    pub shared_files: BTreeSet<PathBuf>,
    pub entries: BTreeMap<String, PathBuf>,
}

impl SourceManifest {
    pub fn entry(&self, target: &str) -> Option<&PathBuf> {
        self.entries.get(target)
    }

    /// Every enabled target must have an entry file before anything is
    /// compiled.
    pub fn require_entries<'a, I>(&self, targets: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a TargetDescriptor>,
    {
        let missing: Vec<&str> = targets
            .into_iter()
            .filter(|t| !self.entries.contains_key(&t.name))
            .map(|t| t.name.as_str())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BuildError::Source(format!(
                "no entry file (<name>{}) for enabled target(s): {}",
                ENTRY_SUFFIX,
                missing.join(", ")
            )))
        }
    }
}

pub fn scan_sources(src_dir: &Path) -> Result<SourceManifest> {
    let mut manifest = SourceManifest::default();

    let walker = WalkDir::new(src_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);
    for entry in walker {
        let entry = entry.map_err(|e| {
            BuildError::Source(format!(
                "unable to read source directory {}: {}",
                src_dir.display(),
                e
            ))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        match file_name.strip_suffix(ENTRY_SUFFIX) {
            Some(target) if !target.is_empty() => {
                manifest
                    .entries
                    .insert(target.to_string(), entry.path().to_path_buf());
            }
            _ => {
                manifest.shared_files.insert(entry.path().to_path_buf());
            }
        }
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn descriptor(name: &str) -> TargetDescriptor {
        TargetDescriptor {
            name: name.to_string(),
            enabled: true,
            flags: vec!["all".to_string()],
            entry_path: PathBuf::from(format!("src/{}.app.go", name)),
        }
    }

    #[test]
    fn test_partition_entries_and_shared() {
        let dir = tempfile::tempdir().unwrap();
        for f in ["args.go", "completions.go", "remotes.app.go", "golint.app.go", "README"] {
            fs::write(dir.path().join(f), "package main\n").unwrap();
        }
        fs::create_dir(dir.path().join("testdata")).unwrap();

        let manifest = scan_sources(dir.path()).unwrap();

        assert_eq!(
            manifest.entries.keys().collect::<Vec<_>>(),
            vec!["golint", "remotes"]
        );
        assert_eq!(manifest.entry("remotes"), Some(&dir.path().join("remotes.app.go")));
        assert_eq!(manifest.shared_files.len(), 3);
        assert!(manifest.shared_files.contains(&dir.path().join("args.go")));
        assert!(!manifest.shared_files.contains(&dir.path().join("testdata")));
    }

    #[test]
    fn test_missing_directory_is_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_sources(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, BuildError::Source(_)));
    }

    #[test]
    fn test_require_entries_lists_missing_targets() {
        let mut manifest = SourceManifest::default();
        manifest
            .entries
            .insert("remotes".to_string(), PathBuf::from("src/remotes.app.go"));

        assert!(manifest.require_entries([&descriptor("remotes")]).is_ok());

        let targets = [descriptor("remotes"), descriptor("vm"), descriptor("golint")];
        let err = manifest.require_entries(targets.iter()).unwrap_err();
        assert!(err.to_string().ends_with("vm, golint"));
    }
}
