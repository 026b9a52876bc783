//! Isolated per-target source trees.
//!
//! A workspace lives at `<build-dir>/.work/<id>` where `<id>` is a truncated
//! SHA-256 of the target's Go symbol. Concurrent builds never share one.

use crate::config::SOURCE_EXT;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const WORKSPACE_ID_LEN: usize = 12;
pub const GENERATED_MAIN: &str = "main_generated.go";

pub fn workspace_id(symbol: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(symbol.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..WORKSPACE_ID_LEN].to_string()
}

/// Returns the first pair of symbols that map to the same workspace id.
pub fn find_collision<'a, I>(symbols: I) -> Option<(&'a str, &'a str)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashMap<String, &'a str> = HashMap::new();
    for symbol in symbols {
        if let Some(previous) = seen.insert(workspace_id(symbol), symbol) {
            return Some((previous, symbol));
        }
    }
    None
}

/// Recreate `dir` with the generated entrypoint and copies of `sources`.
/// Returns the Go files to hand to the toolchain, entrypoint first.
pub fn materialize<'a, I>(dir: &Path, entrypoint: &str, sources: I) -> Result<Vec<PathBuf>, String>
where
    I: IntoIterator<Item = &'a Path>,
{
    if dir.exists() {
        fs::remove_dir_all(dir)
            .map_err(|e| format!("unable to clear workspace {}: {}", dir.display(), e))?;
    }
    fs::create_dir_all(dir)
        .map_err(|e| format!("unable to create workspace {}: {}", dir.display(), e))?;

    let main_file = dir.join(GENERATED_MAIN);
    fs::write(&main_file, entrypoint)
        .map_err(|e| format!("unable to write {}: {}", main_file.display(), e))?;

    let mut inputs = vec![main_file];
    for src in sources {
        let name = src
            .file_name()
            .ok_or_else(|| format!("invalid source path {}", src.display()))?;
        let to = dir.join(name);
        fs::copy(src, &to)
            .map_err(|e| format!("unable to copy {} to {}: {}", src.display(), to.display(), e))?;
        if to.extension().is_some_and(|ext| ext == SOURCE_EXT) {
            inputs.push(to);
        }
    }

    Ok(inputs)
}
