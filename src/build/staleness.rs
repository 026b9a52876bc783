use crate::error::{BuildError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

fn modified(path: &Path) -> Result<SystemTime> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|source| BuildError::Staleness {
            path: path.to_path_buf(),
            source,
        })
}

/// Whether `binary` must be rebuilt from `inputs`.
///
/// A missing binary always needs a build. Otherwise any input strictly newer
/// than the binary does; an input that cannot be stat'ed is an error, never
/// a silent skip.
pub fn needs_rebuild<'a, I>(binary: &Path, inputs: I) -> Result<bool>
where
    I: IntoIterator<Item = &'a Path>,
{
    let bin_time = match fs::metadata(binary).and_then(|m| m.modified()) {
        Ok(time) => time,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(binary = %binary.display(), "no previous binary");
            return Ok(true);
        }
        Err(source) => {
            return Err(BuildError::Staleness {
                path: binary.to_path_buf(),
                source,
            });
        }
    };
    for input in inputs {
        if modified(input)? > bin_time {
            debug!(binary = %binary.display(), input = %input.display(), "input is newer");
            return Ok(true);
        }
    }

    Ok(false)
}
