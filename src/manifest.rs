//! Install manifest.
//!
//! After a fully successful run, `<build-dir>/Makefile` carries one install
//! rule per enabled target so a separate `make` step can install them:
//!
//! ```text
//! DESTDIR := $(HOME)/.local/bin
//! all:
//! 	install -m755 remotes $(DESTDIR)/remotes
//! ```

use crate::error::{BuildError, Result};
use crate::targets::TargetDescriptor;
use std::fs;
use std::path::Path;

pub const DEST_VAR: &str = "DESTDIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRule {
    pub binary_name: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallManifest {
    pub dest_root: String,
    pub rules: Vec<InstallRule>,
}

impl InstallManifest {
    pub fn new(dest_root: impl Into<String>) -> Self {
        Self {
            dest_root: dest_root.into(),
            rules: Vec::new(),
        }
    }

    pub fn for_targets<'a, I>(dest_root: &str, targets: I) -> Self
    where
        I: IntoIterator<Item = &'a TargetDescriptor>,
    {
        let mut manifest = Self::new(dest_root);
        for target in targets {
            manifest.push(&target.name);
        }
        manifest
    }

    pub fn push(&mut self, binary_name: &str) {
        self.rules.push(InstallRule {
            binary_name: binary_name.to_string(),
            destination: format!("$({})/{}", DEST_VAR, binary_name),
        });
    }

    pub fn render(&self) -> String {
        let mut lines = vec![format!("{} := {}", DEST_VAR, self.dest_root), "all:".to_string()];
        for rule in &self.rules {
            lines.push(format!("\tinstall -m755 {} {}", rule.binary_name, rule.destination));
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
