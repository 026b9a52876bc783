//! Shared fixture for the build tests: a project with a Go-like source tree,
//! a declaration directory and a fake `go` toolchain script.

#![allow(dead_code)]

use std::fs::{self, File};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

pub const PLATFORM: &str = "testos";

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        };
        fs::create_dir_all(fixture.project().join("src")).unwrap();
        fs::create_dir_all(fixture.decl_dir()).unwrap();
        fixture.write_source("go.mod", "module tools\n\ngo 1.22\n");
        fixture.write_source(
            "src/args.go",
            "package main\n\ntype Args struct {\n\tName string\n\tConfigFile string\n\tFlags map[string][]string\n}\n",
        );
        fixture.write_toolchain();
        fixture
    }

    pub fn project(&self) -> PathBuf {
        self.dir.path().join("project")
    }

    pub fn decl_dir(&self) -> PathBuf {
        self.dir.path().join("decl")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.project().join("build")
    }

    pub fn toolchain(&self) -> PathBuf {
        self.dir.path().join("fake-go")
    }

    pub fn log(&self) -> PathBuf {
        self.dir.path().join("toolchain.log")
    }

    /// Lines written by the fake toolchain, one per invocation: `<GOOS> <output>`.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.log())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn declare(&self, name: &str, flags: &[&str]) {
        let flags: Vec<String> = flags.iter().map(|f| format!("\"{}\"", f)).collect();
        fs::write(
            self.decl_dir().join(format!("{}.json", name)),
            format!("{{\"Flags\": [{}], \"Settings\": {{}}}}", flags.join(", ")),
        )
        .unwrap();
    }

    /// Declare an enabled target with an entry file.
    pub fn add_target(&self, name: &str) {
        self.declare(name, &["all"]);
        self.write_source(&format!("src/{}.app.go", name), "package main\n");
    }

    /// Write a project file with an mtime well in the past.
    pub fn write_source(&self, rel: &str, content: &str) {
        let path = self.project().join(rel);
        fs::write(&path, content).unwrap();
        set_mtime(&path, SystemTime::now() - Duration::from_secs(600));
    }

    pub fn touch_future(&self, rel: &str) {
        set_mtime(
            &self.project().join(rel),
            SystemTime::now() + Duration::from_secs(600),
        );
    }

    pub fn timeline(&self) -> PathBuf {
        self.dir.path().join("timeline.log")
    }

    /// A toolchain that sleeps for `secs` between logging `start <name>` and
    /// `end <name>` to the timeline.
    pub fn slow_toolchain(&self, secs: u32) -> PathBuf {
        let script = format!(
            r#"#!/bin/sh
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
name=$(basename "$out")
echo "start $name" >> "{timeline}"
sleep {secs}
printf 'binary\n' > "$out"
echo "end $name" >> "{timeline}"
"#,
            timeline = self.timeline().display(),
            secs = secs
        );
        let path = self.dir.path().join("slow-go");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn timeline_events(&self) -> Vec<String> {
        fs::read_to_string(self.timeline())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn write_toolchain(&self) {
        let script = format!(
            r#"#!/bin/sh
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  prev="$arg"
done
echo "$GOOS $out" >> "{log}"
case "$out" in
  */broken) echo "./main_generated.go:21:9: undefined: BrokenApp" >&2; exit 1 ;;
esac
printf 'binary\n' > "$out"
"#,
            log = self.log().display()
        );
        let path = self.toolchain();
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

pub fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}
