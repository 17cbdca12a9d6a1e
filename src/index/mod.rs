// src/index/mod.rs

//! Which installed package provides a file?
//!
//! [`DpkgIndex`] asks `dpkg --search` first. On a miss, and unless running
//! offline, it falls back to `apt-file search`, which also knows about
//! packages that are not installed. Answers are memoized for the run.

mod process;

pub use process::{
    CommandOutput, DRAIN_GRACE_PERIOD, LineHandler, run_command, run_command_with_grace,
};

use crate::error::Result;
use std::collections::HashMap;
use std::process::Command;
use tracing::{debug, info};

/// Maps an installed file path to the package that ships it
pub trait PackageIndex {
    fn lookup(&mut self, path: &str) -> Result<Option<String>>;
}

/// Picks the package name out of `package: /path` lines
#[derive(Debug, Default)]
struct PackageCollector {
    package: Option<String>,
}

impl LineHandler for PackageCollector {
    fn handle_line(&mut self, line: &str) {
        if self.package.is_none() {
            self.package = package_from_line(line);
        }
    }
}

/// `libfoo-java: /usr/share/java/foo.jar` gives `libfoo-java`
fn package_from_line(line: &str) -> Option<String> {
    if line.starts_with("dpkg") {
        return None;
    }
    let (packages, rest) = line.split_once(':')?;
    if !rest.starts_with(' ') || packages.trim() != packages || packages.is_empty() {
        return None;
    }
    packages
        .split(',')
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.contains(char::is_whitespace))
        .map(str::to_string)
}

/// Index backed by `dpkg` and `apt-file`
#[derive(Debug, Default)]
pub struct DpkgIndex {
    offline: bool,
    apt_file_available: Option<bool>,
    memo: HashMap<String, Option<String>>,
}

impl DpkgIndex {
    pub fn new(offline: bool) -> Self {
        Self {
            offline,
            ..Default::default()
        }
    }

    fn search(program: &str, args: &[&str]) -> Result<Option<String>> {
        let mut command = Command::new(program);
        command.args(args);
        let output = run_command(command, PackageCollector::default())?;
        Ok(output.handler.and_then(|h| h.package))
    }

    fn apt_file_available(&mut self) -> bool {
        *self.apt_file_available.get_or_insert_with(|| {
            let found = which::which("apt-file").is_ok();
            if !found {
                info!("apt-file is not installed, only installed packages will be searched");
            }
            found
        })
    }
}

impl PackageIndex for DpkgIndex {
    fn lookup(&mut self, path: &str) -> Result<Option<String>> {
        if let Some(known) = self.memo.get(path) {
            return Ok(known.clone());
        }

        let mut package = Self::search("dpkg", &["--search", path])?;
        if package.is_none() && !self.offline && self.apt_file_available() {
            package = Self::search("apt-file", &["search", path])?;
        }

        debug!("{} is provided by {:?}", path, package);
        self.memo.insert(path.to_string(), package.clone());
        Ok(package)
    }
}

/// Fixed path to package table
#[derive(Debug, Clone, Default)]
pub struct StaticIndex {
    entries: HashMap<String, String>,
    queries: Vec<String>,
}

impl StaticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, package: impl Into<String>) -> Self {
        self.entries.insert(path.into(), package.into());
        self
    }

    /// Paths looked up so far, in order
    pub fn queries(&self) -> &[String] {
        &self.queries
    }
}

impl PackageIndex for StaticIndex {
    fn lookup(&mut self, path: &str) -> Result<Option<String>> {
        self.queries.push(path.to_string());
        Ok(self.entries.get(path).cloned())
    }
}
