// src/resolver/state.rs

//! Per-run resolution state
//!
//! Owned by the solver for the whole run and handed by `&mut` to whichever
//! component is working; nothing here is shared across threads.

use crate::coordinate::{Coordinate, contains_ignore_version};
use crate::descriptor::{ReferenceCategory, ReferenceFlags};
use crate::rules::VersionRule;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};

/// Package dependency category a resolved reference is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Compile,
    Test,
    Runtime,
    Optional,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Self::Compile, Self::Test, Self::Runtime, Self::Optional];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Test => "test",
            Self::Runtime => "runtime",
            Self::Optional => "optional",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package name with an optional minimum version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BucketEntry {
    pub package: String,
    pub min_version: Option<String>,
}

impl BucketEntry {
    pub fn new(package: impl Into<String>, min_version: Option<&str>) -> Self {
        Self {
            package: package.into(),
            min_version: min_version.map(str::to_string),
        }
    }
}

impl fmt::Display for BucketEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.min_version {
            Some(version) => write!(f, "{} (>= {})", self.package, version),
            None => f.write_str(&self.package),
        }
    }
}

/// Deferred resolution of one reference list of one descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub source: PathBuf,
    pub category: ReferenceCategory,
    pub flags: ReferenceFlags,
}

/// Problem reported at the end of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Descriptor the problem was found in
    pub source: String,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

/// Everything a resolution run accumulates
#[derive(Debug, Default)]
pub struct ResolutionState {
    /// Coordinates of every registered descriptor of the project
    known: BTreeSet<Coordinate>,
    /// References the user or the policy chose to skip
    ignored: Vec<Coordinate>,
    buckets: [BTreeSet<BucketEntry>; 4],
    pending: VecDeque<Task>,
    version_rules: HashMap<String, VersionRule>,
    issues: Vec<Issue>,
    visited: HashSet<PathBuf>,
    /// Upstream version chosen for the package
    pub package_version: Option<String>,
    /// Answer to "include all modules?", once asked
    pub include_all_modules: Option<bool>,
}

impl ResolutionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_known(&mut self, coordinate: Coordinate) {
        self.known.insert(coordinate);
    }

    pub fn is_known(&self, coordinate: &Coordinate) -> bool {
        contains_ignore_version(&self.known, coordinate)
    }

    pub fn known(&self) -> &BTreeSet<Coordinate> {
        &self.known
    }

    pub fn ignore(&mut self, coordinate: Coordinate) {
        if !self.is_ignored(&coordinate) {
            self.ignored.push(coordinate);
        }
    }

    pub fn is_ignored(&self, coordinate: &Coordinate) -> bool {
        contains_ignore_version(&self.ignored, coordinate)
    }

    /// File an entry; filing it twice has no further effect
    pub fn add_to_bucket(&mut self, bucket: Bucket, entry: BucketEntry) {
        self.buckets[bucket as usize].insert(entry);
    }

    pub fn bucket(&self, bucket: Bucket) -> &BTreeSet<BucketEntry> {
        &self.buckets[bucket as usize]
    }

    pub fn enqueue(&mut self, task: Task) {
        self.pending.push_back(task);
    }

    pub fn next_task(&mut self) -> Option<Task> {
        self.pending.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn cached_version_rule(&self, version: &str) -> Option<&VersionRule> {
        self.version_rules.get(version)
    }

    pub fn cache_version_rule(&mut self, version: &str, rule: VersionRule) {
        self.version_rules.insert(version.to_string(), rule);
    }

    pub fn add_issue(&mut self, source: &Path, message: impl Into<String>) {
        self.issues.push(Issue {
            source: source.display().to_string(),
            message: message.into(),
        });
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Record a visit, false if the path was visited before
    pub fn mark_visited(&mut self, path: &Path) -> bool {
        self.visited.insert(path.to_path_buf())
    }
}
