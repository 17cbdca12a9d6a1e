// src/resolver/mod.rs

//! Dependency resolution and classification
//!
//! Resolution runs in two phases. The solver first walks the project's
//! descriptors (following parent and module links), registering each one as
//! self-built and queueing its reference lists. Only once the whole tree is
//! known is the queue drained, so a reference to a sibling module is always
//! recognized as internal whatever the order the modules were visited in.
//!
//! Each queued reference goes through the [`ReferenceClassifier`], which
//! drops, ignores or files it into one of the [`Bucket`]s, and may consult
//! the [`VersionRuleSelector`] for self-built descriptors.

mod classifier;
mod registry;
mod solver;
mod state;
mod version_rules;

pub use classifier::{Outcome, ReferenceClassifier};
pub use registry::ProjectRegistry;
pub use solver::{DependencySolver, SolveReport};
pub use state::{Bucket, BucketEntry, Issue, ResolutionState, Task};
pub use version_rules::VersionRuleSelector;

use crate::repository::DEFAULT_REPOSITORY_ROOT;
use std::fmt;
use std::path::PathBuf;

/// Build system driving the package build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PackageMode {
    /// Built with Maven: plugins and extensions are build dependencies
    #[default]
    Maven,
    /// Built with Ant: Maven plugins are never needed
    Ant,
}

impl fmt::Display for PackageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Maven => "maven",
            Self::Ant => "ant",
        })
    }
}

/// Settings of one resolution run
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Package being built
    pub package_name: String,
    pub mode: PackageMode,
    pub run_tests: bool,
    pub generate_docs: bool,
    pub offline: bool,
    /// Follow module links from the root descriptor instead of the descriptor list
    pub explore_projects: bool,
    pub base_dir: PathBuf,
    /// Where rules, the descriptor list and substvars are written
    pub output_dir: PathBuf,
    pub repository_root: PathBuf,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            package_name: String::new(),
            mode: PackageMode::Maven,
            run_tests: false,
            generate_docs: false,
            offline: false,
            explore_projects: true,
            base_dir: PathBuf::from("."),
            output_dir: PathBuf::from("debian"),
            repository_root: PathBuf::from(DEFAULT_REPOSITORY_ROOT),
        }
    }
}

impl SolverConfig {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            ..Default::default()
        }
    }

    /// `<output>/<package>.poms`
    pub fn descriptor_list_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.poms", self.package_name))
    }

    /// `<output>/<package>.substvars`
    pub fn substvars_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.substvars", self.package_name))
    }
}
