// src/lib.rs

//! debsolve: Maven to Debian dependency resolution
//!
//! Walks the POM descriptors of a Maven project and works out, for every
//! dependency, plugin and extension it references, which Debian package
//! provides it and in which role (build, test, runtime or optional).
//!
//! # Architecture
//!
//! - Two phases: every project descriptor is registered before any external
//!   reference is classified, so sibling modules are never mistaken for
//!   external dependencies
//! - Ports: the descriptor parser, the Maven repository, the package index
//!   and the user prompts are traits, with in-memory implementations for tests
//! - Rules: version normalization rules are collected and persisted in the
//!   `maven.*Rules` files used by maven-repo-helper
//! - Issues: problems are accumulated and reported, never abort the run

pub mod cli;
pub mod coordinate;
pub mod descriptor;
mod error;
pub mod index;
pub mod output;
pub mod policy;
pub mod prompt;
pub mod repository;
pub mod resolver;
pub mod rules;

pub use coordinate::{Coordinate, Scope};
pub use descriptor::{
    DescriptorList, DescriptorOptions, DescriptorParser, PomParser, ProjectDescriptor,
    ReferenceCategory, ReferenceFlags,
};
pub use error::{Error, Result};
pub use index::{DpkgIndex, PackageIndex, StaticIndex};
pub use policy::{ToolList, ToolPolicy};
pub use prompt::{Answer, ConsolePrompter, NonInteractive, Prompter, ScriptedPrompter};
pub use repository::{MemoryRepository, Repository, scan_repository};
pub use resolver::{
    Bucket, BucketEntry, DependencySolver, Issue, PackageMode, SolveReport, SolverConfig,
};
pub use rules::{DependencyRule, RuleSet, RuleStores, VersionRule};
