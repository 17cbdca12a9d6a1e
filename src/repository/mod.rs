// src/repository/mod.rs

//! Descriptors of artifacts already provided by installed packages
//!
//! The resolver asks the repository which descriptor (and so which package)
//! provides a referenced artifact. Descriptors installed with the symbolic
//! version `debian` stand for every upstream version of their artifact.
//!
//! The repository also carries the build tool's implicit base descriptor,
//! whose plugin-management entries are tooling every project inherits.

use crate::coordinate::{Coordinate, POM_TYPE};
use crate::descriptor::{DescriptorOptions, DescriptorParser, ProjectDescriptor};
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Version installed descriptors use to match any requested version
pub const DEBIAN_VERSION: &str = "debian";

/// Default location of the installed Maven repository
pub const DEFAULT_REPOSITORY_ROOT: &str = "/usr/share/maven-repo";

/// Lookup of installed artifact descriptors
pub trait Repository {
    /// Best descriptor for a reference: exact version first, then `debian`
    fn search_matching(&self, coordinate: &Coordinate) -> Option<&ProjectDescriptor>;

    /// Every descriptor of the same artifact, whatever its version
    fn search_matching_ignore_version(&self, coordinate: &Coordinate) -> Vec<&ProjectDescriptor>;

    /// Implicit base descriptor of every project
    fn super_descriptor(&self) -> &ProjectDescriptor;

    /// Make a descriptor available to later lookups
    fn register(&mut self, descriptor: ProjectDescriptor);
}

/// Is an artifact published with `packaging` usable where `kind` is referenced?
fn kind_matches(kind: &str, packaging: &str) -> bool {
    kind == packaging || (kind == "jar" && packaging == "bundle")
}

/// Repository held in memory, keyed by (group, artifact)
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    descriptors: BTreeMap<(String, String), Vec<ProjectDescriptor>>,
    super_descriptor: ProjectDescriptor,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            descriptors: BTreeMap::new(),
            super_descriptor: maven_super_descriptor(),
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors of the referenced artifact whose packaging fits the reference
    fn candidates(&self, coordinate: &Coordinate) -> Vec<&ProjectDescriptor> {
        let kind = coordinate.kind.as_str();
        self.descriptors
            .get(&(coordinate.group.clone(), coordinate.artifact.clone()))
            .into_iter()
            .flatten()
            .filter(|d| kind_matches(kind, &d.coordinate.kind))
            .collect()
    }
}

impl Repository for MemoryRepository {
    fn search_matching(&self, coordinate: &Coordinate) -> Option<&ProjectDescriptor> {
        let candidates = self.candidates(coordinate);
        let with_version = |version: &str| {
            candidates
                .iter()
                .copied()
                .find(|d| d.coordinate.version.as_deref() == Some(version))
        };
        coordinate
            .version
            .as_deref()
            .and_then(with_version)
            .or_else(|| with_version(DEBIAN_VERSION))
    }

    fn search_matching_ignore_version(&self, coordinate: &Coordinate) -> Vec<&ProjectDescriptor> {
        self.candidates(coordinate)
    }

    fn super_descriptor(&self) -> &ProjectDescriptor {
        &self.super_descriptor
    }

    fn register(&mut self, descriptor: ProjectDescriptor) {
        let key = (
            descriptor.coordinate.group.clone(),
            descriptor.coordinate.artifact.clone(),
        );
        let entries = self.descriptors.entry(key).or_default();
        match entries
            .iter_mut()
            .find(|d| d.coordinate == descriptor.coordinate)
        {
            Some(existing) => *existing = descriptor,
            None => entries.push(descriptor),
        }
    }
}

/// Implicit base descriptor, with the tooling Maven 2 pins in its plugin management
pub fn maven_super_descriptor() -> ProjectDescriptor {
    let mut descriptor = ProjectDescriptor::new(
        Coordinate::new("org.apache.maven", "maven-super-pom", Some("2.0")).with_kind(POM_TYPE),
    );
    descriptor.plugin_management = [
        ("maven-antrun-plugin", "1.3"),
        ("maven-assembly-plugin", "2.2-beta-2"),
        ("maven-dependency-plugin", "2.0"),
        ("maven-release-plugin", "2.0-beta-8"),
    ]
    .into_iter()
    .map(|(artifact, version)| {
        Coordinate::plugin(crate::coordinate::DEFAULT_PLUGIN_GROUP, artifact, Some(version))
    })
    .collect();
    descriptor
}

/// Load every `*.pom` under `root`; unreadable descriptors are skipped
pub fn scan_repository(root: &Path, parser: &dyn DescriptorParser) -> Result<MemoryRepository> {
    let mut repository = MemoryRepository::new();
    if !root.is_dir() {
        warn!("Maven repository {} does not exist", root.display());
        return Ok(repository);
    }

    info!("Scanning Maven repository {}", root.display());
    let options = DescriptorOptions::default();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "pom") {
            continue;
        }
        match parser.parse(path, &options) {
            Ok(descriptor) => {
                debug!("Indexed {} from {}", descriptor.coordinate, path.display());
                repository.register(descriptor);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    info!("Indexed {} descriptors", repository.len());
    Ok(repository)
}
