// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use debsolve::descriptor::{HAS_PACKAGE_VERSION_PROPERTY, ORIGINAL_VERSION_PROPERTY, PACKAGE_PROPERTY};
use debsolve::{
    Coordinate, DependencySolver, DescriptorList, MemoryRepository, PomParser, Prompter,
    Repository, SolveReport, SolverConfig, StaticIndex,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Name of the package every test project is built into
pub const PACKAGE: &str = "libproject-java";

/// A project tree in a temporary directory.
///
/// Keep the value alive for as long as the files are needed.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a descriptor at `relative`, creating parent directories
    pub fn write(&self, relative: &str, xml: &str) -> &Self {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, xml).unwrap();
        self
    }

    /// Solver settings pointing at this project, output in `<project>/debian`
    pub fn config(&self) -> SolverConfig {
        let mut config = SolverConfig::new(PACKAGE);
        config.base_dir = self.path().to_path_buf();
        config.output_dir = self.path().join("debian");
        config.repository_root = self.path().join("maven-repo");
        config
    }
}

/// Build a POM with the given coordinate and raw body elements
pub fn pom(group: &str, artifact: &str, version: &str, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<project>\n  <modelVersion>4.0.0</modelVersion>\n  \
         <groupId>{}</groupId>\n  <artifactId>{}</artifactId>\n  <version>{}</version>\n{}\n</project>\n",
        group, artifact, version, body
    )
}

/// `<dependencies>` block from `(group, artifact, version, scope)` tuples
pub fn dependencies(deps: &[(&str, &str, Option<&str>, Option<&str>)]) -> String {
    let mut out = String::from("  <dependencies>\n");
    for (group, artifact, version, scope) in deps {
        out.push_str("    <dependency>\n");
        out.push_str(&format!("      <groupId>{}</groupId>\n", group));
        out.push_str(&format!("      <artifactId>{}</artifactId>\n", artifact));
        if let Some(version) = version {
            out.push_str(&format!("      <version>{}</version>\n", version));
        }
        if let Some(scope) = scope {
            out.push_str(&format!("      <scope>{}</scope>\n", scope));
        }
        out.push_str("    </dependency>\n");
    }
    out.push_str("  </dependencies>");
    out
}

/// `<build><plugins>` block from `(group, artifact)` pairs
pub fn plugins(plugins: &[(&str, &str)]) -> String {
    let mut out = String::from("  <build>\n    <plugins>\n");
    for (group, artifact) in plugins {
        out.push_str(&format!(
            "      <plugin><groupId>{}</groupId><artifactId>{}</artifactId></plugin>\n",
            group, artifact
        ));
    }
    out.push_str("    </plugins>\n  </build>");
    out
}

/// `<modules>` block
pub fn modules(names: &[&str]) -> String {
    let mut out = String::from("  <packaging>pom</packaging>\n  <modules>\n");
    for name in names {
        out.push_str(&format!("    <module>{}</module>\n", name));
    }
    out.push_str("  </modules>");
    out
}

/// Register an installed artifact provided by `package`
pub fn install(repository: &mut MemoryRepository, coordinate: Coordinate, package: &str) {
    install_with(repository, coordinate, package, &[]);
}

pub fn install_with(
    repository: &mut MemoryRepository,
    coordinate: Coordinate,
    package: &str,
    properties: &[(&str, &str)],
) {
    let mut descriptor = debsolve::ProjectDescriptor::new(coordinate);
    descriptor.set_property(PACKAGE_PROPERTY, package);
    for (key, value) in properties {
        descriptor.set_property(key, *value);
    }
    repository.register(descriptor);
}

/// Install an artifact the way Debian ships versioned libraries: a copy
/// under its upstream version and one under the symbolic `debian` version
pub fn install_tracking(repository: &mut MemoryRepository, group: &str, artifact: &str, upstream: &str, package: &str) {
    let properties = [
        (ORIGINAL_VERSION_PROPERTY, upstream),
        (HAS_PACKAGE_VERSION_PROPERTY, "true"),
    ];
    install_with(
        repository,
        Coordinate::new(group, artifact, Some(upstream)),
        package,
        &properties,
    );
    install_with(
        repository,
        Coordinate::new(group, artifact, Some("debian")),
        package,
        &properties,
    );
}

/// Outcome of a complete run, detached from the solver's borrows
pub struct Run {
    pub report: SolveReport,
    pub ignore_rules: Vec<String>,
    pub rules: Vec<String>,
    pub list: String,
}

/// Solve `config` against `repository` and collect the results
pub fn solve(
    config: SolverConfig,
    list: DescriptorList,
    repository: &mut MemoryRepository,
    prompter: &mut dyn Prompter,
) -> Run {
    let parser = PomParser::new();
    let mut index = StaticIndex::new();
    let mut solver = DependencySolver::new(config, &parser, repository, &mut index, prompter)
        .with_descriptor_list(list);
    let report = solver.solve().unwrap();
    Run {
        ignore_rules: solver
            .rules()
            .ignore_rules
            .rules()
            .iter()
            .map(|r| r.to_string())
            .collect(),
        rules: solver.rules().rules.rules().iter().map(|r| r.to_string()).collect(),
        list: solver.descriptor_list().render(),
        report,
    }
}
