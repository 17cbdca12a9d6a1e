// src/cli.rs
//! CLI definitions for debsolve
//!
//! Argument parsing only; the run itself lives in `main.rs`.

use crate::repository::DEFAULT_REPOSITORY_ROOT;
use crate::resolver::{PackageMode, SolverConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "debsolve")]
#[command(author = "debsolve Contributors")]
#[command(version)]
#[command(
    about = "Resolve the Debian packages a Maven project depends on",
    long_about = "Analyse the POM files of a Maven project, match every dependency, plugin \
                  and extension against the Maven repository for Debian, and write the \
                  resulting substvars and Maven rule files for the package."
)]
pub struct Cli {
    /// Name of the Debian package being built
    #[arg(short, long)]
    pub package: String,

    /// The package is built with Ant instead of Maven
    #[arg(long)]
    pub ant: bool,

    /// Test dependencies are needed at build time
    #[arg(long)]
    pub run_tests: bool,

    /// Javadoc is generated, pull in the documentation packages
    #[arg(long)]
    pub generate_javadoc: bool,

    /// Never ask questions, take the default answers
    #[arg(long)]
    pub non_interactive: bool,

    /// Do not search packages with apt-file
    #[arg(long)]
    pub offline: bool,

    /// Only visit the POM files listed in <output-dir>/<package>.poms
    #[arg(long)]
    pub no_explore: bool,

    /// Directory containing the project
    #[arg(short, long, default_value = ".")]
    pub base_dir: PathBuf,

    /// Directory receiving the rules, the POM list and the substvars
    #[arg(short, long, default_value = "debian")]
    pub output_dir: PathBuf,

    /// Root of the Maven repository for Debian
    #[arg(long, default_value = DEFAULT_REPOSITORY_ROOT)]
    pub maven_repo: PathBuf,

    /// TOML file extending or replacing the built-in tool lists
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            package_name: self.package.clone(),
            mode: if self.ant {
                PackageMode::Ant
            } else {
                PackageMode::Maven
            },
            run_tests: self.run_tests,
            generate_docs: self.generate_javadoc,
            offline: self.offline,
            explore_projects: !self.no_explore,
            base_dir: self.base_dir.clone(),
            output_dir: self.output_dir.clone(),
            repository_root: self.maven_repo.clone(),
        }
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
