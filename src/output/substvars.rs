// src/output/substvars.rs

//! `<package>.substvars` writer
//!
//! Substitution variables consumed by `dh_gencontrol`. Variables already in
//! the file are kept; the `maven.*` ones produced by a run replace theirs.

use crate::error::Result;
use crate::index::PackageIndex;
use crate::resolver::{Bucket, SolveReport};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const COMPILE_DEPENDS: &str = "maven.CompileDepends";
pub const TEST_DEPENDS: &str = "maven.TestDepends";
pub const DEPENDS: &str = "maven.Depends";
pub const OPTIONAL_DEPENDS: &str = "maven.OptionalDepends";
pub const DOC_DEPENDS: &str = "maven.DocDepends";
pub const DOC_OPTIONAL_DEPENDS: &str = "maven.DocOptionalDepends";
pub const UPSTREAM_VERSION: &str = "maven.UpstreamPackageVersion";

/// Documentation package every documented package depends on
const JDK_DOC_PACKAGE: &str = "default-jdk-doc";

/// Ordered `name=value` variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substvars {
    vars: BTreeMap<String, String>,
}

impl Substvars {
    pub fn parse(content: &str) -> Self {
        let vars = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();
        Self { vars }
    }

    /// Variables of an existing file, none if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.vars.insert(name.to_string(), value.into());
    }

    pub fn render(&self, package: &str) -> String {
        let mut out = format!(
            "# List of dependencies for {}, generated for use by debian/control\n# {}\n",
            package,
            chrono::Utc::now().to_rfc3339()
        );
        for (name, value) in &self.vars {
            out.push_str(name);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }
}

fn joined<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Packages holding the API documentation of a bucket's packages
fn doc_packages(report: &SolveReport, bucket: Bucket, index: &mut dyn PackageIndex) -> BTreeSet<String> {
    report
        .packages(bucket)
        .into_iter()
        .filter_map(|package| {
            let api_index = format!("/usr/share/doc/{}/api/index.html", package);
            match index.lookup(&api_index) {
                Ok(found) => found,
                Err(e) => {
                    warn!("Cannot search the documentation of {}: {}", package, e);
                    None
                }
            }
        })
        .collect()
}

/// Merge a run's results into the substvars file at `path`
pub fn write_substvars(
    path: &Path,
    report: &SolveReport,
    generate_docs: bool,
    index: &mut dyn PackageIndex,
) -> Result<()> {
    let mut vars = Substvars::load(path)?;
    vars.set(COMPILE_DEPENDS, joined(report.bucket(Bucket::Compile)));
    vars.set(TEST_DEPENDS, joined(report.bucket(Bucket::Test)));
    vars.set(DEPENDS, joined(report.bucket(Bucket::Runtime)));
    vars.set(OPTIONAL_DEPENDS, joined(report.bucket(Bucket::Optional)));

    if generate_docs {
        let mut doc_depends = doc_packages(report, Bucket::Runtime, index);
        doc_depends.insert(JDK_DOC_PACKAGE.to_string());
        vars.set(DOC_DEPENDS, joined(doc_depends));
        vars.set(
            DOC_OPTIONAL_DEPENDS,
            joined(doc_packages(report, Bucket::Optional, index)),
        );
    }
    if let Some(version) = &report.package_version {
        vars.set(UPSTREAM_VERSION, version.as_str());
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, vars.render(&report.package))?;
    debug!("Wrote {}", path.display());
    Ok(())
}
