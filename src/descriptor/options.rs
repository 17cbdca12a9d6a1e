// src/descriptor/options.rs

//! Per-file policy overrides and the persisted list of descriptors
//!
//! The list file (`<package>.poms`) has one descriptor per line, relative to
//! the project base directory, followed by its flags:
//!
//! ```text
//! # comment
//! pom.xml --no-parent --has-package-version
//! module-a/pom.xml
//! samples/pom.xml --ignore
//! ```

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const IGNORE_FLAG: &str = "--ignore";
const NO_PARENT_FLAG: &str = "--no-parent";
const HAS_PACKAGE_VERSION_FLAG: &str = "--has-package-version";

const LIST_HEADER: &str = "\
# List of POM files for the package
# Format of this file is:
# <path to pom file> [option]*
# where option can be:
#   --ignore: ignore this POM and its artifact if any
#   --no-parent: remove the <parent> tag from the POM
#   --has-package-version: flag the project version as the package version
";

/// Policy recorded for a single descriptor file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorOptions {
    /// Skip the descriptor entirely
    pub ignore: bool,
    /// Drop the parent link when parsing
    pub no_parent: bool,
    /// The descriptor's version is the package's upstream version
    pub has_package_version: bool,
}

impl DescriptorOptions {
    /// Split a line's flags into the ones this tool acts on and the rest.
    ///
    /// Flags meant for the packaging helpers (`--java-lib`, `--artifact=...`,
    /// `--relocate=...`) are kept verbatim so the list survives a rewrite.
    fn parse_flags<'a>(flags: impl Iterator<Item = &'a str>) -> Result<(Self, Vec<String>)> {
        let mut options = Self::default();
        let mut extra = Vec::new();
        for flag in flags {
            match flag {
                IGNORE_FLAG => options.ignore = true,
                NO_PARENT_FLAG => options.no_parent = true,
                HAS_PACKAGE_VERSION_FLAG => options.has_package_version = true,
                other if other.starts_with("--") => extra.push(other.to_string()),
                other => {
                    return Err(Error::ParseError(format!(
                        "Unexpected token '{}' after descriptor path",
                        other
                    )));
                }
            }
        }
        Ok((options, extra))
    }

    fn flags(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.ignore {
            flags.push(IGNORE_FLAG);
        }
        if self.no_parent {
            flags.push(NO_PARENT_FLAG);
        }
        if self.has_package_version {
            flags.push(HAS_PACKAGE_VERSION_FLAG);
        }
        flags
    }
}

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    options: DescriptorOptions,
    /// Flags owned by other tools, written back untouched
    extra: Vec<String>,
}

/// Ordered list of descriptor files with their options
#[derive(Debug, Clone, Default)]
pub struct DescriptorList {
    entries: Vec<Entry>,
}

impl DescriptorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a list file, an absent file yields an empty list
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No descriptor list at {}", path.display());
            return Ok(Self::new());
        }
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut list = Self::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let Some(path) = tokens.next() else {
                continue;
            };
            let (options, extra) = DescriptorOptions::parse_flags(tokens)?;
            if !extra.is_empty() {
                debug!("Keeping options {} for {}", extra.join(" "), path);
            }
            let index = list.index_of(Path::new(path));
            list.entries[index].options = options;
            list.entries[index].extra = extra;
        }
        Ok(list)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.render())?;
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = String::from(LIST_HEADER);
        for entry in &self.entries {
            out.push_str(&entry.path.to_string_lossy());
            let flags = entry.options.flags().into_iter();
            for flag in flags.chain(entry.extra.iter().map(String::as_str)) {
                out.push(' ');
                out.push_str(flag);
            }
            out.push('\n');
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|entry| entry.path.as_path())
    }

    pub fn first(&self) -> Option<&Path> {
        self.paths().next()
    }

    pub fn options(&self, path: &Path) -> Option<DescriptorOptions> {
        self.entries
            .iter()
            .find(|entry| entry.path == path)
            .map(|entry| entry.options)
    }

    /// Options for a path, creating a default entry at the end of the list
    pub fn options_mut(&mut self, path: &Path) -> &mut DescriptorOptions {
        let index = self.index_of(path);
        &mut self.entries[index].options
    }

    fn index_of(&mut self, path: &Path) -> usize {
        match self.entries.iter().position(|entry| entry.path == path) {
            Some(index) => index,
            None => {
                self.entries.push(Entry {
                    path: path.to_path_buf(),
                    options: DescriptorOptions::default(),
                    extra: Vec::new(),
                });
                self.entries.len() - 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let list = DescriptorList::parse(
            "# header\n\npom.xml --no-parent --has-package-version\nmod-a/pom.xml\nsamples/pom.xml --ignore\n",
        )
        .unwrap();

        assert_eq!(list.paths().count(), 3);
        assert_eq!(list.first(), Some(Path::new("pom.xml")));

        let root = list.options(Path::new("pom.xml")).unwrap();
        assert!(root.no_parent && root.has_package_version && !root.ignore);
        assert!(list.options(Path::new("samples/pom.xml")).unwrap().ignore);
        assert_eq!(
            list.options(Path::new("mod-a/pom.xml")),
            Some(DescriptorOptions::default())
        );
    }

    #[test]
    fn test_parse_stray_token() {
        assert!(DescriptorList::parse("pom.xml --no-parent stray\n").is_err());
    }

    #[test]
    fn test_foreign_flags_preserved() {
        let content = "pom.xml --no-parent --java-lib\n\
                       core/pom.xml --artifact=core/target/core.jar --usj-name=core\n\
                       compat/pom.xml --ignore --relocate=org.old:compat\n";
        let mut list = DescriptorList::parse(content).unwrap();

        let root = list.options(Path::new("pom.xml")).unwrap();
        assert!(root.no_parent && !root.ignore);
        assert!(list.options(Path::new("compat/pom.xml")).unwrap().ignore);

        list.options_mut(Path::new("core/pom.xml")).has_package_version = true;
        let rendered = list.render();
        assert!(rendered.contains("\npom.xml --no-parent --java-lib\n"));
        assert!(rendered.contains(
            "\ncore/pom.xml --has-package-version --artifact=core/target/core.jar --usj-name=core\n"
        ));
        assert!(rendered.contains("\ncompat/pom.xml --ignore --relocate=org.old:compat\n"));

        let reparsed = DescriptorList::parse(&rendered).unwrap();
        assert_eq!(reparsed.render(), rendered);
    }

    #[test]
    fn test_options_mut_keeps_order() {
        let mut list = DescriptorList::new();
        list.options_mut(Path::new("b/pom.xml")).ignore = true;
        list.options_mut(Path::new("a/pom.xml"));
        list.options_mut(Path::new("b/pom.xml")).no_parent = true;

        let paths: Vec<_> = list.paths().collect();
        assert_eq!(paths, vec![Path::new("b/pom.xml"), Path::new("a/pom.xml")]);

        let rendered = list.render();
        assert!(rendered.contains("b/pom.xml --ignore --no-parent\n"));
        assert!(rendered.contains("a/pom.xml\n"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debian/libfoo-java.poms");

        let mut list = DescriptorList::new();
        list.options_mut(Path::new("pom.xml")).has_package_version = true;
        list.save(&path).unwrap();

        let loaded = DescriptorList::load(&path).unwrap();
        assert!(loaded.options(Path::new("pom.xml")).unwrap().has_package_version);
        assert!(DescriptorList::load(&dir.path().join("missing")).unwrap().is_empty());
    }
}
