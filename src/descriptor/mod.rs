// src/descriptor/mod.rs

//! Project descriptors
//!
//! A descriptor is the structured form of one buildable project: its own
//! coordinate, an optional parent link, the ordered reference lists by
//! category, its sub-modules and a property bag. Descriptors are produced by
//! a [`DescriptorParser`]; the resolver only ever enriches the property bag.

mod options;
pub mod pom;

pub use options::{DescriptorList, DescriptorOptions};
pub use pom::PomParser;

use crate::coordinate::Coordinate;
use crate::error::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Property naming the package that provides the artifact
pub const PACKAGE_PROPERTY: &str = "debian.package";

/// Property carrying the upstream version of a repository descriptor
pub const ORIGINAL_VERSION_PROPERTY: &str = "debian.originalVersion";

/// Property set when the descriptor's version tracks the package version
pub const HAS_PACKAGE_VERSION_PROPERTY: &str = "debian.hasPackageVersion";

/// Property listing normalization rules advertised by a descriptor
pub const RULES_PROPERTY: &str = "debian.mavenRules";

/// Reference list categories of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceCategory {
    Parent,
    Dependencies,
    DependencyManagement,
    Plugins,
    PluginDependencies,
    PluginManagement,
    ReportPlugins,
    Extensions,
}

/// How references of a category are classified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceFlags {
    /// Needed to build the project rather than to run it
    pub build_time: bool,
    /// Loaded into the build tool itself (plugins and extensions)
    pub extension: bool,
    /// Advisory entry from a management list
    pub management: bool,
    /// Declared in `<build><extensions>`
    pub build_extension: bool,
}

impl ReferenceCategory {
    /// Categories queued for each visited descriptor, in queue order
    pub const QUEUED: [ReferenceCategory; 7] = [
        Self::Dependencies,
        Self::DependencyManagement,
        Self::Plugins,
        Self::PluginDependencies,
        Self::PluginManagement,
        Self::ReportPlugins,
        Self::Extensions,
    ];

    pub fn flags(&self) -> ReferenceFlags {
        let (build_time, extension, management) = match self {
            Self::Parent => (true, false, false),
            Self::Dependencies => (false, false, false),
            Self::DependencyManagement => (false, false, true),
            Self::Plugins | Self::PluginDependencies | Self::ReportPlugins | Self::Extensions => {
                (true, true, false)
            }
            Self::PluginManagement => (true, true, true),
        };
        ReferenceFlags {
            build_time,
            extension,
            management,
            build_extension: *self == Self::Extensions,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Dependencies => "dependencies",
            Self::DependencyManagement => "dependency management",
            Self::Plugins => "plugins",
            Self::PluginDependencies => "plugin dependencies",
            Self::PluginManagement => "plugin management",
            Self::ReportPlugins => "report plugins",
            Self::Extensions => "extensions",
        }
    }
}

impl fmt::Display for ReferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed metadata of one buildable project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectDescriptor {
    /// The project's own coordinate (type is its packaging)
    pub coordinate: Coordinate,
    pub parent: Option<Coordinate>,
    pub dependencies: Vec<Coordinate>,
    pub dependency_management: Vec<Coordinate>,
    pub plugins: Vec<Coordinate>,
    pub plugin_dependencies: Vec<Coordinate>,
    pub plugin_management: Vec<Coordinate>,
    pub report_plugins: Vec<Coordinate>,
    pub extensions: Vec<Coordinate>,
    /// Sub-module paths relative to the descriptor's directory
    pub modules: Vec<String>,
    pub properties: BTreeMap<String, String>,
}

impl ProjectDescriptor {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            ..Default::default()
        }
    }

    /// References of a category, in declaration order
    pub fn references(&self, category: ReferenceCategory) -> Vec<Coordinate> {
        match category {
            ReferenceCategory::Parent => self.parent.iter().cloned().collect(),
            ReferenceCategory::Dependencies => self.dependencies.clone(),
            ReferenceCategory::DependencyManagement => self.dependency_management.clone(),
            ReferenceCategory::Plugins => self.plugins.clone(),
            ReferenceCategory::PluginDependencies => self.plugin_dependencies.clone(),
            ReferenceCategory::PluginManagement => self.plugin_management.clone(),
            ReferenceCategory::ReportPlugins => self.report_plugins.clone(),
            ReferenceCategory::Extensions => self.extensions.clone(),
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: &str, value: impl Into<String>) {
        self.properties.insert(key.to_string(), value.into());
    }

    /// Package providing this artifact, if the descriptor says so
    pub fn package(&self) -> Option<&str> {
        self.property(PACKAGE_PROPERTY).filter(|p| !p.is_empty())
    }

    /// Upstream version, falling back to the declared version
    pub fn original_version(&self) -> Option<&str> {
        self.property(ORIGINAL_VERSION_PROPERTY)
            .or(self.coordinate.version.as_deref())
    }

    pub fn has_package_version(&self) -> bool {
        self.properties.contains_key(HAS_PACKAGE_VERSION_PROPERTY)
    }

    /// Normalization rules advertised in the property bag
    pub fn advertised_rules(&self) -> Vec<&str> {
        self.property(RULES_PROPERTY)
            .map(|rules| {
                rules
                    .split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Turns a descriptor file into a [`ProjectDescriptor`]
pub trait DescriptorParser {
    /// Parse the descriptor at `path`, honouring per-file policy overrides
    fn parse(&self, path: &Path, options: &DescriptorOptions) -> Result<ProjectDescriptor>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_flags() {
        assert!(ReferenceCategory::Parent.flags().build_time);

        let deps = ReferenceCategory::Dependencies.flags();
        assert!(!deps.build_time && !deps.extension && !deps.management);

        let mgmt = ReferenceCategory::DependencyManagement.flags();
        assert!(!mgmt.build_time && mgmt.management);

        let plugins = ReferenceCategory::Plugins.flags();
        assert!(plugins.build_time && plugins.extension && !plugins.management);

        let plugin_mgmt = ReferenceCategory::PluginManagement.flags();
        assert!(plugin_mgmt.build_time && plugin_mgmt.extension && plugin_mgmt.management);

        assert!(ReferenceCategory::Extensions.flags().build_extension);
        assert!(!ReferenceCategory::PluginDependencies.flags().build_extension);
    }

    #[test]
    fn test_references_parent() {
        let mut d = ProjectDescriptor::new(Coordinate::new("g", "a", Some("1")));
        assert!(d.references(ReferenceCategory::Parent).is_empty());

        d.parent = Some(Coordinate::new("g", "parent", Some("1")));
        assert_eq!(d.references(ReferenceCategory::Parent).len(), 1);
    }

    #[test]
    fn test_properties() {
        let mut d = ProjectDescriptor::new(Coordinate::new("g", "a", Some("debian")));
        assert_eq!(d.original_version(), Some("debian"));
        assert_eq!(d.package(), None);

        d.set_property(ORIGINAL_VERSION_PROPERTY, "1.2");
        d.set_property(PACKAGE_PROPERTY, "liba-java");
        d.set_property(RULES_PROPERTY, "g a * s/1\\..*/1.x/, g b * *,");

        assert_eq!(d.original_version(), Some("1.2"));
        assert_eq!(d.package(), Some("liba-java"));
        assert_eq!(d.advertised_rules(), vec!["g a * s/1\\..*/1.x/", "g b * *"]);
        assert!(!d.has_package_version());
    }
}
