// src/policy/mod.rs

//! Build tool policy tables
//!
//! Fixed lists of (group, artifact) pairs the classifier consults before
//! looking a reference up: tools that are never useful when building a
//! package, tools that usually are not, documentation and test tools, and
//! transport extensions. The built-in tables can be extended (or replaced)
//! from a TOML file:
//!
//! ```toml
//! replace = false
//! never_useful = ["org.example:deploy-maven-plugin"]
//! documentation = ["org.example:site-maven-plugin"]
//! ```

use crate::coordinate::Coordinate;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

const APACHE_PLUGINS: &str = "org.apache.maven.plugins";
const MOJO: &str = "org.codehaus.mojo";

/// Tools unhelpful for a package build, or against packaging policy
const NEVER_USEFUL: &[(&str, &str)] = &[
    (APACHE_PLUGINS, "maven-archetype-plugin"),
    (APACHE_PLUGINS, "changelog-maven-plugin"),
    (APACHE_PLUGINS, "maven-deploy-plugin"),
    (APACHE_PLUGINS, "maven-release-plugin"),
    (APACHE_PLUGINS, "maven-repository-plugin"),
    (APACHE_PLUGINS, "maven-scm-plugin"),
    (APACHE_PLUGINS, "maven-stage-plugin"),
    (APACHE_PLUGINS, "maven-eclipse-plugin"),
    (APACHE_PLUGINS, "maven-idea-plugin"),
    (APACHE_PLUGINS, "maven-source-plugin"),
    (MOJO, "changelog-maven-plugin"),
    (MOJO, "netbeans-freeform-maven-plugin"),
    (MOJO, "nbm-maven-plugin"),
    (MOJO, "ideauidesigner-maven-plugin"),
    (MOJO, "scmchangelog-maven-plugin"),
];

const SOMETIMES_USEFUL: &[(&str, &str)] = &[
    (APACHE_PLUGINS, "maven-ant-plugin"),
    (APACHE_PLUGINS, "maven-assembly-plugin"),
    (MOJO, "buildnumber-maven-plugin"),
    (APACHE_PLUGINS, "maven-verifier-plugin"),
    (MOJO, "findbugs-maven-plugin"),
    (MOJO, "fitnesse-maven-plugin"),
    (MOJO, "selenium-maven-plugin"),
    (MOJO, "dbunit-maven-plugin"),
    (MOJO, "failsafe-maven-plugin"),
    (MOJO, "shitty-maven-plugin"),
];

const DOCUMENTATION: &[(&str, &str)] = &[
    (APACHE_PLUGINS, "maven-changelog-plugin"),
    (APACHE_PLUGINS, "maven-changes-plugin"),
    (APACHE_PLUGINS, "maven-checkstyle-plugin"),
    (APACHE_PLUGINS, "maven-clover-plugin"),
    (APACHE_PLUGINS, "maven-docck-plugin"),
    (APACHE_PLUGINS, "maven-javadoc-plugin"),
    (APACHE_PLUGINS, "maven-jxr-plugin"),
    (APACHE_PLUGINS, "maven-pmd-plugin"),
    (APACHE_PLUGINS, "maven-project-info-reports-plugin"),
    (APACHE_PLUGINS, "maven-surefire-report-plugin"),
    (APACHE_PLUGINS, "maven-pdf-plugin"),
    (APACHE_PLUGINS, "maven-site-plugin"),
    (MOJO, "changes-maven-plugin"),
    (MOJO, "clirr-maven-plugin"),
    (MOJO, "cobertura-maven-plugin"),
    (MOJO, "taglist-maven-plugin"),
    (MOJO, "dita-maven-plugin"),
    (MOJO, "docbook-maven-plugin"),
    (MOJO, "javancss-maven-plugin"),
    (MOJO, "jdepend-maven-plugin"),
    (MOJO, "jxr-maven-plugin"),
    (MOJO, "dashboard-maven-plugin"),
    (MOJO, "emma-maven-plugin"),
    (MOJO, "sonar-maven-plugin"),
    (MOJO, "surefire-report-maven-plugin"),
    ("org.jboss.maven.plugins", "maven-jdocbook-plugin"),
];

const TEST: &[(&str, &str)] = &[
    (APACHE_PLUGINS, "maven-failsafe-plugin"),
    (APACHE_PLUGINS, "maven-surefire-plugin"),
    (APACHE_PLUGINS, "maven-verifier-plugin"),
    (MOJO, "findbugs-maven-plugin"),
    (MOJO, "fitnesse-maven-plugin"),
    (MOJO, "selenium-maven-plugin"),
    (MOJO, "dbunit-maven-plugin"),
    (MOJO, "failsafe-maven-plugin"),
    (MOJO, "shitty-maven-plugin"),
];

const IGNORED_EXTENSIONS: &[(&str, &str)] = &[
    ("org.apache.maven.wagon", "wagon-ssh"),
    ("org.apache.maven.wagon", "wagon-ssh-external"),
    ("org.apache.maven.wagon", "wagon-ftp"),
    ("org.apache.maven.wagon", "wagon-http"),
    ("org.apache.maven.wagon", "wagon-http-lightweight"),
    ("org.apache.maven.wagon", "wagon-scm"),
    ("org.apache.maven.wagon", "wagon-webdav"),
    ("org.apache.maven.wagon", "wagon-webdav-jackrabbit"),
    ("org.jvnet.wagon-svn", "wagon-svn"),
];

/// One of the policy tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolList {
    NeverUseful,
    SometimesUseful,
    Documentation,
    Test,
    IgnoredExtensions,
}

impl ToolList {
    pub const ALL: [ToolList; 5] = [
        Self::NeverUseful,
        Self::SometimesUseful,
        Self::Documentation,
        Self::Test,
        Self::IgnoredExtensions,
    ];

    fn builtin(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::NeverUseful => NEVER_USEFUL,
            Self::SometimesUseful => SOMETIMES_USEFUL,
            Self::Documentation => DOCUMENTATION,
            Self::Test => TEST,
            Self::IgnoredExtensions => IGNORED_EXTENSIONS,
        }
    }
}

impl fmt::Display for ToolList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NeverUseful => "never useful",
            Self::SometimesUseful => "sometimes useful",
            Self::Documentation => "documentation",
            Self::Test => "test",
            Self::IgnoredExtensions => "ignored extensions",
        })
    }
}

/// Lookup tables of build tools with special handling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolPolicy {
    lists: [BTreeSet<(String, String)>; 5],
}

impl ToolPolicy {
    /// Policy with no entries at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in tables
    pub fn builtin() -> Self {
        let mut policy = Self::empty();
        for list in ToolList::ALL {
            for (group, artifact) in list.builtin() {
                policy.insert(list, group, artifact);
            }
        }
        policy
    }

    /// Built-in tables adjusted by a TOML overrides file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let overrides: PolicyOverrides = toml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        let mut policy = if overrides.replace {
            Self::empty()
        } else {
            Self::builtin()
        };
        policy.apply(&overrides)?;
        debug!("Loaded tool policy from {}", path.display());
        Ok(policy)
    }

    pub fn insert(&mut self, list: ToolList, group: &str, artifact: &str) {
        self.lists[list as usize].insert((group.to_string(), artifact.to_string()));
    }

    pub fn contains(&self, list: ToolList, coordinate: &Coordinate) -> bool {
        self.lists[list as usize]
            .contains(&(coordinate.group.clone(), coordinate.artifact.clone()))
    }

    pub fn len(&self, list: ToolList) -> usize {
        self.lists[list as usize].len()
    }

    fn apply(&mut self, overrides: &PolicyOverrides) -> Result<()> {
        let entries = [
            (ToolList::NeverUseful, &overrides.never_useful),
            (ToolList::SometimesUseful, &overrides.sometimes_useful),
            (ToolList::Documentation, &overrides.documentation),
            (ToolList::Test, &overrides.test),
            (ToolList::IgnoredExtensions, &overrides.ignored_extensions),
        ];
        for (list, names) in entries {
            for name in names {
                let (group, artifact) = name
                    .split_once(':')
                    .filter(|(g, a)| !g.is_empty() && !a.is_empty() && !a.contains(':'))
                    .ok_or_else(|| {
                        Error::ConfigError(format!(
                            "'{}' in the {} list is not of the form group:artifact",
                            name, list
                        ))
                    })?;
                self.insert(list, group.trim(), artifact.trim());
            }
        }
        Ok(())
    }
}

/// Contents of a policy overrides file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PolicyOverrides {
    /// Start from empty tables instead of the built-in ones
    replace: bool,
    never_useful: Vec<String>,
    sometimes_useful: Vec<String>,
    documentation: Vec<String>,
    test: Vec<String>,
    ignored_extensions: Vec<String>,
}
