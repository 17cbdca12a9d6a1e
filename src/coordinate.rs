// src/coordinate.rs

//! Artifact coordinates
//!
//! A coordinate identifies either a buildable project or a reference from one
//! project to another artifact. Two notions of identity are used:
//!
//! - "same artifact" compares group, artifact and type only
//! - full identity also compares the version (and scope/optional flags)

use serde::Serialize;
use std::fmt;

/// Type of a plain library artifact
pub const JAR_TYPE: &str = "jar";

/// Type of an aggregator or parent descriptor
pub const POM_TYPE: &str = "pom";

/// Type of a build tool (Maven plugin)
pub const PLUGIN_TYPE: &str = "maven-plugin";

/// Group used by plugins that do not declare one
pub const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

/// Dependency scope as declared by the referencing project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Provided,
    Runtime,
    Test,
    System,
    Import,
}

impl Scope {
    /// Parse a scope name, `None` for unknown scopes
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "compile" => Some(Self::Compile),
            "provided" => Some(Self::Provided),
            "runtime" => Some(Self::Runtime),
            "test" => Some(Self::Test),
            "system" => Some(Self::System),
            "import" => Some(Self::Import),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Provided => "provided",
            Self::Runtime => "runtime",
            Self::Test => "test",
            Self::System => "system",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// (group, artifact, type, version, scope, optional) tuple
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: Option<String>,
    pub scope: Scope,
    pub optional: bool,
}

impl Coordinate {
    /// Create a compile-scope, non-optional jar coordinate
    pub fn new(group: impl Into<String>, artifact: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            kind: JAR_TYPE.to_string(),
            version: version.map(str::to_string),
            scope: Scope::Compile,
            optional: false,
        }
    }

    /// Create a build tool coordinate
    pub fn plugin(group: impl Into<String>, artifact: impl Into<String>, version: Option<&str>) -> Self {
        Self::new(group, artifact, version).with_kind(PLUGIN_TYPE)
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_version(mut self, version: Option<&str>) -> Self {
        self.version = version.map(str::to_string);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Is this reference a build tool?
    pub fn is_plugin(&self) -> bool {
        self.kind == PLUGIN_TYPE
    }

    pub fn is_test(&self) -> bool {
        self.scope == Scope::Test
    }

    /// Same artifact regardless of version, scope or optional flag
    pub fn equals_ignore_version(&self, other: &Coordinate) -> bool {
        self.group == other.group && self.artifact == other.artifact && self.kind == other.kind
    }

    /// Does this coordinate name the given (group, artifact) pair?
    pub fn is(&self, group: &str, artifact: &str) -> bool {
        self.group == group && self.artifact == artifact
    }

    /// `group:artifact:version` form used in issue reports
    pub fn gav(&self) -> String {
        format!(
            "{}:{}:{}",
            self.group,
            self.artifact,
            self.version.as_deref().unwrap_or("?")
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.kind)?;
        if let Some(version) = &self.version {
            write!(f, ":{}", version)?;
        }
        if self.scope != Scope::Compile {
            write!(f, " ({})", self.scope)?;
        }
        if self.optional {
            write!(f, " [optional]")?;
        }
        Ok(())
    }
}

/// Does the collection contain the same artifact, ignoring version?
pub fn contains_ignore_version<'a>(
    coordinates: impl IntoIterator<Item = &'a Coordinate>,
    coordinate: &Coordinate,
) -> bool {
    coordinates
        .into_iter()
        .any(|known| known.equals_ignore_version(coordinate))
}
