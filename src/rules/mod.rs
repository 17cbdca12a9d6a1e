// src/rules/mod.rs

//! Version normalization and ignore rules
//!
//! A [`DependencyRule`] matches coordinates by `group artifact type version`
//! patterns (with `*` wildcards) and carries a [`VersionRule`] that rewrites
//! an upstream version into the form the packaging system expects:
//!
//! - `*` keeps the version unchanged
//! - `s/regex/replacement/` rewrites it (`$1` style group references)
//! - anything else is a literal version
//!
//! Rules live in ordered [`RuleSet`]s which persist to line-oriented files;
//! [`RuleStores`] bundles the four sets produced by a resolution run.

use crate::coordinate::Coordinate;
use crate::error::{Error, Result};
use glob::Pattern;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

/// Pattern matching anything
pub const ANY: &str = "*";

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(\..*)$").expect("static regex"));

static ANY_VERSION: LazyLock<Regex> = LazyLock::new(|| Regex::new("^(?:.*)$").expect("static regex"));

/// Rewrite instruction applied to an upstream version
#[derive(Debug, Clone)]
pub struct VersionRule {
    pattern: String,
    description: Option<String>,
    rewrite: Option<(Regex, String)>,
}

impl VersionRule {
    pub fn parse(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(Error::InvalidRule("empty version rule".to_string()));
        }
        let rewrite = match pattern.strip_prefix("s/") {
            Some(body) => Some(parse_substitution(pattern, body)?),
            None => None,
        };
        Ok(Self {
            pattern: pattern.to_string(),
            description: None,
            rewrite,
        })
    }

    /// Keep the upstream version
    pub fn keep() -> Self {
        Self {
            pattern: ANY.to_string(),
            description: Some("Keep the version".to_string()),
            rewrite: None,
        }
    }

    /// Rewrite every version to the symbolic `debian` version
    pub fn to_debian() -> Self {
        Self::substitution(".*", ANY_VERSION.clone(), "debian")
            .described("Change the version to the symbolic 'debian' version")
    }

    /// Rule freezing the leading numeric component, e.g. `2.1.3` gives `s/2\..*/2.x/`
    pub fn freeze_major(version: &str) -> Option<Self> {
        let major = LEADING_NUMBER.captures(version)?.get(1)?.as_str();
        let regex = format!(r"{}\..*", major);
        let anchored = Regex::new(&format!("^(?:{})$", regex)).ok()?;
        Some(
            Self::substitution(&regex, anchored, &format!("{}.x", major)).described(
                format!("Replace all versions starting by {}. with {}.x", major, major),
            ),
        )
    }

    fn substitution(regex: &str, anchored: Regex, replacement: &str) -> Self {
        Self {
            pattern: format!("s/{}/{}/", regex, replacement),
            description: None,
            rewrite: Some((anchored, replacement.to_string())),
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.pattern)
    }

    pub fn is_keep(&self) -> bool {
        self.pattern == ANY
    }

    /// Does the rule apply to this version?
    pub fn matches(&self, version: Option<&str>) -> bool {
        if self.is_keep() {
            return true;
        }
        match (&self.rewrite, version) {
            (Some((regex, _)), Some(version)) => regex.is_match(version),
            (None, Some(version)) => version == self.pattern,
            (_, None) => false,
        }
    }

    /// Normalized form of a version
    pub fn apply(&self, version: &str) -> String {
        match &self.rewrite {
            Some((regex, replacement)) => regex.replace(version, replacement.as_str()).into_owned(),
            None if self.is_keep() => version.to_string(),
            None => self.pattern.clone(),
        }
    }
}

impl PartialEq for VersionRule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for VersionRule {}

impl fmt::Display for VersionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Split `regex/replacement/` (the part after `s/`), honouring `\/` escapes
fn parse_substitution(pattern: &str, body: &str) -> Result<(Regex, String)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                match chars.next() {
                    Some('/') => current.push('/'),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => current.push('\\'),
                }
            }
            '/' => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }

    let [regex, replacement, ..] = parts.as_slice() else {
        return Err(Error::InvalidRule(format!(
            "'{}' is not of the form s/regex/replacement/",
            pattern
        )));
    };
    let anchored = Regex::new(&format!("^(?:{})$", regex))
        .map_err(|e| Error::InvalidRule(format!("'{}': {}", pattern, e)))?;
    Ok((anchored, replacement.clone()))
}

/// Coordinate pattern plus a version rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRule {
    group: String,
    artifact: String,
    kind: String,
    version: VersionRule,
}

impl DependencyRule {
    pub fn new(group: &str, artifact: &str, kind: &str, version: VersionRule) -> Self {
        Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            kind: kind.to_string(),
            version,
        }
    }

    /// Rule covering every type and version of an artifact
    pub fn ignore(group: &str, artifact: &str) -> Self {
        Self::new(group, artifact, ANY, VersionRule::keep())
    }

    /// Parse `group artifact [type [version-rule]]`; missing fields are `*`
    pub fn parse(definition: &str) -> Result<Self> {
        let mut tokens = definition.split_whitespace();
        let mut next = || tokens.next().unwrap_or(ANY);
        let (group, artifact, kind) = (next(), next(), next());
        let version = VersionRule::parse(next())?;
        if tokens.next().is_some() {
            return Err(Error::InvalidRule(format!(
                "unexpected trailing text in '{}'",
                definition
            )));
        }
        for part in [group, artifact, kind] {
            Pattern::new(part).map_err(|e| Error::InvalidRule(format!("'{}': {}", part, e)))?;
        }
        Ok(Self::new(group, artifact, kind, version))
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version_rule(&self) -> &VersionRule {
        &self.version
    }

    /// Does the rule name a specific artifact rather than every artifact?
    pub fn is_specific(&self) -> bool {
        self.group != ANY || self.artifact != ANY
    }

    pub fn matches(&self, coordinate: &Coordinate) -> bool {
        glob_match(&self.group, &coordinate.group)
            && glob_match(&self.artifact, &coordinate.artifact)
            && glob_match(&self.kind, &coordinate.kind)
            && self.version.matches(coordinate.version.as_deref())
    }

    /// Matches the artifact, whatever its version
    pub fn matches_ignore_version(&self, coordinate: &Coordinate) -> bool {
        glob_match(&self.group, &coordinate.group)
            && glob_match(&self.artifact, &coordinate.artifact)
            && glob_match(&self.kind, &coordinate.kind)
    }
}

impl fmt::Display for DependencyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.group, self.artifact, self.kind, self.version)
    }
}

fn glob_match(pattern: &str, value: &str) -> bool {
    if pattern == ANY {
        return true;
    }
    Pattern::new(pattern)
        .map(|p| p.matches(value))
        .unwrap_or(pattern == value)
}

/// Ordered, de-duplicated collection of rules persisted to one file
#[derive(Debug, Clone)]
pub struct RuleSet {
    description: String,
    path: Option<PathBuf>,
    rules: Vec<DependencyRule>,
}

impl RuleSet {
    /// In-memory rule set
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            path: None,
            rules: Vec::new(),
        }
    }

    /// Rule set bound to a file, loading the rules it already contains
    pub fn open(description: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let mut set = Self::new(description);
        let path = path.into();
        if path.exists() {
            set.load(&path)?;
        }
        set.path = Some(path);
        Ok(set)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)?;
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let rule = DependencyRule::parse(line).map_err(|e| {
                Error::InvalidRule(format!("{}:{}: {}", path.display(), number + 1, e))
            })?;
            if !self.rules.contains(&rule) {
                self.rules.push(rule);
            }
        }
        debug!("Loaded {} rules from {}", self.rules.len(), path.display());
        Ok(())
    }

    /// Append a rule unless an identical one is present
    pub fn add(&mut self, rule: DependencyRule) {
        if self.rules.contains(&rule) {
            return;
        }
        info!("Adding rule [{}] to {}", rule, self.description);
        self.rules.push(rule);
    }

    pub fn find_matching(&self, coordinate: &Coordinate) -> Vec<&DependencyRule> {
        self.rules.iter().filter(|r| r.matches(coordinate)).collect()
    }

    /// Does any rule cover the artifact, whatever its version?
    pub fn covers(&self, coordinate: &Coordinate) -> bool {
        self.rules.iter().any(|r| r.matches_ignore_version(coordinate))
    }

    pub fn rules(&self) -> &[DependencyRule] {
        &self.rules
    }

    pub fn contains(&self, rule: &DependencyRule) -> bool {
        self.rules.contains(rule)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.description.lines() {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
        for rule in &self.rules {
            out.push_str(&rule.to_string());
            out.push('\n');
        }
        out
    }

    /// Write the rules back to their file; in-memory sets are left alone
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            debug!("Rule set '{}' has no file, not saving", self.description);
            return Ok(());
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.render())?;
        debug!("Saved {} rules to {}", self.rules.len(), path.display());
        Ok(())
    }
}

/// File names of the four rule sets in the output directory
pub const RULES_FILE: &str = "maven.rules";
pub const IGNORE_RULES_FILE: &str = "maven.ignoreRules";
pub const PUBLISHED_RULES_FILE: &str = "maven.publishedRules";
pub const CLEAN_IGNORE_RULES_FILE: &str = "maven.cleanIgnoreRules";

const RULES_DESCRIPTION: &str = "Maven rules to transform the version of dependencies.\n\
Format: <group> <artifact> <type> <version rule>, '*' matches anything,\n\
s/regex/replacement/ rewrites the version.";
const IGNORE_RULES_DESCRIPTION: &str = "Maven ignore rules: dependencies and plugins removed from the POMs.";
const PUBLISHED_RULES_DESCRIPTION: &str = "Maven rules published with the package for its reverse dependencies.";
const CLEAN_IGNORE_RULES_DESCRIPTION: &str = "Maven ignore rules applied during the clean phase only.";

/// The general, ignore, published and clean-ignore rule sets of a run
#[derive(Debug, Clone)]
pub struct RuleStores {
    pub rules: RuleSet,
    pub ignore_rules: RuleSet,
    pub published_rules: RuleSet,
    pub clean_ignore_rules: RuleSet,
}

impl Default for RuleStores {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl RuleStores {
    pub fn in_memory() -> Self {
        Self {
            rules: RuleSet::new(RULES_DESCRIPTION),
            ignore_rules: RuleSet::new(IGNORE_RULES_DESCRIPTION),
            published_rules: RuleSet::new(PUBLISHED_RULES_DESCRIPTION),
            clean_ignore_rules: RuleSet::new(CLEAN_IGNORE_RULES_DESCRIPTION),
        }
    }

    /// Rule sets stored in `dir`, loading existing files
    pub fn open(dir: &Path) -> Result<Self> {
        Ok(Self {
            rules: RuleSet::open(RULES_DESCRIPTION, dir.join(RULES_FILE))?,
            ignore_rules: RuleSet::open(IGNORE_RULES_DESCRIPTION, dir.join(IGNORE_RULES_FILE))?,
            published_rules: RuleSet::open(
                PUBLISHED_RULES_DESCRIPTION,
                dir.join(PUBLISHED_RULES_FILE),
            )?,
            clean_ignore_rules: RuleSet::open(
                CLEAN_IGNORE_RULES_DESCRIPTION,
                dir.join(CLEAN_IGNORE_RULES_FILE),
            )?,
        })
    }

    pub fn save(&self) -> Result<()> {
        self.rules.save()?;
        self.ignore_rules.save()?;
        self.published_rules.save()?;
        self.clean_ignore_rules.save()
    }
}
