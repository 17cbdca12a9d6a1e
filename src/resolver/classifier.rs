// src/resolver/classifier.rs

//! Classification of a single reference
//!
//! In order, a reference is:
//!
//! 1. dropped if it is ignored already, built by the project itself, or
//!    (in a management list) default tooling of the base descriptor
//! 2. offered for ignoring when a policy table or the run settings say it
//!    is probably not wanted
//! 3. looked up in the repository; a reference nothing provides is either
//!    ignored or reported as [`Error::UnresolvedReference`]
//! 4. filed into a bucket under the name of the package providing it

use super::{Bucket, BucketEntry, PackageMode, ResolutionState, SolverConfig};
use crate::coordinate::{Coordinate, PLUGIN_TYPE, contains_ignore_version};
use crate::descriptor::{ProjectDescriptor, ReferenceFlags};
use crate::error::{Error, Result};
use crate::index::PackageIndex;
use crate::policy::{ToolList, ToolPolicy};
use crate::prompt::{self, Prompter};
use crate::repository::Repository;
use crate::rules::{DependencyRule, RuleStores, VersionRule};
use std::path::Path;
use tracing::{debug, info, warn};

/// Number of placeholder versions tried for unversioned build tools
const PLACEHOLDER_VERSIONS: u32 = 10;

/// What happened to a classified reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Already ignored, built by the project or default tooling
    Skipped,
    /// Ignored now, an ignore rule was recorded
    Ignored,
    Filed(Bucket, BucketEntry),
    /// Provided by the package being built
    SelfReference,
    /// Found, but no bucket applies or no package is known for it
    Unfiled,
}

/// Where a failed lookup goes next
enum NotFound {
    Ignore,
    Retry,
}

/// Borrowed view of the collaborators needed to classify references
pub struct ReferenceClassifier<'a> {
    pub config: &'a SolverConfig,
    pub policy: &'a ToolPolicy,
    pub repository: &'a dyn Repository,
    pub rules: &'a mut RuleStores,
    pub index: &'a mut dyn PackageIndex,
    pub prompter: &'a mut dyn Prompter,
}

impl ReferenceClassifier<'_> {
    /// Classify `reference`, declared in the descriptor at `source`
    pub fn classify(
        &mut self,
        state: &mut ResolutionState,
        reference: &Coordinate,
        source: &Path,
        flags: ReferenceFlags,
    ) -> Result<Outcome> {
        if reference.is_plugin() && state.is_known(reference) {
            // A plugin built by this project must not be resolved on clean
            self.rules.clean_ignore_rules.add(DependencyRule::new(
                &reference.group,
                &reference.artifact,
                PLUGIN_TYPE,
                VersionRule::keep(),
            ));
        }

        if state.is_ignored(reference) || state.is_known(reference) {
            return Ok(Outcome::Skipped);
        }
        if flags.management
            && contains_ignore_version(&self.repository.super_descriptor().plugin_management, reference)
        {
            return Ok(Outcome::Skipped);
        }

        if let Some(question) = self.policy_question(reference) {
            if self.ask_ignore(source, reference, question, true)? {
                self.ignore(state, reference);
                return Ok(Outcome::Ignored);
            }
        }

        let mut retried = false;
        loop {
            if let Some(matched) = self.lookup(state, reference, source, flags) {
                return self.file(state, reference, source, flags, &matched);
            }
            if flags.management {
                debug!("Dropping unresolved management entry {}", reference);
                return Ok(Outcome::Skipped);
            }
            match self.not_found(state, reference, source, retried)? {
                NotFound::Ignore => {
                    self.ignore(state, reference);
                    return Ok(Outcome::Ignored);
                }
                NotFound::Retry => retried = true,
            }
        }
    }

    /// Question offering to ignore a reference the run probably does not want
    fn policy_question(&self, reference: &Coordinate) -> Option<&'static str> {
        let listed = |list| self.policy.contains(list, reference);
        if listed(ToolList::NeverUseful) {
            Some("This plugin is not useful for the build or its use is against Debian policies. Ignore this plugin?")
        } else if listed(ToolList::IgnoredExtensions) {
            Some("This extension is not useful for the build or its use is against Debian policies. Ignore this extension?")
        } else if listed(ToolList::SometimesUseful) {
            Some("This plugin may be ignored in some cases. Ignore this plugin?")
        } else if !self.config.run_tests && reference.is_test() {
            Some("Tests are turned off. Ignore this test dependency?")
        } else if !self.config.run_tests && listed(ToolList::Test) {
            Some("Tests are turned off. Ignore this test plugin?")
        } else if !self.config.generate_docs && listed(ToolList::Documentation) {
            Some("Documentation is turned off. Ignore this documentation plugin?")
        } else {
            None
        }
    }

    fn ask_ignore(
        &mut self,
        source: &Path,
        reference: &Coordinate,
        message: &str,
        default: bool,
    ) -> Result<bool> {
        let question = format!("In {}:\n{}\n  {}\n", source.display(), message, reference);
        prompt::confirm(&mut *self.prompter, &question, default)
    }

    fn ignore(&mut self, state: &mut ResolutionState, reference: &Coordinate) {
        info!("Ignoring {}", reference);
        state.ignore(reference.clone());
        self.rules
            .ignore_rules
            .add(DependencyRule::ignore(&reference.group, &reference.artifact));
    }

    fn lookup(
        &self,
        state: &mut ResolutionState,
        reference: &Coordinate,
        source: &Path,
        flags: ReferenceFlags,
    ) -> Option<ProjectDescriptor> {
        if let Some(found) = self.repository.search_matching(reference) {
            return Some(found.clone());
        }

        let build_tool = reference.is_plugin() || flags.build_extension;
        if reference.version.is_none() && build_tool {
            for major in 0..PLACEHOLDER_VERSIONS {
                let probe = reference.clone().with_version(Some(&format!("{}.0", major)));
                if let Some(found) = self.repository.search_matching(&probe) {
                    debug!("{} found as {}", reference, probe);
                    return Some(found.clone());
                }
            }
        }

        if reference.is_plugin() {
            let matches = self.repository.search_matching_ignore_version(reference);
            if matches.len() > 1 {
                state.add_issue(
                    source,
                    format!("More than one version matches the plugin {}", reference.gav()),
                );
            }
            // Plugin versions are pinned at build time, no version constraint needed
            return matches.first().map(|found| (*found).clone());
        }
        None
    }

    fn not_found(
        &mut self,
        state: &mut ResolutionState,
        reference: &Coordinate,
        source: &Path,
        retried: bool,
    ) -> Result<NotFound> {
        let ignore = if reference.is_plugin() && self.config.mode == PackageMode::Ant {
            true
        } else if reference.is_plugin() {
            if !retried {
                state.add_issue(
                    source,
                    format!(
                        "Plugin is not packaged in the Maven repository for Debian: {}",
                        reference.gav()
                    ),
                );
            }
            self.ask_ignore(
                source,
                reference,
                "This plugin cannot be found in the Debian Maven repository. Ignore this plugin?",
                false,
            )?
        } else if self.policy.contains(ToolList::Documentation, reference) {
            let ignore = self.ask_ignore(
                source,
                reference,
                "This documentation or report plugin cannot be found in the Maven repository for Debian. Ignore this plugin?",
                true,
            )?;
            if !ignore && !retried {
                state.add_issue(source, not_packaged(reference));
            }
            ignore
        } else {
            if !retried {
                state.add_issue(source, not_packaged(reference));
            }
            self.ask_ignore(
                source,
                reference,
                "This dependency cannot be found in the Debian Maven repository. Ignore this dependency?",
                false,
            )?
        };
        if ignore {
            return Ok(NotFound::Ignore);
        }

        let artifact_dir = self
            .config
            .repository_root
            .join(reference.group.replace('.', "/"))
            .join(&reference.artifact);
        if let Some(package) = self.find_package(&artifact_dir) {
            info!(
                "Please install the missing dependency using\n  sudo apt-get install {}",
                package
            );
        }

        if !retried
            && self.prompter.is_interactive()
            && prompt::confirm(&mut *self.prompter, "Try again to resolve the dependency?", true)?
        {
            return Ok(NotFound::Retry);
        }
        Err(Error::UnresolvedReference(reference.clone()))
    }

    /// Package owning a file; index failures only lose the answer
    fn find_package(&mut self, path: &Path) -> Option<String> {
        match self.index.lookup(&path.to_string_lossy()) {
            Ok(package) => package,
            Err(e) => {
                warn!("Cannot search the package providing {}: {}", path.display(), e);
                None
            }
        }
    }

    fn file(
        &mut self,
        state: &mut ResolutionState,
        reference: &Coordinate,
        source: &Path,
        flags: ReferenceFlags,
        matched: &ProjectDescriptor,
    ) -> Result<Outcome> {
        let package = match matched.package() {
            Some(package) => Some(package.to_string()),
            None => {
                state.add_issue(
                    source,
                    format!(
                        "Dependency is missing the Debian properties in its POM: {}",
                        reference.gav()
                    ),
                );
                let version = reference
                    .version
                    .as_deref()
                    .or(matched.coordinate.version.as_deref())
                    .unwrap_or_default();
                let pom = self
                    .config
                    .repository_root
                    .join(reference.group.replace('.', "/"))
                    .join(&reference.artifact)
                    .join(version)
                    .join(format!("{}-{}.pom", reference.artifact, version));
                self.find_package(&pom)
            }
        };

        let outcome = match package {
            Some(package) if package == self.config.package_name => Outcome::SelfReference,
            Some(package) => {
                let entry = BucketEntry::new(package, min_version(reference, matched));
                match bucket_for(reference, flags, self.config.mode) {
                    Some(bucket) => {
                        debug!("{} -> {} ({})", reference, entry, bucket);
                        state.add_to_bucket(bucket, entry.clone());
                        Outcome::Filed(bucket, entry)
                    }
                    None => Outcome::Unfiled,
                }
            }
            None => Outcome::Unfiled,
        };

        for definition in matched.advertised_rules() {
            match DependencyRule::parse(definition) {
                Ok(rule) => self.rules.rules.add(rule),
                Err(e) => warn!("Ignoring rule advertised by {}: {}", matched.coordinate, e),
            }
        }
        Ok(outcome)
    }
}

fn not_packaged(reference: &Coordinate) -> String {
    format!(
        "Dependency is not packaged in the Maven repository for Debian: {}",
        reference.gav()
    )
}

/// Minimum version of the providing package, when it tracks upstream versions
fn min_version<'a>(reference: &'a Coordinate, matched: &'a ProjectDescriptor) -> Option<&'a str> {
    let upstream = matched.original_version()?;
    if !matched.has_package_version() {
        return None;
    }
    match reference.version.as_deref() {
        Some(declared) if declared >= upstream => Some(declared),
        _ => Some(upstream),
    }
}

/// Bucket for a resolved reference, `None` when the build mode drops it
pub fn bucket_for(reference: &Coordinate, flags: ReferenceFlags, mode: PackageMode) -> Option<Bucket> {
    if flags.build_time {
        if reference.is_test() {
            Some(Bucket::Test)
        } else if reference.is_plugin() || flags.extension {
            (mode == PackageMode::Maven).then_some(Bucket::Compile)
        } else {
            Some(Bucket::Compile)
        }
    } else if reference.optional {
        Some(Bucket::Optional)
    } else if reference.is_test() {
        Some(Bucket::Test)
    } else {
        Some(Bucket::Runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{DEFAULT_PLUGIN_GROUP, Scope};
    use crate::descriptor::{HAS_PACKAGE_VERSION_PROPERTY, ORIGINAL_VERSION_PROPERTY, PACKAGE_PROPERTY, RULES_PROPERTY, ReferenceCategory};
    use crate::index::StaticIndex;
    use crate::prompt::{Answer, ScriptedPrompter};
    use crate::repository::MemoryRepository;

    struct Fixture {
        config: SolverConfig,
        policy: ToolPolicy,
        repository: MemoryRepository,
        rules: RuleStores,
        index: StaticIndex,
        prompter: ScriptedPrompter,
        state: ResolutionState,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: SolverConfig::new("libproject-java"),
                policy: ToolPolicy::builtin(),
                repository: MemoryRepository::new(),
                rules: RuleStores::in_memory(),
                index: StaticIndex::new(),
                prompter: ScriptedPrompter::non_interactive(),
                state: ResolutionState::new(),
            }
        }

        fn install(&mut self, coordinate: Coordinate, package: &str) {
            self.install_with(coordinate, package, &[]);
        }

        fn install_with(&mut self, coordinate: Coordinate, package: &str, properties: &[(&str, &str)]) {
            let mut d = ProjectDescriptor::new(coordinate);
            d.set_property(PACKAGE_PROPERTY, package);
            for (key, value) in properties {
                d.set_property(key, *value);
            }
            self.repository.register(d);
        }

        fn classify(&mut self, reference: &Coordinate, category: ReferenceCategory) -> Result<Outcome> {
            let mut classifier = ReferenceClassifier {
                config: &self.config,
                policy: &self.policy,
                repository: &self.repository,
                rules: &mut self.rules,
                index: &mut self.index,
                prompter: &mut self.prompter,
            };
            classifier.classify(&mut self.state, reference, Path::new("pom.xml"), category.flags())
        }
    }

    #[test]
    fn test_runtime_dependency() {
        let mut f = Fixture::new();
        f.install(Coordinate::new("org.foo", "foo", Some("debian")), "libfoo-java");

        let outcome = f
            .classify(&Coordinate::new("org.foo", "foo", None), ReferenceCategory::Dependencies)
            .unwrap();
        assert_eq!(outcome, Outcome::Filed(Bucket::Runtime, BucketEntry::new("libfoo-java", None)));
        assert!(f.state.issues().is_empty());
    }

    #[test]
    fn test_version_constraint() {
        let mut f = Fixture::new();
        f.install_with(
            Coordinate::new("org.foo", "foo", Some("debian")),
            "libfoo-java",
            &[(ORIGINAL_VERSION_PROPERTY, "1.5"), (HAS_PACKAGE_VERSION_PROPERTY, "true")],
        );

        let older = f
            .classify(&Coordinate::new("org.foo", "foo", Some("1.2")), ReferenceCategory::Dependencies)
            .unwrap();
        assert_eq!(older, Outcome::Filed(Bucket::Runtime, BucketEntry::new("libfoo-java", Some("1.5"))));

        let newer = f
            .classify(&Coordinate::new("org.foo", "foo", Some("1.7")), ReferenceCategory::Dependencies)
            .unwrap();
        assert_eq!(newer, Outcome::Filed(Bucket::Runtime, BucketEntry::new("libfoo-java", Some("1.7"))));
    }

    #[test]
    fn test_test_dependency_ignored_when_tests_off() {
        let mut f = Fixture::new();
        let junit = Coordinate::new("junit", "junit", Some("4.12")).with_scope(Scope::Test);

        let outcome = f.classify(&junit, ReferenceCategory::Dependencies).unwrap();
        assert_eq!(outcome, Outcome::Ignored);
        assert!(f.state.is_ignored(&junit));
        assert!(f.rules.ignore_rules.contains(&DependencyRule::ignore("junit", "junit")));
        assert!(f.state.issues().is_empty());
        assert!(f.prompter.asked().is_empty());
    }

    #[test]
    fn test_never_useful_plugin() {
        let mut f = Fixture::new();
        let release = Coordinate::plugin(DEFAULT_PLUGIN_GROUP, "maven-release-plugin", Some("2.0"));
        assert_eq!(f.classify(&release, ReferenceCategory::Plugins).unwrap(), Outcome::Ignored);
        assert!(f.prompter.asked().is_empty());
    }

    #[test]
    fn test_doc_plugin_ignored_even_when_tests_off() {
        let mut f = Fixture::new();
        let javadoc = Coordinate::plugin(DEFAULT_PLUGIN_GROUP, "maven-javadoc-plugin", None);
        assert_eq!(f.classify(&javadoc, ReferenceCategory::ReportPlugins).unwrap(), Outcome::Ignored);
    }

    #[test]
    fn test_interactive_keeps_policy_plugin() {
        let mut f = Fixture::new();
        f.prompter = ScriptedPrompter::new([Answer::No]);
        f.install(Coordinate::plugin(DEFAULT_PLUGIN_GROUP, "maven-assembly-plugin", Some("debian")), "libmaven-assembly-plugin-java");

        let assembly = Coordinate::plugin(DEFAULT_PLUGIN_GROUP, "maven-assembly-plugin", None);
        let outcome = f.classify(&assembly, ReferenceCategory::Plugins).unwrap();
        assert!(matches!(outcome, Outcome::Filed(Bucket::Compile, _)));
        assert_eq!(f.prompter.asked().len(), 1);
    }

    #[test]
    fn test_unresolved_dependency() {
        let mut f = Fixture::new();
        let missing = Coordinate::new("org.missing", "gone", Some("1.0"));

        let err = f.classify(&missing, ReferenceCategory::Dependencies).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference(ref c) if c == &missing));
        assert_eq!(f.state.issues().len(), 1);
        assert!(f.state.issues()[0].message.contains("org.missing:gone:1.0"));
        assert_eq!(f.index.queries(), ["/usr/share/maven-repo/org/missing/gone"]);
    }

    #[test]
    fn test_unresolved_management_entry_dropped() {
        let mut f = Fixture::new();
        let missing = Coordinate::new("org.missing", "gone", Some("1.0"));
        assert_eq!(
            f.classify(&missing, ReferenceCategory::DependencyManagement).unwrap(),
            Outcome::Skipped
        );
        assert!(f.state.issues().is_empty());
    }

    #[test]
    fn test_default_tooling_in_management() {
        let mut f = Fixture::new();
        let antrun = Coordinate::plugin(DEFAULT_PLUGIN_GROUP, "maven-antrun-plugin", Some("1.7"));
        assert_eq!(f.classify(&antrun, ReferenceCategory::PluginManagement).unwrap(), Outcome::Skipped);
    }

    #[test]
    fn test_plugin_ant_mode() {
        let mut f = Fixture::new();
        f.config.mode = PackageMode::Ant;
        let missing = Coordinate::plugin("org.codehaus.mojo", "exec-maven-plugin", None);
        assert_eq!(f.classify(&missing, ReferenceCategory::Plugins).unwrap(), Outcome::Ignored);

        f.install(Coordinate::plugin("org.codehaus.mojo", "build-helper-maven-plugin", Some("debian")), "libbuild-helper-maven-plugin-java");
        let found = Coordinate::plugin("org.codehaus.mojo", "build-helper-maven-plugin", None);
        assert_eq!(f.classify(&found, ReferenceCategory::Plugins).unwrap(), Outcome::Unfiled);
    }

    #[test]
    fn test_plugin_versionless_fallback_ambiguous() {
        let mut f = Fixture::new();
        let exec = |v| Coordinate::plugin("org.codehaus.mojo", "exec-maven-plugin", Some(v));
        f.install(exec("1.1"), "libexec-maven-plugin-java");
        f.install(exec("1.2"), "libexec-maven-plugin-java");

        let outcome = f.classify(&exec("3.0"), ReferenceCategory::Plugins).unwrap();
        assert_eq!(outcome, Outcome::Filed(Bucket::Compile, BucketEntry::new("libexec-maven-plugin-java", None)));
        assert_eq!(f.state.issues().len(), 1);
        assert!(f.state.issues()[0].message.starts_with("More than one version"));
    }

    #[test]
    fn test_placeholder_version_probe() {
        let mut f = Fixture::new();
        f.install(Coordinate::new("org.apache.maven.wagon", "wagon-file", Some("2.0")), "libwagon-java");
        let wagon = Coordinate::new("org.apache.maven.wagon", "wagon-file", None);

        let outcome = f.classify(&wagon, ReferenceCategory::Extensions).unwrap();
        assert!(matches!(outcome, Outcome::Filed(Bucket::Compile, _)));
    }

    #[test]
    fn test_plugin_dependency_not_probed() {
        let mut f = Fixture::new();
        f.install(Coordinate::new("org.ow2.asm", "asm", Some("3.0")), "libasm3-java");
        let asm = Coordinate::new("org.ow2.asm", "asm", None);

        let err = f.classify(&asm, ReferenceCategory::PluginDependencies).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference(_)));
        assert_eq!(f.state.issues().len(), 1);
    }

    #[test]
    fn test_known_plugin_gets_clean_rule() {
        let mut f = Fixture::new();
        let plugin = Coordinate::plugin("org.foo", "foo-maven-plugin", Some("1.0"));
        f.state.register_known(plugin.clone());

        assert_eq!(f.classify(&plugin, ReferenceCategory::Plugins).unwrap(), Outcome::Skipped);
        assert_eq!(
            f.rules.clean_ignore_rules.rules()[0].to_string(),
            "org.foo foo-maven-plugin maven-plugin *"
        );
    }

    #[test]
    fn test_self_reference_and_advertised_rules() {
        let mut f = Fixture::new();
        f.install_with(
            Coordinate::new("org.project", "api", Some("debian")),
            "libproject-java",
            &[(RULES_PROPERTY, "org.project api * s/1\\..*/1.x/")],
        );

        let outcome = f
            .classify(&Coordinate::new("org.project", "api", Some("1.0")), ReferenceCategory::Dependencies)
            .unwrap();
        assert_eq!(outcome, Outcome::SelfReference);
        assert_eq!(f.rules.rules.len(), 1);
    }

    #[test]
    fn test_missing_debian_properties() {
        let mut f = Fixture::new();
        f.repository
            .register(ProjectDescriptor::new(Coordinate::new("org.bar", "bar", Some("2.0"))));
        f.index = StaticIndex::new().with("/usr/share/maven-repo/org/bar/bar/2.0/bar-2.0.pom", "libbar-java");

        let outcome = f
            .classify(&Coordinate::new("org.bar", "bar", Some("2.0")).optional(), ReferenceCategory::Dependencies)
            .unwrap();
        assert_eq!(outcome, Outcome::Filed(Bucket::Optional, BucketEntry::new("libbar-java", None)));
        assert_eq!(f.state.issues().len(), 1);
    }

    #[test]
    fn test_retry_after_decline() {
        let mut f = Fixture::new();
        f.prompter = ScriptedPrompter::new([Answer::No, Answer::Yes, Answer::No]);
        let missing = Coordinate::new("org.missing", "gone", Some("1.0"));

        let err = f.classify(&missing, ReferenceCategory::Dependencies).unwrap_err();
        assert!(matches!(err, Error::UnresolvedReference(_)));
        assert_eq!(f.prompter.asked().len(), 3);
        assert_eq!(f.state.issues().len(), 1);
    }

    #[test]
    fn test_bucket_table() {
        let jar = Coordinate::new("g", "a", None);
        let test = jar.clone().with_scope(Scope::Test);
        let plugin = Coordinate::plugin("g", "p", None);
        let build = ReferenceCategory::Plugins.flags();
        let deps = ReferenceCategory::Dependencies.flags();

        assert_eq!(bucket_for(&test, build, PackageMode::Maven), Some(Bucket::Test));
        assert_eq!(bucket_for(&plugin, build, PackageMode::Maven), Some(Bucket::Compile));
        assert_eq!(bucket_for(&plugin, build, PackageMode::Ant), None);
        assert_eq!(bucket_for(&jar, ReferenceFlags { build_time: true, ..Default::default() }, PackageMode::Ant), Some(Bucket::Compile));
        assert_eq!(bucket_for(&jar.clone().optional(), deps, PackageMode::Maven), Some(Bucket::Optional));
        assert_eq!(bucket_for(&test, deps, PackageMode::Maven), Some(Bucket::Test));
        assert_eq!(bucket_for(&jar, deps, PackageMode::Maven), Some(Bucket::Runtime));
    }
}
