// src/resolver/solver.rs

//! The resolution walk
//!
//! [`DependencySolver::solve`] visits the project's descriptors, then drains
//! the queue of reference lists they produced. Failures are contained: a
//! descriptor that cannot be read skips its own subtree, an unresolved
//! reference skips only that reference, and both end up in the issue list.

use super::{
    Bucket, BucketEntry, Issue, Outcome, ProjectRegistry, ReferenceClassifier, ResolutionState,
    SolverConfig, Task, VersionRuleSelector,
};
use crate::coordinate::Coordinate;
use crate::descriptor::{
    DescriptorList, DescriptorParser, HAS_PACKAGE_VERSION_PROPERTY, PACKAGE_PROPERTY,
    ReferenceCategory, ReferenceFlags,
};
use crate::error::{Error, Result};
use crate::index::PackageIndex;
use crate::output;
use crate::policy::ToolPolicy;
use crate::prompt::{self, Prompter};
use crate::repository::Repository;
use crate::rules::{DependencyRule, RuleStores};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Candidate root descriptors, relative to the base directory
const ROOT_DESCRIPTORS: [&str; 2] = ["pom.xml", "debian/pom.xml"];

/// Result of a resolution run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SolveReport {
    pub package: String,
    /// Upstream version chosen for the package
    pub package_version: Option<String>,
    pub buckets: BTreeMap<Bucket, Vec<BucketEntry>>,
    pub issues: Vec<Issue>,
}

impl SolveReport {
    pub fn bucket(&self, bucket: Bucket) -> &[BucketEntry] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or_default()
    }

    /// Package names of a bucket, without version constraints
    pub fn packages(&self, bucket: Bucket) -> Vec<&str> {
        self.bucket(bucket).iter().map(|e| e.package.as_str()).collect()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Resolution orchestrator, owning the run's state
pub struct DependencySolver<'a> {
    config: SolverConfig,
    parser: &'a dyn DescriptorParser,
    policy: ToolPolicy,
    rules: RuleStores,
    registry: ProjectRegistry<'a>,
    repository: &'a mut dyn Repository,
    index: &'a mut dyn PackageIndex,
    prompter: &'a mut dyn Prompter,
    selector: VersionRuleSelector,
    state: ResolutionState,
}

impl<'a> DependencySolver<'a> {
    pub fn new(
        config: SolverConfig,
        parser: &'a dyn DescriptorParser,
        repository: &'a mut dyn Repository,
        index: &'a mut dyn PackageIndex,
        prompter: &'a mut dyn Prompter,
    ) -> Self {
        let registry = ProjectRegistry::new(parser, config.base_dir.clone(), DescriptorList::new());
        Self {
            config,
            parser,
            policy: ToolPolicy::builtin(),
            rules: RuleStores::in_memory(),
            registry,
            repository,
            index,
            prompter,
            selector: VersionRuleSelector::new(),
            state: ResolutionState::new(),
        }
    }

    pub fn with_policy(mut self, policy: ToolPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rules(mut self, rules: RuleStores) -> Self {
        self.rules = rules;
        self
    }

    /// Per-file options recorded by a previous run
    pub fn with_descriptor_list(mut self, list: DescriptorList) -> Self {
        self.registry = ProjectRegistry::new(self.parser, self.config.base_dir.clone(), list);
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    pub fn rules(&self) -> &RuleStores {
        &self.rules
    }

    pub fn descriptor_list(&self) -> &DescriptorList {
        self.registry.list()
    }

    /// Walk the project, then classify everything it references
    pub fn solve(&mut self) -> Result<SolveReport> {
        let roots = self.roots();
        if roots.is_empty() {
            let base_dir = self.config.base_dir.clone();
            error!("Cannot find the POM file in {}", base_dir.display());
            self.state.add_issue(&base_dir, "Cannot find the POM file");
        }
        for root in &roots {
            self.visit(root);
        }

        info!("Resolving {} queued reference lists", self.state.pending());
        self.drain_queue();

        let report = self.report();
        for issue in &report.issues {
            error!("{}", issue);
        }
        Ok(report)
    }

    fn roots(&self) -> Vec<PathBuf> {
        if !self.config.explore_projects {
            return self.registry.list().paths().map(Path::to_path_buf).collect();
        }
        if let Some(first) = self.registry.list().first() {
            return vec![first.to_path_buf()];
        }
        ROOT_DESCRIPTORS
            .iter()
            .map(PathBuf::from)
            .find(|p| self.config.base_dir.join(p).is_file())
            .into_iter()
            .collect()
    }

    /// Visit a descriptor, containing any failure to its own subtree
    pub fn visit(&mut self, path: &Path) {
        if let Err(e) = self.visit_descriptor(path) {
            error!("Error while resolving {}: {}", path.display(), e);
            self.state
                .add_issue(path, format!("Cannot process the descriptor: {}", e));
        }
    }

    fn classify(&mut self, reference: &Coordinate, source: &Path, flags: ReferenceFlags) -> Result<Outcome> {
        let mut classifier = ReferenceClassifier {
            config: &self.config,
            policy: &self.policy,
            repository: &*self.repository,
            rules: &mut self.rules,
            index: &mut *self.index,
            prompter: &mut *self.prompter,
        };
        classifier.classify(&mut self.state, reference, source, flags)
    }

    fn visit_descriptor(&mut self, path: &Path) -> Result<()> {
        if !self.state.mark_visited(path) {
            debug!("{} already visited", path.display());
            return Ok(());
        }
        // Every visited descriptor ends up in the list file
        let options = *self.registry.options_mut(path);
        if options.ignore {
            info!("Skipping ignored descriptor {}", path.display());
            return Ok(());
        }

        let mut descriptor = self.registry.get_descriptor(path)?;
        descriptor.set_property(PACKAGE_PROPERTY, self.config.package_name.as_str());
        info!("Analysing {} ({})", path.display(), descriptor.coordinate);

        // Set once the parent went through the classifier, found or not
        let mut parent_classified = false;
        if options.no_parent {
            descriptor.parent = None;
        } else if let Some(parent) = descriptor.parent.clone() {
            parent_classified = true;
            if let Err(e) = self.classify(&parent, path, ReferenceCategory::Parent.flags()) {
                warn!("Cannot find parent {} of {}: {}", parent, path.display(), e);
                let question = format!(
                    "In {}:\nCannot find the parent {}\nIgnore the parent POM for this POM?",
                    path.display(),
                    parent
                );
                if prompt::confirm(&mut *self.prompter, &question, true)? {
                    self.registry.options_mut(path).no_parent = true;
                    self.registry.invalidate(path);
                    descriptor = self.registry.get_descriptor(path)?;
                    descriptor.set_property(PACKAGE_PROPERTY, self.config.package_name.as_str());
                }
            }
        }

        self.choose_package_version(path, &mut descriptor)?;

        if self.state.include_all_modules == Some(false) {
            let question = format!("Include the module {} ?", path.display());
            if !prompt::confirm(&mut *self.prompter, &question, true)? {
                info!("Excluding module {}", path.display());
                self.registry.options_mut(path).ignore = true;
                let coordinate = &descriptor.coordinate;
                self.rules
                    .ignore_rules
                    .add(DependencyRule::ignore(&coordinate.group, &coordinate.artifact));
                self.state.ignore(coordinate.clone());
                return Ok(());
            }
        }

        self.registry
            .register_self_built(path, &descriptor, &mut self.state, &mut *self.repository);

        self.selector
            .select(&descriptor, &mut self.state, &mut self.rules, &mut *self.prompter)?;

        if let Some(parent) = &descriptor.parent {
            let super_coordinate = &self.repository.super_descriptor().coordinate;
            let packaged = self
                .repository
                .search_matching(parent)
                .is_some_and(|found| &found.coordinate != super_coordinate);
            if !packaged {
                self.registry.options_mut(path).no_parent = true;
            }
            if !parent_classified {
                self.enqueue(path, ReferenceCategory::Parent);
            }
        }
        for category in ReferenceCategory::QUEUED {
            self.enqueue(path, category);
        }

        if self.config.explore_projects && !descriptor.modules.is_empty() {
            if self.state.include_all_modules.is_none() && self.prompter.is_interactive() {
                let all = prompt::confirm(
                    &mut *self.prompter,
                    "This project contains modules. Include all modules?",
                    true,
                )?;
                self.state.include_all_modules = Some(all);
            }
            let dir = path.parent().unwrap_or(Path::new(""));
            for module in &descriptor.modules {
                let module_path = if module.ends_with(".xml") {
                    dir.join(module)
                } else {
                    dir.join(module).join("pom.xml")
                };
                self.visit(&module_path);
            }
        }
        Ok(())
    }

    /// Ask for the upstream version once, and flag descriptors carrying it
    fn choose_package_version(
        &mut self,
        path: &Path,
        descriptor: &mut crate::descriptor::ProjectDescriptor,
    ) -> Result<()> {
        let own_version = descriptor.original_version().map(str::to_string);
        if self.state.package_version.is_none() {
            let default = own_version.clone().unwrap_or_default();
            let question = format!(
                "Enter the upstream version for the package. If you press <Enter> it will default to {}",
                default
            );
            let version = prompt::read_text(&mut *self.prompter, &question, &default)?;
            if !version.is_empty() {
                info!("Upstream version of the package is {}", version);
                self.state.package_version = Some(version);
            }
        }

        if own_version.is_some() && own_version == self.state.package_version {
            descriptor.set_property(HAS_PACKAGE_VERSION_PROPERTY, "true");
            self.registry.options_mut(path).has_package_version = true;
        }
        Ok(())
    }

    fn enqueue(&mut self, source: &Path, category: ReferenceCategory) {
        self.state.enqueue(Task {
            source: source.to_path_buf(),
            category,
            flags: category.flags(),
        });
    }

    fn drain_queue(&mut self) {
        while let Some(task) = self.state.next_task() {
            let descriptor = match self.registry.get_descriptor(&task.source) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    error!("Cannot read {}: {}", task.source.display(), e);
                    continue;
                }
            };
            for reference in descriptor.references(task.category) {
                match self.classify(&reference, &task.source, task.flags) {
                    Ok(outcome) => debug!("{} [{}]: {:?}", reference, task.category, outcome),
                    Err(Error::UnresolvedReference(coordinate)) => {
                        error!(
                            "Unresolved dependency {} in {}",
                            coordinate,
                            task.source.display()
                        );
                    }
                    Err(e) => {
                        error!("Error while resolving {}: {}", reference, e);
                        self.state
                            .add_issue(&task.source, format!("Cannot resolve {}: {}", reference, e));
                    }
                }
            }
        }
    }

    fn report(&self) -> SolveReport {
        SolveReport {
            package: self.config.package_name.clone(),
            package_version: self.state.package_version.clone(),
            buckets: Bucket::ALL
                .iter()
                .map(|&b| (b, self.state.bucket(b).iter().cloned().collect()))
                .collect(),
            issues: self.state.issues().to_vec(),
        }
    }

    /// Write the rule files, the descriptor list and the substvars file
    pub fn save(&mut self, report: &SolveReport) -> Result<()> {
        fs::create_dir_all(&self.config.output_dir)?;
        self.rules.save()?;
        self.registry.list().save(&self.config.descriptor_list_path())?;
        output::write_substvars(
            &self.config.substvars_path(),
            report,
            self.config.generate_docs,
            &mut *self.index,
        )?;
        info!("Results written to {}", self.config.output_dir.display());
        Ok(())
    }
}
