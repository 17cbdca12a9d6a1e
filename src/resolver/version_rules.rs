// src/resolver/version_rules.rs

//! Choosing how a self-built artifact's version is normalized
//!
//! The choice is made once per upstream version string: later descriptors
//! sharing that version reuse it without asking again.

use super::ResolutionState;
use crate::descriptor::ProjectDescriptor;
use crate::error::Result;
use crate::prompt::{self, Prompter};
use crate::rules::{DependencyRule, RuleStores, VersionRule};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
enum Candidate {
    Rule(VersionRule),
    Custom,
}

impl Candidate {
    fn description(&self) -> String {
        match self {
            Self::Rule(rule) => rule.description().to_string(),
            Self::Custom => "Custom rule".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VersionRuleSelector {
    defaults: Vec<VersionRule>,
}

impl Default for VersionRuleSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionRuleSelector {
    pub fn new() -> Self {
        Self {
            defaults: vec![VersionRule::to_debian(), VersionRule::keep()],
        }
    }

    fn candidates(&self, version: &str) -> Vec<Candidate> {
        let mut rules: Vec<VersionRule> = Vec::new();
        if let Some(freeze) = VersionRule::freeze_major(version) {
            rules.push(freeze);
        }
        for rule in &self.defaults {
            if !rules.contains(rule) {
                rules.push(rule.clone());
            }
        }
        rules
            .into_iter()
            .map(Candidate::Rule)
            .chain(std::iter::once(Candidate::Custom))
            .collect()
    }

    /// Pick the version rule of a self-built descriptor and record it
    ///
    /// Returns `None` for build tools and for artifacts an existing rule
    /// already names.
    pub fn select(
        &mut self,
        descriptor: &ProjectDescriptor,
        state: &mut ResolutionState,
        rules: &mut RuleStores,
        prompter: &mut dyn Prompter,
    ) -> Result<Option<VersionRule>> {
        let coordinate = &descriptor.coordinate;
        let Some(version) = coordinate.version.as_deref() else {
            return Ok(None);
        };
        if coordinate.is_plugin() {
            return Ok(None);
        }
        if rules
            .rules
            .find_matching(coordinate)
            .iter()
            .any(|rule| rule.is_specific())
        {
            debug!("{} already has a version rule", coordinate);
            return Ok(None);
        }

        let rule = match state.cached_version_rule(version) {
            Some(rule) => rule.clone(),
            None => {
                let rule = self.ask(coordinate.group.as_str(), &coordinate.artifact, version, prompter)?;
                state.cache_version_rule(version, rule.clone());
                rule
            }
        };

        info!("Version {} of {} uses rule {}", version, coordinate.artifact, rule);
        rules.rules.add(DependencyRule::new(
            &coordinate.group,
            &coordinate.artifact,
            &coordinate.kind,
            rule.clone(),
        ));
        Ok(Some(rule))
    }

    fn ask(
        &mut self,
        group: &str,
        artifact: &str,
        version: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<VersionRule> {
        let candidates = self.candidates(version);
        let descriptions: Vec<String> = candidates.iter().map(Candidate::description).collect();
        let question = format!(
            "Version of {}:{} is {}\nChoose how it will be transformed:",
            group, artifact, version
        );
        let choice = prompt::choose(prompter, &question, &descriptions, 0)?;

        let fallback = || match &candidates[0] {
            Candidate::Rule(rule) => rule.clone(),
            Candidate::Custom => VersionRule::keep(),
        };
        match &candidates[choice] {
            Candidate::Rule(rule) => Ok(rule.clone()),
            Candidate::Custom => {
                let pattern = prompt::read_text(
                    prompter,
                    "Enter the pattern for your custom rule (in the form s/regex/replace/)",
                    "",
                )?;
                match VersionRule::parse(&pattern) {
                    Ok(rule) => {
                        let rule = rule.described(format!("My custom rule {}", pattern.trim()));
                        self.defaults.push(rule.clone());
                        Ok(rule)
                    }
                    Err(e) => {
                        warn!("{}, using the first choice instead", e);
                        Ok(fallback())
                    }
                }
            }
        }
    }
}
