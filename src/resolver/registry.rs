// src/resolver/registry.rs

//! Descriptors of the project being packaged
//!
//! Paths are kept relative to the project's base directory, which is also
//! how the descriptor list file names them.

use super::ResolutionState;
use crate::descriptor::{DescriptorList, DescriptorOptions, DescriptorParser, ProjectDescriptor};
use crate::error::Result;
use crate::repository::Repository;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ProjectRegistry<'a> {
    parser: &'a dyn DescriptorParser,
    base_dir: PathBuf,
    list: DescriptorList,
    cache: HashMap<PathBuf, ProjectDescriptor>,
}

impl<'a> ProjectRegistry<'a> {
    pub fn new(parser: &'a dyn DescriptorParser, base_dir: impl Into<PathBuf>, list: DescriptorList) -> Self {
        Self {
            parser,
            base_dir: base_dir.into(),
            list,
            cache: HashMap::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn list(&self) -> &DescriptorList {
        &self.list
    }

    pub fn options(&self, path: &Path) -> DescriptorOptions {
        self.list.options(path).unwrap_or_default()
    }

    pub fn options_mut(&mut self, path: &Path) -> &mut DescriptorOptions {
        self.list.options_mut(path)
    }

    /// Parsed descriptor for `path`, parsing it with the recorded options on first use
    pub fn get_descriptor(&mut self, path: &Path) -> Result<ProjectDescriptor> {
        if let Some(descriptor) = self.cache.get(path) {
            return Ok(descriptor.clone());
        }
        let options = self.options(path);
        debug!("Parsing {} ({:?})", path.display(), options);
        let descriptor = self.parser.parse(&self.base_dir.join(path), &options)?;
        self.cache.insert(path.to_path_buf(), descriptor.clone());
        Ok(descriptor)
    }

    /// Forget the parsed descriptor so the next lookup re-reads it
    pub fn invalidate(&mut self, path: &Path) {
        self.cache.remove(path);
    }

    /// Record the descriptor as built by this project
    pub fn register_self_built(
        &mut self,
        path: &Path,
        descriptor: &ProjectDescriptor,
        state: &mut ResolutionState,
        repository: &mut dyn Repository,
    ) {
        debug!("Registering {} from {}", descriptor.coordinate, path.display());
        state.register_known(descriptor.coordinate.clone());
        repository.register(descriptor.clone());
        self.cache.insert(path.to_path_buf(), descriptor.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Coordinate;
    use crate::descriptor::PomParser;
    use crate::repository::MemoryRepository;
    use std::fs;

    const POM: &str = r#"<project>
        <parent><groupId>org.foo</groupId><artifactId>parent</artifactId><version>1</version></parent>
        <artifactId>core</artifactId><version>1.0</version>
    </project>"#;

    #[test]
    fn test_cache_and_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pom.xml"), POM).unwrap();
        let parser = PomParser::new();
        let mut registry = ProjectRegistry::new(&parser, dir.path(), DescriptorList::new());
        let path = Path::new("pom.xml");

        let first = registry.get_descriptor(path).unwrap();
        assert!(first.parent.is_some());

        registry.options_mut(path).no_parent = true;
        assert!(registry.get_descriptor(path).unwrap().parent.is_some());

        registry.invalidate(path);
        assert!(registry.get_descriptor(path).unwrap().parent.is_none());
        assert!(registry.list().options(path).unwrap().no_parent);
    }

    #[test]
    fn test_register_self_built() {
        let parser = PomParser::new();
        let mut registry = ProjectRegistry::new(&parser, ".", DescriptorList::new());
        let mut state = ResolutionState::new();
        let mut repository = MemoryRepository::new();
        let descriptor = ProjectDescriptor::new(Coordinate::new("org.foo", "core", Some("1.0")));

        registry.register_self_built(Path::new("core/pom.xml"), &descriptor, &mut state, &mut repository);

        assert!(state.is_known(&Coordinate::new("org.foo", "core", None)));
        assert!(
            repository
                .search_matching(&Coordinate::new("org.foo", "core", Some("1.0")))
                .is_some()
        );
        assert_eq!(registry.get_descriptor(Path::new("core/pom.xml")).unwrap(), descriptor);
    }
}
