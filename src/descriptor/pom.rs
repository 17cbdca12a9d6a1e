// src/descriptor/pom.rs

//! Maven POM reader
//!
//! Reads the parts of a `pom.xml` the resolver needs into a
//! [`ProjectDescriptor`]. The document is first loaded into a small element
//! tree with `quick-xml`, then the interesting paths are picked out of it.
//!
//! Group and version are inherited from the parent when the project does not
//! declare them, and `${...}` expressions are substituted from the project
//! coordinates and the `<properties>` section. Anything else (profiles,
//! inheritance of dependency lists, imports) is left to the build tool.

use super::{DescriptorOptions, DescriptorParser, HAS_PACKAGE_VERSION_PROPERTY, ProjectDescriptor};
use crate::coordinate::{Coordinate, DEFAULT_PLUGIN_GROUP, JAR_TYPE, PLUGIN_TYPE, POM_TYPE, Scope};
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Limit on nested `${...}` substitutions
const MAX_INTERPOLATION_PASSES: usize = 8;

/// Reads Maven `pom.xml` descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct PomParser;

impl PomParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse POM content already loaded in memory
    pub fn parse_str(&self, xml: &str, options: &DescriptorOptions) -> Result<ProjectDescriptor> {
        let document = Element::parse(xml)?;
        let project = document
            .child("project")
            .ok_or_else(|| Error::ParseError("missing <project> element".to_string()))?;

        let parent = project.child("parent").map(|p| {
            Coordinate::new(
                p.text("groupId").unwrap_or_default(),
                p.text("artifactId").unwrap_or_default(),
                p.text("version").as_deref(),
            )
            .with_kind(POM_TYPE)
        });

        let artifact = project
            .text("artifactId")
            .ok_or_else(|| Error::ParseError("missing <artifactId>".to_string()))?;
        let group = project
            .text("groupId")
            .or_else(|| parent.as_ref().map(|p| p.group.clone()))
            .ok_or_else(|| Error::ParseError(format!("missing <groupId> for {}", artifact)))?;
        let version = project
            .text("version")
            .or_else(|| parent.as_ref().and_then(|p| p.version.clone()));
        let packaging = project.text("packaging").unwrap_or_else(|| JAR_TYPE.to_string());

        let mut properties: BTreeMap<String, String> = project
            .child("properties")
            .map(|props| {
                props
                    .children
                    .iter()
                    .map(|p| (p.name.clone(), p.text.trim().to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let vars = Interpolator::new(&group, &artifact, version.as_deref(), parent.as_ref(), &properties);

        let mut descriptor = ProjectDescriptor::new(
            Coordinate::new(group.clone(), artifact.clone(), None)
                .with_kind(packaging)
                .with_version(version.as_deref().map(|v| vars.apply(v)).as_deref()),
        );
        descriptor.parent = if options.no_parent { None } else { parent };

        descriptor.dependencies = dependencies(project.path(&["dependencies"]), &vars);
        descriptor.dependency_management =
            dependencies(project.path(&["dependencyManagement", "dependencies"]), &vars);

        if let Some(build) = project.child("build") {
            for plugin in build.path(&["plugins"]).into_iter().flat_map(|p| p.children_named("plugin")) {
                if let Some(coordinate) = plugin_coordinate(plugin, &vars) {
                    descriptor.plugins.push(coordinate);
                }
                descriptor
                    .plugin_dependencies
                    .extend(dependencies(plugin.child("dependencies"), &vars));
            }
            descriptor.plugin_management = plugins(build.path(&["pluginManagement", "plugins"]), &vars);
            descriptor.extensions = build
                .path(&["extensions"])
                .into_iter()
                .flat_map(|e| e.children_named("extension"))
                .filter_map(|e| reference(e, None, JAR_TYPE, &vars))
                .collect();
        }
        descriptor.report_plugins = plugins(project.path(&["reporting", "plugins"]), &vars);

        descriptor.modules = project
            .path(&["modules"])
            .into_iter()
            .flat_map(|m| m.children_named("module"))
            .map(|m| m.text.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        if options.has_package_version {
            properties.insert(HAS_PACKAGE_VERSION_PROPERTY.to_string(), "true".to_string());
        }
        descriptor.properties = properties;

        debug!(
            "Parsed {} ({} dependencies, {} plugins, {} modules)",
            descriptor.coordinate,
            descriptor.dependencies.len(),
            descriptor.plugins.len(),
            descriptor.modules.len()
        );
        Ok(descriptor)
    }
}

impl DescriptorParser for PomParser {
    fn parse(&self, path: &Path, options: &DescriptorOptions) -> Result<ProjectDescriptor> {
        let xml = fs::read_to_string(path)?;
        self.parse_str(&xml, options)
            .map_err(|e| Error::ParseError(format!("{}: {}", path.display(), e)))
    }
}

fn dependencies(list: Option<&Element>, vars: &Interpolator) -> Vec<Coordinate> {
    list.into_iter()
        .flat_map(|l| l.children_named("dependency"))
        .filter_map(|d| reference(d, None, JAR_TYPE, vars))
        .collect()
}

fn plugins(list: Option<&Element>, vars: &Interpolator) -> Vec<Coordinate> {
    list.into_iter()
        .flat_map(|l| l.children_named("plugin"))
        .filter_map(|p| plugin_coordinate(p, vars))
        .collect()
}

fn plugin_coordinate(plugin: &Element, vars: &Interpolator) -> Option<Coordinate> {
    reference(plugin, Some(DEFAULT_PLUGIN_GROUP), PLUGIN_TYPE, vars)
}

fn reference(
    element: &Element,
    default_group: Option<&str>,
    default_kind: &str,
    vars: &Interpolator,
) -> Option<Coordinate> {
    let field = |name: &str| element.text(name).map(|v| vars.apply(&v));

    let Some(artifact) = field("artifactId") else {
        warn!("Skipping <{}> without artifactId", element.name);
        return None;
    };
    let Some(group) = field("groupId").or_else(|| default_group.map(str::to_string)) else {
        warn!("Skipping {} without groupId", artifact);
        return None;
    };

    let mut coordinate = Coordinate::new(group, artifact, field("version").as_deref())
        .with_kind(field("type").unwrap_or_else(|| default_kind.to_string()));
    if let Some(scope) = field("scope") {
        match Scope::parse(&scope) {
            Some(scope) => coordinate.scope = scope,
            None => warn!("Unknown scope '{}' for {}, assuming compile", scope, coordinate.artifact),
        }
    }
    coordinate.optional = field("optional").is_some_and(|o| o == "true");
    Some(coordinate)
}

/// Substitutes `${...}` expressions in POM values
struct Interpolator {
    vars: BTreeMap<String, String>,
}

impl Interpolator {
    fn new(
        group: &str,
        artifact: &str,
        version: Option<&str>,
        parent: Option<&Coordinate>,
        properties: &BTreeMap<String, String>,
    ) -> Self {
        let mut vars = properties.clone();
        for prefix in ["project.", "pom.", ""] {
            vars.insert(format!("{}groupId", prefix), group.to_string());
            vars.insert(format!("{}artifactId", prefix), artifact.to_string());
            if let Some(version) = version {
                vars.insert(format!("{}version", prefix), version.to_string());
            }
        }
        if let Some(parent) = parent {
            for prefix in ["project.parent.", "parent."] {
                vars.insert(format!("{}groupId", prefix), parent.group.clone());
                if let Some(version) = &parent.version {
                    vars.insert(format!("{}version", prefix), version.clone());
                }
            }
        }
        Self { vars }
    }

    fn apply(&self, value: &str) -> String {
        let mut current = value.to_string();
        for _ in 0..MAX_INTERPOLATION_PASSES {
            let next = self.apply_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn apply_once(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let name = &rest[start + 2..start + len];
            out.push_str(&rest[..start]);
            match self.vars.get(name) {
                Some(replacement) => out.push_str(replacement),
                None => out.push_str(&rest[start..start + len + 1]),
            }
            rest = &rest[start + len + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// Minimal XML element tree
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Default::default()
        }
    }

    /// Parse a document; the returned element is a synthetic root
    fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut stack = vec![Element::default()];
        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(Element::named(e.local_name().as_ref())),
                Event::Empty(e) => {
                    let element = Element::named(e.local_name().as_ref());
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
                Event::End(_) => {
                    let element = stack.pop().filter(|_| !stack.is_empty()).ok_or_else(|| {
                        Error::ParseError("unbalanced closing tag".to_string())
                    })?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape()?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Event::CData(t) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() != 1 {
            return Err(Error::ParseError("unexpected end of document".to_string()));
        }
        stack
            .pop()
            .ok_or_else(|| Error::ParseError("empty document".to_string()))
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn path(&self, path: &[&str]) -> Option<&Element> {
        path.iter().try_fold(self, |element, name| element.child(name))
    }

    /// Trimmed, non-empty text of a direct child
    fn text(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|c| c.text.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>example-parent</artifactId>
    <version>2.1.3</version>
  </parent>
  <artifactId>example-core</artifactId>
  <properties>
    <junit.version>4.12</junit.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>${junit.version}</version>
      <scope>test</scope>
    </dependency>
    <dependency>
      <groupId>${project.groupId}</groupId>
      <artifactId>example-api</artifactId>
      <version>${project.version}</version>
    </dependency>
    <dependency>
      <groupId>log4j</groupId>
      <artifactId>log4j</artifactId>
      <optional>true</optional>
    </dependency>
  </dependencies>
  <build>
    <plugins>
      <plugin>
        <artifactId>maven-compiler-plugin</artifactId>
        <dependencies>
          <dependency>
            <groupId>org.codehaus.plexus</groupId>
            <artifactId>plexus-compiler-javac</artifactId>
          </dependency>
        </dependencies>
      </plugin>
    </plugins>
    <pluginManagement>
      <plugins>
        <plugin>
          <groupId>org.codehaus.mojo</groupId>
          <artifactId>build-helper-maven-plugin</artifactId>
          <version>1.5</version>
        </plugin>
      </plugins>
    </pluginManagement>
    <extensions>
      <extension>
        <groupId>org.apache.maven.wagon</groupId>
        <artifactId>wagon-ssh</artifactId>
      </extension>
    </extensions>
  </build>
  <reporting>
    <plugins>
      <plugin>
        <artifactId>maven-javadoc-plugin</artifactId>
      </plugin>
    </plugins>
  </reporting>
</project>
"#;

    #[test]
    fn test_parse_module_pom() {
        let d = PomParser::new()
            .parse_str(MODULE_POM, &DescriptorOptions::default())
            .unwrap();

        assert_eq!(
            d.coordinate,
            Coordinate::new("org.example", "example-core", Some("2.1.3"))
        );
        assert_eq!(
            d.parent,
            Some(Coordinate::new("org.example", "example-parent", Some("2.1.3")).with_kind(POM_TYPE))
        );

        assert_eq!(d.dependencies.len(), 3);
        assert_eq!(d.dependencies[0].version.as_deref(), Some("4.12"));
        assert!(d.dependencies[0].is_test());
        assert_eq!(
            d.dependencies[1],
            Coordinate::new("org.example", "example-api", Some("2.1.3"))
        );
        assert!(d.dependencies[2].optional);
        assert_eq!(d.dependencies[2].version, None);

        assert_eq!(
            d.plugins,
            vec![Coordinate::plugin(DEFAULT_PLUGIN_GROUP, "maven-compiler-plugin", None)]
        );
        assert_eq!(d.plugin_dependencies.len(), 1);
        assert_eq!(d.plugin_dependencies[0].kind, JAR_TYPE);
        assert_eq!(
            d.plugin_management,
            vec![Coordinate::plugin("org.codehaus.mojo", "build-helper-maven-plugin", Some("1.5"))]
        );
        assert!(d.extensions[0].is("org.apache.maven.wagon", "wagon-ssh"));
        assert!(d.report_plugins[0].is(DEFAULT_PLUGIN_GROUP, "maven-javadoc-plugin"));
        assert!(d.report_plugins[0].is_plugin());
        assert_eq!(d.property("junit.version"), Some("4.12"));
    }

    #[test]
    fn test_parse_options() {
        let options = DescriptorOptions {
            no_parent: true,
            has_package_version: true,
            ..Default::default()
        };
        let d = PomParser::new().parse_str(MODULE_POM, &options).unwrap();

        assert_eq!(d.parent, None);
        // Inherited values survive dropping the parent link
        assert_eq!(d.coordinate.group, "org.example");
        assert!(d.has_package_version());
    }

    #[test]
    fn test_parse_aggregator() {
        let xml = r#"<project>
  <groupId>org.example</groupId>
  <artifactId>example-parent</artifactId>
  <version>2.1.3</version>
  <packaging>pom</packaging>
  <modules>
    <module>core</module>
    <module>api</module>
  </modules>
</project>"#;
        let d = PomParser::new()
            .parse_str(xml, &DescriptorOptions::default())
            .unwrap();
        assert_eq!(d.coordinate.kind, POM_TYPE);
        assert_eq!(d.modules, vec!["core", "api"]);
        assert!(d.dependencies.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        let parser = PomParser::new();
        let options = DescriptorOptions::default();

        assert!(parser.parse_str("<notaproject/>", &options).is_err());
        assert!(parser
            .parse_str("<project><groupId>g</groupId></project>", &options)
            .is_err());
        assert!(parser.parse_str("<project><artifactId>a", &options).is_err());
    }

    #[test]
    fn test_interpolation_leaves_unknown() {
        let props = BTreeMap::from([("a".to_string(), "${b}".to_string()), ("b".to_string(), "x".to_string())]);
        let vars = Interpolator::new("g", "art", Some("1.0"), None, &props);
        assert_eq!(vars.apply("${a}-${project.version}-${missing}"), "x-1.0-${missing}");
        assert_eq!(vars.apply("${unterminated"), "${unterminated");
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pom.xml");
        fs::write(&path, MODULE_POM).unwrap();

        let d = PomParser::new()
            .parse(&path, &DescriptorOptions::default())
            .unwrap();
        assert_eq!(d.coordinate.artifact, "example-core");

        let err = PomParser::new()
            .parse(&dir.path().join("missing.xml"), &DescriptorOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
