//! Graph fixtures: TOML templates that describe a container graph
//!
//! ```toml
//! scalar = 23
//! elements = [1, { set = [1, 2, 3] }, [1, 2, 3]]
//! link = "linked"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{attach, link, Container, ContainerRef, Element, Node};

/// How the node of a built graph is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Node attached and owned by the container (the cycle)
    #[default]
    Linked,
    /// Node attached as backref but without an owner
    Unlinked,
    /// No node at all
    Absent,
}

/// One element of a fixture's sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementTemplate {
    Scalar(i64),
    List(Vec<i64>),
    Set { set: Vec<i64> },
}

impl ElementTemplate {
    fn build(&self) -> Element {
        match self {
            ElementTemplate::Scalar(v) => Element::scalar(*v),
            ElementTemplate::List(values) => Element::list(values.iter().copied()),
            ElementTemplate::Set { set } => Element::set(set.iter().copied()),
        }
    }
}

/// Description of a container graph; every `build` creates fresh objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphTemplate {
    pub scalar: i64,
    #[serde(default)]
    pub elements: Vec<ElementTemplate>,
    #[serde(default)]
    pub link: LinkMode,
}

impl Default for GraphTemplate {
    fn default() -> Self {
        Self::scenario()
    }
}

impl GraphTemplate {
    /// `scalar = 23`, `elements = [1, {1, 2, 3}, [1, 2, 3]]`, linked node.
    pub fn scenario() -> Self {
        Self {
            scalar: 23,
            elements: vec![
                ElementTemplate::Scalar(1),
                ElementTemplate::Set { set: vec![1, 2, 3] },
                ElementTemplate::List(vec![1, 2, 3]),
            ],
            link: LinkMode::Linked,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[instrument(level = "debug", skip(self), fields(scalar = self.scalar, link = ?self.link))]
    pub fn build(&self) -> ApplicationResult<ContainerRef> {
        let elements = self.elements.iter().map(ElementTemplate::build).collect();
        let container = Container::new(self.scalar, elements);
        match self.link {
            LinkMode::Absent => {}
            LinkMode::Unlinked => attach(&container, &Node::new())?,
            LinkMode::Linked => link(&container, &Node::new())?,
        }
        Ok(container)
    }
}

/// Read a fixture file.
#[instrument(level = "debug")]
pub fn load_template(path: &Path) -> ApplicationResult<GraphTemplate> {
    let content = fs::read_to_string(path).with_path_context("read fixture", path)?;
    let template = GraphTemplate::from_toml_str(&content).map_err(|e| ApplicationError::Fixture {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;
    debug!(elements = template.elements.len(), "fixture loaded");
    Ok(template)
}

/// The fixture at `path`, or the built-in scenario when none is given.
pub fn resolve_template(path: Option<&Path>) -> ApplicationResult<GraphTemplate> {
    match path {
        Some(path) => load_template(path),
        None => Ok(GraphTemplate::scenario()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::is_cycle_intact;

    #[test]
    fn given_mixed_elements_when_parsing_toml_then_variants_resolve() {
        let template = GraphTemplate::from_toml_str(
            r#"
scalar = 23
elements = [1, { set = [1, 2, 3] }, [1, 2, 3]]
"#,
        )
        .expect("parse");

        assert_eq!(template, GraphTemplate::scenario());
    }

    #[test]
    fn given_link_mode_when_building_then_node_state_matches() {
        let mut template = GraphTemplate::scenario();

        let linked = template.build().expect("build");
        assert!(is_cycle_intact(&linked));

        template.link = LinkMode::Unlinked;
        let unlinked = template.build().expect("build");
        let node = unlinked.borrow().backref().expect("node");
        assert!(node.borrow().owner().is_none());

        template.link = LinkMode::Absent;
        let absent = template.build().expect("build");
        assert!(absent.borrow().backref().is_none());
    }

    #[test]
    fn given_template_when_built_twice_then_graphs_are_independent() {
        let template = GraphTemplate::scenario();
        let a = template.build().expect("build");
        let b = template.build().expect("build");

        assert_ne!(a.borrow().elements[1].id(), b.borrow().elements[1].id());
    }

    #[test]
    fn given_bad_element_when_parsing_then_fails() {
        let result = GraphTemplate::from_toml_str("scalar = 1\nelements = [\"x\"]\n");
        assert!(result.is_err());
    }
}
