//! Demonstration runner for the prototype cloner.
//!
//! Builds a graph from a template, clones it shallowly and deeply, mutates
//! the source and records what each clone observes. Every observation is a
//! named check so callers can print the report or assert on it.

use std::collections::BTreeSet;
use std::rc::Rc;

use tracing::{debug, info, instrument};

use crate::application::fixture::{GraphTemplate, LinkMode};
use crate::application::ApplicationResult;
use crate::domain::{
    is_cycle_closed, is_cycle_intact, ContainerRef, Element, GraphArena, GraphRender, IntSet,
    ListRef, Prototype, SetRef,
};

/// One observed property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub label: String,
    pub passed: bool,
}

/// A titled group of checks with the graphs rendered at that point.
#[derive(Debug, Clone, Default)]
pub struct Stage {
    pub title: String,
    pub graphs: Vec<String>,
    pub checks: Vec<Check>,
}

impl Stage {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    fn check(&mut self, label: impl Into<String>, passed: bool) {
        let label = label.into();
        debug!(%label, passed, "check");
        self.checks.push(Check { label, passed });
    }

    fn graph(&mut self, name: &str, container: &ContainerRef) {
        let tree = GraphArena::from_container(container).to_tree_string();
        self.graphs.push(format!("{name}:\n{tree}"));
    }
}

#[derive(Debug, Clone, Default)]
pub struct DemoReport {
    pub stages: Vec<Stage>,
}

impl DemoReport {
    pub fn all_passed(&self) -> bool {
        self.checks().all(|c| c.passed)
    }

    pub fn checks(&self) -> impl Iterator<Item = &Check> {
        self.stages.iter().flat_map(|s| s.checks.iter())
    }

    pub fn failures(&self) -> Vec<&Check> {
        self.checks().filter(|c| !c.passed).collect()
    }
}

pub struct DemoRunner {
    template: GraphTemplate,
}

impl DemoRunner {
    pub fn new(template: GraphTemplate) -> Self {
        Self { template }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn run(&self) -> ApplicationResult<DemoReport> {
        let original = self.template.build()?;
        let mut report = DemoReport::default();

        let mut stage = Stage::new("original");
        stage.graph("original", &original);
        if self.template_is_linked() {
            stage.check("original.backref.owner is original", is_cycle_intact(&original));
        }
        report.stages.push(stage);

        report.stages.push(self.shallow_stage(&original));
        report.stages.push(self.deep_stage(&original));

        info!(
            checks = report.checks().count(),
            failures = report.failures().len(),
            "demo finished"
        );
        Ok(report)
    }

    fn template_is_linked(&self) -> bool {
        self.template.link == LinkMode::Linked
    }

    fn shallow_stage(&self, original: &ContainerRef) -> Stage {
        let mut stage = Stage::new("shallow clone");
        let copy = original.shallow_clone();

        stage.check("copy is a new container", !Rc::ptr_eq(&copy, original));
        stage.check("scalar copied", copy.borrow().scalar == original.borrow().scalar);

        let before = original.borrow().scalar;
        original.borrow_mut().scalar = before.wrapping_add(1);
        stage.check("scalar change on original not seen by copy", copy.borrow().scalar == before);
        original.borrow_mut().scalar = before;

        let len = original.borrow().elements.len();
        copy.borrow_mut().elements.push(Element::scalar(10));
        stage.check(
            format!("append to copy leaves original with {len} elements"),
            original.borrow().elements.len() == len,
        );

        if let Some((i, set)) = first_set(original) {
            let probe = fresh_value(set.borrow().iter());
            set.borrow_mut().insert(probe);
            let shared = copy.borrow().elements[i]
                .as_set()
                .is_some_and(|s| Rc::ptr_eq(s, &set) && s.borrow().contains(&probe));
            stage.check(format!("{probe} added to original set is in copy.elements[{i}]"), shared);
        }

        if let Some((i, list)) = first_list(original) {
            let probe = fresh_value(list.borrow().iter());
            list.borrow_mut().push(probe);
            let shared = copy.borrow().elements[i]
                .as_list()
                .is_some_and(|l| Rc::ptr_eq(l, &list) && l.borrow().last() == Some(&probe));
            stage.check(format!("{probe} pushed to original list is in copy.elements[{i}]"), shared);
        }

        if self.template_is_linked() {
            stage.check("copy.backref.owner is copy", is_cycle_intact(&copy));
        }

        let shared = GraphArena::from_container(&copy)
            .shared_with(&GraphArena::from_container(original))
            .len();
        stage.check(
            format!("copy shares {shared} nested objects with original"),
            shared == nested_count(original),
        );

        stage.graph("copy", &copy);
        stage
    }

    fn deep_stage(&self, original: &ContainerRef) -> Stage {
        let mut stage = Stage::new("deep clone");
        let copy = original.deep_clone();

        stage.check("copy is a new container", !Rc::ptr_eq(&copy, original));
        stage.check("scalar copied", copy.borrow().scalar == original.borrow().scalar);

        let len = original.borrow().elements.len();
        copy.borrow_mut().elements.push(Element::scalar(12));
        stage.check(
            format!("append to copy leaves original with {len} elements"),
            original.borrow().elements.len() == len,
        );

        if let Some((i, set)) = first_set(original) {
            let probe = fresh_value(set.borrow().iter());
            set.borrow_mut().insert(probe);
            let independent = copy.borrow().elements[i]
                .as_set()
                .is_some_and(|s| !Rc::ptr_eq(s, &set) && !s.borrow().contains(&probe));
            stage.check(
                format!("{probe} added to original set is not in copy.elements[{i}]"),
                independent,
            );
        }

        if let Some((i, list)) = first_list(original) {
            let probe = fresh_value(list.borrow().iter());
            list.borrow_mut().push(probe);
            let independent = copy.borrow().elements[i]
                .as_list()
                .is_some_and(|l| !Rc::ptr_eq(l, &list) && !l.borrow().contains(&probe));
            stage.check(
                format!("{probe} pushed to original list is not in copy.elements[{i}]"),
                independent,
            );
        }

        if self.template_is_linked() {
            stage.check("copy.backref.owner is copy", is_cycle_intact(&copy));
            stage.check(
                "copy.backref.owner.backref.owner is copy.backref.owner",
                is_cycle_closed(&copy),
            );
        }

        let shared = GraphArena::from_container(&copy)
            .shared_with(&GraphArena::from_container(original))
            .len();
        stage.check("copy shares nothing with original", shared == 0);

        stage.graph("copy", &copy);
        stage
    }
}

fn first_set(container: &ContainerRef) -> Option<(usize, SetRef)> {
    container
        .borrow()
        .elements
        .iter()
        .enumerate()
        .find_map(|(i, e)| e.as_set().map(|s| (i, Rc::clone(s))))
}

fn first_list(container: &ContainerRef) -> Option<(usize, ListRef)> {
    container
        .borrow()
        .elements
        .iter()
        .enumerate()
        .find_map(|(i, e)| e.as_list().map(|l| (i, Rc::clone(l))))
}

/// A value not among `values`: one past the maximum, or the smallest free
/// value when the maximum is `i64::MAX`.
fn fresh_value<'a>(values: impl IntoIterator<Item = &'a i64>) -> i64 {
    let taken: IntSet = values.into_iter().copied().collect();
    match taken.last() {
        None => 0,
        Some(max) => max
            .checked_add(1)
            .or_else(|| (i64::MIN..i64::MAX).find(|v| !taken.contains(v)))
            .unwrap_or(i64::MIN),
    }
}

/// Distinct nested sets and lists held by `container`.
fn nested_count(container: &ContainerRef) -> usize {
    let ids: BTreeSet<_> = container
        .borrow()
        .elements
        .iter()
        .filter_map(Element::id)
        .collect();
    ids.len()
}
