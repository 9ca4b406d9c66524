//! Graph snapshots: identity accounting and sharing between source and clones.

use rstest::{fixture, rstest};

use protoclone::application::GraphTemplate;
use protoclone::domain::{ContainerRef, GraphArena, GraphRender, ObjectId, ObjectKind, Prototype};
use protoclone::util::testing;

#[fixture]
fn scenario() -> ContainerRef {
    testing::init_test_setup();
    GraphTemplate::scenario().build().expect("build scenario")
}

fn is_container(kind: &ObjectKind) -> bool {
    matches!(kind, ObjectKind::Container { .. })
}

fn is_node(kind: &ObjectKind) -> bool {
    matches!(kind, ObjectKind::Node)
}

#[rstest]
fn given_scenario_when_snapshot_then_each_object_appears_once(scenario: ContainerRef) {
    let graph = GraphArena::from_container(&scenario);

    assert_eq!(graph.count(is_container), 1);
    assert_eq!(graph.count(is_node), 1);
    assert_eq!(graph.count(|k| matches!(k, ObjectKind::Set(_))), 1);
    assert_eq!(graph.count(|k| matches!(k, ObjectKind::List(_))), 1);
    assert_eq!(graph.count(|k| matches!(k, ObjectKind::Scalar(_))), 1);
    assert_eq!(graph.alias_count(), 1);
    assert_eq!(graph.ids().len(), 4);
    assert!(graph.contains(ObjectId::of(&scenario)));
}

#[rstest]
fn given_shallow_clone_when_comparing_snapshots_then_shares_only_set_and_list(scenario: ContainerRef) {
    let copy = scenario.shallow_clone();

    let source = GraphArena::from_container(&scenario);
    let target = GraphArena::from_container(&copy);
    let shared: Vec<&ObjectKind> = target.shared_with(&source).into_iter().map(|d| &d.kind).collect();

    assert_eq!(
        shared,
        vec![&ObjectKind::Set(vec![1, 2, 3]), &ObjectKind::List(vec![1, 2, 3])]
    );
}

#[rstest]
fn given_deep_clone_when_comparing_snapshots_then_shares_nothing(scenario: ContainerRef) {
    let copy = scenario.deep_clone();

    let source = GraphArena::from_container(&scenario);
    let target = GraphArena::from_container(&copy);

    assert!(target.shared_with(&source).is_empty());
    assert_eq!(target.count(is_container), 1);
    assert_eq!(target.count(is_node), 1);
    assert_eq!(target.alias_count(), 1);
}

#[rstest]
fn given_deep_clone_when_rendered_then_tree_matches_source_shape(scenario: ContainerRef) {
    let copy = scenario.deep_clone();

    let source = GraphArena::from_container(&scenario).to_tree_string().to_string();
    let target = GraphArena::from_container(&copy).to_tree_string().to_string();

    assert_eq!(source, target);
    assert!(target.contains("Container#0 scalar=23"));
    assert!(target.contains("Set#1 {1, 2, 3}"));
    assert!(target.contains("List#2 [1, 2, 3]"));
    assert!(target.contains("Node#3"));
    assert!(target.contains("-> Container#0"));
}

#[rstest]
fn given_snapshot_when_iterating_then_node_reached_last(scenario: ContainerRef) {
    let graph = GraphArena::from_container(&scenario);

    let kinds: Vec<&str> = graph.iter().map(|(_, n)| n.data.kind.name()).collect();

    assert_eq!(kinds, vec!["Container", "int", "Set", "List", "Node"]);
}
