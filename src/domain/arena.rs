//! Arena snapshots of the object graph reachable from a container

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use generational_arena::{Arena, Index};
use itertools::Itertools;
use tracing::instrument;

use crate::domain::entities::{ContainerRef, Element, ListRef, NodeRef, SetRef};
use crate::domain::identity::ObjectId;

/// What a snapshot entry stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Container { scalar: i64 },
    Node,
    Set(Vec<i64>),
    List(Vec<i64>),
    Scalar(i64),
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Container { .. } => "Container",
            ObjectKind::Node => "Node",
            ObjectKind::Set(_) => "Set",
            ObjectKind::List(_) => "List",
            ObjectKind::Scalar(_) => "int",
        }
    }
}

/// Data payload for snapshot entries.
#[derive(Debug, Clone)]
pub struct ObjectData {
    pub kind: ObjectKind,
    /// Identity of the live object, None for scalars
    pub id: Option<ObjectId>,
    /// Position in discovery order among objects with identity
    pub ordinal: Option<usize>,
}

impl fmt::Display for ObjectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.ordinal {
            Some(n) => format!("{}#{}", self.kind.name(), n),
            None => self.kind.name().to_string(),
        };
        match &self.kind {
            ObjectKind::Container { scalar } => write!(f, "{} scalar={}", tag, scalar),
            ObjectKind::Node => write!(f, "{}", tag),
            ObjectKind::Set(values) => write!(f, "{} {{{}}}", tag, values.iter().join(", ")),
            ObjectKind::List(values) => write!(f, "{} [{}]", tag, values.iter().join(", ")),
            ObjectKind::Scalar(v) => write!(f, "{} {}", tag, v),
        }
    }
}

/// Snapshot entry in the arena.
#[derive(Debug)]
pub struct GraphNode {
    pub data: ObjectData,
    /// Index of the entry that first reached this one, None for the root
    pub parent: Option<Index>,
    /// Entries first reached through this one
    pub children: Vec<Index>,
    /// References to entries already recorded elsewhere (cycles, aliasing)
    pub aliases: Vec<Index>,
}

/// Arena-based snapshot of everything reachable from one container.
///
/// Each live object appears once, keyed by identity; a second path to the
/// same object becomes an alias edge. The container/node cycle therefore
/// shows up as one alias from the node back to the root.
#[derive(Debug)]
pub struct GraphArena {
    arena: Arena<GraphNode>,
    root: Option<Index>,
    by_id: HashMap<ObjectId, Index>,
    next_ordinal: usize,
}

impl Default for GraphArena {
    fn default() -> Self {
        Self::new()
    }
}

enum Reachable {
    Container(ContainerRef),
    Node(NodeRef),
    Set(SetRef),
    List(ListRef),
    Scalar(i64),
}

impl Reachable {
    fn id(&self) -> Option<ObjectId> {
        match self {
            Reachable::Container(c) => Some(ObjectId::of(c)),
            Reachable::Node(n) => Some(ObjectId::of(n)),
            Reachable::Set(s) => Some(ObjectId::of(s)),
            Reachable::List(l) => Some(ObjectId::of(l)),
            Reachable::Scalar(_) => None,
        }
    }

    fn from_element(element: &Element) -> Self {
        match element {
            Element::Scalar(v) => Reachable::Scalar(*v),
            Element::Set(s) => Reachable::Set(s.clone()),
            Element::List(l) => Reachable::List(l.clone()),
        }
    }

    /// Kind of the object and what it references, in order.
    fn expand(&self) -> (ObjectKind, Vec<Reachable>) {
        match self {
            Reachable::Container(c) => {
                let c = c.borrow();
                let mut next: Vec<Reachable> =
                    c.elements.iter().map(Reachable::from_element).collect();
                if let Some(node) = &c.backref {
                    next.push(Reachable::Node(node.clone()));
                }
                (ObjectKind::Container { scalar: c.scalar }, next)
            }
            Reachable::Node(n) => {
                let next: Vec<Reachable> = n
                    .borrow()
                    .owner()
                    .map(Reachable::Container)
                    .into_iter()
                    .collect();
                (ObjectKind::Node, next)
            }
            Reachable::Set(s) => (ObjectKind::Set(s.borrow().iter().copied().collect()), vec![]),
            Reachable::List(l) => (ObjectKind::List(l.borrow().clone()), vec![]),
            Reachable::Scalar(v) => (ObjectKind::Scalar(*v), vec![]),
        }
    }
}

impl GraphArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            by_id: HashMap::new(),
            next_ordinal: 0,
        }
    }

    /// Snapshot the graph reachable from `container`.
    #[instrument(level = "debug", skip_all, fields(root = %ObjectId::of(container)))]
    pub fn from_container(container: &ContainerRef) -> Self {
        let mut graph = Self::new();
        let mut stack = vec![(Reachable::Container(container.clone()), None)];

        while let Some((current, parent)) = stack.pop() {
            if let Some(id) = current.id() {
                if let Some(&seen) = graph.by_id.get(&id) {
                    if let Some(parent_idx) = parent {
                        if let Some(p) = graph.arena.get_mut(parent_idx) {
                            p.aliases.push(seen);
                        }
                    }
                    continue;
                }
            }

            let (kind, next) = current.expand();
            let idx = graph.insert_node(kind, current.id(), parent);

            // Push in reverse order for left-to-right traversal
            for reachable in next.into_iter().rev() {
                stack.push((reachable, Some(idx)));
            }
        }

        graph
    }

    #[instrument(level = "trace", skip(self))]
    fn insert_node(&mut self, kind: ObjectKind, id: Option<ObjectId>, parent: Option<Index>) -> Index {
        let ordinal = id.map(|_| {
            let n = self.next_ordinal;
            self.next_ordinal += 1;
            n
        });
        let node = GraphNode {
            data: ObjectData { kind, id, ordinal },
            parent,
            children: Vec::new(),
            aliases: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(id) = id {
            self.by_id.insert(id, node_idx);
        }
        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&GraphNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    /// Number of entries, scalars included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn iter(&self) -> GraphIterator {
        GraphIterator::new(self)
    }

    /// Number of entries whose kind matches `pred`.
    pub fn count(&self, pred: impl Fn(&ObjectKind) -> bool) -> usize {
        self.arena.iter().filter(|(_, n)| pred(&n.data.kind)).count()
    }

    /// Total number of alias edges.
    pub fn alias_count(&self) -> usize {
        self.arena.iter().map(|(_, n)| n.aliases.len()).sum()
    }

    /// Identities of every object in the snapshot.
    pub fn ids(&self) -> BTreeSet<ObjectId> {
        self.by_id.keys().copied().collect()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn find(&self, id: ObjectId) -> Option<&GraphNode> {
        self.by_id.get(&id).and_then(|&idx| self.arena.get(idx))
    }

    /// Objects reachable from both snapshots, in this snapshot's discovery order.
    pub fn shared_with(&self, other: &GraphArena) -> Vec<&ObjectData> {
        self.iter()
            .map(|(_, node)| &node.data)
            .filter(|data| data.id.is_some_and(|id| other.contains(id)))
            .collect()
    }
}

/// Pre-order traversal over first-reach edges (aliases are not followed).
pub struct GraphIterator<'a> {
    graph: &'a GraphArena,
    stack: Vec<Index>,
}

impl<'a> GraphIterator<'a> {
    fn new(graph: &'a GraphArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = graph.root() {
            stack.push(root);
        }
        Self { graph, stack }
    }
}

impl<'a> Iterator for GraphIterator<'a> {
    type Item = (Index, &'a GraphNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.graph.get_node(current_idx) {
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{attach, link, Container, Node};

    #[test]
    fn given_unlinked_container_when_snapshot_then_no_alias() {
        let container = Container::new(5, vec![Element::scalar(1)]);
        attach(&container, &Node::new()).expect("attach");
        let graph = GraphArena::from_container(&container);

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.alias_count(), 0);
        assert_eq!(graph.ids().len(), 2);
    }

    #[test]
    fn given_linked_container_when_snapshot_then_node_aliases_root() {
        let node = Node::new();
        let container = Container::new(5, vec![]);
        link(&container, &node).expect("link");

        let graph = GraphArena::from_container(&container);
        let root = graph.root().expect("root");
        let node_entry = graph.find(ObjectId::of(&node)).expect("node entry");

        assert_eq!(node_entry.aliases, vec![root]);
        assert_eq!(node_entry.parent, Some(root));
    }

    #[test]
    fn given_snapshot_when_iterating_then_preorder_left_to_right() {
        let container = Container::new(
            1,
            vec![Element::scalar(7), Element::set([2]), Element::list([3])],
        );
        let graph = GraphArena::from_container(&container);

        let labels: Vec<String> = graph.iter().map(|(_, n)| n.data.to_string()).collect();
        assert_eq!(
            labels,
            vec!["Container#0 scalar=1", "int 7", "Set#1 {2}", "List#2 [3]"]
        );
    }
}
