//! Prototype cloning: shallow and deep copies of a container graph.
//!
//! A shallow clone duplicates the container and its element sequence but
//! shares every nested set and list with the source. A deep clone
//! duplicates everything reachable, using an [`IdentityMap`] so each object
//! is cloned at most once per call. In both cases the clone's node points
//! back at the clone, never at the source.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::domain::entities::{
    points_to, Container, ContainerRef, Element, ListRef, Node, NodeRef, SetRef,
};
use crate::domain::identity::{IdentityMap, ObjectId};

/// How far a clone duplicates the object graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneDepth {
    Shallow,
    #[default]
    Deep,
}

impl fmt::Display for CloneDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloneDepth::Shallow => write!(f, "shallow"),
            CloneDepth::Deep => write!(f, "deep"),
        }
    }
}

impl FromStr for CloneDepth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shallow" => Ok(CloneDepth::Shallow),
            "deep" => Ok(CloneDepth::Deep),
            other => Err(format!("unknown clone depth '{other}' (expected shallow or deep)")),
        }
    }
}

/// Cloning capability implemented per entity type.
pub trait Prototype: Sized {
    /// Copy this object one level deep.
    fn shallow_clone(&self) -> Self;

    /// Copy everything reachable, reusing clones already recorded in `memo`.
    fn deep_clone_with(&self, memo: &mut IdentityMap) -> Self;

    /// Copy everything reachable with a fresh identity map.
    fn deep_clone(&self) -> Self {
        let mut memo = IdentityMap::new();
        self.deep_clone_with(&mut memo)
    }

    fn clone_to(&self, depth: CloneDepth) -> Self {
        match depth {
            CloneDepth::Shallow => self.shallow_clone(),
            CloneDepth::Deep => self.deep_clone(),
        }
    }
}

impl Prototype for ContainerRef {
    #[instrument(level = "trace", skip_all, fields(source = %ObjectId::of(self)))]
    fn shallow_clone(&self) -> Self {
        let source = self.borrow();
        let copy = Container::new(source.scalar, source.elements.clone());

        if let Some(node) = &source.backref {
            let owned = node.borrow().is_owned_by(self);
            adopt(&copy, node.shallow_clone(), owned);
        }

        trace!(copy = %ObjectId::of(&copy), "shallow clone done");
        copy
    }

    #[instrument(level = "trace", skip_all, fields(source = %ObjectId::of(self)))]
    fn deep_clone_with(&self, memo: &mut IdentityMap) -> Self {
        if let Some(existing) = memo.lookup(self) {
            trace!("container already cloned in this operation");
            return existing;
        }

        let (scalar, elements, backref) = {
            let source = self.borrow();
            (source.scalar, source.elements.clone(), source.backref.clone())
        };

        // registered before visiting children so the node's back-link finds it
        let copy = Container::new(scalar, Vec::with_capacity(elements.len()));
        memo.remember(self, &copy);

        let elements: Vec<Element> = elements
            .iter()
            .map(|element| element.deep_clone_with(memo))
            .collect();
        copy.borrow_mut().elements = elements;

        if let Some(node) = backref {
            let node_copy = node.deep_clone_with(memo);
            let owned = node_copy.borrow().is_owned_by(&copy);
            adopt(&copy, node_copy, owned);
        }

        trace!(copy = %ObjectId::of(&copy), "deep clone done");
        copy
    }
}

/// Make `node` the backref of `container`, owned by it when `owned`.
fn adopt(container: &ContainerRef, node: NodeRef, owned: bool) {
    {
        let mut target = node.borrow_mut();
        target.holder = Some(Rc::downgrade(container));
        target.owner = owned.then(|| Rc::downgrade(container));
    }
    container.borrow_mut().backref = Some(node);
}

impl Prototype for NodeRef {
    /// New detached node; the container being cloned attaches it.
    fn shallow_clone(&self) -> Self {
        Node::new()
    }

    /// New node whose owner is the clone of the source owner, provided that
    /// owner was cloned in the same operation. A node cloned on its own comes
    /// back detached, so the copy never points into the source graph.
    fn deep_clone_with(&self, memo: &mut IdentityMap) -> Self {
        if let Some(existing) = memo.lookup(self) {
            return existing;
        }

        let copy = Node::new();
        memo.remember(self, &copy);

        let owner = self
            .borrow()
            .owner()
            .and_then(|source_owner| memo.lookup(&source_owner))
            .map(|owner_copy| Rc::downgrade(&owner_copy));
        copy.borrow_mut().owner = owner;
        copy
    }
}

impl Prototype for SetRef {
    fn shallow_clone(&self) -> Self {
        Rc::new(RefCell::new(self.borrow().clone()))
    }

    fn deep_clone_with(&self, memo: &mut IdentityMap) -> Self {
        if let Some(existing) = memo.lookup(self) {
            return existing;
        }
        let copy = self.shallow_clone();
        memo.remember(self, &copy);
        copy
    }
}

impl Prototype for ListRef {
    fn shallow_clone(&self) -> Self {
        Rc::new(RefCell::new(self.borrow().clone()))
    }

    fn deep_clone_with(&self, memo: &mut IdentityMap) -> Self {
        if let Some(existing) = memo.lookup(self) {
            return existing;
        }
        let copy = self.shallow_clone();
        memo.remember(self, &copy);
        copy
    }
}

impl Element {
    /// Deep copy of the element; scalars are copied by value.
    pub fn deep_clone_with(&self, memo: &mut IdentityMap) -> Element {
        match self {
            Element::Scalar(v) => Element::Scalar(*v),
            Element::Set(set) => Element::Set(set.deep_clone_with(memo)),
            Element::List(list) => Element::List(list.deep_clone_with(memo)),
        }
    }
}

/// True when `container.backref.owner.backref` is the same node, i.e. the
/// cycle closes after exactly one container and one node.
pub fn is_cycle_closed(container: &ContainerRef) -> bool {
    let Some(node) = container.borrow().backref.clone() else {
        return false;
    };
    let Some(owner) = node.borrow().owner.clone() else {
        return false;
    };
    if !points_to(&owner, container) {
        return false;
    }
    let Some(owner) = owner.upgrade() else {
        return false;
    };
    let closes = owner
        .borrow()
        .backref
        .as_ref()
        .is_some_and(|again| Rc::ptr_eq(again, &node));
    closes
}
