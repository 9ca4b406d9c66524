//! Object identity and the per-operation identity map used by deep clones

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::domain::entities::{Container, IntList, IntSet, Node};

/// Identity of a shared object: the address of its allocation.
///
/// Only meaningful while the object is alive; `IdentityMap` keeps its
/// sources alive for exactly that reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn of<T>(rc: &Rc<T>) -> Self {
        Self(Rc::as_ptr(rc) as usize)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Original → clone entries for one object type.
#[derive(Debug)]
pub struct IdentitySlot<T> {
    entries: HashMap<ObjectId, (Rc<RefCell<T>>, Rc<RefCell<T>>)>,
}

impl<T> Default for IdentitySlot<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> IdentitySlot<T> {
    fn get(&self, source: &Rc<RefCell<T>>) -> Option<Rc<RefCell<T>>> {
        self.entries
            .get(&ObjectId::of(source))
            .map(|(_, copy)| Rc::clone(copy))
    }

    fn insert(&mut self, source: &Rc<RefCell<T>>, copy: &Rc<RefCell<T>>) {
        self.entries
            .insert(ObjectId::of(source), (Rc::clone(source), Rc::clone(copy)));
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Selects the slot of an `IdentityMap` that holds a given object type.
pub trait Tracked: Sized {
    fn slot(map: &IdentityMap) -> &IdentitySlot<Self>;
    fn slot_mut(map: &mut IdentityMap) -> &mut IdentitySlot<Self>;
}

/// Maps every object already cloned during one deep-clone operation to
/// its clone.
///
/// Consulted before cloning any shared object: a hit returns the existing
/// clone, which is what makes cyclic graphs terminate and keeps aliased
/// objects aliased in the copy. Create one per operation; never share it
/// between unrelated clone calls.
#[derive(Debug, Default)]
pub struct IdentityMap {
    containers: IdentitySlot<Container>,
    nodes: IdentitySlot<Node>,
    sets: IdentitySlot<IntSet>,
    lists: IdentitySlot<IntList>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The clone already produced for `source`, if any.
    pub fn lookup<T: Tracked>(&self, source: &Rc<RefCell<T>>) -> Option<Rc<RefCell<T>>> {
        T::slot(self).get(source)
    }

    /// Record `copy` as the clone of `source`.
    pub fn remember<T: Tracked>(&mut self, source: &Rc<RefCell<T>>, copy: &Rc<RefCell<T>>) {
        T::slot_mut(self).insert(source, copy);
    }

    /// Number of distinct objects of type `T` cloned so far.
    pub fn count<T: Tracked>(&self) -> usize {
        T::slot(self).len()
    }

    /// Number of distinct objects cloned so far.
    pub fn len(&self) -> usize {
        self.containers.len() + self.nodes.len() + self.sets.len() + self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Tracked for Container {
    fn slot(map: &IdentityMap) -> &IdentitySlot<Self> {
        &map.containers
    }
    fn slot_mut(map: &mut IdentityMap) -> &mut IdentitySlot<Self> {
        &mut map.containers
    }
}

impl Tracked for Node {
    fn slot(map: &IdentityMap) -> &IdentitySlot<Self> {
        &map.nodes
    }
    fn slot_mut(map: &mut IdentityMap) -> &mut IdentitySlot<Self> {
        &mut map.nodes
    }
}

impl Tracked for IntSet {
    fn slot(map: &IdentityMap) -> &IdentitySlot<Self> {
        &map.sets
    }
    fn slot_mut(map: &mut IdentityMap) -> &mut IdentitySlot<Self> {
        &mut map.sets
    }
}

impl Tracked for IntList {
    fn slot(map: &IdentityMap) -> &IdentitySlot<Self> {
        &map.lists
    }
    fn slot_mut(map: &mut IdentityMap) -> &mut IdentitySlot<Self> {
        &mut map.lists
    }
}
