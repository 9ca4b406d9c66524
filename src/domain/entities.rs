//! Domain entities: the container/node pair and its element collections

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::identity::ObjectId;

pub type IntSet = BTreeSet<i64>;
pub type IntList = Vec<i64>;

pub type ContainerRef = Rc<RefCell<Container>>;
pub type WeakContainerRef = Weak<RefCell<Container>>;
pub type NodeRef = Rc<RefCell<Node>>;
pub type SetRef = Rc<RefCell<IntSet>>;
pub type ListRef = Rc<RefCell<IntList>>;

/// One entry of a container's element sequence.
///
/// Cloning an `Element` copies the handle, not the collection behind it:
/// two elements cloned from each other refer to the same set or list.
#[derive(Debug, Clone)]
pub enum Element {
    Scalar(i64),
    Set(SetRef),
    List(ListRef),
}

impl Element {
    pub fn scalar(value: i64) -> Self {
        Element::Scalar(value)
    }

    pub fn set(values: impl IntoIterator<Item = i64>) -> Self {
        Element::Set(Rc::new(RefCell::new(values.into_iter().collect())))
    }

    pub fn list(values: impl IntoIterator<Item = i64>) -> Self {
        Element::List(Rc::new(RefCell::new(values.into_iter().collect())))
    }

    pub fn as_scalar(&self) -> Option<i64> {
        match self {
            Element::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&SetRef> {
        match self {
            Element::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Element::List(list) => Some(list),
            _ => None,
        }
    }

    /// Identity of the nested collection, `None` for scalars.
    pub fn id(&self) -> Option<ObjectId> {
        match self {
            Element::Scalar(_) => None,
            Element::Set(set) => Some(ObjectId::of(set)),
            Element::List(list) => Some(ObjectId::of(list)),
        }
    }
}

/// The cloneable entity: a scalar, an ordered element sequence and the
/// node that points back at it.
///
/// The node is attached only through [`link`] or [`attach`], which keep a
/// node from being held or owned by two containers at once.
#[derive(Debug)]
pub struct Container {
    pub scalar: i64,
    pub elements: Vec<Element>,
    /// Held back-reference node, None until one is attached
    pub(crate) backref: Option<NodeRef>,
}

impl Container {
    pub fn new(scalar: i64, elements: Vec<Element>) -> ContainerRef {
        Rc::new(RefCell::new(Self {
            scalar,
            elements,
            backref: None,
        }))
    }

    pub fn backref(&self) -> Option<NodeRef> {
        self.backref.clone()
    }
}

/// Back-reference entity. Holds a weak pointer to its owning container so
/// the container/node cycle does not keep itself alive.
///
/// `holder` is the container whose `backref` this node is; `owner`, when
/// set, is always that same container.
#[derive(Debug, Default)]
pub struct Node {
    pub(crate) owner: Option<WeakContainerRef>,
    pub(crate) holder: Option<WeakContainerRef>,
}

impl Node {
    pub fn new() -> NodeRef {
        Rc::new(RefCell::new(Self::default()))
    }

    /// The owning container, if one was linked and is still alive.
    pub fn owner(&self) -> Option<ContainerRef> {
        self.owner.as_ref().and_then(Weak::upgrade)
    }

    /// The container holding this node as its backref, if still alive.
    pub fn holder(&self) -> Option<ContainerRef> {
        self.holder.as_ref().and_then(Weak::upgrade)
    }

    /// Whether this node's owner is exactly `container`.
    pub fn is_owned_by(&self, container: &ContainerRef) -> bool {
        self.owner
            .as_ref()
            .is_some_and(|weak| points_to(weak, container))
    }

    /// Detach from `container` if it holds or owns this node.
    fn release(&mut self, container: &ContainerRef) {
        if self.is_owned_by(container) {
            self.owner = None;
        }
        if self.holder.as_ref().is_some_and(|weak| points_to(weak, container)) {
            self.holder = None;
        }
    }
}

/// Identity comparison between a weak back-reference and a container handle.
pub fn points_to(weak: &WeakContainerRef, container: &ContainerRef) -> bool {
    std::ptr::eq(weak.as_ptr(), Rc::as_ptr(container))
}

/// Link `node` and `container` to each other, establishing the cycle.
///
/// A node has at most one owner and one holder: linking a node that is
/// owned or held by a different live container fails. If the container
/// already held another node, that node is released.
#[instrument(level = "debug", skip_all, fields(container = %ObjectId::of(container), node = %ObjectId::of(node)))]
pub fn link(container: &ContainerRef, node: &NodeRef) -> DomainResult<()> {
    hold(container, node)?;
    node.borrow_mut().owner = Some(Rc::downgrade(container));
    Ok(())
}

/// Attach `node` as the container's backref without making the container
/// its owner (an unlinked node). Same exclusivity rules as [`link`].
#[instrument(level = "debug", skip_all, fields(container = %ObjectId::of(container), node = %ObjectId::of(node)))]
pub fn attach(container: &ContainerRef, node: &NodeRef) -> DomainResult<()> {
    hold(container, node)
}

fn hold(container: &ContainerRef, node: &NodeRef) -> DomainResult<()> {
    {
        let current = node.borrow();
        if let Some(owner) = current.owner().filter(|o| !Rc::ptr_eq(o, container)) {
            return Err(DomainError::NodeAlreadyOwned {
                node: ObjectId::of(node),
                owner: ObjectId::of(&owner),
            });
        }
        if let Some(holder) = current.holder().filter(|h| !Rc::ptr_eq(h, container)) {
            return Err(DomainError::NodeAlreadyAttached {
                node: ObjectId::of(node),
                holder: ObjectId::of(&holder),
            });
        }
    }

    let previous = container.borrow_mut().backref.replace(Rc::clone(node));
    if let Some(previous) = previous.filter(|p| !Rc::ptr_eq(p, node)) {
        debug!(released = %ObjectId::of(&previous), "releasing previous backref node");
        previous.borrow_mut().release(container);
    }

    node.borrow_mut().holder = Some(Rc::downgrade(container));
    Ok(())
}

/// True when `container.backref.owner is container`.
pub fn is_cycle_intact(container: &ContainerRef) -> bool {
    container
        .borrow()
        .backref
        .as_ref()
        .is_some_and(|node| node.borrow().is_owned_by(container))
}
