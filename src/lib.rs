//! protoclone: shallow and deep cloning of a cyclic container/node graph.
//!
//! ```
//! use protoclone::domain::{is_cycle_intact, link, Container, Element, Node, Prototype};
//!
//! let node = Node::new();
//! let container = Container::new(23, vec![Element::scalar(1), Element::set([1, 2, 3])]);
//! link(&container, &node).unwrap();
//!
//! let copy = container.deep_clone();
//! assert!(is_cycle_intact(&copy));
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;
