//! Domain layer: entities and cloning logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod identity;
pub mod prototype;
pub mod render;

pub use arena::{GraphArena, GraphNode, ObjectData, ObjectKind};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use identity::{IdentityMap, ObjectId, Tracked};
pub use prototype::{is_cycle_closed, CloneDepth, Prototype};
pub use render::GraphRender;
