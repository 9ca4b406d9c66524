//! Application layer: fixtures and the demonstration runner
//!
//! This layer orchestrates domain logic and owns file I/O for fixtures.

pub mod error;
pub mod error_ext;
pub mod fixture;
pub mod runner;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use fixture::{load_template, resolve_template, ElementTemplate, GraphTemplate, LinkMode};
pub use runner::{Check, DemoReport, DemoRunner, Stage};
