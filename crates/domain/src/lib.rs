//! musikant domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `reference`: Parsing of tagged action references
//! - `workflow`: Workflow documents and the `uses` tree walker
//! - `usecases`: Pinning workflows and updating repository topics

pub mod model;
pub mod ports;
pub mod reference;
pub mod usecases;
pub mod workflow;

pub use model::*;
pub use ports::*;
pub use reference::ParseError;
pub use workflow::{WorkflowDocument, process_tree};
