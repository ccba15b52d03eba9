//! Core data types shared across the scope engine.
//!
//! Everything here is host-agnostic: ids, boundary kinds, mutation events,
//! and the value kinds an injector can hold.

mod boundary;
#[cfg(test)]
mod boundary_test;
mod node_id;
mod scope_value;
mod tree_event;

pub use boundary::{Boundary, TraversalPolicy};
pub use node_id::NodeId;
pub use scope_value::ScopeValue;
pub use tree_event::TreeEvent;
