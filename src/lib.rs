//! # treescope
//!
//! Scope-aware injectors, reactive contexts, and attribute-driven behaviors
//! for trees of nodes.
//!
//! ## Architecture
//!
//! The engine annotates a host-owned tree through side tables keyed by
//! [`types::NodeId`]; it never creates, destroys, or references host nodes.
//!
//! [`injector_root::InjectorRoot`] maps nodes to their injectors and resolves
//! keys closest-wins up the ancestor chain. [`context::ContextRegistry`]
//! publishes context definitions through an injector; live
//! [`context::CustomContext`] values are backed by an observable
//! [`store::Store`]. [`attribute::CustomAttributeRegistry`] drives behavior
//! instances through connect, value change, and disconnect.
//! [`engine::TreeScope`] ties all three to the mutation stream of a
//! [`tree::HostTree`].

pub mod attribute;
#[cfg(test)]
mod attribute_test;
pub mod context;
pub mod engine;
pub mod error;
pub mod injector;
pub mod injector_root;
pub mod store;
pub mod tree;
pub mod types;

pub use attribute::{AttributeBehavior, BehaviorFactory, CustomAttributeRegistry};
pub use context::{
  CONTEXT_REGISTRY_KEY, ContextDefinition, ContextRegistry, CustomContext, NodeScope,
  StaticContext, context_key,
};
pub use engine::{INJECTOR_ATTRIBUTE, ScopeOptions, TreeScope};
pub use error::{Result, ScopeError};
pub use injector::Injector;
pub use injector_root::{InjectorRoot, Injectors};
pub use store::{Store, Subscription};
pub use tree::{HostTree, MemoryTree};
pub use types::{Boundary, NodeId, ScopeValue, TraversalPolicy, TreeEvent};
