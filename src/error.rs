//! Error type for scope, lifecycle, and traversal failures.

use crate::types::NodeId;
use thiserror::Error;

/// Failures the engine reports loudly; soft misses are `Option` instead.
#[derive(Debug, Error)]
pub enum ScopeError {
  /// A second injector was attached for a node that already owns one.
  #[error("node {node} already owns an injector")]
  DuplicateOwner { node: NodeId },

  /// A behavior was connected twice for the same node and attribute.
  #[error("attribute '{name}' on node {node} is already connected")]
  AlreadyConnected { node: NodeId, name: String },

  /// A lifecycle call arrived for a behavior that was never connected.
  #[error("{operation} for attribute '{name}' on node {node} with no connected behavior")]
  LifecycleOrder {
    node: NodeId,
    name: String,
    operation: &'static str,
  },

  /// The tree structure changed underneath an in-flight injector traversal.
  #[error("tree structure changed during injector traversal from node {start}")]
  MutatedDuringTraversal { start: NodeId },
}

pub type Result<T> = std::result::Result<T, ScopeError>;
