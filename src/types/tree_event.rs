//! Mutation notifications emitted by a host tree.

use super::node_id::NodeId;
use serde::{Deserialize, Serialize};

/// One host tree mutation, in the order the host observed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeEvent {
  /// `node` was inserted into the observed tree.
  Connected { node: NodeId },
  /// `node` was removed from the observed tree.
  Disconnected { node: NodeId },
  /// An attribute on `node` was added (`old` absent), changed, or removed
  /// (`new` absent).
  AttributeChanged {
    node: NodeId,
    name: String,
    old: Option<String>,
    new: Option<String>,
  },
}

impl TreeEvent {
  /// The node the event is about.
  pub fn node(&self) -> NodeId {
    match self {
      TreeEvent::Connected { node }
      | TreeEvent::Disconnected { node }
      | TreeEvent::AttributeChanged { node, .. } => *node,
    }
  }
}
