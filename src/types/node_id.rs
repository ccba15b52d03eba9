//! Opaque identity of a host tree node.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a host tree node.
///
/// The engine never creates or destroys host nodes; it annotates them through
/// side tables keyed by this id. Hosts allocate ids however they like as long
/// as an id is never reused while the engine can still observe the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
  pub const fn new(raw: u64) -> Self {
    Self(raw)
  }

  pub const fn raw(self) -> u64 {
    self.0
  }
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}
