//! Boundary kinds on tree nodes and the policy for crossing them.

use std::fmt;

/// Kind of scope boundary a node establishes, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Boundary {
  /// Ordinary node; ancestor walks pass straight through.
  #[default]
  None,
  /// Encapsulation boundary in the style of a shadow root.
  Shadow,
  /// Inert subtree boundary in the style of a template element.
  Template,
}

impl fmt::Display for Boundary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      Boundary::None => "none",
      Boundary::Shadow => "shadow",
      Boundary::Template => "template",
    };
    write!(f, "{label}")
  }
}

/// Controls which boundary kinds an ancestor walk may step across.
///
/// A walk always visits the boundary node itself; the policy only decides
/// whether the walk continues to that node's parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalPolicy {
  pub cross_shadow: bool,
  pub cross_template: bool,
}

impl TraversalPolicy {
  /// Whether a walk positioned on a node with `boundary` may step to its parent.
  pub fn crosses(&self, boundary: Boundary) -> bool {
    match boundary {
      Boundary::None => true,
      Boundary::Shadow => self.cross_shadow,
      Boundary::Template => self.cross_template,
    }
  }
}

impl Default for TraversalPolicy {
  fn default() -> Self {
    Self {
      cross_shadow: true,
      cross_template: true,
    }
  }
}
