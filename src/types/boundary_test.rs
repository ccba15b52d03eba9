//! Tests for `Boundary` and `TraversalPolicy`.

use super::{Boundary, TraversalPolicy};

#[test]
fn default_policy_crosses_everything() {
  let policy = TraversalPolicy::default();
  assert!(policy.crosses(Boundary::None));
  assert!(policy.crosses(Boundary::Shadow));
  assert!(policy.crosses(Boundary::Template));
}

#[test]
fn shadow_crossing_can_be_disabled() {
  let policy = TraversalPolicy {
    cross_shadow: false,
    cross_template: true,
  };
  assert!(policy.crosses(Boundary::None));
  assert!(!policy.crosses(Boundary::Shadow));
  assert!(policy.crosses(Boundary::Template));
}

#[test]
fn plain_nodes_always_cross() {
  let policy = TraversalPolicy {
    cross_shadow: false,
    cross_template: false,
  };
  assert!(policy.crosses(Boundary::None));
}

#[test]
fn displays_lowercase_labels() {
  assert_eq!(Boundary::None.to_string(), "none");
  assert_eq!(Boundary::Shadow.to_string(), "shadow");
  assert_eq!(Boundary::Template.to_string(), "template");
}
