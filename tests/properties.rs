//! Property tests for ancestor resolution over randomly shaped trees.

use proptest::prelude::*;
use std::collections::HashSet;
use treescope::{HostTree, InjectorRoot, MemoryTree, NodeId, ScopeValue};

/// Builds a tree from parent picks: node `i + 1` hangs under one of the
/// nodes created before it.
fn build_tree(parents: &[prop::sample::Index]) -> (MemoryTree, Vec<NodeId>) {
  let tree = MemoryTree::new();
  let mut nodes = vec![tree.add_root()];
  for pick in parents {
    let parent = nodes[pick.index(nodes.len())];
    nodes.push(tree.add_child(parent));
  }
  (tree, nodes)
}

fn is_ancestor_or_self(tree: &MemoryTree, ancestor: NodeId, node: NodeId) -> bool {
  let mut cursor = Some(node);
  while let Some(current) = cursor {
    if current == ancestor {
      return true;
    }
    cursor = tree.parent_of(current);
  }
  false
}

/// Random tree shapes of up to 25 nodes.
fn arb_parents() -> impl Strategy<Value = Vec<prop::sample::Index>> {
  prop::collection::vec(any::<prop::sample::Index>(), 0..24)
}

proptest! {
  /// A binding is resolvable from exactly the provider's subtree.
  #[test]
  fn prop_bindings_cover_exactly_the_provider_subtree(
    parents in arb_parents(),
    provider in any::<prop::sample::Index>(),
  ) {
    let (tree, nodes) = build_tree(&parents);
    let provider = nodes[provider.index(nodes.len())];
    let root = InjectorRoot::new();
    root.attach(nodes[0]);
    root.ensure_injector(provider).set("token", ScopeValue::service(1u32));

    for node in &nodes {
      let resolved = root.resolve(&tree, *node, "token").is_some();
      prop_assert_eq!(resolved, is_ancestor_or_self(&tree, provider, *node));
    }
  }

  /// A deeper binding masks the root binding in its subtree and nowhere else.
  #[test]
  fn prop_overrides_shadow_exactly_their_subtree(
    parents in arb_parents(),
    inner in any::<prop::sample::Index>(),
  ) {
    let (tree, nodes) = build_tree(&parents);
    let inner = nodes[inner.index(nodes.len())];
    let root = InjectorRoot::new();
    root.attach(nodes[0]);
    root.ensure_injector(nodes[0]).set("token", ScopeValue::service("outer"));
    root.ensure_injector(inner).set("token", ScopeValue::service("inner"));

    for node in &nodes {
      let value = root.resolve(&tree, *node, "token").unwrap();
      let label = *value.downcast::<&str>().unwrap();
      let expected = if is_ancestor_or_self(&tree, inner, *node) { "inner" } else { "outer" };
      prop_assert_eq!(label, expected);
    }
  }

  /// Repeated ensures hand back the same injector, one per distinct node.
  #[test]
  fn prop_ensure_injector_is_idempotent(
    parents in arb_parents(),
    picks in prop::collection::vec(any::<prop::sample::Index>(), 1..8),
  ) {
    let (_tree, nodes) = build_tree(&parents);
    let root = InjectorRoot::new();
    root.attach(nodes[0]);

    let mut distinct = HashSet::new();
    for pick in &picks {
      let node = nodes[pick.index(nodes.len())];
      let first = root.ensure_injector(node);
      let second = root.ensure_injector(node);
      prop_assert!(std::rc::Rc::ptr_eq(&first, &second));
      distinct.insert(node);
    }
    prop_assert_eq!(root.injector_count(), distinct.len());
  }

  /// The resolver's closest owner agrees with a hand-rolled parent walk.
  #[test]
  fn prop_closest_injector_matches_a_manual_walk(
    parents in arb_parents(),
    owners in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    query in any::<prop::sample::Index>(),
  ) {
    let (tree, nodes) = build_tree(&parents);
    let root = InjectorRoot::new();
    root.attach(nodes[0]);

    let mut owned = HashSet::new();
    for pick in &owners {
      let node = nodes[pick.index(nodes.len())];
      root.ensure_injector(node);
      owned.insert(node);
    }

    let query = nodes[query.index(nodes.len())];
    let mut expected = None;
    let mut cursor = Some(query);
    while let Some(current) = cursor {
      if owned.contains(&current) {
        expected = Some(current);
        break;
      }
      cursor = tree.parent_of(current);
    }

    let found = root.closest_injector(&tree, query).map(|injector| injector.owner());
    prop_assert_eq!(found, expected);
  }
}
