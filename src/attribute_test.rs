//! Tests for `CustomAttributeRegistry` lifecycle handling.

use crate::attribute::{AttributeBehavior, CustomAttributeRegistry};
use crate::error::ScopeError;
use crate::tree::MemoryTree;
use crate::types::NodeId;
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

struct Recorder {
  tag: &'static str,
  log: Log,
}

impl AttributeBehavior for Recorder {
  fn connected(&mut self, host: NodeId, name: &str, value: &str) {
    self
      .log
      .borrow_mut()
      .push(format!("{} connect {host} {name}={value}", self.tag));
  }

  fn value_changed(&mut self, old: &str, new: &str) {
    self.log.borrow_mut().push(format!("{} change {old}->{new}", self.tag));
  }

  fn disconnected(&mut self, host: NodeId) {
    self.log.borrow_mut().push(format!("{} disconnect {host}", self.tag));
  }
}

fn recorder_registry(tag: &'static str, name: &str) -> (CustomAttributeRegistry, Log) {
  let registry = CustomAttributeRegistry::new();
  let log: Log = Rc::default();
  let sink = log.clone();
  registry.define(name, move || {
    Box::new(Recorder {
      tag,
      log: sink.clone(),
    })
  });
  (registry, log)
}

#[test]
fn connect_runs_the_hook_with_host_name_and_value() {
  let (registry, log) = recorder_registry("a", "highlight");
  let node = NodeId::new(1);

  assert!(registry.connect(node, "highlight", "on").unwrap());
  assert_eq!(log.borrow().as_slice(), &["a connect #1 highlight=on"]);
  assert!(registry.is_connected(node, "highlight"));
  assert_eq!(registry.value_of(node, "highlight"), Some("on".into()));
}

#[test]
fn undefined_names_are_skipped() {
  let (registry, log) = recorder_registry("a", "highlight");
  let node = NodeId::new(1);

  assert!(!registry.connect(node, "other", "x").unwrap());
  registry.value_changed(node, "other", "x", "y").unwrap();
  assert!(!registry.disconnect(node, "other"));
  assert!(log.borrow().is_empty());
}

#[test]
fn connecting_twice_is_an_error() {
  let (registry, _log) = recorder_registry("a", "highlight");
  let node = NodeId::new(1);
  registry.connect(node, "highlight", "on").unwrap();

  let err = registry.connect(node, "highlight", "on").unwrap_err();
  assert!(matches!(err, ScopeError::AlreadyConnected { node: n, name } if n == node && name == "highlight"));
}

#[test]
fn value_change_before_connect_is_an_error() {
  let (registry, _log) = recorder_registry("a", "highlight");

  let err = registry
    .value_changed(NodeId::new(1), "highlight", "on", "off")
    .unwrap_err();
  assert!(matches!(err, ScopeError::LifecycleOrder { operation, .. } if operation == "value change"));
}

#[test]
fn value_changes_flow_to_the_instance() {
  let (registry, log) = recorder_registry("a", "highlight");
  let node = NodeId::new(1);
  registry.connect(node, "highlight", "on").unwrap();

  registry.value_changed(node, "highlight", "on", "off").unwrap();
  assert_eq!(registry.value_of(node, "highlight"), Some("off".into()));
  assert_eq!(log.borrow().as_slice(), &[
    "a connect #1 highlight=on",
    "a change on->off",
  ]);
}

#[test]
fn disconnect_runs_once_then_becomes_a_noop() {
  let (registry, log) = recorder_registry("a", "highlight");
  let node = NodeId::new(1);
  registry.connect(node, "highlight", "on").unwrap();

  assert!(registry.disconnect(node, "highlight"));
  assert!(!registry.disconnect(node, "highlight"));
  assert!(!registry.is_connected(node, "highlight"));
  assert_eq!(log.borrow().as_slice(), &[
    "a connect #1 highlight=on",
    "a disconnect #1",
  ]);
}

#[test]
fn each_occurrence_gets_its_own_instance() {
  let (registry, _log) = recorder_registry("a", "highlight");
  let first = NodeId::new(1);
  let second = NodeId::new(2);

  registry.connect(first, "highlight", "x").unwrap();
  registry.connect(second, "highlight", "y").unwrap();
  assert_eq!(registry.connected_count(), 2);

  registry.disconnect(first, "highlight");
  assert!(!registry.is_connected(first, "highlight"));
  assert!(registry.is_connected(second, "highlight"));
}

#[test]
fn disconnect_node_drops_instances_in_name_order() {
  let registry = CustomAttributeRegistry::new();
  let log: Log = Rc::default();
  for name in ["zeta", "alpha"] {
    let sink = log.clone();
    registry.define(name, move || {
      Box::new(Recorder {
        tag: name,
        log: sink.clone(),
      })
    });
  }
  let node = NodeId::new(3);
  registry.connect(node, "zeta", "1").unwrap();
  registry.connect(node, "alpha", "2").unwrap();
  log.borrow_mut().clear();

  assert_eq!(registry.disconnect_node(node), 2);
  assert_eq!(log.borrow().as_slice(), &["alpha disconnect #3", "zeta disconnect #3"]);
  assert_eq!(registry.connected_count(), 0);
}

#[test]
fn disconnect_all_drains_every_instance_in_node_order() {
  let (registry, log) = recorder_registry("a", "highlight");
  registry.connect(NodeId::new(2), "highlight", "x").unwrap();
  registry.connect(NodeId::new(1), "highlight", "y").unwrap();
  log.borrow_mut().clear();

  assert_eq!(registry.disconnect_all(), 2);
  assert_eq!(log.borrow().as_slice(), &["a disconnect #1", "a disconnect #2"]);
  assert_eq!(registry.connected_count(), 0);
  assert_eq!(registry.disconnect_all(), 0);
}

#[test]
fn upgrade_connects_marked_nodes_parents_first() {
  let (registry, log) = recorder_registry("a", "highlight");
  let tree = MemoryTree::new();
  let root = tree.add_root();
  let child = tree.add_child(root);
  let grandchild = tree.add_child(child);
  tree.set_attribute(grandchild, "highlight", "deep");
  tree.set_attribute(root, "highlight", "top");

  assert_eq!(registry.upgrade(&tree, root), 2);
  assert_eq!(log.borrow().as_slice(), &[
    format!("a connect {root} highlight=top"),
    format!("a connect {grandchild} highlight=deep"),
  ]);
}

#[test]
fn upgrade_is_idempotent() {
  let (registry, log) = recorder_registry("a", "highlight");
  let tree = MemoryTree::new();
  let root = tree.add_root();
  tree.set_attribute(root, "highlight", "on");

  assert_eq!(registry.upgrade(&tree, root), 1);
  assert_eq!(registry.upgrade(&tree, root), 0);
  assert_eq!(log.borrow().len(), 1);
}

#[test]
fn upgrade_connects_attributes_defined_late() {
  let registry = CustomAttributeRegistry::new();
  let tree = MemoryTree::new();
  let root = tree.add_root();
  tree.set_attribute(root, "highlight", "on");

  assert_eq!(registry.upgrade(&tree, root), 0, "nothing defined yet");

  let log: Log = Rc::default();
  let sink = log.clone();
  registry.define("highlight", move || {
    Box::new(Recorder {
      tag: "late",
      log: sink.clone(),
    })
  });
  assert_eq!(registry.upgrade(&tree, root), 1);
  assert_eq!(log.borrow().as_slice(), &[format!("late connect {root} highlight=on")]);
}

#[test]
fn redefining_swaps_instances_only_on_upgrade() {
  let (registry, log) = recorder_registry("old", "highlight");
  let tree = MemoryTree::new();
  let root = tree.add_root();
  tree.set_attribute(root, "highlight", "on");
  registry.upgrade(&tree, root);

  let sink = log.clone();
  registry.define("highlight", move || {
    Box::new(Recorder {
      tag: "new",
      log: sink.clone(),
    })
  });
  assert_eq!(log.borrow().len(), 1, "live instance untouched by define");

  registry.upgrade(&tree, root);
  assert_eq!(log.borrow().as_slice(), &[
    format!("old connect {root} highlight=on"),
    format!("old disconnect {root}"),
    format!("new connect {root} highlight=on"),
  ]);
}

#[test]
fn new_connects_use_the_latest_definition() {
  let (registry, log) = recorder_registry("old", "highlight");
  let sink = log.clone();
  registry.define("highlight", move || {
    Box::new(Recorder {
      tag: "new",
      log: sink.clone(),
    })
  });

  registry.connect(NodeId::new(5), "highlight", "x").unwrap();
  assert_eq!(log.borrow().as_slice(), &["new connect #5 highlight=x"]);
}

#[test]
fn hooks_may_reenter_the_registry() {
  let registry = Rc::new(CustomAttributeRegistry::new());
  let log: Log = Rc::default();

  struct Chaining {
    registry: Rc<CustomAttributeRegistry>,
    log: Log,
  }
  impl AttributeBehavior for Chaining {
    fn connected(&mut self, host: NodeId, _name: &str, _value: &str) {
      self.log.borrow_mut().push(format!("chain connect {host}"));
      self.registry.define("secondary", || Box::new(NoOp));
    }
  }
  struct NoOp;
  impl AttributeBehavior for NoOp {}

  let inner = registry.clone();
  let sink = log.clone();
  registry.define("primary", move || {
    Box::new(Chaining {
      registry: inner.clone(),
      log: sink.clone(),
    })
  });

  registry.connect(NodeId::new(1), "primary", "x").unwrap();
  assert!(registry.defines("secondary"));
  assert_eq!(log.borrow().as_slice(), &["chain connect #1"]);
}
