//! Attribute-driven behaviors: definitions, lifecycle, and subtree upgrades.
//!
//! A behavior definition maps an attribute name to a factory. Each occurrence
//! of the attribute on a node gets its own instance, driven through
//! `connected`, `value_changed`, and `disconnected` exactly once per
//! transition. Instances record the definition generation that built them, so
//! an upgrade pass can swap instances left behind by a re-definition.

use crate::error::{Result, ScopeError};
use crate::tree::HostTree;
use crate::types::NodeId;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info};

/// Reacts to the lifecycle of one attribute occurrence on one node.
///
/// Every hook defaults to a no-op so behaviors implement only what they need.
pub trait AttributeBehavior {
  /// The attribute appeared on `host`, or an upgrade found it already there.
  fn connected(&mut self, host: NodeId, name: &str, value: &str) {
    let _ = (host, name, value);
  }

  /// The attribute's value changed while connected.
  fn value_changed(&mut self, old: &str, new: &str) {
    let _ = (old, new);
  }

  /// The attribute was removed, or its host left the tree.
  fn disconnected(&mut self, host: NodeId) {
    let _ = host;
  }
}

/// Produces one behavior instance per attribute occurrence.
pub type BehaviorFactory = Rc<dyn Fn() -> Box<dyn AttributeBehavior>>;

struct Definition {
  factory: BehaviorFactory,
  generation: u64,
}

struct Instance {
  behavior: Box<dyn AttributeBehavior>,
  value: String,
  generation: u64,
}

/// Registers behavior factories by attribute name and drives the instances.
///
/// User hooks always run with no registry borrow held, so a hook may re-enter
/// the registry, define further names, or disconnect other instances.
pub struct CustomAttributeRegistry {
  definitions: RefCell<HashMap<String, Definition>>,
  instances: RefCell<HashMap<NodeId, HashMap<String, Instance>>>,
  generation: Cell<u64>,
}

impl CustomAttributeRegistry {
  pub fn new() -> Self {
    Self {
      definitions: RefCell::new(HashMap::new()),
      instances: RefCell::new(HashMap::new()),
      generation: Cell::new(0),
    }
  }

  /// Registers a factory for an attribute name, replacing any previous one.
  /// Existing instances keep running until an upgrade pass swaps them.
  pub fn define(
    &self,
    name: impl Into<String>,
    factory: impl Fn() -> Box<dyn AttributeBehavior> + 'static,
  ) {
    let name = name.into();
    let generation = self.generation.get() + 1;
    self.generation.set(generation);
    debug!(name = %name, generation, "defined attribute behavior");
    self.definitions.borrow_mut().insert(name, Definition {
      factory: Rc::new(factory),
      generation,
    });
  }

  pub fn defines(&self, name: &str) -> bool {
    self.definitions.borrow().contains_key(name)
  }

  /// Connects a fresh instance for the attribute occurrence. Undefined names
  /// are skipped with `Ok(false)`; connecting an already connected pair is an
  /// error.
  pub fn connect(&self, node: NodeId, name: &str, value: &str) -> Result<bool> {
    let Some((factory, generation)) = self.lookup(name) else {
      return Ok(false);
    };
    if self.is_connected(node, name) {
      return Err(ScopeError::AlreadyConnected {
        node,
        name: name.to_owned(),
      });
    }
    let mut behavior = factory();
    behavior.connected(node, name, value);
    self.instances.borrow_mut().entry(node).or_default().insert(
      name.to_owned(),
      Instance {
        behavior,
        value: value.to_owned(),
        generation,
      },
    );
    debug!(node = %node, name, "connected attribute behavior");
    Ok(true)
  }

  /// Forwards a value change to the connected instance. Undefined names are
  /// skipped; a change for a pair that was never connected is an error.
  pub fn value_changed(&self, node: NodeId, name: &str, old: &str, new: &str) -> Result<()> {
    if !self.defines(name) {
      return Ok(());
    }
    // The record is taken out while the hook runs; hooks may re-enter.
    let taken = self
      .instances
      .borrow_mut()
      .get_mut(&node)
      .and_then(|names| names.remove(name));
    let Some(mut instance) = taken else {
      return Err(ScopeError::LifecycleOrder {
        node,
        name: name.to_owned(),
        operation: "value change",
      });
    };
    instance.behavior.value_changed(old, new);
    instance.value = new.to_owned();
    self
      .instances
      .borrow_mut()
      .entry(node)
      .or_default()
      .insert(name.to_owned(), instance);
    Ok(())
  }

  /// Disconnects the instance for the pair, if one is connected. Reentrant
  /// or repeated disconnects are no-ops.
  pub fn disconnect(&self, node: NodeId, name: &str) -> bool {
    let taken = {
      let mut instances = self.instances.borrow_mut();
      let Some(names) = instances.get_mut(&node) else {
        return false;
      };
      let taken = names.remove(name);
      if names.is_empty() {
        instances.remove(&node);
      }
      taken
    };
    match taken {
      Some(mut instance) => {
        instance.behavior.disconnected(node);
        debug!(node = %node, name, "disconnected attribute behavior");
        true
      }
      None => false,
    }
  }

  /// Disconnects every instance on `node`, in attribute name order.
  pub fn disconnect_node(&self, node: NodeId) -> usize {
    let Some(names) = self.instances.borrow_mut().remove(&node) else {
      return 0;
    };
    let mut instances: Vec<(String, Instance)> = names.into_iter().collect();
    instances.sort_by(|a, b| a.0.cmp(&b.0));
    let count = instances.len();
    for (name, mut instance) in instances {
      instance.behavior.disconnected(node);
      debug!(node = %node, name = %name, "disconnected attribute behavior");
    }
    count
  }

  /// Disconnects every live instance, nodes in id order.
  pub fn disconnect_all(&self) -> usize {
    let mut nodes: Vec<NodeId> = self.instances.borrow().keys().copied().collect();
    nodes.sort();
    nodes.into_iter().map(|node| self.disconnect_node(node)).sum()
  }

  /// Reconciles one node against the current definitions: connects defined
  /// attributes without an instance and swaps instances whose definition was
  /// replaced. Returns how many instances were connected.
  pub fn upgrade_node(&self, tree: &dyn HostTree, node: NodeId) -> usize {
    let mut connected = 0;
    for (name, value) in tree.attributes_of(node) {
      let Some(current) = self.generation_of(&name) else {
        continue;
      };
      let recorded = self
        .instances
        .borrow()
        .get(&node)
        .and_then(|names| names.get(&name))
        .map(|instance| instance.generation);
      match recorded {
        Some(generation) if generation == current => continue,
        Some(_) => {
          self.disconnect(node, &name);
        }
        None => {}
      }
      if matches!(self.connect(node, &name, &value), Ok(true)) {
        connected += 1;
      }
    }
    connected
  }

  /// Reconciles a whole subtree, parents before children.
  pub fn upgrade(&self, tree: &dyn HostTree, root: NodeId) -> usize {
    let mut connected = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
      connected += self.upgrade_node(tree, node);
      for child in tree.children_of(node).into_iter().rev() {
        stack.push(child);
      }
    }
    info!(root = %root, connected, "upgraded subtree");
    connected
  }

  pub fn is_connected(&self, node: NodeId, name: &str) -> bool {
    self
      .instances
      .borrow()
      .get(&node)
      .is_some_and(|names| names.contains_key(name))
  }

  /// Last value the connected instance saw, if one is connected.
  pub fn value_of(&self, node: NodeId, name: &str) -> Option<String> {
    self
      .instances
      .borrow()
      .get(&node)
      .and_then(|names| names.get(name))
      .map(|instance| instance.value.clone())
  }

  pub fn connected_count(&self) -> usize {
    self.instances.borrow().values().map(|names| names.len()).sum()
  }

  fn lookup(&self, name: &str) -> Option<(BehaviorFactory, u64)> {
    self
      .definitions
      .borrow()
      .get(name)
      .map(|definition| (definition.factory.clone(), definition.generation))
  }

  fn generation_of(&self, name: &str) -> Option<u64> {
    self
      .definitions
      .borrow()
      .get(name)
      .map(|definition| definition.generation)
  }
}

impl Default for CustomAttributeRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for CustomAttributeRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CustomAttributeRegistry")
      .field("definitions", &self.definitions.borrow().len())
      .field("connected", &self.connected_count())
      .finish()
  }
}
