//! Coordination layer: routes host tree mutations into the scope engine.

use crate::attribute::CustomAttributeRegistry;
use crate::context::NodeScope;
use crate::error::Result;
use crate::injector_root::InjectorRoot;
use crate::tree::HostTree;
use crate::types::{NodeId, TraversalPolicy, TreeEvent};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, instrument};

/// Default attribute name that declares an injector on its node.
pub const INJECTOR_ATTRIBUTE: &str = "injector";

/// Construction options for [`TreeScope`].
#[derive(Debug, Clone)]
pub struct ScopeOptions {
  /// Attribute name that declares an injector on its node.
  pub injector_attribute: String,
  /// Boundary crossing policy for ancestor walks.
  pub traversal: TraversalPolicy,
}

impl Default for ScopeOptions {
  fn default() -> Self {
    Self {
      injector_attribute: INJECTOR_ATTRIBUTE.to_owned(),
      traversal: TraversalPolicy::default(),
    }
  }
}

/// Ties the injector map, the context layer, and the attribute registry to
/// the mutation stream of one host tree.
///
/// The engine holds no tree reference. Hosts push mutations through
/// [`TreeScope::handle`] or the individual hooks, passing the tree in; the
/// engine reads whatever structure the host reports at that moment.
pub struct TreeScope {
  injectors: InjectorRoot,
  attributes: CustomAttributeRegistry,
  injector_attribute: String,
  declarative: RefCell<HashSet<NodeId>>,
}

impl TreeScope {
  pub fn new() -> Self {
    Self::with_options(ScopeOptions::default())
  }

  pub fn with_options(options: ScopeOptions) -> Self {
    Self {
      injectors: InjectorRoot::with_policy(options.traversal),
      attributes: CustomAttributeRegistry::new(),
      injector_attribute: options.injector_attribute,
      declarative: RefCell::new(HashSet::new()),
    }
  }

  /// Injector ownership and resolution layer.
  pub fn injectors(&self) -> &InjectorRoot {
    &self.injectors
  }

  /// Attribute behavior definitions and live instances.
  pub fn attributes(&self) -> &CustomAttributeRegistry {
    &self.attributes
  }

  /// Roots the engine at `root` and reconciles the existing subtree:
  /// declaratively marked nodes get injectors and defined attributes get
  /// behavior instances. Idempotent per root; a different root first
  /// disconnects every live behavior instance and resets per-tree state.
  /// Returns how many behavior instances were connected.
  #[instrument(level = "trace", skip(self, tree))]
  pub fn attach(&self, tree: &dyn HostTree, root: NodeId) -> usize {
    if self.injectors.root() != Some(root) {
      self.attributes.disconnect_all();
      self.declarative.borrow_mut().clear();
    }
    self.injectors.attach(root);
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
      if tree.attribute_of(node, &self.injector_attribute).is_some() {
        self.declare_injector(node);
      }
      for child in tree.children_of(node).into_iter().rev() {
        stack.push(child);
      }
    }
    let connected = self.attributes.upgrade(tree, root);
    info!(root = %root, connected, "attached scope engine");
    connected
  }

  /// Applies one host mutation event.
  #[instrument(level = "trace", skip(self, tree))]
  pub fn handle(&self, tree: &dyn HostTree, event: &TreeEvent) -> Result<()> {
    match event {
      TreeEvent::Connected { node } => {
        self.on_node_connected(tree, *node);
        Ok(())
      }
      TreeEvent::Disconnected { node } => {
        self.on_node_disconnected(*node);
        Ok(())
      }
      TreeEvent::AttributeChanged { node, name, old, new } => {
        self.on_attribute_changed(*node, name, old.as_deref(), new.as_deref())
      }
    }
  }

  /// A node joined the tree: honor its declarative injector marker and
  /// connect behaviors for its current attributes. Hosts report one connect
  /// per inserted node.
  #[instrument(level = "trace", skip(self, tree))]
  pub fn on_node_connected(&self, tree: &dyn HostTree, node: NodeId) {
    if tree.attribute_of(node, &self.injector_attribute).is_some() {
      self.declare_injector(node);
    }
    self.attributes.upgrade_node(tree, node);
  }

  /// A node left the tree: its behavior instances disconnect and its
  /// injector, declarative or explicit, is disposed. Nothing cascades here;
  /// hosts report one disconnect per removed node, parents first.
  #[instrument(level = "trace", skip(self))]
  pub fn on_node_disconnected(&self, node: NodeId) {
    self.attributes.disconnect_node(node);
    self.declarative.borrow_mut().remove(&node);
    self.injectors.dispose_injector(node);
  }

  /// An attribute changed: the declarative injector marker reacts to
  /// presence transitions, then the behavior lifecycle runs for defined
  /// names. A first observed value connects, later values forward as
  /// changes, removal disconnects. An add whose value a connect scan
  /// already absorbed is dropped rather than replayed as a change.
  #[instrument(level = "trace", skip(self))]
  pub fn on_attribute_changed(
    &self,
    node: NodeId,
    name: &str,
    old: Option<&str>,
    new: Option<&str>,
  ) -> Result<()> {
    if name == self.injector_attribute {
      match (old, new) {
        (None, Some(_)) => self.declare_injector(node),
        (Some(_), None) => self.undeclare_injector(node),
        _ => {}
      }
    }
    match (self.attributes.is_connected(node, name), new) {
      (false, Some(value)) => {
        self.attributes.connect(node, name, value)?;
      }
      (true, Some(value)) => {
        if let Some(old) = old {
          self.attributes.value_changed(node, name, old, value)?;
        } else if let Some(recorded) = self.attributes.value_of(node, name) {
          // An add event for an already connected pair means a connect
          // scan absorbed the attribute from tree state. The recorded
          // value is the real prior value; a match carries nothing new.
          if recorded != value {
            self.attributes.value_changed(node, name, &recorded, value)?;
          }
        }
      }
      (true, None) => {
        self.attributes.disconnect(node, name);
      }
      (false, None) => {}
    }
    Ok(())
  }

  /// Context operations from the point of view of `node`.
  pub fn node<'a>(&'a self, tree: &'a dyn HostTree, node: NodeId) -> NodeScope<'a> {
    NodeScope::new(&self.injectors, tree, node)
  }

  /// First wins: a node that already owns an injector keeps it, and its
  /// provenance is unchanged.
  fn declare_injector(&self, node: NodeId) {
    if self.injectors.injector_of(node).is_some() {
      return;
    }
    self.injectors.ensure_injector(node);
    self.declarative.borrow_mut().insert(node);
    debug!(node = %node, "declared injector");
  }

  /// Only injectors this engine created declaratively are disposed when the
  /// marker attribute goes away; explicitly created ones stay.
  fn undeclare_injector(&self, node: NodeId) {
    if self.declarative.borrow_mut().remove(&node) {
      self.injectors.dispose_injector(node);
      debug!(node = %node, "undeclared injector");
    }
  }
}

impl Default for TreeScope {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for TreeScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TreeScope")
      .field("root", &self.injectors.root())
      .field("injectors", &self.injectors.injector_count())
      .field("attributes", &self.attributes)
      .finish()
  }
}
