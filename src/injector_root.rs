//! Node to injector ownership and closest-wins ancestor resolution.

use crate::error::{Result, ScopeError};
use crate::injector::Injector;
use crate::tree::HostTree;
use crate::types::{NodeId, ScopeValue, TraversalPolicy};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info};

/// Owns the node to injector map for one tree and resolves keys through it.
///
/// At most one injector exists per node. Ancestor walks start at the queried
/// node itself and end at the attached root, at a parentless node, or at a
/// boundary the [`TraversalPolicy`] refuses to cross.
#[derive(Debug)]
pub struct InjectorRoot {
  root: Cell<Option<NodeId>>,
  owners: RefCell<HashMap<NodeId, Rc<Injector>>>,
  policy: Cell<TraversalPolicy>,
}

impl InjectorRoot {
  pub fn new() -> Self {
    Self::with_policy(TraversalPolicy::default())
  }

  pub fn with_policy(policy: TraversalPolicy) -> Self {
    Self {
      root: Cell::new(None),
      owners: RefCell::new(HashMap::new()),
      policy: Cell::new(policy),
    }
  }

  pub fn policy(&self) -> TraversalPolicy {
    self.policy.get()
  }

  pub fn set_policy(&self, policy: TraversalPolicy) {
    self.policy.set(policy);
  }

  /// Node the resolver is currently rooted at.
  pub fn root(&self) -> Option<NodeId> {
    self.root.get()
  }

  /// Roots the resolver at `root`. Idempotent for the current root; a
  /// different root resets the owner map. Forgotten injectors are not
  /// disposed, existing handles to them stay usable.
  pub fn attach(&self, root: NodeId) {
    if self.root.get() == Some(root) {
      return;
    }
    let dropped = {
      let mut owners = self.owners.borrow_mut();
      let dropped = owners.len();
      owners.clear();
      dropped
    };
    self.root.set(Some(root));
    info!(root = %root, dropped, "attached injector root");
  }

  /// Returns the injector owned by `node`, creating it on first call.
  pub fn ensure_injector(&self, node: NodeId) -> Rc<Injector> {
    let mut owners = self.owners.borrow_mut();
    if let Some(existing) = owners.get(&node) {
      return existing.clone();
    }
    let injector = Rc::new(Injector::new(node));
    owners.insert(node, injector.clone());
    debug!(node = %node, "created injector");
    injector
  }

  /// Registers an externally constructed injector under its owner node.
  pub fn attach_injector(&self, injector: Rc<Injector>) -> Result<()> {
    let node = injector.owner();
    let mut owners = self.owners.borrow_mut();
    if owners.contains_key(&node) {
      return Err(ScopeError::DuplicateOwner { node });
    }
    owners.insert(node, injector);
    debug!(node = %node, "attached external injector");
    Ok(())
  }

  /// Injector owned by `node` itself, without ancestor fallback.
  pub fn injector_of(&self, node: NodeId) -> Option<Rc<Injector>> {
    self.owners.borrow().get(&node).cloned()
  }

  /// Nearest owned injector on the ancestor path, starting at `node` itself.
  pub fn closest_injector(&self, tree: &dyn HostTree, node: NodeId) -> Option<Rc<Injector>> {
    self.walk(tree, node).next()
  }

  /// Lazy iterator over the ancestor injectors of `start`, closest first.
  ///
  /// Each step re-reads the host, so creating an ancestor injector mid-walk
  /// is visible to later steps. If the host reports a structural change, the
  /// next step yields [`ScopeError::MutatedDuringTraversal`] once and the
  /// iterator fuses.
  pub fn injectors<'a>(&'a self, tree: &'a dyn HostTree, start: NodeId) -> Injectors<'a> {
    Injectors {
      root: self,
      tree,
      start,
      cursor: Some(start),
      revision: tree.revision(),
      poisoned: false,
    }
  }

  /// Closest-wins lookup: the first ancestor injector with a binding for
  /// `key` answers, even if a farther one also binds it.
  pub fn resolve(&self, tree: &dyn HostTree, node: NodeId, key: &str) -> Option<ScopeValue> {
    self.walk(tree, node).find_map(|injector| injector.get(key))
  }

  /// Binds `key` at `node` only when no scope on the ancestor path already
  /// answers for it. Returns whether a binding was created.
  pub fn set_if_absent(
    &self,
    tree: &dyn HostTree,
    node: NodeId,
    key: &str,
    value: ScopeValue,
  ) -> bool {
    if self.resolve(tree, node, key).is_some() {
      return false;
    }
    self.ensure_injector(node).set(key, value);
    true
  }

  /// Removes and disposes the injector owned by `node`, if any.
  pub fn dispose_injector(&self, node: NodeId) -> bool {
    let removed = self.owners.borrow_mut().remove(&node);
    match removed {
      Some(injector) => {
        injector.dispose();
        true
      }
      None => false,
    }
  }

  pub fn injector_count(&self) -> usize {
    self.owners.borrow().len()
  }

  pub(crate) fn walk<'a>(&'a self, tree: &'a dyn HostTree, start: NodeId) -> Walk<'a> {
    Walk {
      root: self,
      tree,
      cursor: Some(start),
    }
  }

  fn next_up(&self, tree: &dyn HostTree, cursor: NodeId) -> Option<NodeId> {
    if self.root.get() == Some(cursor) {
      return None;
    }
    if !self.policy.get().crosses(tree.boundary_of(cursor)) {
      return None;
    }
    tree.parent_of(cursor)
  }
}

impl Default for InjectorRoot {
  fn default() -> Self {
    Self::new()
  }
}

/// Infallible ancestor walk used internally by resolution helpers.
pub(crate) struct Walk<'a> {
  root: &'a InjectorRoot,
  tree: &'a dyn HostTree,
  cursor: Option<NodeId>,
}

impl Iterator for Walk<'_> {
  type Item = Rc<Injector>;

  fn next(&mut self) -> Option<Self::Item> {
    while let Some(current) = self.cursor {
      self.cursor = self.root.next_up(self.tree, current);
      if let Some(injector) = self.root.injector_of(current) {
        return Some(injector);
      }
    }
    None
  }
}

/// Iterator returned by [`InjectorRoot::injectors`].
pub struct Injectors<'a> {
  root: &'a InjectorRoot,
  tree: &'a dyn HostTree,
  start: NodeId,
  cursor: Option<NodeId>,
  revision: u64,
  poisoned: bool,
}

impl Iterator for Injectors<'_> {
  type Item = Result<Rc<Injector>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.poisoned {
      return None;
    }
    while let Some(current) = self.cursor {
      if self.tree.revision() != self.revision {
        self.poisoned = true;
        return Some(Err(ScopeError::MutatedDuringTraversal { start: self.start }));
      }
      self.cursor = self.root.next_up(self.tree, current);
      if let Some(injector) = self.root.injector_of(current) {
        return Some(Ok(injector));
      }
    }
    None
  }
}
