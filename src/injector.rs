//! Per-node key-value scope.

use crate::types::{NodeId, ScopeValue};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Key-value scope owned by exactly one tree node.
///
/// An injector only answers for its own keys; ancestor fallback lives in
/// [`crate::injector_root::InjectorRoot`].
#[derive(Debug)]
pub struct Injector {
  owner: NodeId,
  values: RefCell<HashMap<String, ScopeValue>>,
}

impl Injector {
  pub fn new(owner: NodeId) -> Self {
    Self {
      owner,
      values: RefCell::new(HashMap::new()),
    }
  }

  /// Node this injector is scoped to.
  pub fn owner(&self) -> NodeId {
    self.owner
  }

  /// Binds `key` locally, replacing any previous binding.
  pub fn set(&self, key: impl Into<String>, value: ScopeValue) {
    self.values.borrow_mut().insert(key.into(), value);
  }

  /// Local lookup only; absent keys are not resolved through ancestors.
  pub fn get(&self, key: &str) -> Option<ScopeValue> {
    self.values.borrow().get(key).cloned()
  }

  /// Removes a local binding, returning it if present.
  pub fn remove(&self, key: &str) -> Option<ScopeValue> {
    self.values.borrow_mut().remove(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.values.borrow().contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.values.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.borrow().is_empty()
  }

  /// Local typed service lookup; `None` when absent or not a `T`.
  pub fn service<T: 'static>(&self, key: &str) -> Option<Rc<T>> {
    self.get(key).and_then(|value| value.downcast::<T>())
  }

  /// Drops every binding and disposes owned contexts. Nested injector and
  /// registry references are dropped without being disposed; they are not
  /// owned by this scope.
  pub(crate) fn dispose(&self) {
    let values = std::mem::take(&mut *self.values.borrow_mut());
    let mut contexts = 0usize;
    for value in values.into_values() {
      if let ScopeValue::Context(context) = value {
        context.dispose();
        contexts += 1;
      }
    }
    debug!(owner = %self.owner, contexts, "disposed injector");
  }
}
