//! Context definitions, the type registry, live contexts, and node access.
//!
//! A registry published on an injector makes its context types discoverable
//! by every descendant node. Live contexts are created lazily from the
//! nearest defining registry and cached on the requesting node's injector,
//! where descendants find and share them.

use crate::injector_root::InjectorRoot;
use crate::store::{Store, Subscription};
use crate::tree::HostTree;
use crate::types::{NodeId, ScopeValue};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Reserved injector key under which a context registry is published.
pub const CONTEXT_REGISTRY_KEY: &str = "customContexts";

/// Reserved injector key caching a live context of the given type.
pub fn context_key(context_type: &str) -> String {
  format!("{CONTEXT_REGISTRY_KEY}:{context_type}")
}

/// Defines how contexts of one type start out and answer queries.
pub trait ContextDefinition {
  /// Initial store state for a newly created context.
  fn initial_value(&self) -> Value;

  /// Optional query handler; the default supports no queries.
  fn handle_query(&self, state: &Value, query: &Value) -> Option<Value> {
    let _ = (state, query);
    None
  }
}

/// Definition that seeds every new context with a fixed value.
pub struct StaticContext {
  initial: Value,
}

impl StaticContext {
  pub fn new(initial: Value) -> Self {
    Self { initial }
  }
}

impl ContextDefinition for StaticContext {
  fn initial_value(&self) -> Value {
    self.initial.clone()
  }
}

/// Maps context type names to their definitions.
#[derive(Default)]
pub struct ContextRegistry {
  definitions: RefCell<HashMap<String, Rc<dyn ContextDefinition>>>,
}

impl ContextRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a definition, replacing any previous one for the type.
  /// Contexts already created from the old definition are unaffected.
  pub fn define(
    &self,
    context_type: impl Into<String>,
    definition: impl ContextDefinition + 'static,
  ) {
    let context_type = context_type.into();
    debug!(context_type = %context_type, "defined context type");
    self
      .definitions
      .borrow_mut()
      .insert(context_type, Rc::new(definition));
  }

  pub fn defines(&self, context_type: &str) -> bool {
    self.definitions.borrow().contains_key(context_type)
  }

  pub fn definition(&self, context_type: &str) -> Option<Rc<dyn ContextDefinition>> {
    self.definitions.borrow().get(context_type).cloned()
  }

  /// Registered type names, sorted.
  pub fn types(&self) -> Vec<String> {
    let mut types: Vec<String> = self.definitions.borrow().keys().cloned().collect();
    types.sort();
    types
  }
}

impl fmt::Debug for ContextRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContextRegistry")
      .field("types", &self.types())
      .finish()
  }
}

/// Live observable context of one type.
///
/// The injector caching the context owns it; disposal of that injector
/// disposes the context. Identity matters: descendants sharing a provider
/// receive clones of the same `Rc`.
pub struct CustomContext {
  context_type: String,
  store: Store,
  definition: Rc<dyn ContextDefinition>,
}

impl CustomContext {
  pub(crate) fn from_definition(
    context_type: impl Into<String>,
    definition: Rc<dyn ContextDefinition>,
  ) -> Self {
    let store = Store::new(definition.initial_value());
    Self {
      context_type: context_type.into(),
      store,
      definition,
    }
  }

  pub fn context_type(&self) -> &str {
    &self.context_type
  }

  /// Snapshot of the backing store state.
  pub fn value(&self) -> Value {
    self.store.value()
  }

  pub fn get(&self, key: &str) -> Option<Value> {
    self.store.get_item(key)
  }

  /// Writes one key; subscribers are notified before this returns.
  pub fn set(&self, key: impl Into<String>, value: Value) {
    self.store.set_item(key, value);
  }

  /// Applies a patch through the backing store's merge rules.
  pub fn update(&self, patch: Value) {
    self.store.update(patch);
  }

  pub fn subscribe(&self, listener: impl Fn(&Value) + 'static) -> Subscription {
    self.store.subscribe(listener)
  }

  /// Backing store, for callers that want store-level access.
  pub fn store(&self) -> &Store {
    &self.store
  }

  /// Delegates to the definition's query handler over the current state.
  pub fn query(&self, query: &Value) -> Option<Value> {
    self.definition.handle_query(&self.store.value(), query)
  }

  pub(crate) fn dispose(&self) {
    debug!(context_type = %self.context_type, "disposed context");
    self.store.clear_subscribers();
  }
}

impl fmt::Debug for CustomContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CustomContext")
      .field("context_type", &self.context_type)
      .field("store", &self.store)
      .finish()
  }
}

/// Context operations from the point of view of one node.
pub struct NodeScope<'a> {
  root: &'a InjectorRoot,
  tree: &'a dyn HostTree,
  node: NodeId,
}

impl<'a> NodeScope<'a> {
  pub fn new(root: &'a InjectorRoot, tree: &'a dyn HostTree, node: NodeId) -> Self {
    Self { root, tree, node }
  }

  pub fn node(&self) -> NodeId {
    self.node
  }

  /// Closest registry published on the ancestor path, if any.
  pub fn registry(&self) -> Option<Rc<ContextRegistry>> {
    self
      .root
      .resolve(self.tree, self.node, CONTEXT_REGISTRY_KEY)
      .and_then(|value| value.as_registry())
  }

  /// Registry published on this node's own injector, created on first call.
  pub fn ensure_registry(&self) -> Rc<ContextRegistry> {
    let injector = self.root.ensure_injector(self.node);
    if let Some(existing) = injector
      .get(CONTEXT_REGISTRY_KEY)
      .and_then(|value| value.as_registry())
    {
      return existing;
    }
    let registry = Rc::new(ContextRegistry::new());
    injector.set(CONTEXT_REGISTRY_KEY, ScopeValue::Registry(registry.clone()));
    registry
  }

  /// Creates a fresh context from the nearest registry defining the type,
  /// without caching it anywhere. `None` when no reachable registry defines
  /// `context_type`.
  pub fn create_context(&self, context_type: &str) -> Option<Rc<CustomContext>> {
    let definition = self.find_definition(context_type)?;
    Some(Rc::new(CustomContext::from_definition(context_type, definition)))
  }

  /// Closest cached context of the type on the ancestor path.
  pub fn get_context(&self, context_type: &str) -> Option<Rc<CustomContext>> {
    self
      .root
      .resolve(self.tree, self.node, &context_key(context_type))
      .and_then(|value| value.as_context())
  }

  /// Cached context on this node's own injector only.
  pub fn get_own_context(&self, context_type: &str) -> Option<Rc<CustomContext>> {
    self
      .root
      .injector_of(self.node)?
      .get(&context_key(context_type))?
      .as_context()
  }

  pub fn has_context(&self, context_type: &str) -> bool {
    self.get_context(context_type).is_some()
  }

  pub fn has_own_context(&self, context_type: &str) -> bool {
    self.get_own_context(context_type).is_some()
  }

  /// This node's own cached context, creating and caching it on first call.
  /// Later calls return the same instance; descendants calling
  /// [`NodeScope::get_context`] share it. `None` when no reachable registry
  /// defines the type.
  pub fn ensure_context(&self, context_type: &str) -> Option<Rc<CustomContext>> {
    if let Some(existing) = self.get_own_context(context_type) {
      return Some(existing);
    }
    let context = self.create_context(context_type)?;
    self
      .root
      .ensure_injector(self.node)
      .set(context_key(context_type), ScopeValue::Context(context.clone()));
    debug!(node = %self.node, context_type, "created context");
    Some(context)
  }

  /// Queries the closest context of the type; `None` when no context
  /// resolves or its definition does not support querying.
  pub fn query_context(&self, context_type: &str, query: &Value) -> Option<Value> {
    self.get_context(context_type)?.query(query)
  }

  /// Walks ancestor registries until one defines the type; a closer
  /// registry without the type does not mask a farther one that has it.
  fn find_definition(&self, context_type: &str) -> Option<Rc<dyn ContextDefinition>> {
    self.root.walk(self.tree, self.node).find_map(|injector| {
      injector
        .get(CONTEXT_REGISTRY_KEY)
        .and_then(|value| value.as_registry())
        .and_then(|registry| registry.definition(context_type))
    })
  }
}
