//! Value kinds an injector scope can hold.

use crate::context::{ContextRegistry, CustomContext};
use crate::injector::Injector;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// One value stored under a key in an injector scope.
///
/// `Service` carries an arbitrary shared object; the other variants are the
/// engine's own reference types, kept as distinct variants so lookups can
/// recover them without downcasting.
#[derive(Clone)]
pub enum ScopeValue {
  /// Arbitrary shared service object, recovered via [`ScopeValue::downcast`].
  Service(Rc<dyn Any>),
  /// A context registry published for descendant nodes.
  Registry(Rc<ContextRegistry>),
  /// A live custom context owned by the storing injector.
  Context(Rc<CustomContext>),
  /// A reference to another injector.
  Injector(Rc<Injector>),
}

impl ScopeValue {
  /// Wraps an arbitrary service object.
  pub fn service<T: 'static>(value: T) -> Self {
    ScopeValue::Service(Rc::new(value))
  }

  /// Recovers a typed service, if this is a `Service` of type `T`.
  pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
    match self {
      ScopeValue::Service(value) => value.clone().downcast::<T>().ok(),
      _ => None,
    }
  }

  pub fn as_registry(&self) -> Option<Rc<ContextRegistry>> {
    match self {
      ScopeValue::Registry(registry) => Some(registry.clone()),
      _ => None,
    }
  }

  pub fn as_context(&self) -> Option<Rc<CustomContext>> {
    match self {
      ScopeValue::Context(context) => Some(context.clone()),
      _ => None,
    }
  }

  pub fn as_injector(&self) -> Option<Rc<Injector>> {
    match self {
      ScopeValue::Injector(injector) => Some(injector.clone()),
      _ => None,
    }
  }
}

impl fmt::Debug for ScopeValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ScopeValue::Service(_) => f.write_str("Service(..)"),
      ScopeValue::Registry(_) => f.write_str("Registry(..)"),
      ScopeValue::Context(context) => write!(f, "Context({})", context.context_type()),
      ScopeValue::Injector(injector) => write!(f, "Injector({})", injector.owner()),
    }
  }
}
