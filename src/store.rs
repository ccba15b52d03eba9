//! Observable state container with synchronous subscriber notification.

use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::trace;

struct Entry {
  id: u64,
  listener: Rc<dyn Fn(&Value)>,
}

/// Holds a JSON value and notifies subscribers synchronously on every update,
/// in subscription order, with the post-update value.
pub struct Store {
  state: RefCell<Value>,
  entries: Rc<RefCell<Vec<Entry>>>,
  next_id: Cell<u64>,
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping the handle without calling [`Subscription::unsubscribe`] leaves
/// the listener attached for the lifetime of the store.
pub struct Subscription {
  id: u64,
  entries: Weak<RefCell<Vec<Entry>>>,
}

impl Subscription {
  pub fn unsubscribe(self) {
    if let Some(entries) = self.entries.upgrade() {
      entries.borrow_mut().retain(|entry| entry.id != self.id);
    }
  }
}

impl Store {
  pub fn new(initial: Value) -> Self {
    Self {
      state: RefCell::new(initial),
      entries: Rc::new(RefCell::new(Vec::new())),
      next_id: Cell::new(0),
    }
  }

  /// Snapshot of the current state.
  pub fn value(&self) -> Value {
    self.state.borrow().clone()
  }

  /// Reads one key of an object state; `None` when absent or non-object.
  pub fn get_item(&self, key: &str) -> Option<Value> {
    self.state.borrow().as_object().and_then(|map| map.get(key)).cloned()
  }

  /// Writes one key and notifies. Non-object state is replaced by a
  /// single-entry object.
  pub fn set_item(&self, key: impl Into<String>, value: Value) {
    {
      let mut state = self.state.borrow_mut();
      match &mut *state {
        Value::Object(map) => {
          map.insert(key.into(), value);
        }
        other => {
          let mut map = Map::new();
          map.insert(key.into(), value);
          *other = Value::Object(map);
        }
      }
    }
    self.notify();
  }

  /// Applies `patch` and notifies, even when the state is unchanged by it.
  /// Two objects shallow-merge; any other combination replaces the state.
  pub fn update(&self, patch: Value) {
    {
      let mut state = self.state.borrow_mut();
      match (&mut *state, patch) {
        (Value::Object(current), Value::Object(patch)) => {
          for (key, value) in patch {
            current.insert(key, value);
          }
        }
        (current, patch) => *current = patch,
      }
    }
    self.notify();
  }

  /// Registers a listener; it stays attached until unsubscribed or the store
  /// is disposed. The same closure may be subscribed more than once.
  pub fn subscribe(&self, listener: impl Fn(&Value) + 'static) -> Subscription {
    let id = self.next_id.get();
    self.next_id.set(id + 1);
    self.entries.borrow_mut().push(Entry {
      id,
      listener: Rc::new(listener),
    });
    Subscription {
      id,
      entries: Rc::downgrade(&self.entries),
    }
  }

  pub fn subscriber_count(&self) -> usize {
    self.entries.borrow().len()
  }

  pub(crate) fn clear_subscribers(&self) {
    self.entries.borrow_mut().clear();
  }

  /// Listeners are snapshotted first so a listener may subscribe or
  /// unsubscribe mid-notification without corrupting the iteration.
  fn notify(&self) {
    let listeners: Vec<Rc<dyn Fn(&Value)>> = self
      .entries
      .borrow()
      .iter()
      .map(|entry| entry.listener.clone())
      .collect();
    if listeners.is_empty() {
      return;
    }
    trace!(listeners = listeners.len(), "notifying store subscribers");
    let value = self.value();
    for listener in listeners {
      listener(&value);
    }
  }
}

impl fmt::Debug for Store {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Store")
      .field("state", &*self.state.borrow())
      .field("subscribers", &self.subscriber_count())
      .finish()
  }
}
