//! Host tree contract and an in-memory reference host.
//!
//! The engine never stores tree references; every traversal borrows a
//! [`HostTree`] for the duration of one call and observes whatever structure
//! the host reports at that moment. [`MemoryTree`] is the reference host used
//! by tests and demos. Its mutators panic on misuse (unknown ids, cycles); it
//! is deliberately strict because it stands in for a well-behaved host.

use crate::types::{Boundary, NodeId, TreeEvent};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Read-only view of a node tree, answered at the moment of each call.
pub trait HostTree {
  /// Parent of `node`, absent for a root or an unknown id.
  fn parent_of(&self, node: NodeId) -> Option<NodeId>;

  /// Children of `node` in document order.
  fn children_of(&self, node: NodeId) -> Vec<NodeId>;

  /// Boundary kind `node` establishes.
  fn boundary_of(&self, node: NodeId) -> Boundary;

  /// Current value of the named attribute on `node`.
  fn attribute_of(&self, node: NodeId, name: &str) -> Option<String>;

  /// All attributes of `node` in the order they were first set.
  fn attributes_of(&self, node: NodeId) -> Vec<(String, String)>;

  /// Counter the host bumps on every structural mutation. Attribute edits do
  /// not count; only changes that can invalidate an ancestor walk do.
  fn revision(&self) -> u64;
}

struct NodeData {
  parent: Option<NodeId>,
  children: Vec<NodeId>,
  boundary: Boundary,
  attributes: Vec<(String, String)>,
}

/// In-memory tree that queues a [`TreeEvent`] for every observable mutation.
///
/// Events accumulate until drained with [`MemoryTree::take_events`], which
/// lets a test or demo decide when the engine reacts to them.
pub struct MemoryTree {
  nodes: RefCell<HashMap<NodeId, NodeData>>,
  root: Cell<Option<NodeId>>,
  next_id: Cell<u64>,
  revision: Cell<u64>,
  events: RefCell<Vec<TreeEvent>>,
}

impl MemoryTree {
  pub fn new() -> Self {
    Self {
      nodes: RefCell::new(HashMap::new()),
      root: Cell::new(None),
      next_id: Cell::new(0),
      revision: Cell::new(0),
      events: RefCell::new(Vec::new()),
    }
  }

  pub fn root(&self) -> Option<NodeId> {
    self.root.get()
  }

  pub fn contains(&self, node: NodeId) -> bool {
    self.nodes.borrow().contains_key(&node)
  }

  pub fn node_count(&self) -> usize {
    self.nodes.borrow().len()
  }

  /// Creates the single root node.
  pub fn add_root(&self) -> NodeId {
    assert!(self.root.get().is_none(), "tree already has a root");
    let id = self.alloc(None, Boundary::None);
    self.root.set(Some(id));
    id
  }

  /// Appends a new child under `parent`.
  pub fn add_child(&self, parent: NodeId) -> NodeId {
    self.add_child_with_boundary(parent, Boundary::None)
  }

  /// Appends a new child that establishes the given boundary.
  pub fn add_child_with_boundary(&self, parent: NodeId, boundary: Boundary) -> NodeId {
    assert!(self.contains(parent), "add_child: unknown parent {parent}");
    self.alloc(Some(parent), boundary)
  }

  /// Sets an attribute and queues the change, including a set to the same
  /// value.
  pub fn set_attribute(&self, node: NodeId, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    let old = {
      let mut nodes = self.nodes.borrow_mut();
      let Some(data) = nodes.get_mut(&node) else {
        panic!("set_attribute: unknown node {node}");
      };
      match data.attributes.iter_mut().find(|(existing, _)| *existing == name) {
        Some((_, slot)) => Some(std::mem::replace(slot, value.clone())),
        None => {
          data.attributes.push((name.clone(), value.clone()));
          None
        }
      }
    };
    self.events.borrow_mut().push(TreeEvent::AttributeChanged {
      node,
      name,
      old,
      new: Some(value),
    });
  }

  /// Removes an attribute; removing an absent attribute queues nothing.
  pub fn remove_attribute(&self, node: NodeId, name: &str) {
    let old = {
      let mut nodes = self.nodes.borrow_mut();
      let Some(data) = nodes.get_mut(&node) else {
        panic!("remove_attribute: unknown node {node}");
      };
      data
        .attributes
        .iter()
        .position(|(existing, _)| existing == name)
        .map(|index| data.attributes.remove(index).1)
    };
    if let Some(old) = old {
      self.events.borrow_mut().push(TreeEvent::AttributeChanged {
        node,
        name: name.to_owned(),
        old: Some(old),
        new: None,
      });
    }
  }

  /// Removes `node` and its whole subtree, queueing one disconnect per node
  /// in document order, parents before children.
  pub fn remove_node(&self, node: NodeId) {
    assert!(self.contains(node), "remove_node: unknown node {node}");
    let order = self.collect_subtree(node);
    {
      let mut nodes = self.nodes.borrow_mut();
      let parent = nodes.get(&node).and_then(|data| data.parent);
      if let Some(parent) = parent {
        if let Some(data) = nodes.get_mut(&parent) {
          data.children.retain(|child| *child != node);
        }
      }
      for id in &order {
        nodes.remove(id);
      }
    }
    if self.root.get() == Some(node) {
      self.root.set(None);
    }
    self.bump();
    let mut events = self.events.borrow_mut();
    for id in order {
      events.push(TreeEvent::Disconnected { node: id });
    }
  }

  /// Reparents `node` under `new_parent` as one structural change. No
  /// connect or disconnect events are queued; the node never leaves the tree.
  pub fn move_node(&self, node: NodeId, new_parent: NodeId) {
    assert!(self.contains(node), "move_node: unknown node {node}");
    assert!(self.contains(new_parent), "move_node: unknown parent {new_parent}");
    assert!(self.root.get() != Some(node), "move_node: cannot move the root");
    assert!(
      !self.collect_subtree(node).contains(&new_parent),
      "move_node: {new_parent} is inside the subtree of {node}"
    );
    {
      let mut nodes = self.nodes.borrow_mut();
      let old_parent = nodes.get(&node).and_then(|data| data.parent);
      if let Some(old_parent) = old_parent {
        if let Some(data) = nodes.get_mut(&old_parent) {
          data.children.retain(|child| *child != node);
        }
      }
      if let Some(data) = nodes.get_mut(&new_parent) {
        data.children.push(node);
      }
      if let Some(data) = nodes.get_mut(&node) {
        data.parent = Some(new_parent);
      }
    }
    self.bump();
  }

  /// Drains the queued mutation events in the order they happened.
  pub fn take_events(&self) -> Vec<TreeEvent> {
    std::mem::take(&mut *self.events.borrow_mut())
  }

  fn alloc(&self, parent: Option<NodeId>, boundary: Boundary) -> NodeId {
    let id = NodeId::new(self.next_id.get());
    self.next_id.set(id.raw() + 1);
    {
      let mut nodes = self.nodes.borrow_mut();
      nodes.insert(id, NodeData {
        parent,
        children: Vec::new(),
        boundary,
        attributes: Vec::new(),
      });
      if let Some(parent) = parent {
        if let Some(data) = nodes.get_mut(&parent) {
          data.children.push(id);
        }
      }
    }
    self.bump();
    self.events.borrow_mut().push(TreeEvent::Connected { node: id });
    id
  }

  fn collect_subtree(&self, node: NodeId) -> Vec<NodeId> {
    let nodes = self.nodes.borrow();
    let mut order = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
      order.push(current);
      if let Some(data) = nodes.get(&current) {
        for child in data.children.iter().rev() {
          stack.push(*child);
        }
      }
    }
    order
  }

  fn bump(&self) {
    self.revision.set(self.revision.get() + 1);
  }
}

impl Default for MemoryTree {
  fn default() -> Self {
    Self::new()
  }
}

impl HostTree for MemoryTree {
  fn parent_of(&self, node: NodeId) -> Option<NodeId> {
    self.nodes.borrow().get(&node).and_then(|data| data.parent)
  }

  fn children_of(&self, node: NodeId) -> Vec<NodeId> {
    self
      .nodes
      .borrow()
      .get(&node)
      .map(|data| data.children.clone())
      .unwrap_or_default()
  }

  fn boundary_of(&self, node: NodeId) -> Boundary {
    self
      .nodes
      .borrow()
      .get(&node)
      .map(|data| data.boundary)
      .unwrap_or_default()
  }

  fn attribute_of(&self, node: NodeId, name: &str) -> Option<String> {
    self.nodes.borrow().get(&node).and_then(|data| {
      data
        .attributes
        .iter()
        .find(|(existing, _)| existing == name)
        .map(|(_, value)| value.clone())
    })
  }

  fn attributes_of(&self, node: NodeId) -> Vec<(String, String)> {
    self
      .nodes
      .borrow()
      .get(&node)
      .map(|data| data.attributes.clone())
      .unwrap_or_default()
  }

  fn revision(&self) -> u64 {
    self.revision.get()
  }
}
