//! Drive attribute behaviors from a stream of tree mutations.

use treescope::{AttributeBehavior, INJECTOR_ATTRIBUTE, MemoryTree, NodeId, TreeScope};

struct Highlight;

impl AttributeBehavior for Highlight {
  fn connected(&mut self, host: NodeId, name: &str, value: &str) {
    println!("  {host}: {name} connected with '{value}'");
  }

  fn value_changed(&mut self, old: &str, new: &str) {
    println!("  value changed '{old}' -> '{new}'");
  }

  fn disconnected(&mut self, host: NodeId) {
    println!("  {host}: disconnected");
  }
}

fn pump(scope: &TreeScope, tree: &MemoryTree) -> treescope::Result<()> {
  for event in tree.take_events() {
    scope.handle(tree, &event)?;
  }
  Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::INFO)
    .init();

  let tree = MemoryTree::new();
  let root = tree.add_root();
  let scope = TreeScope::new();
  scope.attach(&tree, root);
  tree.take_events();

  scope.attributes().define("highlight", || Box::new(Highlight));

  println!("Adding a highlighted item...");
  let item = tree.add_child(root);
  tree.set_attribute(item, "highlight", "subtle");
  tree.set_attribute(item, INJECTOR_ATTRIBUTE, "");
  pump(&scope, &tree)?;

  println!("Changing the highlight...");
  tree.set_attribute(item, "highlight", "loud");
  pump(&scope, &tree)?;

  println!("Removing the item...");
  tree.remove_node(item);
  pump(&scope, &tree)?;

  println!("Connected behaviors left: {}", scope.attributes().connected_count());
  println!("Injectors left: {}", scope.injectors().injector_count());
  Ok(())
}
