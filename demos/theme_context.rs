//! Share a theme context through a small tree and react to updates.

use serde_json::json;
use std::rc::Rc;
use treescope::{MemoryTree, StaticContext, TreeScope};

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::INFO)
    .init();

  let tree = MemoryTree::new();
  let root = tree.add_root();
  let main = tree.add_child(root);
  let card = tree.add_child(main);
  let button = tree.add_child(card);

  let scope = TreeScope::new();
  scope.attach(&tree, root);
  tree.take_events();

  scope.node(&tree, root).ensure_registry().define(
    "theme",
    StaticContext::new(json!({ "theme": "light", "density": "comfortable" })),
  );

  let provided = scope
    .node(&tree, card)
    .ensure_context("theme")
    .ok_or("no registry defines 'theme'")?;
  let _sub = provided.subscribe(|value| {
    println!("  subscriber saw: {value}");
  });

  let seen = scope
    .node(&tree, button)
    .get_context("theme")
    .ok_or("context not resolvable from the button")?;
  println!("Button resolves the card's context.");
  println!("  Same instance: {}", Rc::ptr_eq(&provided, &seen));
  println!("  Theme: {}", seen.get("theme").unwrap_or_default());

  println!("Switching to dark...");
  provided.set("theme", json!("dark"));
  println!("  Theme now: {}", seen.get("theme").unwrap_or_default());

  Ok(())
}
