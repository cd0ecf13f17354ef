use std::collections::HashMap;

use crate::state::{StateId, StateNode};

/// The resolved state tree: a flat arena of nodes plus a machine-wide
/// name index.  Nodes reference each other by [`StateId`], with the parent
/// link giving the ancestor chain and the child map giving the tree shape.
pub struct StateGraph {
  pub(crate) nodes: Vec<StateNode>,
  pub(crate) index: HashMap<String, StateId>,
  pub(crate) root: StateId,
}

impl StateGraph {
  pub(crate) fn node(&self, id: StateId) -> &StateNode {
    &self.nodes[id.0]
  }

  pub fn root(&self) -> StateId {
    self.root
  }

  pub fn name(&self, id: StateId) -> &str {
    &self.node(id).name
  }

  /// Look a state up in the machine-wide name index.  Note that target
  /// resolution deliberately does NOT go through here; it only ever searches
  /// the declaring state's children and its parent's children.
  pub fn lookup(&self, name: &str) -> Option<StateId> {
    self.index.get(name).copied()
  }

  /// Walk from `id` up through its ancestors to the root, inclusive.
  pub(crate) fn ancestors(&self, id: StateId) -> impl Iterator<Item = StateId> + '_ {
    let mut cursor = Some(id);
    std::iter::from_fn(move || {
      let current = cursor?;
      cursor = self.node(current).parent;
      Some(current)
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use crate::graph_builder::GraphBuilder;

  use super::*;

  fn graph(config: serde_json::Value) -> StateGraph {
    let config = serde_json::from_value(config).unwrap();
    GraphBuilder::new(&config).unwrap().build().unwrap()
  }

  #[test]
  fn index_covers_every_node() {
    let graph = graph(json!({
      "id": "root",
      "states": {
        "a": { "states": { "a1": {} } },
        "b": {},
      },
    }));
    for name in ["root", "a", "a1", "b"] {
      let id = graph.lookup(name).unwrap();
      assert_eq!(graph.name(id), name);
    }
    assert_eq!(graph.lookup("missing"), None);
  }

  #[test]
  fn ancestors_walk_leaf_to_root() {
    let graph = graph(json!({
      "id": "root",
      "states": { "a": { "states": { "a1": {} } } },
    }));
    let a1 = graph.lookup("a1").unwrap();
    let names: Vec<&str> = graph.ancestors(a1).map(|id| graph.name(id)).collect();
    assert_eq!(names, vec!["a1", "a", "root"]);
  }
}
