use std::collections::HashMap;

use log::trace;

use crate::config::{StateConfig, TransitionConfig};
use crate::error::Error;
use crate::graph::StateGraph;
use crate::state::{Candidate, StateId, StateNode};

/// Two-phase construction of a [`StateGraph`].
///
/// Phase 1 ([`GraphBuilder::new`]) walks the config tree and collects every
/// node, erroring on name collisions.  Phase 2 ([`GraphBuilder::build`])
/// rewrites every symbolic transition target and `initial` name into a
/// direct [`StateId`].  `build` consumes the builder, so the resolution pass
/// runs exactly once per machine and an already-resolved graph can never be
/// resolved again.
pub struct GraphBuilder {
  nodes: Vec<BuildNode>,
  index: HashMap<String, StateId>,
  root: StateId,
}

/// Node as collected from the config, targets still symbolic.
struct BuildNode {
  name: String,
  parent: Option<StateId>,
  children: HashMap<String, StateId>,
  initial: Option<String>,
  handlers: Vec<(String, Vec<TransitionConfig>)>,
  entry_action: Option<String>,
  exit_action: Option<String>,
}

impl GraphBuilder {
  pub fn new(config: &StateConfig) -> Result<Self, Error> {
    let mut builder = Self {
      nodes: vec![],
      index: HashMap::new(),
      root: StateId(0),
    };
    let root_name = config.id.as_deref().unwrap_or("root");
    let root = builder.add_state(root_name, config, None)?;
    builder.root = root;
    Ok(builder)
  }

  fn add_state(
    &mut self,
    name: &str,
    config: &StateConfig,
    parent: Option<StateId>,
  ) -> Result<StateId, Error> {
    if self.index.contains_key(name) {
      return Err(Error::DuplicateName(name.to_string()));
    }

    let id = StateId(self.nodes.len());
    let handlers = config
        .on
        .iter()
        .map(|(event, event_config)| (event.clone(), event_config.clone().into_candidates()))
        .collect();
    self.nodes.push(BuildNode {
      name: name.to_string(),
      parent,
      children: HashMap::new(),
      initial: config.initial.clone(),
      handlers,
      entry_action: config.entry.clone(),
      exit_action: config.exit.clone(),
    });
    self.index.insert(name.to_string(), id);

    for (child_name, child_config) in &config.states {
      let child_id = self.add_state(child_name, child_config, Some(id))?;
      self.nodes[id.0].children.insert(child_name.clone(), child_id);
    }
    Ok(id)
  }

  /// Resolution pass.  Visits every declared candidate of every node exactly
  /// once; resolution is purely local per transition so traversal order does
  /// not matter.
  pub fn build(self) -> Result<StateGraph, Error> {
    let mut resolved = Vec::with_capacity(self.nodes.len());
    for (i, node) in self.nodes.iter().enumerate() {
      let id = StateId(i);

      let initial = match &node.initial {
        Some(initial) => match node.children.get(initial) {
          Some(&child) => Some(child),
          None => {
            return Err(Error::InitialNotFound {
              state: node.name.clone(),
              initial: initial.clone(),
            })
          }
        },
        None => None,
      };

      let mut handlers = HashMap::new();
      for (event, candidates) in &node.handlers {
        let mut out = Vec::with_capacity(candidates.len());
        for candidate in candidates {
          let target = match &candidate.target {
            Some(target) => Some(self.resolve_target(id, target)?),
            None => None,
          };
          out.push(Candidate {
            target,
            guard: candidate.guard.clone(),
            actions: candidate.actions.clone(),
          });
        }
        handlers.insert(event.clone(), out);
      }

      resolved.push(StateNode {
        name: node.name.clone(),
        parent: node.parent,
        children: node.children.clone(),
        initial,
        handlers,
        entry_action: node.entry_action.clone(),
        exit_action: node.exit_action.clone(),
      });
    }

    Ok(StateGraph {
      nodes: resolved,
      index: self.index,
      root: self.root,
    })
  }

  /// The two-step local search: a target declared on state `S` must name a
  /// child of `S` or a child of `S`'s parent.  The machine-wide index is
  /// intentionally not consulted, so a state in a distant branch is not a
  /// legal target even though the index knows its name.
  fn resolve_target(&self, from: StateId, target: &str) -> Result<StateId, Error> {
    let node = &self.nodes[from.0];
    if let Some(&child) = node.children.get(target) {
      trace!("[{}]: target [{}] resolved to child", node.name, target);
      return Ok(child);
    }
    if let Some(parent) = node.parent {
      if let Some(&sibling) = self.nodes[parent.0].children.get(target) {
        trace!("[{}]: target [{}] resolved to sibling", node.name, target);
        return Ok(sibling);
      }
    }
    Err(Error::TargetNotFound {
      target: target.to_string(),
      state: node.name.clone(),
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn build(config: serde_json::Value) -> Result<StateGraph, Error> {
    let config: StateConfig = serde_json::from_value(config).unwrap();
    GraphBuilder::new(&config)?.build()
  }

  fn candidate_target(graph: &StateGraph, state: &str, event: &str) -> StateId {
    let id = graph.lookup(state).unwrap();
    graph.node(id).handlers[event][0].target.unwrap()
  }

  #[test]
  fn duplicate_name_across_branches_fails() {
    let result = build(json!({
      "id": "root",
      "states": {
        "a": { "states": { "leaf": {} } },
        "b": { "states": { "leaf": {} } },
      },
    }));
    assert!(matches!(result, Err(Error::DuplicateName(name)) if name == "leaf"));
  }

  #[test]
  fn unresolvable_initial_fails() {
    let result = build(json!({
      "id": "root",
      "initial": "nope",
      "states": { "a": {} },
    }));
    assert!(matches!(
      result,
      Err(Error::InitialNotFound { state, initial }) if state == "root" && initial == "nope"
    ));
  }

  #[test]
  fn target_resolves_to_own_child() {
    let graph = build(json!({
      "id": "root",
      "states": {
        "a": {
          "on": { "GO": "inner" },
          "states": { "inner": {} },
        },
        "b": {},
      },
    }))
    .unwrap();
    assert_eq!(candidate_target(&graph, "a", "GO"), graph.lookup("inner").unwrap());
  }

  #[test]
  fn target_falls_back_to_sibling() {
    let graph = build(json!({
      "id": "root",
      "states": {
        "a": { "on": { "GO": "b" } },
        "b": {},
      },
    }))
    .unwrap();
    assert_eq!(candidate_target(&graph, "a", "GO"), graph.lookup("b").unwrap());
  }

  #[test]
  fn state_can_target_itself_through_the_sibling_step() {
    let graph = build(json!({
      "id": "root",
      "states": {
        "a": { "on": { "RETRY": "a" } },
      },
    }))
    .unwrap();
    assert_eq!(candidate_target(&graph, "a", "RETRY"), graph.lookup("a").unwrap());
  }

  #[test]
  fn distant_target_is_not_reachable_despite_the_index() {
    // "deep" exists in the machine-wide index, but it is neither a child of
    // "b" nor a child of "b"'s parent, so resolution must refuse it.
    let result = build(json!({
      "id": "root",
      "states": {
        "a": { "states": { "deep": {} } },
        "b": { "on": { "JUMP": "deep" } },
      },
    }));
    assert!(matches!(
      result,
      Err(Error::TargetNotFound { target, state }) if target == "deep" && state == "b"
    ));
  }

  #[test]
  fn root_transitions_resolve_to_its_children() {
    let graph = build(json!({
      "id": "root",
      "on": { "RESET": "a" },
      "states": { "a": {} },
    }))
    .unwrap();
    assert_eq!(candidate_target(&graph, "root", "RESET"), graph.lookup("a").unwrap());
  }

  #[test]
  fn internal_candidates_keep_a_none_target() {
    let graph = build(json!({
      "id": "root",
      "states": {
        "a": { "on": { "TICK": { "actions": ["count"] } } },
      },
    }))
    .unwrap();
    let a = graph.lookup("a").unwrap();
    let candidate = &graph.node(a).handlers["TICK"][0];
    assert_eq!(candidate.target, None);
    assert_eq!(candidate.actions, vec!["count"]);
  }
}
