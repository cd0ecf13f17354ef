//! Declarative machine configuration as consumed by [`crate::machine::StateMachine::new`].
//!
//! The shapes here mirror what embedders actually write (typically via
//! `serde_json::json!` or a config file): nested state objects with an `on`
//! table whose values come in three forms.  Everything funnels through
//! [`EventConfig::into_candidates`] so the rest of the crate only ever sees
//! one uniform candidate list per event.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateConfig {
  /// Name of the root node.  Ignored on nested states, which are named by
  /// their key in the parent's `states` table.
  pub id: Option<String>,

  /// Initial shared context.  Only meaningful on the root.
  pub context: Option<Value>,

  /// Name of the default child entered when this state becomes active.
  pub initial: Option<String>,

  #[serde(default)]
  pub states: HashMap<String, StateConfig>,

  #[serde(default)]
  pub on: HashMap<String, EventConfig>,

  /// Named action invoked when the state is entered.
  pub entry: Option<String>,

  /// Named action invoked when the state is exited.
  pub exit: Option<String>,
}

/// One entry in a state's `on` table.  Accepts the three shorthand forms the
/// configuration language allows.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventConfig {
  /// `GO: "busy"` -- bare target name.
  Target(String),
  /// `GO: { target: "busy", guard: "isReady" }` -- single candidate.
  Single(TransitionConfig),
  /// `GO: [ {...}, {...} ]` -- ordered candidates, first passing guard wins.
  Many(Vec<TransitionConfig>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransitionConfig {
  /// Symbolic target state name.  Absent means an internal transition:
  /// actions run, no exit/entry.
  pub target: Option<String>,

  /// Named guard predicate.  Absent means the candidate always matches.
  pub guard: Option<String>,

  #[serde(default)]
  pub actions: Vec<String>,
}

impl EventConfig {
  /// Normalize into the uniform ordered candidate list.
  pub fn into_candidates(self) -> Vec<TransitionConfig> {
    match self {
      EventConfig::Target(target) => vec![TransitionConfig {
        target: Some(target),
        ..TransitionConfig::default()
      }],
      EventConfig::Single(candidate) => vec![candidate],
      EventConfig::Many(candidates) => candidates,
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn parse(value: serde_json::Value) -> EventConfig {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn bare_target_normalizes_to_single_candidate() {
    let candidates = parse(json!("busy")).into_candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].target.as_deref(), Some("busy"));
    assert_eq!(candidates[0].guard, None);
    assert!(candidates[0].actions.is_empty());
  }

  #[test]
  fn single_object_keeps_guard_and_actions() {
    let candidates = parse(json!({
      "target": "busy",
      "guard": "isReady",
      "actions": ["notify"],
    }))
    .into_candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].guard.as_deref(), Some("isReady"));
    assert_eq!(candidates[0].actions, vec!["notify"]);
  }

  #[test]
  fn list_preserves_declaration_order() {
    let candidates = parse(json!([
      { "guard": "first", "target": "a" },
      { "target": "b" },
    ]))
    .into_candidates();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].guard.as_deref(), Some("first"));
    assert_eq!(candidates[1].target.as_deref(), Some("b"));
  }

  #[test]
  fn targetless_object_is_an_internal_transition() {
    let candidates = parse(json!({ "actions": ["tick"] })).into_candidates();
    assert_eq!(candidates[0].target, None);
    assert_eq!(candidates[0].actions, vec!["tick"]);
  }

  #[test]
  fn nested_state_config_parses() {
    let config: StateConfig = serde_json::from_value(json!({
      "id": "player",
      "initial": "idle",
      "context": { "volume": 5 },
      "states": {
        "idle": { "on": { "PLAY": "playing" } },
        "playing": { "entry": "startPlayback", "on": { "STOP": "idle" } },
      },
    }))
    .unwrap();
    assert_eq!(config.id.as_deref(), Some("player"));
    assert_eq!(config.initial.as_deref(), Some("idle"));
    assert_eq!(config.states.len(), 2);
    assert_eq!(config.states["playing"].entry.as_deref(), Some("startPlayback"));
  }
}
