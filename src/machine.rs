//! The machine itself: one active leaf state, one shared mutable context,
//! and the synchronous `start`/`dispatch` cycle.
//!
//! Dispatch runs to completion before returning: guard evaluation,
//! candidate actions, the bubbling exit chain and the default-entry cascade
//! are all ordinary synchronous calls.  A failure anywhere propagates
//! straight back to the caller and leaves the active pointer wherever it got
//! to; there is no rollback and no retry.

use std::collections::HashMap;

use derive_new::new;
use log::debug;
use serde_json::Value;

use crate::config::StateConfig;
use crate::error::Error;
use crate::graph::StateGraph;
use crate::graph_builder::GraphBuilder;
use crate::registry::Setup;
use crate::state::{Candidate, StateId};

/// Event name entry actions observe during [`StateMachine::start`].
pub const START_EVENT: &str = "hsm.start";

/// An event as seen by actions and guards: the dispatched name plus
/// arbitrary payload data.
#[derive(Debug, Clone, new)]
pub struct Event {
  pub name: String,
  pub data: Value,
}

/// Everything one dispatch did: results of the selected candidate's actions
/// in execution order, and exit/entry action results keyed by the name of
/// each state that was exited/entered (`Value::Null` for states without a
/// declared exit/entry action).  All three empty means the event was
/// unhandled.
#[derive(Debug, Default, PartialEq)]
pub struct DispatchResult {
  pub actions: Vec<Value>,
  pub exit: HashMap<String, Value>,
  pub entry: HashMap<String, Value>,
}

/// Outcome of transition selection: the state whose handler matched, the
/// chain of states between the active leaf and that handler (leaf first,
/// handler excluded), and the matched candidate.
struct Selection {
  handler: StateId,
  bubble_path: Vec<StateId>,
  candidate: Candidate,
}

pub struct StateMachine {
  graph: StateGraph,
  setup: Setup,
  context: Value,
  active: Option<StateId>,
}

impl StateMachine {
  /// Build the state tree from `config` and resolve every symbolic target.
  /// The machine starts out uninitialized; call [`StateMachine::start`]
  /// before dispatching.
  pub fn new(config: StateConfig, setup: Setup) -> Result<Self, Error> {
    let graph = GraphBuilder::new(&config)?.build()?;
    let context = config
        .context
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    Ok(Self {
      graph,
      setup,
      context,
      active: None,
    })
  }

  /// Convenience for configs held as loose JSON.
  pub fn from_value(config: Value, setup: Setup) -> Result<Self, anyhow::Error> {
    let config: StateConfig = serde_json::from_value(config)?;
    Ok(Self::new(config, setup)?)
  }

  /// Name of the active leaf state, if started.
  pub fn active(&self) -> Option<&str> {
    self.active.map(|id| self.graph.name(id))
  }

  pub fn context(&self) -> &Value {
    &self.context
  }

  pub fn graph(&self) -> &StateGraph {
    &self.graph
  }

  /// Activate the root and cascade into default substates, entry actions
  /// firing outermost first.  A second call on a started machine is a no-op.
  pub fn start(&mut self) -> Result<(), Error> {
    if self.active.is_some() {
      return Ok(());
    }
    let event = Event::new(START_EVENT.to_string(), Value::Null);
    self.transition(self.graph.root(), &event)?;
    Ok(())
  }

  /// Resolve `name` against the active leaf and its ancestors, run the
  /// selected candidate, and apply the resulting exit/entry sequence.
  /// Unhandled events return an empty result and have no side effects.
  pub fn dispatch(&mut self, name: &str, data: Value) -> Result<DispatchResult, Error> {
    let leaf = self.active.ok_or(Error::NotStarted)?;
    let event = Event::new(name.to_string(), data);

    let selection = match self.select(leaf, &event)? {
      Some(selection) => selection,
      None => {
        debug!("[{}]: unhandled [{}]", self.graph.name(self.graph.root()), event.name);
        return Ok(DispatchResult::default());
      }
    };
    debug!("[{}] handles [{}]", self.graph.name(selection.handler), event.name);

    // Candidate actions run on selection, before any exit, whether or not a
    // state change follows.
    let mut actions = Vec::with_capacity(selection.candidate.actions.len());
    for action in &selection.candidate.actions {
      actions.push(self.setup.run_action(action, &mut self.context, &event)?);
    }

    let target = match selection.candidate.target {
      Some(target) => target,
      None => {
        // Internal transition: no exit, no entry.
        return Ok(DispatchResult {
          actions,
          ..DispatchResult::default()
        });
      }
    };

    let mut exit = HashMap::new();
    if selection.bubble_path.is_empty() {
      exit.insert(
        self.graph.name(leaf).to_string(),
        self.exit_state(leaf, &event)?,
      );
    } else {
      // Innermost first: the leaf, then each ancestor up to (excluding) the
      // handling state.
      for &id in &selection.bubble_path {
        exit.insert(
          self.graph.name(id).to_string(),
          self.exit_state(id, &event)?,
        );
      }
    }

    let entry = self.transition(target, &event)?;
    Ok(DispatchResult { actions, exit, entry })
  }

  /// Find the state handling `event` by bubbling from the leaf towards the
  /// root.  The first ancestor declaring candidates for the event name gets
  /// to decide: its candidates are evaluated in order and the first whose
  /// guard is absent or passes wins.  If every guard rejects, the event is
  /// unhandled; bubbling does not continue past a declaring state.
  fn select(&self, leaf: StateId, event: &Event) -> Result<Option<Selection>, Error> {
    let mut bubble_path = vec![];
    for id in self.graph.ancestors(leaf) {
      let node = self.graph.node(id);
      if let Some(candidates) = node.handlers.get(&event.name) {
        for candidate in candidates {
          let matches = match &candidate.guard {
            Some(guard) => self.setup.run_guard(guard, &self.context, event)?,
            None => true,
          };
          if matches {
            return Ok(Some(Selection {
              handler: id,
              bubble_path,
              candidate: candidate.clone(),
            }));
          }
        }
        return Ok(None);
      }
      bubble_path.push(id);
    }
    Ok(None)
  }

  /// Make `target` the active state and cascade into its chain of default
  /// substates, entering outermost first, stopping at the first state with
  /// no declared initial child.
  fn transition(&mut self, target: StateId, event: &Event) -> Result<HashMap<String, Value>, Error> {
    let mut entry = HashMap::new();
    let mut current = target;
    self.active = Some(current);
    entry.insert(
      self.graph.name(current).to_string(),
      self.enter_state(current, event)?,
    );

    while let Some(next) = self.graph.node(current).initial {
      current = next;
      self.active = Some(current);
      entry.insert(
        self.graph.name(current).to_string(),
        self.enter_state(current, event)?,
      );
    }
    Ok(entry)
  }

  fn enter_state(&mut self, id: StateId, event: &Event) -> Result<Value, Error> {
    debug!("entering [{}]", self.graph.name(id));
    match self.graph.node(id).entry_action.clone() {
      Some(action) => self.setup.run_action(&action, &mut self.context, event),
      None => Ok(Value::Null),
    }
  }

  fn exit_state(&mut self, id: StateId, event: &Event) -> Result<Value, Error> {
    debug!("exiting [{}]", self.graph.name(id));
    match self.graph.node(id).exit_action.clone() {
      Some(action) => self.setup.run_action(&action, &mut self.context, event),
      None => Ok(Value::Null),
    }
  }
}
