//! Embedder-supplied callables, looked up by name at invocation time.
//!
//! The engine never defines actions or guards itself; configs reference them
//! symbolically and the [`Setup`] maps those names to boxed functions.
//! Construction does not validate names against the registry; an
//! unresolved name is a runtime error at the moment of invocation.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Error;
use crate::machine::Event;

/// A named side-effecting action: may mutate the shared context, returns an
/// arbitrary result value that gets surfaced in the dispatch result.
pub type ActionFn = Box<dyn Fn(&mut Value, &Event) -> anyhow::Result<Value> + Send>;

/// A named predicate deciding whether a candidate transition matches.
pub type GuardFn = Box<dyn Fn(&Value, &Event) -> anyhow::Result<bool> + Send>;

/// Registry of actions and guards referenced by name from the config.
/// Both tables default to empty.
#[derive(Default)]
pub struct Setup {
  actions: HashMap<String, ActionFn>,
  guards: HashMap<String, GuardFn>,
}

impl Setup {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
  where
    F: Fn(&mut Value, &Event) -> anyhow::Result<Value> + Send + 'static,
  {
    self.actions.insert(name.into(), Box::new(action));
    self
  }

  /// Register a pre-boxed action, e.g. one built by [`assign`].
  pub fn boxed_action(mut self, name: impl Into<String>, action: ActionFn) -> Self {
    self.actions.insert(name.into(), action);
    self
  }

  pub fn guard<F>(mut self, name: impl Into<String>, guard: F) -> Self
  where
    F: Fn(&Value, &Event) -> anyhow::Result<bool> + Send + 'static,
  {
    self.guards.insert(name.into(), Box::new(guard));
    self
  }

  pub(crate) fn run_action(
    &self,
    name: &str,
    context: &mut Value,
    event: &Event,
  ) -> Result<Value, Error> {
    let action = self
        .actions
        .get(name)
        .ok_or_else(|| Error::MissingAction(name.to_string()))?;
    action(context, event).map_err(|source| Error::ActionFailed {
      name: name.to_string(),
      source,
    })
  }

  pub(crate) fn run_guard(
    &self,
    name: &str,
    context: &Value,
    event: &Event,
  ) -> Result<bool, Error> {
    let guard = self
        .guards
        .get(name)
        .ok_or_else(|| Error::MissingGuard(name.to_string()))?;
    guard(context, event).map_err(|source| Error::GuardFailed {
      name: name.to_string(),
      source,
    })
  }
}

/// Build an action that merges the object computed by `updater` into the
/// machine context, key by key.  The applied patch doubles as the action
/// result.  Context mutation is the only way domain state changes, so most
/// embedders want at least one of these.
pub fn assign<F>(updater: F) -> ActionFn
where
  F: Fn(&Value, &Event) -> Value + Send + 'static,
{
  Box::new(move |context, event| {
    let patch = updater(context, event);
    if let Some(fields) = patch.as_object() {
      if !context.is_object() {
        *context = Value::Object(serde_json::Map::new());
      }
      if let Some(target) = context.as_object_mut() {
        for (key, value) in fields {
          target.insert(key.clone(), value.clone());
        }
      }
    }
    Ok(patch)
  })
}
