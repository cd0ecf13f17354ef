use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  /// Two states share a name, either under the same parent or anywhere in the
  /// tree (every name must be unique in the machine-wide index).
  #[error("duplicate state name [{0}]")]
  DuplicateName(String),

  #[error("initial state [{initial}] is not a child of [{state}]")]
  InitialNotFound { state: String, initial: String },

  /// The two-step local search (children of the declaring state, then
  /// children of its parent) came up empty for a symbolic target.
  #[error("target [{target}] not found in [{state}]")]
  TargetNotFound { target: String, state: String },

  #[error("dispatch called before start()")]
  NotStarted,

  #[error("action [{0}] is not registered")]
  MissingAction(String),

  #[error("guard [{0}] is not registered")]
  MissingGuard(String),

  #[error("action [{name}] failed: {source}")]
  ActionFailed {
    name: String,
    #[source]
    source: anyhow::Error,
  },

  #[error("guard [{name}] failed: {source}")]
  GuardFailed {
    name: String,
    #[source]
    source: anyhow::Error,
  },
}
