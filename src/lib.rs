//! A synchronous hierarchical state machine (statechart) engine.
//!
//! A machine is built from a declarative tree of nested states, tracks a
//! single active leaf, and resolves dispatched events by bubbling up the
//! ancestor chain to the first state declaring a handler.  Guarded candidate
//! transitions are selected in declaration order; firing one exits the
//! bubbled states innermost-first and enters the target, cascading into its
//! default substates.  Actions and guards are embedder-supplied callables
//! invoked by name.

pub mod config;
pub mod error;
pub mod graph;
pub mod graph_builder;
pub mod machine;
pub mod registry;
pub mod state;

pub use config::{EventConfig, StateConfig, TransitionConfig};
pub use error::Error;
pub use machine::{DispatchResult, Event, StateMachine, START_EVENT};
pub use registry::{assign, ActionFn, GuardFn, Setup};
pub use state::StateId;
