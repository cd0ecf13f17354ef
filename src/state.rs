use std::collections::HashMap;

/// Index of a state in the graph's node arena.  Targets and parent links are
/// stored as ids rather than references so the tree can be both fully
/// connected and plainly owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) usize);

/// One node of the state tree, fully resolved.  Built exclusively by
/// [`crate::graph_builder::GraphBuilder`]; immutable afterwards.
pub(crate) struct StateNode {
  pub(crate) name: String,
  pub(crate) parent: Option<StateId>,
  pub(crate) children: HashMap<String, StateId>,

  /// Default child entered when this node becomes active as a compound
  /// state.  Resolved against the node's own children at build time, so a
  /// present value always points at an existing child.
  pub(crate) initial: Option<StateId>,

  /// Ordered candidate transitions per event name, declared directly on
  /// this node.
  pub(crate) handlers: HashMap<String, Vec<Candidate>>,

  pub(crate) entry_action: Option<String>,
  pub(crate) exit_action: Option<String>,
}

/// One guarded option within an event's handler list.  The first candidate
/// whose guard is absent or passes is selected; a `None` target means an
/// internal transition (actions only, no exit/entry).
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
  pub(crate) target: Option<StateId>,
  pub(crate) guard: Option<String>,
  pub(crate) actions: Vec<String>,
}
