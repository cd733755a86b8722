//! Definition validation errors.

use thiserror::Error;

/// Problems found in a [`MachineDefinition`](super::MachineDefinition).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// A transition names the same state on both ends
    #[error("self-loop declared on state {state}")]
    SelfLoop { state: String },

    /// A transition entry lists no target states
    #[error("transition from {from} has no targets")]
    EmptyTargets { from: String },

    /// The same state is listed twice in `states`
    #[error("state {state} is listed more than once")]
    DuplicateState { state: String },

    /// The initial state appears nowhere else in a non-empty definition
    #[error("initial state {state} is not part of the graph")]
    UnknownInitial { state: String },
}
