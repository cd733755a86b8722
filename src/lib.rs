//! Waypoint: a synchronous finite-state-machine engine
//!
//! Callers declare named states and the directed edges between them, attach
//! hooks, and then drive the machine. Only declared edges can be taken, and
//! hooks run in a fixed order before each move is committed.
//!
//! # Core Concepts
//!
//! - **State**: Comparable name of a node, via the `State` trait
//! - **Graph**: Declared edges, with a one-step memory of how each state was entered
//! - **Hooks**: Callbacks that may veto a transition
//! - **Builder**: Fluent construction with a latched first error
//!
//! Hook order for a move `from -> to`: global "after" hooks, the "after" hook
//! of `from`, global "before" hooks, the "before" hook of `to`.
//!
//! # Example
//!
//! ```rust
//! use waypoint::{FsmError, StateMachine, StateName};
//!
//! let mut worker = StateMachine::<StateName>::builder()
//!     .add_transitions("Disabled", ["Enabled"])
//!     .add_transitions("Enabled", ["Initialized", "Failed", "Disabled"])
//!     .add_transitions("Initialized", ["Run", "Failed", "Disabled"])
//!     .add_transitions("Run", ["Stopped", "Failed"])
//!     .add_transitions("Stopped", ["Run"])
//!     .add_transitions("Failed", ["Initialized", "Disabled"])
//!     .set_before_hook("Run", |from, _| {
//!         println!("starting from {from}");
//!         Ok(())
//!     })
//!     .finalize("Disabled")?;
//!
//! assert!(matches!(worker.go_to("Run"), Err(FsmError::InvalidTransition { .. })));
//!
//! worker.go_to("Enabled")?;
//! worker.go_to("Initialized")?;
//! worker.go_to("Run")?;
//! worker.go_to("Stopped")?;
//! worker.go_back()?;
//! assert_eq!(worker.current().as_str(), "Run");
//! # Ok::<(), FsmError>(())
//! ```

pub mod builder;
pub mod core;
pub mod definition;
pub mod error;
pub mod runtime;

// Re-export commonly used types
pub use builder::MachineBuilder;
pub use core::{Hook, HookPipeline, State, StateGraph, StateName, StateNode};
pub use definition::{DefinitionError, MachineDefinition, TransitionDefinition};
pub use error::{FsmError, HookError, HookPhase};
pub use runtime::StateMachine;
