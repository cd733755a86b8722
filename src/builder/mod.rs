//! Builder API for ergonomic state machine construction.
//!
//! This module provides the fluent [`MachineBuilder`] and the
//! [`state_enum!`](crate::state_enum) macro for declaring states.

pub mod machine;
pub mod macros;

pub use machine::MachineBuilder;
