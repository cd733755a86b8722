//! Core graph and hook types.
//!
//! This module contains the building blocks the state machine is made of:
//! - State identity via the `State` trait
//! - The state graph with its declared edges
//! - The hook pipeline run around each transition

mod graph;
mod hooks;
mod state;

pub use graph::{StateGraph, StateNode};
pub use hooks::{Hook, HookPipeline};
pub use state::{State, StateName};
