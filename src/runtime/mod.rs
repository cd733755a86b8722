//! Transition execution on a finalized machine.
//!
//! # Key Concepts
//!
//! - **`go_to`**: validated move along a declared edge, with hooks
//! - **`go_back`**: raw pop of the single remembered step, without hooks
//! - **`set_state`**: forced move that skips edges and hooks
//!
//! Nothing here locks. A machine shared between threads needs external
//! synchronization around every mutating call.

mod machine;

pub use machine::StateMachine;
