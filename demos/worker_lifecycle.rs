//! Worker Lifecycle
//!
//! This example walks a background worker through its lifecycle graph.
//!
//! Key concepts:
//! - Declaring the graph with the fluent builder
//! - Per-state and global hooks, run before each move commits
//! - Rejected moves along undeclared edges
//! - One-step `go_back`
//!
//! Run with: cargo run --example worker_lifecycle
//! Set RUST_LOG=waypoint=debug to see the engine's own events.

use tracing_subscriber::EnvFilter;
use waypoint::{state_enum, FsmError, StateMachine};

state_enum! {
    enum Worker {
        Disabled,
        Enabled,
        Initialized,
        Run,
        Stopped,
        Failed,
    }
}

// (*) -> [Disabled] -> [Enabled] -> [Initialized] -> [Run] <-> [Stopped]
//          ^ ^____________|  |          |  |  ^         |
//          |_________________|__________|  |  |------|  v
//                            |-------------|-----> [Failed]
fn worker_machine() -> Result<StateMachine<Worker>, FsmError> {
    StateMachine::<Worker>::builder()
        .add_transitions(Worker::Disabled, [Worker::Enabled])
        .add_transitions(
            Worker::Enabled,
            [Worker::Initialized, Worker::Failed, Worker::Disabled],
        )
        .add_transitions(
            Worker::Initialized,
            [Worker::Run, Worker::Failed, Worker::Disabled],
        )
        .add_transitions(Worker::Run, [Worker::Stopped, Worker::Failed])
        .add_transitions(Worker::Stopped, [Worker::Run])
        .add_transitions(Worker::Failed, [Worker::Initialized, Worker::Disabled])
        .add_after_all_hook(|from, to| {
            println!("  leaving {from} for {to}");
            Ok(())
        })
        .set_before_hook(Worker::Run, |_, _| {
            println!("  spawning worker task");
            Ok(())
        })
        .set_after_hook(Worker::Run, |_, _| {
            println!("  draining worker task");
            Ok(())
        })
        .finalize(Worker::Disabled)
}

fn main() -> Result<(), FsmError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("=== Worker Lifecycle Example ===\n");

    let mut worker = worker_machine()?;
    println!("Initial state: {}", worker.current());

    println!("\nTrying to run a disabled worker:");
    if let Err(err) = worker.go_to(Worker::Run) {
        println!("  rejected: {err}");
    }

    println!("\nBringing the worker up:");
    for step in [Worker::Enabled, Worker::Initialized, Worker::Run] {
        worker.go_to(step)?;
        println!("-> {}", worker.current());
    }

    println!("\nPausing and undoing the pause:");
    worker.go_to(Worker::Stopped)?;
    println!("-> {}", worker.current());
    worker.go_back()?;
    println!("<- {}", worker.current());

    println!("\n=== Example Complete ===");
    Ok(())
}
