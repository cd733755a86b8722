//! State machine that walks declared edges and runs hooks.

use crate::builder::MachineBuilder;
use crate::core::{HookPipeline, State, StateGraph};
use crate::error::FsmError;
use tracing::debug;

/// A finalized state machine.
///
/// Obtained from [`MachineBuilder::finalize`]. Every value has a current
/// state; [`go_to`](Self::go_to) moves along declared edges and
/// [`go_back`](Self::go_back) returns to where the current state was entered
/// from.
///
/// Cloning yields a fully independent machine: graph and hook collections are
/// copied, so mutating one copy never affects the other.
///
/// # Example
///
/// ```rust
/// use waypoint::{FsmError, StateMachine, StateName};
///
/// let mut machine = StateMachine::<StateName>::builder()
///     .add_transition("Idle", "Busy")
///     .add_transition("Busy", "Idle")
///     .finalize("Idle")
///     .unwrap();
///
/// machine.go_to("Busy").unwrap();
/// assert_eq!(machine.current().as_str(), "Busy");
///
/// machine.go_back().unwrap();
/// assert_eq!(machine.current().as_str(), "Idle");
///
/// let err = machine.go_to("Missing").unwrap_err();
/// assert!(matches!(err, FsmError::StateNotFound { .. }));
/// ```
#[derive(Debug, Clone)]
pub struct StateMachine<S: State> {
    current: S,
    graph: StateGraph<S>,
    hooks: HookPipeline<S>,
    rewound: bool,
}

impl<S: State> StateMachine<S> {
    /// Start building an empty machine.
    pub fn builder() -> MachineBuilder<S> {
        MachineBuilder::new()
    }

    /// Assemble a machine, entering `initial` as if by [`set_state`](Self::set_state)
    /// from `previous`.
    pub(crate) fn from_parts(
        mut graph: StateGraph<S>,
        hooks: HookPipeline<S>,
        previous: Option<S>,
        initial: S,
    ) -> Self {
        graph.set_prev(initial.clone(), previous);
        Self {
            current: initial,
            graph,
            hooks,
            rewound: false,
        }
    }

    /// Get current state
    pub fn current(&self) -> &S {
        &self.current
    }

    /// The state [`go_back`](Self::go_back) would return to, if any.
    ///
    /// `None` once the remembered step has been consumed by a `go_back`.
    pub fn previous(&self) -> Option<&S> {
        if self.rewound {
            return None;
        }
        self.graph.node(&self.current).and_then(|node| node.prev())
    }

    pub fn graph(&self) -> &StateGraph<S> {
        &self.graph
    }

    pub fn hooks(&self) -> &HookPipeline<S> {
        &self.hooks
    }

    pub fn has_state(&self, state: &S) -> bool {
        self.graph.contains(state)
    }

    pub fn has_transition(&self, from: &S, to: &S) -> bool {
        self.graph.has_edge(from, to)
    }

    /// Check whether [`go_to`](Self::go_to) would pass its graph checks.
    ///
    /// Hooks are not consulted.
    pub fn can_go_to(&self, target: &S) -> bool {
        self.graph.contains(target)
            && (*target == self.current || self.graph.has_edge(&self.current, target))
    }

    /// Declare a new edge on the finalized machine.
    pub fn add_transition(&mut self, from: impl Into<S>, to: impl Into<S>) -> Result<(), FsmError> {
        self.graph.add_edge(from.into(), to.into())
    }

    /// Remove a declared edge. Returns whether it existed.
    pub fn remove_transition(&mut self, from: &S, to: &S) -> bool {
        self.graph.remove_edge(from, to)
    }

    /// Force the machine into `state`, skipping edge checks and hooks.
    ///
    /// The state is registered if unseen and remembers the old current state
    /// as the one it was entered from.
    pub fn set_state(&mut self, state: impl Into<S>) {
        let state = state.into();
        debug!(from = self.current.name(), to = state.name(), "forcing state");

        let previous = std::mem::replace(&mut self.current, state.clone());
        self.graph.set_prev(state, Some(previous));
        self.rewound = false;
    }

    /// Move along the declared edge from the current state to `target`.
    ///
    /// Requesting the current state is a no-op that runs no hooks. If any
    /// hook fails the error is returned and the machine stays where it was.
    pub fn go_to(&mut self, target: impl Into<S>) -> Result<(), FsmError> {
        let target = target.into();

        if !self.graph.contains(&target) {
            return Err(FsmError::state_not_found(target.name()));
        }
        if target == self.current {
            return Ok(());
        }
        if !self.graph.has_edge(&self.current, &target) {
            return Err(FsmError::invalid_transition(
                self.current.name(),
                target.name(),
            ));
        }

        self.hooks.execute(&self.current, &target)?;

        debug!(
            from = self.current.name(),
            to = target.name(),
            "transition committed"
        );
        let previous = std::mem::replace(&mut self.current, target.clone());
        self.graph.set_prev(target, Some(previous));
        self.rewound = false;
        Ok(())
    }

    /// Return to the state the current state was entered from.
    ///
    /// This pops the single remembered step without running hooks. The edge
    /// back must still be declared; an empty slot counts as an undeclared
    /// edge. Only one step is remembered: a second call without an
    /// intervening [`go_to`](Self::go_to) or [`set_state`](Self::set_state)
    /// fails with [`FsmError::NoHistory`].
    pub fn go_back(&mut self) -> Result<(), FsmError> {
        let node = self
            .graph
            .node(&self.current)
            .ok_or_else(|| FsmError::state_not_found(self.current.name()))?;

        if self.rewound {
            return Err(FsmError::NoHistory {
                state: self.current.name().to_string(),
            });
        }
        let Some(prev) = node.prev().cloned() else {
            return Err(FsmError::invalid_transition(self.current.name(), ""));
        };

        if !node.sources().contains(&prev) {
            return Err(FsmError::invalid_transition(
                self.current.name(),
                prev.name(),
            ));
        }
        if !self.graph.contains(&prev) {
            return Err(FsmError::state_not_found(prev.name()));
        }

        debug!(from = self.current.name(), to = prev.name(), "went back");
        self.current = prev;
        self.rewound = true;
        Ok(())
    }

    /// Run the rollback hook registered for `from`.
    ///
    /// The machine never calls this itself; callers invoke it after a failed
    /// [`go_to`](Self::go_to) when they want compensation.
    pub fn rollback(&self, from: impl Into<S>, to: impl Into<S>) -> Result<(), FsmError> {
        self.hooks.execute_rollback(&from.into(), &to.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateName;
    use crate::error::HookPhase;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn s(name: &str) -> StateName {
        StateName::from(name)
    }

    fn triangle() -> StateMachine<StateName> {
        StateMachine::<StateName>::builder()
            .add_transitions("A", ["B", "C"])
            .add_transition("B", "A")
            .add_transition("C", "B")
            .finalize("A")
            .unwrap()
    }

    #[test]
    fn go_to_follows_declared_edge() {
        let mut machine = triangle();

        machine.go_to("B").unwrap();

        assert_eq!(machine.current(), &s("B"));
        assert_eq!(machine.previous(), Some(&s("A")));
    }

    #[test]
    fn go_to_unknown_state_fails() {
        let mut machine = triangle();
        let err = machine.go_to("Z").unwrap_err();

        assert!(matches!(err, FsmError::StateNotFound { ref state } if state == "Z"));
        assert_eq!(machine.current(), &s("A"));
    }

    #[test]
    fn go_to_undeclared_edge_fails() {
        let mut machine = triangle();
        machine.go_to("C").unwrap();

        let err = machine.go_to("A").unwrap_err();

        assert!(matches!(
            err,
            FsmError::InvalidTransition { ref from, ref to } if from == "C" && to == "A"
        ));
        assert_eq!(machine.current(), &s("C"));
    }

    #[test]
    fn go_to_current_state_runs_no_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut machine = StateMachine::<StateName>::builder()
            .add_transition("A", "B")
            .add_before_all_hook(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .finalize("A")
            .unwrap();

        machine.go_to("A").unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(machine.current(), &s("A"));
    }

    #[test]
    fn failing_hook_keeps_current_state() {
        let mut machine = StateMachine::<StateName>::builder()
            .add_transition("A", "B")
            .set_before_hook("B", |_, _| Err("not ready".into()))
            .finalize("A")
            .unwrap();

        let err = machine.go_to("B").unwrap_err();

        assert!(matches!(err, FsmError::HookFailed { .. }));
        assert_eq!(machine.current(), &s("A"));
        assert_eq!(machine.graph().node(&s("B")).unwrap().prev(), None);
    }

    #[test]
    fn hooks_see_origin_and_target() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut machine = StateMachine::<StateName>::builder()
            .add_transition("A", "B")
            .add_after_all_hook(move |from, to| {
                sink.lock().unwrap().push((from.clone(), to.clone()));
                Ok(())
            })
            .finalize("A")
            .unwrap();

        machine.go_to("B").unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(s("A"), s("B"))]);
    }

    #[test]
    fn go_back_returns_to_previous_state() {
        let mut machine = triangle();
        machine.go_to("B").unwrap();

        machine.go_back().unwrap();

        assert_eq!(machine.current(), &s("A"));
    }

    #[test]
    fn go_back_skips_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut machine = StateMachine::<StateName>::builder()
            .add_transition("A", "B")
            .add_before_all_hook(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .finalize("A")
            .unwrap();

        machine.go_to("B").unwrap();
        machine.go_back().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn go_back_after_edge_removal_fails() {
        let mut machine = triangle();
        machine.go_to("B").unwrap();
        assert!(machine.remove_transition(&s("A"), &s("B")));

        let err = machine.go_back().unwrap_err();

        assert!(matches!(
            err,
            FsmError::InvalidTransition { ref from, ref to } if from == "B" && to == "A"
        ));
        assert_eq!(machine.current(), &s("B"));
    }

    #[test]
    fn go_back_twice_fails() {
        let mut machine = triangle();
        machine.go_to("C").unwrap();
        machine.go_to("B").unwrap();

        machine.go_back().unwrap();
        assert_eq!(machine.current(), &s("C"));

        let err = machine.go_back().unwrap_err();
        assert!(matches!(err, FsmError::NoHistory { ref state } if state == "C"));
        assert_eq!(machine.current(), &s("C"));
    }

    #[test]
    fn go_to_after_go_back_restores_history() {
        let mut machine = triangle();
        machine.go_to("B").unwrap();
        machine.go_back().unwrap();
        machine.go_to("C").unwrap();

        machine.go_back().unwrap();
        assert_eq!(machine.current(), &s("A"));
    }

    #[test]
    fn go_back_from_initial_state_is_invalid() {
        let mut machine = triangle();

        let err = machine.go_back().unwrap_err();

        assert!(matches!(
            err,
            FsmError::InvalidTransition { ref from, ref to } if from == "A" && to.is_empty()
        ));
        assert_eq!(machine.current(), &s("A"));
    }

    #[test]
    fn previous_is_cleared_by_go_back() {
        let mut machine = triangle();
        machine.go_to("C").unwrap();
        machine.go_to("B").unwrap();
        assert_eq!(machine.previous(), Some(&s("C")));

        machine.go_back().unwrap();
        assert_eq!(machine.previous(), None);
        assert_eq!(machine.graph().node(&s("C")).unwrap().prev(), Some(&s("A")));

        machine.go_to("B").unwrap();
        assert_eq!(machine.previous(), Some(&s("C")));
    }

    #[test]
    fn failing_after_hook_names_origin() {
        let mut machine = StateMachine::<StateName>::builder()
            .add_transition("A", "B")
            .set_after_hook("A", |_, _| Err("still draining".into()))
            .finalize("A")
            .unwrap();

        let err = machine.go_to("B").unwrap_err();

        assert_eq!(
            err.hook_phase(),
            Some(&HookPhase::AfterState {
                state: "A".to_string()
            })
        );
        assert_eq!(machine.current(), &s("A"));
        assert_eq!(machine.graph().node(&s("B")).unwrap().prev(), None);
    }

    #[test]
    fn set_state_bypasses_edges_and_records_prev() {
        let mut machine = triangle();
        machine.set_state("C");

        assert_eq!(machine.current(), &s("C"));
        assert_eq!(machine.previous(), Some(&s("A")));

        machine.set_state("Elsewhere");
        assert!(machine.has_state(&s("Elsewhere")));
        assert!(matches!(
            machine.go_back(),
            Err(FsmError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn rollback_runs_hook_for_origin() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut machine = StateMachine::<StateName>::builder()
            .add_transition("A", "B")
            .set_before_hook("B", |_, _| Err("refused".into()))
            .set_rollback_hook("A", move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .finalize("A")
            .unwrap();

        assert!(machine.go_to("B").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        machine.rollback("A", "B").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(machine.rollback("B", "A").is_ok());
    }

    #[test]
    fn clone_is_deep() {
        let original = triangle();
        let mut copy = original.clone();

        copy.add_transition("B", "C").unwrap();
        copy.go_to("B").unwrap();

        assert!(copy.has_transition(&s("B"), &s("C")));
        assert!(!original.has_transition(&s("B"), &s("C")));
        assert_eq!(original.current(), &s("A"));
        assert_eq!(original.graph().node(&s("B")).unwrap().prev(), None);
    }

    #[test]
    fn can_go_to_reflects_graph() {
        let machine = triangle();

        assert!(machine.can_go_to(&s("A")));
        assert!(machine.can_go_to(&s("B")));
        assert!(!machine.can_go_to(&s("Z")));

        let mut machine = machine;
        machine.go_to("C").unwrap();
        assert!(!machine.can_go_to(&s("A")));
    }
}
