//! Transition hooks and the pipeline that runs them.
//!
//! A hook is a callback of `(from, to)` that may abort a transition by
//! returning an error. The pipeline runs hooks in a fixed order:
//!
//! 1. every global "after" hook, in registration order
//! 2. the "after" hook of the origin state
//! 3. every global "before" hook, in registration order
//! 4. the "before" hook of the target state
//!
//! "After" hooks clean up the state being left and "before" hooks prepare the
//! state being entered. All of them run before the new state is committed.

use super::state::State;
use crate::error::{FsmError, HookError, HookPhase};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

type HookFn<S> = dyn Fn(&S, &S) -> Result<(), HookError> + Send + Sync;

/// Callback invoked with the origin and target of a transition.
///
/// # Example
///
/// ```rust
/// use waypoint::core::{Hook, StateName};
///
/// let hook = Hook::new(|from: &StateName, to: &StateName| {
///     if to.as_str() == "Forbidden" {
///         return Err(format!("cannot leave {from}").into());
///     }
///     Ok(())
/// });
///
/// assert!(hook.call(&"A".into(), &"B".into()).is_ok());
/// assert!(hook.call(&"A".into(), &"Forbidden".into()).is_err());
/// ```
pub struct Hook<S: State> {
    func: Arc<HookFn<S>>,
}

impl<S: State> Hook<S> {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&S, &S) -> Result<(), HookError> + Send + Sync + 'static,
    {
        Hook {
            func: Arc::new(func),
        }
    }

    pub fn call(&self, from: &S, to: &S) -> Result<(), HookError> {
        (self.func)(from, to)
    }
}

impl<S: State> Clone for Hook<S> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
        }
    }
}

impl<S: State> fmt::Debug for Hook<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook")
    }
}

/// Ordered global hooks plus per-state and rollback hooks.
///
/// Cloning copies every collection; the callbacks themselves are immutable
/// and shared.
#[derive(Debug, Clone)]
pub struct HookPipeline<S: State> {
    before_all: Vec<Hook<S>>,
    after_all: Vec<Hook<S>>,
    before_state: HashMap<S, Hook<S>>,
    after_state: HashMap<S, Hook<S>>,
    rollback: HashMap<S, Hook<S>>,
}

impl<S: State> Default for HookPipeline<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> HookPipeline<S> {
    pub fn new() -> Self {
        Self {
            before_all: Vec::new(),
            after_all: Vec::new(),
            before_state: HashMap::new(),
            after_state: HashMap::new(),
            rollback: HashMap::new(),
        }
    }

    pub fn push_before_all(&mut self, hook: Hook<S>) {
        self.before_all.push(hook);
    }

    pub fn push_after_all(&mut self, hook: Hook<S>) {
        self.after_all.push(hook);
    }

    /// Install the hook run when entering `state`, replacing any previous one.
    pub fn set_before(&mut self, state: S, hook: Hook<S>) {
        self.before_state.insert(state, hook);
    }

    /// Install the hook run when leaving `state`, replacing any previous one.
    pub fn set_after(&mut self, state: S, hook: Hook<S>) {
        self.after_state.insert(state, hook);
    }

    pub fn set_rollback(&mut self, state: S, hook: Hook<S>) {
        self.rollback.insert(state, hook);
    }

    pub fn has_rollback(&self, state: &S) -> bool {
        self.rollback.contains_key(state)
    }

    /// Total number of installed hooks, rollback hooks excluded.
    pub fn len(&self) -> usize {
        self.before_all.len()
            + self.after_all.len()
            + self.before_state.len()
            + self.after_state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the pipeline for `from -> to`, stopping at the first failure.
    pub fn execute(&self, from: &S, to: &S) -> Result<(), FsmError> {
        for (index, hook) in self.after_all.iter().enumerate() {
            run(hook, from, to, || HookPhase::AfterAll { index })?;
        }

        if let Some(hook) = self.after_state.get(from) {
            run(hook, from, to, || HookPhase::AfterState {
                state: from.name().to_string(),
            })?;
        }

        for (index, hook) in self.before_all.iter().enumerate() {
            run(hook, from, to, || HookPhase::BeforeAll { index })?;
        }

        if let Some(hook) = self.before_state.get(to) {
            run(hook, from, to, || HookPhase::BeforeState {
                state: to.name().to_string(),
            })?;
        }

        Ok(())
    }

    /// Run the rollback hook registered for `from`, if any.
    pub fn execute_rollback(&self, from: &S, to: &S) -> Result<(), FsmError> {
        let Some(hook) = self.rollback.get(from) else {
            return Ok(());
        };

        trace!(from = from.name(), to = to.name(), "running rollback hook");
        hook.call(from, to).map_err(|source| FsmError::RollbackFailed {
            from: from.name().to_string(),
            source,
        })
    }
}

fn run<S, P>(hook: &Hook<S>, from: &S, to: &S, phase: P) -> Result<(), FsmError>
where
    S: State,
    P: FnOnce() -> HookPhase,
{
    trace!(from = from.name(), to = to.name(), "running hook");
    hook.call(from, to).map_err(|source| FsmError::HookFailed {
        phase: phase(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateName;
    use std::sync::Mutex;

    fn s(name: &str) -> StateName {
        StateName::from(name)
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, label: &str) -> Hook<StateName> {
        let log = Arc::clone(log);
        let label = label.to_string();
        Hook::new(move |_, _| {
            log.lock().unwrap().push(label.clone());
            Ok(())
        })
    }

    fn failing(label: &str) -> Hook<StateName> {
        let label = label.to_string();
        Hook::new(move |_, _| Err(label.clone().into()))
    }

    #[test]
    fn execute_runs_phases_in_fixed_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = HookPipeline::new();

        hooks.set_before(s("B"), recorder(&log, "before[B]"));
        hooks.push_before_all(recorder(&log, "before#0"));
        hooks.set_after(s("A"), recorder(&log, "after[A]"));
        hooks.push_after_all(recorder(&log, "after#0"));
        hooks.push_before_all(recorder(&log, "before#1"));
        hooks.push_after_all(recorder(&log, "after#1"));

        hooks.execute(&s("A"), &s("B")).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["after#0", "after#1", "after[A]", "before#0", "before#1", "before[B]"]
        );
    }

    #[test]
    fn per_state_hooks_match_origin_and_target_only() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = HookPipeline::new();

        hooks.set_after(s("B"), recorder(&log, "after[B]"));
        hooks.set_before(s("A"), recorder(&log, "before[A]"));

        hooks.execute(&s("A"), &s("B")).unwrap();

        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn execute_stops_at_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = HookPipeline::new();

        hooks.push_after_all(recorder(&log, "after#0"));
        hooks.push_after_all(failing("boom"));
        hooks.push_before_all(recorder(&log, "before#0"));

        let err = hooks.execute(&s("A"), &s("B")).unwrap_err();

        assert_eq!(err.hook_phase(), Some(&HookPhase::AfterAll { index: 1 }));
        assert_eq!(*log.lock().unwrap(), vec!["after#0"]);
    }

    #[test]
    fn per_state_failure_names_the_state() {
        let mut hooks = HookPipeline::new();
        hooks.set_before(s("B"), failing("not ready"));

        let err = hooks.execute(&s("A"), &s("B")).unwrap_err();

        assert_eq!(
            err.hook_phase(),
            Some(&HookPhase::BeforeState {
                state: "B".to_string()
            })
        );
        assert_eq!(err.to_string(), "before hook for [B] failed: not ready");
    }

    #[test]
    fn set_before_overwrites_previous_hook() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = HookPipeline::new();

        hooks.set_before(s("B"), recorder(&log, "first"));
        hooks.set_before(s("B"), recorder(&log, "second"));
        hooks.execute(&s("A"), &s("B")).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["second"]);
        assert_eq!(hooks.len(), 1);
    }

    #[test]
    fn rollback_without_hook_succeeds() {
        let hooks: HookPipeline<StateName> = HookPipeline::new();
        assert!(hooks.execute_rollback(&s("A"), &s("B")).is_ok());
    }

    #[test]
    fn rollback_failure_is_distinguishable() {
        let mut hooks = HookPipeline::new();
        hooks.set_rollback(s("A"), failing("cannot undo"));

        let err = hooks.execute_rollback(&s("A"), &s("B")).unwrap_err();

        assert!(matches!(err, FsmError::RollbackFailed { ref from, .. } if from == "A"));
        assert_eq!(err.error_code(), "ROLLBACK_FAILED");
    }

    #[test]
    fn cloned_pipeline_is_independent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut original = HookPipeline::new();
        original.push_before_all(recorder(&log, "shared"));

        let mut copy = original.clone();
        copy.push_before_all(recorder(&log, "copy-only"));

        original.execute(&s("A"), &s("B")).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["shared"]);
        assert_eq!(copy.len(), 2);
    }
}
