//! Builder for constructing state machines.

use crate::core::{Hook, HookPipeline, State, StateGraph};
use crate::error::{FsmError, HookError};
use crate::runtime::StateMachine;
use tracing::debug;

/// Graph and hooks collected so far.
#[derive(Debug)]
struct Draft<S: State> {
    graph: StateGraph<S>,
    hooks: HookPipeline<S>,
    current: Option<S>,
}

/// Builder for constructing state machines with a fluent API.
///
/// The first failing call latches its error: every later call is a no-op and
/// [`finalize`](Self::finalize) returns that error. A machine can only be
/// obtained through `finalize`, so the error cannot go unnoticed.
///
/// # Example
///
/// ```rust
/// use waypoint::{FsmError, StateMachine, StateName};
///
/// let result = StateMachine::<StateName>::builder()
///     .add_transition("A", "A")
///     .add_transition("A", "B")
///     .finalize("A");
///
/// assert!(matches!(result, Err(FsmError::InvalidTransition { .. })));
/// ```
#[derive(Debug)]
pub struct MachineBuilder<S: State> {
    draft: Result<Draft<S>, FsmError>,
}

impl<S: State> MachineBuilder<S> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            draft: Ok(Draft {
                graph: StateGraph::new(),
                hooks: HookPipeline::new(),
                current: None,
            }),
        }
    }

    /// The latched error, if any call has failed.
    pub fn error(&self) -> Option<&FsmError> {
        self.draft.as_ref().err()
    }

    fn apply<F>(self, op: &'static str, f: F) -> Self
    where
        F: FnOnce(&mut Draft<S>) -> Result<(), FsmError>,
    {
        let was_ok = self.draft.is_ok();
        let draft = self.draft.and_then(|mut draft| {
            f(&mut draft)?;
            Ok(draft)
        });
        if let (true, Err(err)) = (was_ok, &draft) {
            debug!(op, error = %err, "builder error latched");
        }
        Self { draft }
    }

    /// Declare the edge `from -> to`. Self-loops are rejected.
    pub fn add_transition(self, from: impl Into<S>, to: impl Into<S>) -> Self {
        let (from, to) = (from.into(), to.into());
        self.apply("add_transition", |draft| draft.graph.add_edge(from, to))
    }

    /// Declare an edge from `from` to each of `to`, stopping at the first
    /// rejected one.
    pub fn add_transitions<I>(self, from: impl Into<S>, to: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<S>,
    {
        let from = from.into();
        self.apply("add_transitions", |draft| {
            to.into_iter()
                .try_for_each(|target| draft.graph.add_edge(from.clone(), target.into()))
        })
    }

    /// Register `state` without hooks.
    pub fn add_state(self, state: impl Into<S>) -> Self {
        let state = state.into();
        self.apply("add_state", |draft| {
            draft.graph.get_or_create(state);
            Ok(())
        })
    }

    /// Register `state` and install both of its per-state hooks, replacing
    /// any installed before.
    pub fn register_state<B, A>(self, state: impl Into<S>, before: B, after: A) -> Self
    where
        B: Fn(&S, &S) -> Result<(), HookError> + Send + Sync + 'static,
        A: Fn(&S, &S) -> Result<(), HookError> + Send + Sync + 'static,
    {
        let state = state.into();
        self.apply("register_state", |draft| {
            draft.graph.get_or_create(state.clone());
            draft.hooks.set_before(state.clone(), Hook::new(before));
            draft.hooks.set_after(state, Hook::new(after));
            Ok(())
        })
    }

    /// Append a hook run when entering any state.
    pub fn add_before_all_hook<F>(self, hook: F) -> Self
    where
        F: Fn(&S, &S) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.apply("add_before_all_hook", |draft| {
            draft.hooks.push_before_all(Hook::new(hook));
            Ok(())
        })
    }

    /// Append a hook run when leaving any state.
    pub fn add_after_all_hook<F>(self, hook: F) -> Self
    where
        F: Fn(&S, &S) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.apply("add_after_all_hook", |draft| {
            draft.hooks.push_after_all(Hook::new(hook));
            Ok(())
        })
    }

    pub fn set_before_hook<F>(self, state: impl Into<S>, hook: F) -> Self
    where
        F: Fn(&S, &S) -> Result<(), HookError> + Send + Sync + 'static,
    {
        let state = state.into();
        self.apply("set_before_hook", |draft| {
            draft.hooks.set_before(state, Hook::new(hook));
            Ok(())
        })
    }

    pub fn set_after_hook<F>(self, state: impl Into<S>, hook: F) -> Self
    where
        F: Fn(&S, &S) -> Result<(), HookError> + Send + Sync + 'static,
    {
        let state = state.into();
        self.apply("set_after_hook", |draft| {
            draft.hooks.set_after(state, Hook::new(hook));
            Ok(())
        })
    }

    /// Install the compensation hook for transitions out of `state`.
    ///
    /// It only runs through [`StateMachine::rollback`].
    pub fn set_rollback_hook<F>(self, state: impl Into<S>, hook: F) -> Self
    where
        F: Fn(&S, &S) -> Result<(), HookError> + Send + Sync + 'static,
    {
        let state = state.into();
        self.apply("set_rollback_hook", |draft| {
            draft.hooks.set_rollback(state, Hook::new(hook));
            Ok(())
        })
    }

    /// Force the current state, registering it if unseen.
    pub fn set_state(self, state: impl Into<S>) -> Self {
        let state = state.into();
        self.apply("set_state", |draft| {
            let previous = draft.current.replace(state.clone());
            draft.graph.set_prev(state, previous);
            Ok(())
        })
    }

    /// Enter `initial` and hand over the machine, or the latched error.
    pub fn finalize(self, initial: impl Into<S>) -> Result<StateMachine<S>, FsmError> {
        let draft = self.draft?;
        Ok(StateMachine::from_parts(
            draft.graph,
            draft.hooks,
            draft.current,
            initial.into(),
        ))
    }
}

impl<S: State> Default for MachineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
