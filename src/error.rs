//! Error types for graph construction and transition execution.

use crate::definition::DefinitionError;
use std::fmt;
use thiserror::Error;

/// Error type returned by hooks.
///
/// Hooks may fail with any error; the engine wraps it in
/// [`FsmError::HookFailed`] or [`FsmError::RollbackFailed`] together with
/// the position of the hook that produced it.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Position of a hook inside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookPhase {
    /// A global "after" hook, by registration index.
    AfterAll { index: usize },

    /// The per-state "after" hook of the origin state.
    AfterState { state: String },

    /// A global "before" hook, by registration index.
    BeforeAll { index: usize },

    /// The per-state "before" hook of the target state.
    BeforeState { state: String },
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::AfterAll { index } => write!(f, "after hook #{index}"),
            HookPhase::AfterState { state } => write!(f, "after hook for [{state}]"),
            HookPhase::BeforeAll { index } => write!(f, "before hook #{index}"),
            HookPhase::BeforeState { state } => write!(f, "before hook for [{state}]"),
        }
    }
}

/// Errors produced by the state machine engine.
#[derive(Debug, Error)]
pub enum FsmError {
    #[error("invalid transition: {from} --> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("state not found: {state}")]
    StateNotFound { state: String },

    #[error("{phase} failed: {source}")]
    HookFailed {
        phase: HookPhase,
        #[source]
        source: HookError,
    },

    #[error("rollback hook for [{from}] failed: {source}")]
    RollbackFailed {
        from: String,
        #[source]
        source: HookError,
    },

    #[error("no previous state to return to from {state}")]
    NoHistory { state: String },

    #[error("invalid machine definition: {}", format_definition_errors(.0))]
    Definition(Vec<DefinitionError>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FsmError {
    pub(crate) fn invalid_transition(from: &str, to: &str) -> Self {
        FsmError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub(crate) fn state_not_found(state: &str) -> Self {
        FsmError::StateNotFound {
            state: state.to_string(),
        }
    }

    /// Returns a stable code identifying the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            FsmError::InvalidTransition { .. } => "INVALID_TRANSITION",
            FsmError::StateNotFound { .. } => "STATE_NOT_FOUND",
            FsmError::HookFailed { .. } => "HOOK_FAILED",
            FsmError::RollbackFailed { .. } => "ROLLBACK_FAILED",
            FsmError::NoHistory { .. } => "NO_HISTORY",
            FsmError::Definition(_) => "BAD_DEFINITION",
            FsmError::Json(_) => "BAD_DEFINITION",
        }
    }

    /// Returns the failing hook's phase, if this error came from a hook.
    pub fn hook_phase(&self) -> Option<&HookPhase> {
        match self {
            FsmError::HookFailed { phase, .. } => Some(phase),
            _ => None,
        }
    }
}

fn format_definition_errors(errors: &[DefinitionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_phase_display_names_position() {
        assert_eq!(HookPhase::AfterAll { index: 2 }.to_string(), "after hook #2");
        assert_eq!(
            HookPhase::BeforeState {
                state: "Run".to_string()
            }
            .to_string(),
            "before hook for [Run]"
        );
    }

    #[test]
    fn hook_failure_keeps_source() {
        let err = FsmError::HookFailed {
            phase: HookPhase::BeforeAll { index: 0 },
            source: "disk full".into(),
        };

        assert_eq!(err.to_string(), "before hook #0 failed: disk full");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.error_code(), "HOOK_FAILED");
    }

    #[test]
    fn invalid_transition_formats_edge() {
        let err = FsmError::invalid_transition("Disabled", "Run");
        assert_eq!(err.to_string(), "invalid transition: Disabled --> Run");
        assert!(err.hook_phase().is_none());
    }
}
