//! Declarative machine definitions.
//!
//! A definition lists the graph of a machine as data, so it can live in a
//! configuration file instead of code:
//!
//! ```json
//! {
//!   "initial": "Disabled",
//!   "states": ["Disabled", "Enabled"],
//!   "transitions": [
//!     {"from": "Disabled", "to": "Enabled"},
//!     {"from": "Enabled", "to": ["Disabled"]}
//!   ]
//! }
//! ```
//!
//! Hooks are code and cannot be declared here; attach them to the builder
//! returned by [`MachineDefinition::builder`].

pub mod error;

pub use error::DefinitionError;

use crate::builder::MachineBuilder;
use crate::core::State;
use crate::error::FsmError;
use crate::runtime::StateMachine;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Edges out of one state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionDefinition<S: State> {
    pub from: S,

    /// A single state or a list of states
    #[serde(deserialize_with = "one_or_many")]
    pub to: Vec<S>,
}

/// Serializable description of a machine's graph and initial state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct MachineDefinition<S: State> {
    /// State entered on finalize
    pub initial: S,

    /// States registered even if no edge mentions them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<S>,

    #[serde(default)]
    pub transitions: Vec<TransitionDefinition<S>>,
}

impl<S: State> MachineDefinition<S> {
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            states: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Add a state to register without edges.
    pub fn state(mut self, state: S) -> Self {
        self.states.push(state);
        self
    }

    /// Add edges from `from` to each of `to`.
    pub fn transitions(mut self, from: S, to: impl IntoIterator<Item = S>) -> Self {
        self.transitions.push(TransitionDefinition {
            from,
            to: to.into_iter().collect(),
        });
        self
    }

    pub fn from_json(json: &str) -> Result<Self, FsmError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, FsmError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the definition, accumulating ALL problems found.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<DefinitionError>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<DefinitionError>>> = Vec::new();

        for entry in &self.transitions {
            if entry.to.is_empty() {
                checks.push(Validation::fail(DefinitionError::EmptyTargets {
                    from: entry.from.name().to_string(),
                }));
            }
            for to in &entry.to {
                let check = if *to == entry.from {
                    Validation::fail(DefinitionError::SelfLoop {
                        state: to.name().to_string(),
                    })
                } else {
                    Validation::success(())
                };
                checks.push(check);
            }
        }

        let mut seen = HashSet::new();
        for state in &self.states {
            if !seen.insert(state) {
                checks.push(Validation::fail(DefinitionError::DuplicateState {
                    state: state.name().to_string(),
                }));
            }
        }

        checks.push(self.check_initial());

        Validation::all_vec(checks).map(|_| ())
    }

    fn check_initial(&self) -> Validation<(), NonEmptyVec<DefinitionError>> {
        let is_empty = self.states.is_empty() && self.transitions.is_empty();
        let mentioned = self.states.contains(&self.initial)
            || self
                .transitions
                .iter()
                .any(|entry| entry.from == self.initial || entry.to.contains(&self.initial));

        if is_empty || mentioned {
            Validation::success(())
        } else {
            Validation::fail(DefinitionError::UnknownInitial {
                state: self.initial.name().to_string(),
            })
        }
    }

    /// Validate and load the graph into a builder.
    ///
    /// The builder is not finalized, so hooks can still be attached; pass
    /// [`initial`](Self::initial) to its `finalize`.
    pub fn builder(&self) -> Result<MachineBuilder<S>, FsmError> {
        if let Validation::Failure(errors) = self.validate() {
            return Err(FsmError::Definition(errors.iter().cloned().collect()));
        }

        let builder = self
            .states
            .iter()
            .fold(MachineBuilder::new(), |builder, state| {
                builder.add_state(state.clone())
            });
        let builder = self.transitions.iter().fold(builder, |builder, entry| {
            builder.add_transitions(entry.from.clone(), entry.to.iter().cloned())
        });

        Ok(builder)
    }

    /// Validate, load and finalize in the initial state.
    pub fn build(&self) -> Result<StateMachine<S>, FsmError> {
        self.builder()?.finalize(self.initial.clone())
    }
}

fn one_or_many<'de, D, S>(deserializer: D) -> Result<Vec<S>, D::Error>
where
    D: Deserializer<'de>,
    S: State,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::<S>::deserialize(deserializer)? {
        OneOrMany::One(state) => vec![state],
        OneOrMany::Many(states) => states,
    })
}
