//! Directed graph of states and declared edges.
//!
//! Each node keeps both its outgoing (`to`) and incoming (`from`) edge sets.
//! The two halves of an edge are always inserted and removed together, so
//! `a -> b` exists iff `b` is in `a.to` and `a` is in `b.from`.

use super::state::State;
use crate::error::FsmError;
use std::collections::{HashMap, HashSet};

/// One registered state in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateNode<S: State> {
    to: HashSet<S>,
    from: HashSet<S>,
    prev: Option<S>,
}

impl<S: State> StateNode<S> {
    fn new() -> Self {
        Self {
            to: HashSet::new(),
            from: HashSet::new(),
            prev: None,
        }
    }

    /// States reachable from this node by one declared edge.
    pub fn targets(&self) -> &HashSet<S> {
        &self.to
    }

    /// States that declare an edge into this node.
    pub fn sources(&self) -> &HashSet<S> {
        &self.from
    }

    /// The state this node was most recently entered from.
    pub fn prev(&self) -> Option<&S> {
        self.prev.as_ref()
    }
}

/// Mapping from state to its node.
///
/// Only registered states are stored; looking up an unknown state yields
/// `None` rather than an implicit empty node.
#[derive(Debug, Clone)]
pub struct StateGraph<S: State> {
    nodes: HashMap<S, StateNode<S>>,
}

impl<S: State> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Return the node for `state`, registering an empty one if unseen.
    pub fn get_or_create(&mut self, state: S) -> &mut StateNode<S> {
        self.nodes.entry(state).or_insert_with(StateNode::new)
    }

    /// Declare the edge `from -> to`.
    ///
    /// Both endpoints are registered. Declaring an existing edge again is a
    /// no-op; a self-loop is rejected and leaves the graph untouched.
    pub fn add_edge(&mut self, from: S, to: S) -> Result<(), FsmError> {
        if from == to {
            return Err(FsmError::invalid_transition(from.name(), to.name()));
        }

        self.get_or_create(from.clone()).to.insert(to.clone());
        self.get_or_create(to).from.insert(from);
        Ok(())
    }

    /// Remove the edge `from -> to`. Returns whether it existed.
    ///
    /// Both endpoints stay registered.
    pub fn remove_edge(&mut self, from: &S, to: &S) -> bool {
        let removed = self
            .nodes
            .get_mut(from)
            .is_some_and(|node| node.to.remove(to));
        if removed {
            if let Some(node) = self.nodes.get_mut(to) {
                node.from.remove(from);
            }
        }
        removed
    }

    pub fn has_edge(&self, from: &S, to: &S) -> bool {
        self.nodes
            .get(from)
            .is_some_and(|node| node.to.contains(to))
    }

    pub fn contains(&self, state: &S) -> bool {
        self.nodes.contains_key(state)
    }

    pub fn node(&self, state: &S) -> Option<&StateNode<S>> {
        self.nodes.get(state)
    }

    /// Record `prev` as the state `state` was entered from.
    pub(crate) fn set_prev(&mut self, state: S, prev: Option<S>) {
        self.get_or_create(state).prev = prev;
    }

    /// Iterate over all registered states, in no particular order.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of declared edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.to.len()).sum()
    }
}
