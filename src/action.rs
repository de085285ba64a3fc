//! # Action Module for Expected-Utility Planning
//!
//! This module provides [`Action`], the unit the planner strings together.
//!
//! ## Key Components
//!
//! * `Action`: a name, prerequisites on state attributes, a stochastic outcome
//!   table and a cost
//! * `Act`: what a plan step performs, either a plain action or a goal
//!
//! ## Basic Usage
//!
//! ```
//! use goap_utility::{Action, Outcomes, Prereq, State, Update};
//!
//! let work = Action::new("work", 1.0)
//!     .unwrap()
//!     .with_prereq("time", Prereq::ge(30.0))
//!     .with_outcomes(Outcomes::certain(Update::new().add("cash", 100)));
//!
//! let state: State = [("time", 50), ("cash", 0)].into_iter().collect();
//! assert!(work.satisfied(&state));
//! assert_eq!(work.expected_state(&state).get_f64("cash"), Some(100.0));
//!
//! let tired: State = [("time", 10), ("cash", 0)].into_iter().collect();
//! assert!(work.invoke(&tired).is_err());
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use rand::Rng;

use crate::prereq::{Prereq, Prereqs};
use crate::{GoapError, Goal, Outcomes, Result, State};

/// Something an agent can do.
///
/// Actions compare and hash by name, prerequisites and outcome table, so they
/// behave as values in goal sets.
#[derive(Debug, Clone)]
pub struct Action {
    /// The name of the action
    pub name: String,
    /// Prerequisites keyed by the attribute they constrain
    pub prereqs: Prereqs,
    /// What may happen when the action is taken
    pub outcomes: Outcomes,
    /// The cost of taking this action
    pub cost: f64,
}

impl Action {
    /// Creates an action without prerequisites whose outcome changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `GoapError::InvalidActionCost` if the cost is negative or not finite.
    pub fn new(name: impl Into<String>, cost: f64) -> Result<Self> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(GoapError::InvalidActionCost(cost));
        }

        Ok(Self {
            name: name.into(),
            prereqs: Prereqs::new(),
            outcomes: Outcomes::none(),
            cost,
        })
    }

    pub fn with_prereq(mut self, key: impl Into<String>, prereq: Prereq) -> Self {
        self.prereqs.insert(key.into(), prereq);
        self
    }

    pub fn with_outcomes(mut self, outcomes: Outcomes) -> Self {
        self.outcomes = outcomes;
        self
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// True if every prerequisite holds in `state`.
    ///
    /// A prerequisite on an attribute the state does not carry fails.
    pub fn satisfied(&self, state: &State) -> bool {
        self.satisfied_by(Some(state))
    }

    /// Like [`Action::satisfied`], for a state that may be absent.
    ///
    /// Any prerequisite fails against an absent state; an action without
    /// prerequisites is satisfied by anything.
    pub fn satisfied_by(&self, state: Option<&State>) -> bool {
        self.prereqs.iter().all(|(key, prereq)| match state {
            Some(state) => state.contains_key(key) && prereq.satisfied(state.get_f64(key)),
            None => false,
        })
    }

    /// Takes the action, sampling one outcome with the thread-local RNG.
    pub fn invoke(&self, state: &State) -> Result<State> {
        self.invoke_with(state, &mut rand::rng())
    }

    /// Takes the action, sampling one outcome with `rng`.
    ///
    /// # Errors
    ///
    /// Returns `GoapError::PrerequisitesUnmet` if `state` does not satisfy the action.
    pub fn invoke_with<R: Rng + ?Sized>(&self, state: &State, rng: &mut R) -> Result<State> {
        if !self.satisfied(state) {
            return Err(GoapError::PrerequisitesUnmet(self.to_string()));
        }
        Ok(self.outcomes.resolve_with(state, rng))
    }

    pub fn expected_state(&self, state: &State) -> State {
        self.outcomes.expected_state(state)
    }

    pub fn outcomes(&self, state: &State) -> Vec<(State, f64)> {
        self.outcomes.distribution(state)
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.prereqs == other.prereqs && self.outcomes == other.outcomes
    }
}

impl Eq for Action {}

impl Hash for Action {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.prereqs.hash(state);
        self.outcomes.hash(state);
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({})", self.name)
    }
}

/// What a plan step performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Act {
    Action(Action),
    /// Completing a goal; the step's goal set no longer holds it
    Goal(Goal),
}

impl Act {
    /// The underlying action, for a goal its action view.
    pub fn as_action(&self) -> &Action {
        match self {
            Act::Action(action) => action,
            Act::Goal(goal) => goal.as_action(),
        }
    }

    pub fn name(&self) -> &str {
        &self.as_action().name
    }

    pub fn cost(&self) -> f64 {
        self.as_action().cost
    }

    pub fn satisfied(&self, state: &State) -> bool {
        self.as_action().satisfied(state)
    }

    pub fn expected_state(&self, state: &State) -> State {
        self.as_action().expected_state(state)
    }

    /// The goal this act would be deferred as when it cannot be taken yet.
    pub fn to_goal(&self) -> Goal {
        match self {
            Act::Action(action) => Goal::from(action.clone()),
            Act::Goal(goal) => goal.clone(),
        }
    }
}

impl fmt::Display for Act {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Act::Action(action) => write!(f, "{}", action),
            Act::Goal(goal) => write!(f, "{}", goal),
        }
    }
}
