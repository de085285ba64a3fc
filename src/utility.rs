//! Utility scoring of states, transitions and goal progress.
//!
//! Utility comes from externally supplied per-attribute functions; attributes
//! without a function contribute nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::prereq::state_distance;
use crate::{Goal, GoalSet, State};

/// Maps an attribute value to its utility.
pub type UtilityFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// The per-attribute utility functions of an agent.
///
/// # Examples
///
/// ```
/// use goap_utility::{State, UtilityFuncs};
///
/// let funcs = UtilityFuncs::new().with("cash", |x| x);
/// let poor: State = [("cash", 0)].into_iter().collect();
/// let rich: State = [("cash", 1000)].into_iter().collect();
///
/// assert_eq!(funcs.change_utility(&poor, &rich), 1000.0);
/// ```
#[derive(Clone)]
pub struct UtilityFuncs {
    funcs: BTreeMap<String, UtilityFn>,
    goal_weight: f64,
}

impl Default for UtilityFuncs {
    fn default() -> Self {
        Self {
            funcs: BTreeMap::new(),
            goal_weight: 1.0,
        }
    }
}

impl UtilityFuncs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the utility of a goal whose prerequisites are met. Negative weights are taken as 0.
    pub fn with_goal_weight(mut self, weight: f64) -> Self {
        self.goal_weight = weight.max(0.0);
        self
    }

    pub fn goal_weight(&self) -> f64 {
        self.goal_weight
    }

    pub fn with<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.insert(key, f);
        self
    }

    pub fn insert<F>(&mut self, key: impl Into<String>, f: F)
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.funcs.insert(key.into(), Arc::new(f));
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.funcs.keys()
    }

    /// Sum of the utility functions applied to the state's values.
    pub fn state_utility(&self, state: &State) -> f64 {
        self.funcs
            .iter()
            .filter_map(|(key, f)| state.get_f64(key).map(|v| f(v)))
            .sum()
    }

    /// Utility gained moving from `from` to `to`.
    pub fn change_utility(&self, from: &State, to: &State) -> f64 {
        self.state_utility(to) - self.state_utility(from)
    }

    /// Probability-weighted utility of a set of possible outcome states.
    pub fn expected_utility(&self, outcomes: &[(State, f64)]) -> f64 {
        outcomes
            .iter()
            .map(|(state, p)| p * self.state_utility(state))
            .sum()
    }

    /// How much being in `state` is worth toward `goal`.
    ///
    /// `goal_weight / (1 + distance)`, with `distance` the Euclidean distance to
    /// the goal's prerequisites. Strictly decreasing in that distance for every
    /// goal, whatever its outcome does to utility.
    pub fn goal_utility(&self, state: &State, goal: &Goal) -> f64 {
        let distance = state_distance(state, &goal.as_action().prereqs);
        self.goal_weight / (1.0 + distance)
    }

    /// Sum of [`UtilityFuncs::goal_utility`] over every goal.
    pub fn goals_utility(&self, state: &State, goals: &GoalSet) -> f64 {
        goals.iter().map(|goal| self.goal_utility(state, goal)).sum()
    }
}

impl fmt::Debug for UtilityFuncs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtilityFuncs")
            .field("funcs", &self.funcs.keys().collect::<Vec<_>>())
            .field("goal_weight", &self.goal_weight)
            .finish()
    }
}
