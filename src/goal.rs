//! Goals and goal sets.
//!
//! A [`Goal`] is an [`Action`] the agent wants to complete, optionally on a
//! countdown. Goals never add or remove themselves from a [`GoalSet`]; the
//! planning agent owns that bookkeeping.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::Rng;

use crate::{Action, Outcomes, Result, State};

/// A long-term objective with an optional timer and failure outcomes.
///
/// # Examples
///
/// ```
/// use goap_utility::{Action, Goal, Outcomes, Prereq, Update};
///
/// let action = Action::new("rent", 1.0)
///     .unwrap()
///     .with_prereq("cash", Prereq::ge(500.0))
///     .with_outcomes(Outcomes::certain(Update::new().add("cash", -500)));
///
/// let mut goal = Goal::new(action)
///     .with_failures(Outcomes::certain(Update::new().add("stress", 10)))
///     .with_timer(2)
///     .repeating(true);
///
/// goal.tick();
/// goal.tick();
/// assert!(goal.expired());
/// goal.reset();
/// assert_eq!(goal.remaining(), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct Goal {
    action: Action,
    failures: Outcomes,
    time: Option<u32>,
    remaining: Option<u32>,
    repeats: bool,
}

impl Goal {
    /// A goal without timer or failure effects that does not repeat.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            failures: Outcomes::none(),
            time: None,
            remaining: None,
            repeats: false,
        }
    }

    pub fn with_failures(mut self, failures: Outcomes) -> Self {
        self.failures = failures;
        self
    }

    /// Sets a countdown of `time` ticks.
    pub fn with_timer(mut self, time: u32) -> Self {
        self.time = Some(time);
        self.remaining = Some(time);
        self
    }

    pub fn repeating(mut self, repeats: bool) -> Self {
        self.repeats = repeats;
        self
    }

    /// The action view of this goal, used when planning toward it.
    pub fn as_action(&self) -> &Action {
        &self.action
    }

    pub fn into_action(self) -> Action {
        self.action
    }

    pub fn name(&self) -> &str {
        &self.action.name
    }

    pub fn repeats(&self) -> bool {
        self.repeats
    }

    /// Ticks left on the timer, if one is set.
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    /// True once a configured timer has run out.
    pub fn expired(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Advances the countdown by one step. No effect without a timer.
    pub fn tick(&mut self) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }

    /// Restores the timer to its configured value.
    pub fn reset(&mut self) {
        self.remaining = self.time;
    }

    pub fn satisfied(&self, state: &State) -> bool {
        self.action.satisfied(state)
    }

    pub fn invoke(&self, state: &State) -> Result<State> {
        self.action.invoke(state)
    }

    pub fn invoke_with<R: Rng + ?Sized>(&self, state: &State, rng: &mut R) -> Result<State> {
        self.action.invoke_with(state, rng)
    }

    pub fn expected_state(&self, state: &State) -> State {
        self.action.expected_state(state)
    }

    pub fn outcomes(&self, state: &State) -> Vec<(State, f64)> {
        self.action.outcomes(state)
    }

    /// Fails the goal, sampling its failure outcomes with the thread-local RNG.
    pub fn fail(&self, state: &State) -> State {
        self.fail_with(state, &mut rand::rng())
    }

    pub fn fail_with<R: Rng + ?Sized>(&self, state: &State, rng: &mut R) -> State {
        self.failures.resolve_with(state, rng)
    }

    pub fn expected_failure_state(&self, state: &State) -> State {
        self.failures.expected_state(state)
    }
}

impl From<Action> for Goal {
    fn from(action: Action) -> Self {
        Goal::new(action)
    }
}

// Identity is the action's; the timer changes over a goal's life.
impl PartialEq for Goal {
    fn eq(&self, other: &Self) -> bool {
        self.action == other.action
    }
}

impl Eq for Goal {}

impl Hash for Goal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.action.hash(state);
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Goal({})", self.action.name)
    }
}

/// A copy-on-write set of goals.
///
/// Cloning is cheap; the goals are shared until one of the copies changes.
/// Iteration follows insertion order, and equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct GoalSet {
    goals: Arc<Vec<Goal>>,
}

impl GoalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `goal` unless an equal goal is already present. Returns whether it was added.
    pub fn insert(&mut self, goal: Goal) -> bool {
        if self.contains(&goal) {
            return false;
        }
        Arc::make_mut(&mut self.goals).push(goal);
        true
    }

    pub fn remove(&mut self, goal: &Goal) -> bool {
        match self.goals.iter().position(|g| g == goal) {
            Some(index) => {
                Arc::make_mut(&mut self.goals).remove(index);
                true
            }
            None => false,
        }
    }

    /// A copy of this set without `goal`.
    pub fn without(&self, goal: &Goal) -> GoalSet {
        let mut set = self.clone();
        set.remove(goal);
        set
    }

    pub fn contains(&self, goal: &Goal) -> bool {
        self.goals.iter().any(|g| g == goal)
    }

    pub fn get(&self, name: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.name() == name)
    }

    /// The union of both sets; goals already here keep their timers.
    pub fn union(&self, other: &GoalSet) -> GoalSet {
        let mut set = self.clone();
        for goal in other.iter() {
            set.insert(goal.clone());
        }
        set
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Goal> {
        self.goals.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Goal> {
        Arc::make_mut(&mut self.goals).iter_mut()
    }

    pub(crate) fn retain(&mut self, f: impl FnMut(&Goal) -> bool) {
        Arc::make_mut(&mut self.goals).retain(f);
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}

impl PartialEq for GoalSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|g| other.contains(g))
    }
}

impl Eq for GoalSet {}

impl FromIterator<Goal> for GoalSet {
    fn from_iter<I: IntoIterator<Item = Goal>>(iter: I) -> Self {
        let mut set = GoalSet::new();
        for goal in iter {
            set.insert(goal);
        }
        set
    }
}

impl<'a> IntoIterator for &'a GoalSet {
    type Item = &'a Goal;
    type IntoIter = std::slice::Iter<'a, Goal>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
