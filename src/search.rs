//! # Search Module
//!
//! Building blocks shared by the planner's searches: [`Step`] and [`Plan`],
//! the [`Successors`] trait an agent implements to expand states, the
//! [`HeuristicStrategy`] trait used by IDA*, and [`hill_climbing`], the greedy
//! depth-first search behind [`crate::Planner::plan`].
//!
//! Searches run over expected states. Acts whose prerequisites do not hold in
//! the previous state are never expanded by hill climbing; they come back as
//! newly discovered goals instead.

use std::collections::{HashSet, VecDeque};

use crate::prereq::state_distance;
use crate::{Act, Action, GoalSet, State};

/// One step of a plan: what was done and where it leads.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// The action or goal performed
    pub act: Act,
    /// The expected state after the act
    pub state: State,
    /// Goals still outstanding after the act
    pub goals: GoalSet,
}

/// An ordered sequence of steps from some root state.
pub type Plan = Vec<Step>;

/// Successor generation for the searches.
///
/// Implemented by the planning agent; searches only see states and goal sets.
pub trait Successors {
    /// Candidate next steps from `state`, best first.
    fn successors(&self, state: &State, goals: &GoalSet) -> Vec<Step>;

    /// Whether `step` can actually be taken from `prev`.
    fn valid(&self, step: &Step, prev: &State) -> bool {
        step.act.satisfied(prev)
    }
}

/// A trait for heuristic functions used by IDA*.
pub trait HeuristicStrategy: Send + Sync {
    /// Estimates the remaining cost from `state` to satisfying `target`.
    ///
    /// Must not overestimate for IDA* to return cheapest subplans.
    fn estimate(&self, state: &State, target: &Action) -> f64;
}

/// Uninformed heuristic; IDA* degrades to iterative deepening on path cost.
pub struct ZeroHeuristic;

impl HeuristicStrategy for ZeroHeuristic {
    fn estimate(&self, _state: &State, _target: &Action) -> f64 {
        0.0
    }
}

/// Euclidean prerequisite distance to the target, scaled by `weight`.
pub struct PrereqDistanceHeuristic {
    pub weight: f64,
}

impl Default for PrereqDistanceHeuristic {
    fn default() -> Self {
        Self { weight: 1.0 }
    }
}

impl HeuristicStrategy for PrereqDistanceHeuristic {
    fn estimate(&self, state: &State, target: &Action) -> f64 {
        self.weight * state_distance(state, &target.prereqs)
    }
}

/// Greedy depth-first search that always tries the best successor first.
///
/// `successors` must return steps sorted best first. A step whose act is not
/// valid from the previous state is not expanded; its act is collected as a
/// newly discovered goal instead. The search stops at the first path that
/// reaches `depth` steps or has no successors, and returns that path with the
/// discovered goals. If every branch dead-ends first, the last path accepted
/// is returned.
///
/// The result may miss the best-scoring path when it runs through a
/// low-scoring step.
pub fn hill_climbing<S>(
    root_state: &State,
    root_goals: &GoalSet,
    successors: &S,
    depth: Option<usize>,
) -> (Plan, GoalSet)
where
    S: Successors + ?Sized,
{
    let mut new_goals = GoalSet::new();
    let mut seen: HashSet<u64> = HashSet::new();
    let mut fringe: VecDeque<Plan> = VecDeque::from([Plan::new()]);
    let mut best = Plan::new();

    while let Some(path) = fringe.pop_front() {
        let succs = {
            let (state, goals) = match path.last() {
                Some(step) => (&step.state, &step.goals),
                None => (root_state, root_goals),
            };

            // extended list filtering
            let fingerprint = state.fingerprint();
            if seen.contains(&fingerprint) {
                continue;
            }

            if let Some(step) = path.last() {
                let prev = match path.len() {
                    1 => root_state,
                    n => &path[n - 2].state,
                };
                if !successors.valid(step, prev) {
                    log::debug!("{} is not reachable yet, deferring it as a goal", step.act);
                    new_goals.insert(step.act.to_goal());
                    continue;
                }
            }
            seen.insert(fingerprint);

            if depth.is_some_and(|d| path.len() >= d) {
                best = path;
                break;
            }
            successors.successors(state, goals)
        };

        if succs.is_empty() {
            best = path;
            break;
        }

        for succ in succs.into_iter().rev() {
            let mut child = path.clone();
            child.push(succ);
            fringe.push_front(child);
        }
        best = path;
    }

    log::trace!(
        "hill climbing visited {} states, plan has {} steps",
        seen.len(),
        best.len()
    );
    (best, new_goals)
}
