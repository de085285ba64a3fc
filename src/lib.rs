mod action;
mod agent;
mod config;
mod error;
mod goal;
mod outcome;
mod planner;
mod prereq;
mod search;
mod state;
mod utility;
pub mod util;
mod visualizer;

pub use action::{Act, Action};
pub use agent::{ActionFilter, PlanningAgent};
pub use config::{CostMetric, PlannerConfig};
pub use error::{GoapError, Result};
pub use goal::{Goal, GoalSet};
pub use outcome::{random_choice, Distribution, DistributionFn, Outcomes};
pub use planner::Planner;
pub use prereq::{
    state_distance, Comparator, Prereq, Prereqs, MIN_UNSATISFIED_DISTANCE, UNDEFINED_DISTANCE,
};
pub use search::{
    hill_climbing, HeuristicStrategy, Plan, PrereqDistanceHeuristic, Step, Successors,
    ZeroHeuristic,
};
pub use state::{ComputeFn, Computed, Effect, Range, Ranges, State, Update, Value};
pub use utility::{UtilityFn, UtilityFuncs};
pub use visualizer::PlanVisualizer;
