//! Planner configuration.

use serde::{Deserialize, Serialize};

/// Constants of the transition cost metric.
///
/// A transition that loses utility `u < 0` costs `cost * penalty_weight * u^2`;
/// one that gains costs `cost * reward_discount * (tanh(-u) + 1)`, which falls
/// toward zero as the gain grows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostMetric {
    pub penalty_weight: f64,
    pub reward_discount: f64,
}

impl Default for CostMetric {
    fn default() -> Self {
        Self {
            penalty_weight: 1.0,
            reward_discount: 0.1,
        }
    }
}

impl CostMetric {
    /// Cost of moving with an action of cost `cost` and utility change `utility_delta`.
    pub fn transition_cost(&self, cost: f64, utility_delta: f64) -> f64 {
        if utility_delta < 0.0 {
            cost * self.penalty_weight * utility_delta.powi(2)
        } else {
            cost * self.reward_discount * ((-utility_delta).tanh() + 1.0)
        }
    }
}

/// Bounds and tuning for the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub cost_metric: CostMetric,
    /// How many times IDA* may raise its bound before giving up
    pub max_iterations: usize,
    /// Longest subplan IDA* will consider; `None` leaves paths unbounded
    pub max_depth: Option<usize>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            cost_metric: CostMetric::default(),
            max_iterations: 64,
            max_depth: Some(32),
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cost_metric(mut self, cost_metric: CostMetric) -> Self {
        self.cost_metric = cost_metric;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}
