//! # Planner Module for Expected-Utility Planning
//!
//! The planner runs the two searches the planning agent relies on:
//!
//! - [`Planner::plan`]: greedy hill climbing over expected states, for fast
//!   multi-step plans that also surface desired-but-unreachable actions as new
//!   goals.
//! - [`Planner::ida`]: iterative-deepening A* toward one target, for subplans
//!   that reach a specific set of prerequisites.
//!
//! Both searches walk expected states (probability-weighted outcomes) rather
//! than samples, and keep their visited-state memo local to a single call.
//! IDA* only prunes a revisited state when an earlier visit reached it at
//! least as cheaply and in no more steps, so a shorter route found later is
//! still explored under the depth cap.
//!
//! IDA* without a tight admissible heuristic can be expensive on unbounded
//! state spaces. [`PlannerConfig::max_depth`] and
//! [`PlannerConfig::max_iterations`] bound it; keep them tight when planning
//! alongside latency-sensitive work.

use std::collections::HashMap;

use crate::search::{hill_climbing, HeuristicStrategy, Plan, Step, Successors, ZeroHeuristic};
use crate::{Act, Action, GoalSet, PlannerConfig, State, UtilityFuncs};

/// Runs plan and subplan searches for an agent.
///
/// # Examples
///
/// ```
/// use goap_utility::{Planner, PlannerConfig, PrereqDistanceHeuristic, UtilityFuncs};
///
/// let planner = Planner::new(UtilityFuncs::new().with("cash", |x| x))
///     .with_config(PlannerConfig::default().with_max_depth(Some(8)))
///     .with_heuristic(Box::new(PrereqDistanceHeuristic::default()));
/// assert_eq!(planner.config().max_depth, Some(8));
/// ```
pub struct Planner {
    utility: UtilityFuncs,
    config: PlannerConfig,
    heuristic: Box<dyn HeuristicStrategy>,
}

/// Per-state visits of one IDA* iteration, as `(path cost, steps)` pairs no
/// other recorded visit dominates.
struct Visited {
    visits: HashMap<u64, Vec<(f64, usize)>>,
}

impl Visited {
    fn new() -> Self {
        Self {
            visits: HashMap::new(),
        }
    }

    /// Records a visit. Returns false if an earlier visit was no costlier and no deeper.
    fn insert(&mut self, fingerprint: u64, length: f64, depth: usize) -> bool {
        let visits = self.visits.entry(fingerprint).or_default();
        if visits.iter().any(|&(l, d)| l <= length && d <= depth) {
            return false;
        }
        visits.retain(|&(l, d)| !(length <= l && depth <= d));
        visits.push((length, depth));
        true
    }
}

enum Probe {
    Found(Plan),
    /// No path within the bound; carries the smallest `f` that exceeded it
    Exceeded(f64),
}

impl Planner {
    /// Creates a planner with the default configuration and an uninformed heuristic.
    pub fn new(utility: UtilityFuncs) -> Self {
        Self {
            utility,
            config: PlannerConfig::default(),
            heuristic: Box::new(ZeroHeuristic),
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_heuristic(mut self, heuristic: Box<dyn HeuristicStrategy>) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn utility(&self) -> &UtilityFuncs {
        &self.utility
    }

    /// Search cost of moving from `from` to `to` by `act`.
    ///
    /// Weighs expected utility over raw action cost: losing utility is
    /// penalized quadratically, gaining it is nearly free.
    pub fn distance(&self, from: &State, to: &State, act: &Act) -> f64 {
        let delta = self.utility.change_utility(from, to);
        self.config.cost_metric.transition_cost(act.cost(), delta)
    }

    /// Hill-climbing plan from `state`, at most `depth` steps long.
    ///
    /// Returns the plan and the goals discovered along the way.
    pub fn plan<S>(
        &self,
        successors: &S,
        state: &State,
        goals: &GoalSet,
        depth: Option<usize>,
    ) -> (Plan, GoalSet)
    where
        S: Successors + ?Sized,
    {
        hill_climbing(state, goals, successors, depth)
    }

    /// Iterative-deepening A* from `state` until `target` is satisfied.
    ///
    /// Returns `None` when the reachable space is exhausted or the iteration
    /// cap is hit. A root that already satisfies the target yields an empty plan.
    pub fn ida<S>(
        &self,
        successors: &S,
        state: &State,
        goals: &GoalSet,
        target: &Action,
    ) -> Option<Plan>
    where
        S: Successors + ?Sized,
    {
        let mut bound = self.heuristic.estimate(state, target);

        for iteration in 0..self.config.max_iterations {
            let mut seen = Visited::new();
            let mut path = Plan::new();
            match self.probe(successors, state, goals, target, &mut path, 0.0, bound, &mut seen) {
                Probe::Found(plan) => {
                    log::debug!(
                        "subplan for {} found after {} iterations, {} steps",
                        target,
                        iteration + 1,
                        plan.len()
                    );
                    return Some(plan);
                }
                Probe::Exceeded(next) if next.is_finite() => {
                    log::trace!("raising IDA* bound for {} from {} to {}", target, bound, next);
                    bound = next;
                }
                Probe::Exceeded(_) => {
                    log::debug!("no subplan for {}: search space exhausted", target);
                    return None;
                }
            }
        }

        log::debug!(
            "no subplan for {} within {} iterations",
            target,
            self.config.max_iterations
        );
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn probe<S>(
        &self,
        successors: &S,
        state: &State,
        goals: &GoalSet,
        target: &Action,
        path: &mut Plan,
        length: f64,
        bound: f64,
        seen: &mut Visited,
    ) -> Probe
    where
        S: Successors + ?Sized,
    {
        let f = length + self.heuristic.estimate(state, target);
        if f > bound {
            return Probe::Exceeded(f);
        }
        if target.satisfied(state) {
            return Probe::Found(path.clone());
        }
        if self.config.max_depth.is_some_and(|d| path.len() >= d) {
            return Probe::Exceeded(f64::INFINITY);
        }

        // extended list filtering
        if !seen.insert(state.fingerprint(), length, path.len()) {
            return Probe::Exceeded(f64::INFINITY);
        }

        let mut next_bound = f64::INFINITY;
        for step in successors.successors(state, goals) {
            if !successors.valid(&step, state) {
                continue;
            }
            let cost = length + self.distance(state, &step.state, &step.act);
            let (child_state, child_goals) = (step.state.clone(), step.goals.clone());

            path.push(step);
            let probe = self.probe(
                successors,
                &child_state,
                &child_goals,
                target,
                path,
                cost,
                bound,
                seen,
            );
            path.pop();

            match probe {
                Probe::Found(plan) => return Probe::Found(plan),
                Probe::Exceeded(f) => next_bound = next_bound.min(f),
            }
        }
        Probe::Exceeded(next_bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CostMetric, Outcomes, Prereq, Update};

    /// "earn" adds 10 cash; "spend" needs 20 cash and trades 20 cash for a tool.
    struct Shop;

    fn earn() -> Action {
        Action::new("earn", 1.0)
            .unwrap()
            .with_outcomes(Outcomes::certain(Update::new().add("cash", 10)))
    }

    fn spend() -> Action {
        Action::new("spend", 1.0)
            .unwrap()
            .with_prereq("cash", Prereq::ge(20.0))
            .with_outcomes(Outcomes::certain(
                Update::new().add("cash", -20).add("tools", 1),
            ))
    }

    fn has_tool() -> Action {
        Action::new("has_tool", 1.0)
            .unwrap()
            .with_prereq("tools", Prereq::ge(1.0))
    }

    impl Successors for Shop {
        fn successors(&self, state: &State, goals: &GoalSet) -> Vec<Step> {
            [spend(), earn()]
                .into_iter()
                .map(|action| Step {
                    state: action.expected_state(state),
                    act: Act::Action(action),
                    goals: goals.clone(),
                })
                .collect()
        }
    }

    fn planner() -> Planner {
        Planner::new(UtilityFuncs::new().with("cash", |x| x).with("tools", |x| 30.0 * x))
    }

    fn start() -> State {
        [("cash", 0), ("tools", 0)].into_iter().collect()
    }

    #[test]
    fn test_distance_metric() {
        let planner = planner();
        let act = Act::Action(earn());
        let from: State = [("cash", 10)].into_iter().collect();
        let to: State = [("cash", 7)].into_iter().collect();

        // losing 3 utility costs 9
        assert_eq!(planner.distance(&from, &to, &act), 9.0);
        // gaining is cheap and non-negative
        let gain = planner.distance(&to, &from, &act);
        assert!(gain > 0.0 && gain < 0.1);
    }

    #[test]
    fn test_distance_respects_configured_metric() {
        let planner = planner().with_config(PlannerConfig::default().with_cost_metric(CostMetric {
            penalty_weight: 0.5,
            reward_discount: 0.1,
        }));
        let from: State = [("cash", 10)].into_iter().collect();
        let to: State = [("cash", 8)].into_iter().collect();
        assert_eq!(planner.distance(&from, &to, &Act::Action(earn())), 2.0);
    }

    #[test]
    fn test_ida_finds_subplan() {
        let plan = planner()
            .ida(&Shop, &start(), &GoalSet::new(), &has_tool())
            .expect("subplan");
        let names: Vec<_> = plan.iter().map(|s| s.act.name()).collect();
        assert_eq!(names, ["earn", "earn", "spend"]);
        assert!(has_tool().satisfied(&plan.last().unwrap().state));
    }

    #[test]
    fn test_ida_with_prereq_heuristic() {
        let planner = planner().with_heuristic(Box::new(crate::PrereqDistanceHeuristic::default()));
        let plan = planner
            .ida(&Shop, &start(), &GoalSet::new(), &has_tool())
            .expect("subplan");
        assert!(has_tool().satisfied(&plan.last().unwrap().state));
    }

    #[test]
    fn test_ida_already_satisfied() {
        let state: State = [("cash", 0), ("tools", 1)].into_iter().collect();
        let plan = planner().ida(&Shop, &state, &GoalSet::new(), &has_tool());
        assert_eq!(plan, Some(Vec::new()));
    }

    #[test]
    fn test_ida_unreachable() {
        let impossible = Action::new("impossible", 1.0)
            .unwrap()
            .with_prereq("magic", Prereq::ge(1.0));
        let planner = planner().with_config(
            PlannerConfig::default()
                .with_max_depth(Some(4))
                .with_max_iterations(16),
        );
        assert!(planner
            .ida(&Shop, &start(), &GoalSet::new(), &impossible)
            .is_none());
    }

    /// Free moves over a small graph: 0 -> {1, 2}, 1 -> 2, 2 -> 3, 3 -> 4.
    struct Diamond;

    impl Successors for Diamond {
        fn successors(&self, state: &State, goals: &GoalSet) -> Vec<Step> {
            let next: &[i64] = match state.get_f64("x").map(|x| x as i64) {
                Some(0) => &[1, 2],
                Some(1) => &[2],
                Some(2) => &[3],
                Some(3) => &[4],
                _ => &[],
            };
            next.iter()
                .map(|&n| Step {
                    act: Act::Action(Action::new(format!("to_{}", n), 0.0).unwrap()),
                    state: [("x", n)].into_iter().collect(),
                    goals: goals.clone(),
                })
                .collect()
        }
    }

    #[test]
    fn test_ida_revisits_state_on_shorter_route() {
        let target = Action::new("reach_4", 1.0)
            .unwrap()
            .with_prereq("x", Prereq::ge(4.0));
        let planner = planner().with_config(PlannerConfig::default().with_max_depth(Some(3)));
        let root: State = [("x", 0)].into_iter().collect();

        // 0 -> 1 -> 2 first reaches 2 with no steps left; 0 -> 2 must still be tried
        let plan = planner
            .ida(&Diamond, &root, &GoalSet::new(), &target)
            .expect("0 -> 2 -> 3 -> 4 fits in three steps");
        let names: Vec<_> = plan.iter().map(|s| s.act.name()).collect();
        assert_eq!(names, ["to_2", "to_3", "to_4"]);
    }

    #[test]
    fn test_visited_dominance() {
        let mut seen = Visited::new();
        assert!(seen.insert(7, 1.0, 3));
        assert!(!seen.insert(7, 1.0, 3));
        assert!(!seen.insert(7, 2.0, 4));
        // shallower, or cheaper, is worth another look
        assert!(seen.insert(7, 1.0, 1));
        assert!(seen.insert(7, 0.5, 5));
        assert!(!seen.insert(7, 0.5, 6));
    }

    #[test]
    fn test_plan_delegates_to_hill_climbing() {
        let (plan, goals) = planner().plan(&Shop, &start(), &GoalSet::new(), Some(2));
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|s| s.act.name() == "earn"));
        assert!(goals.contains(&crate::Goal::from(spend())));
    }
}
