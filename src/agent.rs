//! # Planning Agent
//!
//! [`PlanningAgent`] is an expected-utility maximizing agent that manages
//! long-term goals. It supplies the successor function for both searches,
//! scores successors with its utility functions, and owns the goal set that
//! planning grows as it discovers desired-but-unreachable actions.
//!
//! ## Example
//!
//! ```
//! use goap_utility::{Action, Goal, Outcomes, PlanningAgent, Prereq, State, Update, UtilityFuncs};
//!
//! let work = Action::new("work", 1.0)
//!     .unwrap()
//!     .with_outcomes(Outcomes::new(
//!         vec![Update::new().add("cash", 100), Update::new().add("cash", 50)],
//!         vec![0.5, 0.5],
//!     ));
//! let money = Goal::new(
//!     Action::new("money", 1.0)
//!         .unwrap()
//!         .with_prereq("cash", Prereq::ge(200.0))
//!         .with_outcomes(Outcomes::certain(Update::new().add("cash", 1000))),
//! );
//!
//! let state: State = [("cash", 0)].into_iter().collect();
//! let mut agent = PlanningAgent::new(
//!     state.clone(),
//!     vec![work],
//!     vec![money],
//!     UtilityFuncs::new().with("cash", |x| x),
//! );
//!
//! let goals = agent.goals().clone();
//! let (plan, _) = agent.plan(&state, &goals, Some(3));
//! let cash: Vec<_> = plan.iter().map(|s| s.state.get_f64("cash").unwrap()).collect();
//! assert_eq!(cash, vec![75.0, 150.0, 225.0]);
//! ```

use std::sync::Arc;

use rand::Rng;

use crate::search::{HeuristicStrategy, Plan, Step, Successors};
use crate::{
    Act, Action, Goal, GoalSet, Planner, PlannerConfig, Ranges, Result, State, UtilityFuncs, Value,
};

/// Decides whether an action is available in a given state.
pub type ActionFilter = Arc<dyn Fn(&Action, &State) -> bool + Send + Sync>;

/// An expected-utility maximizing agent with long-term goals.
pub struct PlanningAgent {
    state: State,
    goals: GoalSet,
    actions: Vec<Action>,
    ranges: Option<Ranges>,
    action_filter: Option<ActionFilter>,
    planner: Planner,
}

impl PlanningAgent {
    pub fn new(
        state: State,
        actions: Vec<Action>,
        goals: impl IntoIterator<Item = Goal>,
        utility: UtilityFuncs,
    ) -> Self {
        Self {
            state,
            goals: goals.into_iter().collect(),
            actions,
            ranges: None,
            action_filter: None,
            planner: Planner::new(utility),
        }
    }

    /// Clamps every expected successor state, and every state the agent
    /// moves into, to `ranges`.
    pub fn with_ranges(mut self, ranges: Ranges) -> Self {
        self.ranges = Some(ranges);
        self
    }

    /// Restricts the actions considered from a state to those `filter` accepts.
    pub fn with_action_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Action, &State) -> bool + Send + Sync + 'static,
    {
        self.action_filter = Some(Arc::new(filter));
        self
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.planner = self.planner.with_config(config);
        self
    }

    pub fn with_heuristic(mut self, heuristic: Box<dyn HeuristicStrategy>) -> Self {
        self.planner = self.planner.with_heuristic(heuristic);
        self
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.set(key, value);
    }

    pub fn goals(&self) -> &GoalSet {
        &self.goals
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn utility(&self) -> &UtilityFuncs {
        self.planner.utility()
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// The actions the agent may consider from `state`.
    pub fn actions_for_state<'a>(
        &'a self,
        state: &'a State,
    ) -> impl Iterator<Item = &'a Action> + 'a {
        self.actions.iter().filter(move |action| {
            self.action_filter
                .as_ref()
                .map_or(true, |filter| filter(action, state))
        })
    }

    /// Expected next steps from `state`, best first.
    ///
    /// Every available action contributes a step; every goal in `goals` that
    /// `state` satisfies contributes a step whose goal set no longer holds it.
    /// Ties keep that order.
    pub fn successors(&self, state: &State, goals: &GoalSet) -> Vec<Step> {
        let actions = self.actions_for_state(state).map(|action| Step {
            act: Act::Action(action.clone()),
            state: self.bounded(action.expected_state(state)),
            goals: goals.clone(),
        });
        let completions = goals
            .iter()
            .filter(|goal| goal.satisfied(state))
            .map(|goal| Step {
                act: Act::Goal(goal.clone()),
                state: self.bounded(goal.expected_state(state)),
                goals: goals.without(goal),
            });

        let mut scored: Vec<(f64, Step)> = actions
            .chain(completions)
            .map(|step| (self.score_successor(state, &step.state), step))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, step)| step).collect()
    }

    /// Utility gained moving to `to`, plus the value of the agent's goals from there.
    pub fn score_successor(&self, from: &State, to: &State) -> f64 {
        let utility = self.planner.utility();
        utility.change_utility(from, to) + utility.goals_utility(to, &self.goals)
    }

    /// Plans up to `depth` steps from `state`, starting with `goals` outstanding.
    ///
    /// Actions the plan wanted but could not take yet are added to the
    /// agent's goals. Returns the plan and the agent's updated goals.
    pub fn plan(&mut self, state: &State, goals: &GoalSet, depth: Option<usize>) -> (Plan, GoalSet) {
        let (plan, discovered) = self.planner.plan(&*self, state, goals, depth);

        for goal in discovered.iter().filter(|g| !self.goals.contains(g)) {
            log::debug!("adding {} to goals", goal);
        }
        self.goals = self.goals.union(&discovered);
        (plan, self.goals.clone())
    }

    /// A path from `state` to satisfying `goal`'s prerequisites, if one is found.
    pub fn subplan(&self, state: &State, goal: &Goal) -> Option<Plan> {
        self.planner.ida(self, state, &self.goals, goal.as_action())
    }

    /// Advances every goal timer by one tick.
    ///
    /// See [`PlanningAgent::tick_goals_with`].
    pub fn tick_goals(&mut self) -> Vec<Goal> {
        self.tick_goals_with(&mut rand::rng())
    }

    /// Advances every goal timer by one tick, sampling failures from `rng`.
    ///
    /// Each expired goal applies its failure outcome to the agent's state.
    /// Repeating goals then restart their countdown; the rest are dropped.
    /// Returns the goals that expired on this tick.
    pub fn tick_goals_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Goal> {
        let mut expired = Vec::new();
        for goal in self.goals.iter_mut() {
            goal.tick();
            if !goal.expired() {
                continue;
            }
            log::info!("{} expired", goal);
            let failed = goal.fail_with(&self.state, rng);
            self.state = bound_to(self.ranges.as_ref(), failed);
            expired.push(goal.clone());
            if goal.repeats() {
                goal.reset();
            }
        }
        self.goals.retain(|goal| goal.repeats() || !goal.expired());
        expired
    }

    pub fn complete_goal(&mut self, goal: &Goal) -> Result<()> {
        self.complete_goal_with(goal, &mut rand::rng())
    }

    /// Invokes `goal` against the agent's state.
    ///
    /// A repeating goal restarts its countdown and stays; any other goal is
    /// removed. Fails without changes when the goal is not satisfied.
    pub fn complete_goal_with<R: Rng + ?Sized>(&mut self, goal: &Goal, rng: &mut R) -> Result<()> {
        let next = goal.invoke_with(&self.state, rng)?;
        self.state = bound_to(self.ranges.as_ref(), next);

        if goal.repeats() {
            for g in self.goals.iter_mut().filter(|g| *g == goal) {
                g.reset();
            }
        } else {
            self.goals.remove(goal);
        }
        log::debug!("completed {}", goal);
        Ok(())
    }

    pub fn perform(&mut self, act: &Act) -> Result<&State> {
        self.perform_with(act, &mut rand::rng())
    }

    /// Carries out a planned act against the agent's current state.
    pub fn perform_with<R: Rng + ?Sized>(&mut self, act: &Act, rng: &mut R) -> Result<&State> {
        match act {
            Act::Action(action) => {
                let next = action.invoke_with(&self.state, rng)?;
                self.state = bound_to(self.ranges.as_ref(), next);
            }
            Act::Goal(goal) => self.complete_goal_with(goal, rng)?,
        }
        Ok(&self.state)
    }

    fn bounded(&self, state: State) -> State {
        bound_to(self.ranges.as_ref(), state)
    }
}

fn bound_to(ranges: Option<&Ranges>, state: State) -> State {
    match ranges {
        Some(ranges) => state.attenuate(ranges),
        None => state,
    }
}

impl Successors for PlanningAgent {
    fn successors(&self, state: &State, goals: &GoalSet) -> Vec<Step> {
        PlanningAgent::successors(self, state, goals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GoapError, Outcomes, Prereq, Range, Update};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cash(v: i64) -> State {
        [("cash", v)].into_iter().collect()
    }

    fn work() -> Action {
        Action::new("work", 1.0)
            .unwrap()
            .with_outcomes(Outcomes::certain(Update::new().add("cash", 100)))
    }

    fn money() -> Goal {
        Goal::new(
            Action::new("money", 1.0)
                .unwrap()
                .with_prereq("cash", Prereq::ge(200.0))
                .with_outcomes(Outcomes::certain(Update::new().add("cash", 1000))),
        )
    }

    fn agent() -> PlanningAgent {
        PlanningAgent::new(
            cash(0),
            vec![work()],
            vec![money()],
            UtilityFuncs::new().with("cash", |x| x),
        )
    }

    #[test]
    fn test_score_successor_is_monotonic_in_cash() {
        let agent = agent();
        let scores: Vec<f64> = [-100, 100, 200, 300]
            .into_iter()
            .map(|v| agent.score_successor(&cash(0), &cash(v)))
            .collect();
        assert!(scores.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_successors_include_satisfied_goals() {
        let agent = agent();
        let succs = agent.successors(&cash(300), agent.goals());
        assert_eq!(succs.len(), 2);

        // completing the goal is worth more than working
        assert_eq!(succs[0].act, Act::Goal(money()));
        assert_eq!(succs[0].state.get_f64("cash"), Some(1300.0));
        assert!(succs[0].goals.is_empty());

        assert_eq!(succs[1].act.name(), "work");
        assert!(succs[1].goals.contains(&money()));
    }

    #[test]
    fn test_successors_skip_unsatisfied_goals() {
        let agent = agent();
        let succs = agent.successors(&cash(0), agent.goals());
        assert_eq!(succs.len(), 1);
        assert_eq!(succs[0].act.name(), "work");
    }

    #[test]
    fn test_action_filter() {
        let agent = agent().with_action_filter(|_, state| state.get_f64("cash") < Some(100.0));
        assert_eq!(agent.actions_for_state(&cash(0)).count(), 1);
        assert_eq!(agent.actions_for_state(&cash(150)).count(), 0);
    }

    #[test]
    fn test_ranges_bound_successors() {
        let ranges = Ranges::from([("cash".to_string(), Range::at_most(50.0))]);
        let agent = agent().with_ranges(ranges);
        let succs = agent.successors(&cash(0), agent.goals());
        assert_eq!(succs[0].state.get_f64("cash"), Some(50.0));
    }

    #[test]
    fn test_state_accessors() {
        let mut agent = agent();
        agent.set("cash", 42);
        assert_eq!(agent.state().get_f64("cash"), Some(42.0));
        assert_eq!(agent.actions().len(), 1);
        assert_eq!(agent.utility().state_utility(agent.state()), 42.0);
    }

    #[test]
    fn test_tick_goals_expires_and_fails() {
        let rent = money()
            .with_timer(2)
            .with_failures(Outcomes::certain(Update::new().add("cash", -10)));
        let mut agent = PlanningAgent::new(
            cash(50),
            vec![work()],
            vec![rent],
            UtilityFuncs::new().with("cash", |x| x),
        );
        let mut rng = StdRng::seed_from_u64(1);

        assert!(agent.tick_goals_with(&mut rng).is_empty());
        assert_eq!(agent.goals().len(), 1);

        let expired = agent.tick_goals_with(&mut rng);
        assert_eq!(expired.len(), 1);
        assert_eq!(agent.state().get_f64("cash"), Some(40.0));
        assert!(agent.goals().is_empty());
    }

    #[test]
    fn test_tick_goals_resets_repeating() {
        let rent = money()
            .with_timer(1)
            .repeating(true)
            .with_failures(Outcomes::certain(Update::new().add("cash", -10)));
        let mut agent = PlanningAgent::new(
            cash(50),
            vec![],
            vec![rent],
            UtilityFuncs::new().with("cash", |x| x),
        );
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(agent.tick_goals_with(&mut rng).len(), 1);
        assert_eq!(agent.tick_goals_with(&mut rng).len(), 1);
        assert_eq!(agent.state().get_f64("cash"), Some(30.0));
        assert_eq!(agent.goals().iter().next().and_then(Goal::remaining), Some(1));
    }

    #[test]
    fn test_tick_goals_keeps_repeating_zero_timer() {
        let chore = money()
            .with_timer(0)
            .repeating(true)
            .with_failures(Outcomes::certain(Update::new().add("cash", -1)));
        let mut agent = PlanningAgent::new(
            cash(10),
            vec![],
            vec![chore],
            UtilityFuncs::new().with("cash", |x| x),
        );
        let mut rng = StdRng::seed_from_u64(2);

        for _ in 0..3 {
            assert_eq!(agent.tick_goals_with(&mut rng).len(), 1);
            assert_eq!(agent.goals().len(), 1);
        }
        assert_eq!(agent.state().get_f64("cash"), Some(7.0));
    }

    #[test]
    fn test_complete_goal() {
        let mut agent = agent();
        let mut rng = StdRng::seed_from_u64(3);

        let result = agent.complete_goal_with(&money(), &mut rng);
        assert!(matches!(result, Err(GoapError::PrerequisitesUnmet(_))));
        assert_eq!(agent.goals().len(), 1);

        agent.set("cash", 200);
        agent.complete_goal_with(&money(), &mut rng).unwrap();
        assert_eq!(agent.state().get_f64("cash"), Some(1200.0));
        assert!(agent.goals().is_empty());
    }

    #[test]
    fn test_perform_plan() {
        let mut agent = agent();
        let mut rng = StdRng::seed_from_u64(9);
        let state = agent.state().clone();
        let goals = agent.goals().clone();
        let (plan, _) = agent.plan(&state, &goals, Some(2));

        for step in &plan {
            agent.perform_with(&step.act, &mut rng).unwrap();
        }
        assert_eq!(agent.state().get_f64("cash"), Some(200.0));
    }
}
