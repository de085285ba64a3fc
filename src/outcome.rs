//! Stochastic outcome tables.
//!
//! An [`Outcomes`] table pairs a list of [`Update`]s with the probability of
//! each. Probabilities are either fixed or computed from the current state when
//! the table is resolved.
//!
//! The table is not validated: probabilities are expected to be non-negative,
//! one per update, and to sum to 1. Keeping them that way is the caller's job.
//! Missing probabilities count as 0 and extra ones are ignored.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::Rng;

use crate::state::hash_f64;
use crate::{State, Update};

/// A function computing outcome probabilities from the current state.
pub type DistributionFn = Arc<dyn Fn(&State) -> Vec<f64> + Send + Sync>;

/// Probabilities for the entries of an outcome table.
#[derive(Clone)]
pub enum Distribution {
    Fixed(Vec<f64>),
    Computed(DistributionFn),
}

impl Distribution {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&State) -> Vec<f64> + Send + Sync + 'static,
    {
        Distribution::Computed(Arc::new(f))
    }

    /// The probabilities as they apply to `state`.
    pub fn probabilities(&self, state: &State) -> Vec<f64> {
        match self {
            Distribution::Fixed(probs) => probs.clone(),
            Distribution::Computed(f) => f(state),
        }
    }
}

fn fn_addr(f: &DistributionFn) -> *const () {
    Arc::as_ptr(f) as *const ()
}

impl fmt::Debug for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Fixed(probs) => f.debug_tuple("Fixed").field(probs).finish(),
            Distribution::Computed(func) => write!(f, "Computed({:p})", fn_addr(func)),
        }
    }
}

impl PartialEq for Distribution {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Distribution::Fixed(a), Distribution::Fixed(b)) => a == b,
            (Distribution::Computed(a), Distribution::Computed(b)) => {
                std::ptr::eq(fn_addr(a), fn_addr(b))
            }
            _ => false,
        }
    }
}

impl Hash for Distribution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Distribution::Fixed(probs) => {
                0u8.hash(state);
                for p in probs {
                    hash_f64(*p, state);
                }
            }
            Distribution::Computed(func) => {
                1u8.hash(state);
                (fn_addr(func) as usize).hash(state);
            }
        }
    }
}

/// A list of possible updates and the probability of each.
///
/// # Examples
///
/// ```
/// use goap_utility::{Outcomes, State, Update};
///
/// let work = Outcomes::new(
///     vec![Update::new().add("cash", 100), Update::new().add("cash", 50)],
///     vec![0.5, 0.5],
/// );
/// let state: State = [("cash", 0)].into_iter().collect();
///
/// assert_eq!(work.expected_state(&state).get_f64("cash"), Some(75.0));
/// assert_eq!(work.distribution(&state).len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct Outcomes {
    pub updates: Vec<Update>,
    pub dist: Distribution,
}

impl Outcomes {
    pub fn new(updates: Vec<Update>, probabilities: Vec<f64>) -> Self {
        Self {
            updates,
            dist: Distribution::Fixed(probabilities),
        }
    }

    pub fn computed<F>(updates: Vec<Update>, f: F) -> Self
    where
        F: Fn(&State) -> Vec<f64> + Send + Sync + 'static,
    {
        Self {
            updates,
            dist: Distribution::computed(f),
        }
    }

    /// A single update that always happens.
    pub fn certain(update: Update) -> Self {
        Self::new(vec![update], vec![1.0])
    }

    /// A table whose only outcome leaves the state unchanged.
    pub fn none() -> Self {
        Self::certain(Update::new())
    }

    fn weighted(&self, state: &State) -> impl Iterator<Item = (&Update, f64)> {
        let probs = self.dist.probabilities(state);
        self.updates
            .iter()
            .enumerate()
            .map(move |(i, update)| (update, probs.get(i).copied().unwrap_or(0.0)))
    }

    /// Samples one outcome with the thread-local RNG and applies it to `state`.
    pub fn resolve(&self, state: &State) -> State {
        self.resolve_with(state, &mut rand::rng())
    }

    /// Samples one outcome with `rng` and applies it to `state`.
    pub fn resolve_with<R: Rng + ?Sized>(&self, state: &State, rng: &mut R) -> State {
        let choices: Vec<(&Update, f64)> = self.weighted(state).collect();
        match random_choice(choices, rng) {
            Some(update) => state.update(update),
            None => state.clone(),
        }
    }

    /// The probability-weighted mean of every outcome, attribute by attribute.
    ///
    /// Computed effects contribute their expected value. The result holds float
    /// values for every attribute of `state`.
    pub fn expected_state(&self, state: &State) -> State {
        if self.updates.is_empty() {
            return state.clone();
        }
        let outcomes: Vec<(State, f64)> = self
            .weighted(state)
            .map(|(update, p)| (state.update_expected(update), p))
            .collect();

        state
            .iter()
            .map(|(key, _)| {
                let mean: f64 = outcomes
                    .iter()
                    .map(|(outcome, p)| p * outcome.get_f64(key).unwrap_or(0.0))
                    .sum();
                (key.clone(), mean)
            })
            .collect()
    }

    /// Every possible resulting state with its probability, without sampling.
    pub fn distribution(&self, state: &State) -> Vec<(State, f64)> {
        self.weighted(state)
            .map(|(update, p)| (state.update(update), p))
            .collect()
    }
}

impl Default for Outcomes {
    fn default() -> Self {
        Self::none()
    }
}

/// Picks one of `choices` according to its probability.
///
/// Choices are sorted by ascending probability and the first whose cumulative
/// probability reaches a uniform roll in `[0, 1)` wins. If rounding leaves the
/// total short of the roll, the most likely choice is returned. Returns `None`
/// only when there are no choices.
pub fn random_choice<T, R: Rng + ?Sized>(mut choices: Vec<(T, f64)>, rng: &mut R) -> Option<T> {
    choices.sort_by(|a, b| a.1.total_cmp(&b.1));
    let roll: f64 = rng.random();

    let mut acc = 0.0;
    let mut index = None;
    for (i, (_, p)) in choices.iter().enumerate() {
        acc += p;
        if roll <= acc {
            index = Some(i);
            break;
        }
    }
    let index = index.or_else(|| choices.len().checked_sub(1))?;
    Some(choices.swap_remove(index).0)
}
