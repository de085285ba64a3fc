//! Prerequisites: conditions on a single state attribute.
//!
//! A [`Prereq`] is either a leaf comparison against a target value, or an
//! AND/OR composition of two prerequisites. Besides a boolean test, every
//! prerequisite reports a normalized distance to satisfaction that the
//! planner uses to rank states.
//!
//! ```
//! use goap_utility::Prereq;
//!
//! let in_band = Prereq::ge(10.0).and(Prereq::le(20.0));
//! assert!(in_band.satisfied(Some(15.0)));
//! assert!(!in_band.satisfied(Some(25.0)));
//! assert_eq!(in_band.distance(Some(15.0)), 0.0);
//! assert!(in_band.distance(Some(25.0)) > 0.0);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::state::hash_f64;
use crate::State;

/// Smallest distance reported for an unsatisfied prerequisite.
///
/// Strict comparisons sitting exactly on their target (`x > 0` at `x = 0`) have
/// a zero deviation but are still unsatisfied.
pub const MIN_UNSATISFIED_DISTANCE: f64 = 1e-9;

/// Distance reported for a leaf whose value is missing or NaN.
pub const UNDEFINED_DISTANCE: f64 = 1.0;

/// Binary comparison between a state value (left) and a target (right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparator {
    pub fn compare(self, value: f64, target: f64) -> bool {
        match self {
            Comparator::Lt => value < target,
            Comparator::Le => value <= target,
            Comparator::Gt => value > target,
            Comparator::Ge => value >= target,
            Comparator::Eq => value == target,
            Comparator::Ne => value != target,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
        }
    }
}

/// A satisfaction predicate over one attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Prereq {
    Leaf { comparator: Comparator, target: f64 },
    And(Box<Prereq>, Box<Prereq>),
    Or(Box<Prereq>, Box<Prereq>),
}

impl Prereq {
    pub fn new(comparator: Comparator, target: f64) -> Self {
        Prereq::Leaf { comparator, target }
    }

    pub fn lt(target: f64) -> Self {
        Self::new(Comparator::Lt, target)
    }

    pub fn le(target: f64) -> Self {
        Self::new(Comparator::Le, target)
    }

    pub fn gt(target: f64) -> Self {
        Self::new(Comparator::Gt, target)
    }

    pub fn ge(target: f64) -> Self {
        Self::new(Comparator::Ge, target)
    }

    pub fn equal(target: f64) -> Self {
        Self::new(Comparator::Eq, target)
    }

    pub fn not_equal(target: f64) -> Self {
        Self::new(Comparator::Ne, target)
    }

    /// Both this and `other` must hold.
    pub fn and(self, other: Prereq) -> Self {
        Prereq::And(Box::new(self), Box::new(other))
    }

    /// Either this or `other` must hold.
    pub fn or(self, other: Prereq) -> Self {
        Prereq::Or(Box::new(self), Box::new(other))
    }

    /// Tests `value` against this prerequisite. A missing value never satisfies.
    pub fn satisfied(&self, value: Option<f64>) -> bool {
        match self {
            Prereq::Leaf { comparator, target } => {
                value.is_some_and(|v| !v.is_nan() && comparator.compare(v, *target))
            }
            Prereq::And(a, b) => a.satisfied(value) && b.satisfied(value),
            Prereq::Or(a, b) => a.satisfied(value) || b.satisfied(value),
        }
    }

    /// Squared normalized distance from `value` to satisfaction.
    ///
    /// Zero exactly when satisfied. For a leaf this is the squared relative
    /// error `((target - value) / target)^2`, or `(target - value)^2` for a
    /// zero target. AND sums its children, OR takes the smaller.
    pub fn distance(&self, value: Option<f64>) -> f64 {
        match self {
            Prereq::Leaf { comparator, target } => leaf_distance(*comparator, *target, value),
            Prereq::And(a, b) => a.distance(value) + b.distance(value),
            Prereq::Or(a, b) => a.distance(value).min(b.distance(value)),
        }
    }
}

fn leaf_distance(comparator: Comparator, target: f64, value: Option<f64>) -> f64 {
    let Some(value) = value.filter(|v| !v.is_nan()) else {
        return UNDEFINED_DISTANCE;
    };
    if comparator.compare(value, target) {
        return 0.0;
    }
    let raw = if target == 0.0 {
        (target - value).powi(2)
    } else {
        ((target - value) / target).powi(2)
    };
    if raw.is_finite() {
        raw.max(MIN_UNSATISFIED_DISTANCE)
    } else {
        f64::MAX
    }
}

impl Hash for Prereq {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Prereq::Leaf { comparator, target } => {
                0u8.hash(state);
                comparator.hash(state);
                hash_f64(*target, state);
            }
            Prereq::And(a, b) => {
                1u8.hash(state);
                a.hash(state);
                b.hash(state);
            }
            Prereq::Or(a, b) => {
                2u8.hash(state);
                a.hash(state);
                b.hash(state);
            }
        }
    }
}

impl fmt::Display for Prereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prereq::Leaf { comparator, target } => write!(f, "{} {}", comparator.symbol(), target),
            Prereq::And(a, b) => write!(f, "({} and {})", a, b),
            Prereq::Or(a, b) => write!(f, "({} or {})", a, b),
        }
    }
}

/// Prerequisites keyed by the attribute they constrain.
pub type Prereqs = BTreeMap<String, Prereq>;

/// Euclidean distance of `state` to a set of prerequisites.
///
/// Missing attributes count as undefined values.
pub fn state_distance(state: &State, prereqs: &Prereqs) -> f64 {
    prereqs
        .iter()
        .map(|(key, prereq)| prereq.distance(state.get_f64(key)))
        .sum::<f64>()
        .sqrt()
}
