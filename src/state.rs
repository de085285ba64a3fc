//! # State Module for Expected-Utility Planning
//!
//! This module provides the world-state representation the planner reasons over.
//!
//! ## What is State here?
//!
//! A [`State`] is a mapping from attribute name to a numeric [`Value`]. States are
//! treated as immutable values: every transformation ([`State::update`],
//! [`State::attenuate`]) hands back a new state, so a state shared by one
//! in-flight search node is never changed underneath it.
//!
//! An [`Update`] is a partial-state update specification: for each attribute it
//! names, an [`Effect`] either adds a constant delta or computes the new value
//! from the whole state. Attributes named by an update but absent from the state
//! are ignored, so an update written for a richer agent can be applied to a
//! leaner one without error.
//!
//! ## Basic Usage
//!
//! ```
//! use goap_utility::{Range, Ranges, State, Update};
//!
//! let state: State = [("money", 10), ("time", 10)].into_iter().collect();
//!
//! let update = Update::new()
//!     .add("money", 10)
//!     .compute("time", |s: &State| s.get_f64("time").unwrap_or(0.0) + 2.0);
//!
//! let next = state.update(&update);
//! assert_eq!(next.get_f64("money"), Some(20.0));
//! assert_eq!(next.get_f64("time"), Some(12.0));
//!
//! // Keep money within [0, 15]
//! let mut ranges = Ranges::new();
//! ranges.insert("money".to_string(), Range::new(Some(0.0), Some(15.0)));
//! let clamped = next.attenuate(&ranges);
//! assert_eq!(clamped.get_f64("money"), Some(15.0));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A numeric state value.
///
/// The numeric kind is preserved across updates: an integral attribute stays
/// integral after a fractional update (truncating toward zero).
#[derive(Debug, Clone, Copy)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    /// The value as a float.
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v,
        }
    }

    /// Returns `true` for integral values.
    pub fn is_int(self) -> bool {
        matches!(self, Value::Int(_))
    }

    /// Converts `value` to the numeric kind of `self`.
    pub fn coerce(self, value: f64) -> Value {
        match self {
            Value::Int(_) => Value::Int(value as i64),
            Value::Float(_) => Value::Float(value),
        }
    }

    fn add(self, delta: Value) -> Value {
        match (self, delta) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.saturating_add(b)),
            _ => self.coerce(self.as_f64() + delta.as_f64()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash numerically so that Int(75) and Float(75.0) collide, as they compare equal
        hash_f64(self.as_f64(), state);
    }
}

/// Hashes `v` consistently with `==`: `0.0` and `-0.0` hash alike.
pub(crate) fn hash_f64<H: Hasher>(v: f64, state: &mut H) {
    let v = if v == 0.0 { 0.0 } else { v };
    v.to_bits().hash(state);
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

/// The result of a computed effect.
///
/// `value` is used when sampling a concrete next state; `expected` is used when
/// computing expected states for planning. A computed effect that is not itself
/// random returns the same number for both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Computed {
    pub value: f64,
    pub expected: f64,
}

impl From<f64> for Computed {
    fn from(v: f64) -> Self {
        Self {
            value: v,
            expected: v,
        }
    }
}

impl From<(f64, f64)> for Computed {
    fn from((value, expected): (f64, f64)) -> Self {
        Self { value, expected }
    }
}

/// A function computing an attribute's new value from the whole state.
pub type ComputeFn = Arc<dyn Fn(&State) -> Computed + Send + Sync>;

/// How a single attribute changes under an update.
#[derive(Clone)]
pub enum Effect {
    /// Add a constant to the current value
    Delta(Value),
    /// Replace the current value with one computed from the state
    Compute(ComputeFn),
}

impl Effect {
    pub fn delta(delta: impl Into<Value>) -> Self {
        Effect::Delta(delta.into())
    }

    pub fn compute<F, R>(f: F) -> Self
    where
        F: Fn(&State) -> R + Send + Sync + 'static,
        R: Into<Computed>,
    {
        Effect::Compute(Arc::new(move |state| f(state).into()))
    }
}

fn fn_addr(f: &ComputeFn) -> *const () {
    Arc::as_ptr(f) as *const ()
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Delta(v) => write!(f, "Delta({})", v),
            Effect::Compute(func) => write!(f, "Compute({:p})", fn_addr(func)),
        }
    }
}

// Computed effects compare by identity; closures have no structural equality.
impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Effect::Delta(a), Effect::Delta(b)) => a == b,
            (Effect::Compute(a), Effect::Compute(b)) => std::ptr::eq(fn_addr(a), fn_addr(b)),
            _ => false,
        }
    }
}

impl Hash for Effect {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Effect::Delta(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            Effect::Compute(func) => {
                1u8.hash(state);
                (fn_addr(func) as usize).hash(state);
            }
        }
    }
}

/// A partial-state update specification.
///
/// # Examples
///
/// ```
/// use goap_utility::{State, Update};
///
/// let update = Update::new().add("cash", 100);
/// let state: State = [("cash", 0)].into_iter().collect();
///
/// assert_eq!(state.update(&update).get_f64("cash"), Some(100.0));
/// // Keys the state does not carry are ignored
/// let other: State = [("time", 3)].into_iter().collect();
/// assert_eq!(other.update(&update), other);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Hash)]
pub struct Update {
    effects: BTreeMap<String, Effect>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constant delta for `key`.
    pub fn add(mut self, key: impl Into<String>, delta: impl Into<Value>) -> Self {
        self.effects.insert(key.into(), Effect::delta(delta));
        self
    }

    /// Computes the value for `key` from the state being updated.
    pub fn compute<F, R>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&State) -> R + Send + Sync + 'static,
        R: Into<Computed>,
    {
        self.effects.insert(key.into(), Effect::compute(f));
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, effect: Effect) {
        self.effects.insert(key.into(), effect);
    }

    pub fn get(&self, key: &str) -> Option<&Effect> {
        self.effects.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Effect)> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// A clamping range; either bound may be left open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(Some(min), None)
    }

    pub fn at_most(max: f64) -> Self {
        Self::new(None, Some(max))
    }

    /// Clamps `value` into this range.
    ///
    /// A clamped integral value stays integral unless the bound itself is
    /// fractional, in which case the bound is returned as a float.
    pub fn clamp(&self, value: Value) -> Value {
        let mut value = value;
        if let Some(min) = self.min {
            if value.as_f64() < min {
                value = bound_value(value, min);
            }
        }
        if let Some(max) = self.max {
            if value.as_f64() > max {
                value = bound_value(value, max);
            }
        }
        value
    }
}

fn bound_value(like: Value, bound: f64) -> Value {
    match like {
        Value::Int(_) if bound.fract() == 0.0 => Value::Int(bound as i64),
        _ => Value::Float(bound),
    }
}

/// Per-attribute clamping ranges.
pub type Ranges = BTreeMap<String, Range>;

/// A snapshot of an agent's world: attribute name to numeric value.
///
/// # Examples
///
/// ```
/// use goap_utility::{State, Value};
///
/// let mut state = State::new();
/// state.set("cash", 0);
/// state.set("health", 0.5);
///
/// assert_eq!(state.get("cash"), Some(Value::Int(0)));
/// assert_eq!(state.get_f64("health"), Some(0.5));
/// assert_eq!(state.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    values: BTreeMap<String, Value>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).copied()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).map(Value::as_f64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns a new state with `update` applied, sampling computed effects.
    ///
    /// Effects are applied in key order, and computed effects see the
    /// attributes updated before them. Keys absent from this state are skipped.
    /// The result is not attenuated.
    pub fn update(&self, update: &Update) -> State {
        self.apply(update, false)
    }

    /// Like [`State::update`], but computed effects contribute their expected value.
    pub fn update_expected(&self, update: &Update) -> State {
        self.apply(update, true)
    }

    fn apply(&self, update: &Update, expected: bool) -> State {
        let mut next = self.clone();
        for (key, effect) in update.iter() {
            let Some(current) = next.get(key) else {
                continue;
            };
            let value = match effect {
                Effect::Delta(delta) => current.add(*delta),
                Effect::Compute(f) => {
                    let computed = f(&next);
                    current.coerce(if expected {
                        computed.expected
                    } else {
                        computed.value
                    })
                }
            };
            next.values.insert(key.clone(), value);
        }
        next
    }

    /// Clamps every attribute that has a configured range.
    pub fn attenuate(mut self, ranges: &Ranges) -> State {
        for (key, value) in self.values.iter_mut() {
            if let Some(range) = ranges.get(key) {
                *value = range.clamp(*value);
            }
        }
        self
    }

    /// A hash of the attribute/value pairs, used to filter revisited states during search.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (key, value) in &self.values {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for State
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = State::new();
        for (key, value) in iter {
            state.set(key, value);
        }
        state
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(pairs: &[(&str, i64)]) -> State {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = State::new();
        assert!(state.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let mut state = State::new();
        state.set("foo", 1);
        assert_eq!(state.get("foo"), Some(Value::Int(1)));
        state.set("foo", 2.5);
        assert_eq!(state.get("foo"), Some(Value::Float(2.5)));
        assert_eq!(state.get("bar"), None);
    }

    #[test]
    fn test_empty_update_is_identity() {
        let start = state(&[("money", 10), ("time", 10)]);
        assert_eq!(start.update(&Update::new()), start);
    }

    #[test]
    fn test_update_constant_and_computed() {
        let start = state(&[("money", 10), ("time", 10)]);
        let update = Update::new()
            .add("money", 10)
            .compute("time", |s: &State| s.get_f64("time").unwrap_or(0.0) + 2.0);

        let end = start.update(&update);
        assert_eq!(end, state(&[("money", 20), ("time", 12)]));

        let end = end.update(&update);
        assert_eq!(end, state(&[("money", 30), ("time", 14)]));

        // the source state is untouched
        assert_eq!(start, state(&[("money", 10), ("time", 10)]));
    }

    #[test]
    fn test_update_ignores_unknown_keys() {
        let start = state(&[("money", 10)]);
        let end = start.update(&Update::new().add("debt", 5));
        assert_eq!(end, start);
        assert!(!end.contains_key("debt"));
    }

    #[test]
    fn test_update_coerces_to_original_kind() {
        let start = state(&[("count", 3)]);
        let end = start.update(&Update::new().add("count", 1.7));
        assert_eq!(end.get("count"), Some(Value::Int(4)));
        assert!(end.get("count").unwrap().is_int());

        let mut float_state = State::new();
        float_state.set("level", 1.0);
        let end = float_state.update(&Update::new().add("level", 2));
        assert_eq!(end.get("level"), Some(Value::Float(3.0)));
    }

    #[test]
    fn test_update_expected_uses_expected_value() {
        let start = state(&[("cash", 0)]);
        let update = Update::new().compute("cash", |_: &State| (100.0, 60.0));
        assert_eq!(start.update(&update).get_f64("cash"), Some(100.0));
        assert_eq!(start.update_expected(&update).get_f64("cash"), Some(60.0));
    }

    #[test]
    fn test_attenuate() {
        let mut ranges = Ranges::new();
        ranges.insert("a".to_string(), Range::new(Some(0.0), Some(10.0)));
        ranges.insert("b".to_string(), Range::at_least(5.0));
        ranges.insert("c".to_string(), Range::at_most(1.5));

        let s = state(&[("a", 20), ("b", 2), ("c", 9), ("d", 100)]).attenuate(&ranges);
        assert_eq!(s.get("a"), Some(Value::Int(10)));
        assert_eq!(s.get("b"), Some(Value::Int(5)));
        assert_eq!(s.get("c"), Some(Value::Float(1.5)));
        assert_eq!(s.get("d"), Some(Value::Int(100)));
    }

    #[test]
    fn test_attenuated_updates_stay_in_range() {
        let mut ranges = Ranges::new();
        ranges.insert("x".to_string(), Range::new(Some(-3.5), Some(7.0)));
        ranges.insert("y".to_string(), Range::new(Some(0.0), None));

        let start = state(&[("x", 0), ("y", 0)]);
        for delta in [-1000.0, -3.6, -0.5, 0.0, 0.25, 6.9, 7.1, 1e9] {
            let update = Update::new().add("x", delta).add("y", delta);
            let s = start.update(&update).attenuate(&ranges);
            let x = s.get_f64("x").unwrap();
            let y = s.get_f64("y").unwrap();
            assert!((-3.5..=7.0).contains(&x), "x={} for delta {}", x, delta);
            assert!(y >= 0.0, "y={} for delta {}", y, delta);
        }
    }

    #[test]
    fn test_mixed_kind_equality_and_fingerprint() {
        let mut a = State::new();
        a.set("cash", 75);
        let mut b = State::new();
        b.set("cash", 75.0);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());

        b.set("cash", 76.0);
        assert_ne!(a, b);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_effect_identity() {
        let f = Effect::compute(|_: &State| 1.0);
        let g = Effect::compute(|_: &State| 1.0);
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
        assert_eq!(Effect::delta(3), Effect::delta(3.0));
    }

    #[test]
    fn test_display() {
        let s = state(&[("b", 2), ("a", 1)]);
        assert_eq!(s.to_string(), "{a: 1, b: 2}");
    }
}
