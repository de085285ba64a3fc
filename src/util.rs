//! Numeric helpers for writing utility functions.

/// Smoothing factor used by [`ewma`] callers that have no better choice.
pub const DEFAULT_ALPHA: f64 = 0.8;

/// Exponentially weighted moving mean: moves `mean` toward `value` by `alpha`.
///
/// ```
/// use goap_utility::util::{ewma, DEFAULT_ALPHA};
///
/// assert_eq!(ewma(10.0, 20.0, 0.5), 15.0);
/// assert!((ewma(0.0, 10.0, DEFAULT_ALPHA) - 8.0).abs() < 1e-12);
/// ```
pub fn ewma(mean: f64, value: f64, alpha: f64) -> f64 {
    mean + alpha * (value - mean)
}

/// Hyperbolically discounts `value` received after `delay` time units at rate `k`.
pub fn hyperbolic_discount(value: f64, delay: f64, k: f64) -> f64 {
    value / (1.0 + delay * k)
}
