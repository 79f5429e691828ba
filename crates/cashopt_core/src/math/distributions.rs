//! Standard normal distribution functions.
//!
//! This module provides:
//! - `norm_cdf`: Cumulative distribution function Φ(x)
//! - `norm_pdf`: Probability density function φ(x)
//!
//! Both are generic over `T: Float` so the same code serves `f64` and `f32`.

use num_traits::Float;

/// 1 / sqrt(2π)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Abramowitz and Stegun 7.1.26 coefficients.
const ERF_A: [f64; 5] = [
    0.254_829_592,
    -0.284_496_736,
    1.421_413_741,
    -1.453_152_027,
    1.061_405_429,
];
const ERF_P: f64 = 0.327_591_1;

#[inline]
fn lit<T: Float>(x: f64) -> T {
    T::from(x).unwrap_or_else(T::nan)
}

/// Complementary error function for non-negative arguments.
///
/// Abramowitz and Stegun 7.1.26, absolute error below 1.5e-7.
#[inline]
fn erfc_non_negative<T: Float>(abs_x: T) -> T {
    let t = T::one() / (T::one() + lit::<T>(ERF_P) * abs_x);

    // Horner evaluation of a1 t + a2 t² + ... + a5 t⁵
    let poly = ERF_A
        .iter()
        .rev()
        .fold(T::zero(), |acc, &a| acc * t + lit::<T>(a));

    t * poly * (-abs_x * abs_x).exp()
}

/// Standard normal cumulative distribution function.
///
/// Computes P(X <= x) for X ~ N(0, 1) as Φ(x) = erfc(-x/√2) / 2.
///
/// The negative half-line is evaluated through the reflection
/// `erfc(-z) = 2 - erfc(z)`, so `Φ(x) + Φ(-x) = 1` holds up to rounding
/// rather than up to approximation error. This is what keeps put-call parity
/// tight in the closed-form pricer.
///
/// # Accuracy
/// Absolute error below 1e-7 for all finite x. Results are clamped to [0, 1].
///
/// # Examples
/// ```
/// use cashopt_core::math::distributions::norm_cdf;
///
/// assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-7);
/// assert!(norm_cdf(-3.0_f64) < 0.01);
/// assert!(norm_cdf(3.0_f64) > 0.99);
/// ```
#[inline]
pub fn norm_cdf<T: Float>(x: T) -> T {
    if x.is_nan() {
        return x;
    }
    let half = lit::<T>(0.5);
    let z = x / lit::<T>(std::f64::consts::SQRT_2);
    let tail = erfc_non_negative(z.abs());

    let cdf = if z >= T::zero() {
        T::one() - half * tail
    } else {
        half * tail
    };
    cdf.max(T::zero()).min(T::one())
}

/// Standard normal probability density function.
///
/// φ(x) = exp(-x²/2) / √(2π)
///
/// # Examples
/// ```
/// use cashopt_core::math::distributions::norm_pdf;
///
/// assert!((norm_pdf(0.0_f64) - 0.3989422804).abs() < 1e-9);
/// ```
#[inline]
pub fn norm_pdf<T: Float>(x: T) -> T {
    lit::<T>(FRAC_1_SQRT_2PI) * (-lit::<T>(0.5) * x * x).exp()
}
