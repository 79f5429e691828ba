//! Black-Scholes pricing for European cash-settled options.
//!
//! ## Mathematical Formulas
//!
//! **Call Price**: C = S·N(d₁) - K·e^(-rT)·N(d₂)
//! **Put Price**: P = K·e^(-rT)·N(-d₂) - S·N(-d₁)
//!
//! Where:
//! - d₁ = (ln(S/K) + (r + σ²/2)T) / (σ√T)
//! - d₂ = d₁ - σ√T
//!
//! At or after expiry (`T <= 0`) the price is the intrinsic value regardless
//! of σ. Inputs are not validated: a zero or stale spot is priced as given,
//! and anything that makes the formula non-finite comes back as
//! [`PriceOutcome::Unpriceable`].

use std::fmt;

use cashopt_core::math::{norm_cdf, norm_pdf};

use crate::contract::OptionKind;

/// Why a price could not be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "reason", rename_all = "snake_case"))]
pub enum UnpriceableReason {
    /// σ ≤ 0 (or NaN) with time remaining.
    NonPositiveVolatility {
        /// The offending volatility
        volatility: f64,
    },
    /// The formula produced NaN or infinity.
    NonFinite,
}

impl fmt::Display for UnpriceableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnpriceableReason::NonPositiveVolatility { volatility } => {
                write!(f, "non-positive volatility σ = {volatility}")
            }
            UnpriceableReason::NonFinite => write!(f, "non-finite result"),
        }
    }
}

/// Result of a pricing attempt.
///
/// A mathematically worthless option is `Priced(0.0)`; a price that could
/// not be computed is `Unpriceable`. Callers that need the legacy single
/// number use [`value_or_zero`](Self::value_or_zero).
///
/// # Examples
/// ```
/// use cashopt_engine::contract::OptionKind;
/// use cashopt_engine::pricing::{quote, PriceOutcome};
///
/// let worthless = quote(OptionKind::Call, 10.0, 18.0, 0.05, 0.75, 0.0);
/// assert_eq!(worthless, PriceOutcome::Priced(0.0));
///
/// let broken = quote(OptionKind::Call, 18.0, 18.0, 0.05, 0.0, 0.1);
/// assert!(!broken.is_priced());
/// assert_eq!(broken.value_or_zero(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PriceOutcome {
    /// A finite, non-negative fair value.
    Priced(f64),
    /// No price could be computed.
    Unpriceable(UnpriceableReason),
}

impl PriceOutcome {
    /// The price, or 0 when unpriceable.
    #[inline]
    pub fn value_or_zero(&self) -> f64 {
        self.value().unwrap_or(0.0)
    }

    /// The price, if one was computed.
    #[inline]
    pub fn value(&self) -> Option<f64> {
        match self {
            PriceOutcome::Priced(value) => Some(*value),
            PriceOutcome::Unpriceable(_) => None,
        }
    }

    /// Whether a price was computed.
    #[inline]
    pub fn is_priced(&self) -> bool {
        matches!(self, PriceOutcome::Priced(_))
    }
}

/// Black-Scholes model for a fixed spot, rate and volatility.
///
/// # Examples
/// ```
/// use cashopt_engine::contract::OptionKind;
/// use cashopt_engine::pricing::BlackScholes;
///
/// let bs = BlackScholes::new(18.0, 0.0475, 0.75);
/// let t = 30.0 / 365.0;
/// let call = bs.price(OptionKind::Call, 18.0, t);
/// let put = bs.price(OptionKind::Put, 18.0, t);
///
/// // C - P = S - K·e^(-rT)
/// let parity = call - put - (18.0 - 18.0 * (-0.0475 * t).exp());
/// assert!(parity.abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholes {
    spot: f64,
    rate: f64,
    volatility: f64,
}

impl BlackScholes {
    /// Creates a model. Inputs are taken as given.
    pub fn new(spot: f64, rate: f64, volatility: f64) -> Self {
        Self {
            spot,
            rate,
            volatility,
        }
    }

    /// Spot price.
    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Risk-free rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Volatility.
    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// The same model at another volatility.
    #[inline]
    pub fn with_volatility(&self, volatility: f64) -> Self {
        Self { volatility, ..*self }
    }

    /// d₁ = (ln(S/K) + (r + σ²/2)T) / (σ√T)
    ///
    /// Only meaningful for `expiry > 0` and `σ > 0`.
    #[inline]
    pub fn d1(&self, strike: f64, expiry: f64) -> f64 {
        let sigma = self.volatility;
        let numerator = (self.spot / strike).ln() + (self.rate + 0.5 * sigma * sigma) * expiry;
        numerator / (sigma * expiry.sqrt())
    }

    /// d₂ = d₁ - σ√T
    #[inline]
    pub fn d2(&self, strike: f64, expiry: f64) -> f64 {
        self.d1(strike, expiry) - self.volatility * expiry.sqrt()
    }

    /// Prices an option, distinguishing worthless from unpriceable.
    pub fn quote(&self, kind: OptionKind, strike: f64, expiry: f64) -> PriceOutcome {
        // f64::max drops NaN, so the intrinsic branch would report 0.
        if self.spot.is_nan() || strike.is_nan() {
            return unpriceable(UnpriceableReason::NonFinite);
        }

        if expiry <= 0.0 {
            let intrinsic = kind.intrinsic(self.spot, strike);
            return if intrinsic.is_finite() {
                PriceOutcome::Priced(intrinsic)
            } else {
                unpriceable(UnpriceableReason::NonFinite)
            };
        }

        if self.volatility.is_nan() || self.volatility <= 0.0 {
            return unpriceable(UnpriceableReason::NonPositiveVolatility {
                volatility: self.volatility,
            });
        }

        let d1 = self.d1(strike, expiry);
        let d2 = d1 - self.volatility * expiry.sqrt();
        let discounted_strike = strike * (-self.rate * expiry).exp();

        let value = match kind {
            OptionKind::Call => self.spot * norm_cdf(d1) - discounted_strike * norm_cdf(d2),
            OptionKind::Put => discounted_strike * norm_cdf(-d2) - self.spot * norm_cdf(-d1),
        };

        if value.is_finite() {
            // Cancellation can leave a tiny negative residue deep out of the money.
            PriceOutcome::Priced(value.max(0.0))
        } else {
            unpriceable(UnpriceableReason::NonFinite)
        }
    }

    /// Prices an option, returning 0 when unpriceable.
    #[inline]
    pub fn price(&self, kind: OptionKind, strike: f64, expiry: f64) -> f64 {
        self.quote(kind, strike, expiry).value_or_zero()
    }

    /// Vega: ∂V/∂σ = S·√T·φ(d₁), identical for calls and puts.
    ///
    /// Zero at or after expiry and whenever the formula is undefined.
    pub fn vega(&self, strike: f64, expiry: f64) -> f64 {
        if expiry <= 0.0 || self.volatility.is_nan() || self.volatility <= 0.0 {
            return 0.0;
        }
        let vega = self.spot * expiry.sqrt() * norm_pdf(self.d1(strike, expiry));
        if vega.is_finite() {
            vega
        } else {
            0.0
        }
    }
}

fn unpriceable(reason: UnpriceableReason) -> PriceOutcome {
    tracing::debug!(%reason, "option unpriceable");
    PriceOutcome::Unpriceable(reason)
}

/// Prices an option from its five market parameters.
///
/// Never negative and never NaN: unpriceable inputs give 0. Use [`quote`]
/// to tell a worthless option from an unpriceable one.
///
/// # Examples
/// ```
/// use cashopt_engine::contract::OptionKind;
/// use cashopt_engine::pricing::price;
///
/// let call = price(OptionKind::Call, 18.0, 18.0, 0.0475, 0.75, 30.0 / 365.0);
/// assert!((call - 1.57).abs() < 0.02);
///
/// // At expiry only intrinsic value remains.
/// assert_eq!(price(OptionKind::Put, 16.0, 18.0, 0.0475, 0.75, 0.0), 2.0);
/// ```
pub fn price(
    kind: OptionKind,
    spot: f64,
    strike: f64,
    rate: f64,
    volatility: f64,
    expiry: f64,
) -> f64 {
    BlackScholes::new(spot, rate, volatility).price(kind, strike, expiry)
}

/// Prices an option from its five market parameters as a tagged outcome.
pub fn quote(
    kind: OptionKind,
    spot: f64,
    strike: f64,
    rate: f64,
    volatility: f64,
    expiry: f64,
) -> PriceOutcome {
    BlackScholes::new(spot, rate, volatility).quote(kind, strike, expiry)
}

/// Analytic vega of an option from its five market parameters.
pub fn vega(spot: f64, strike: f64, rate: f64, volatility: f64, expiry: f64) -> f64 {
    BlackScholes::new(spot, rate, volatility).vega(strike, expiry)
}
