//! Engine configuration.
//!
//! Market constants and solver settings are passed explicitly into every
//! pricing and solving call. Nothing here is global; a caller that wants the
//! same rate everywhere keeps one [`EngineConfig`] and hands out references.

use std::fmt;
use std::str::FromStr;

use cashopt_core::schedule::{SettlementSchedule, MAX_FEED_WINDOW_SECS};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// A field holds an unusable value.
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        /// Dotted path of the field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Unrecognised solver method name.
    #[error("Unknown implied volatility method: {0}")]
    UnknownMethod(String),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField {
        field,
        reason: reason.into(),
    }
}

/// Market constants used when a call does not supply its own.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MarketParams {
    /// Annualised continuously compounded risk-free rate.
    pub risk_free_rate: f64,
    /// Volatility used to quote fair prices.
    pub default_volatility: f64,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0475,
            default_volatility: 0.75,
        }
    }
}

impl MarketParams {
    /// Validates the parameters.
    ///
    /// # Errors
    /// `ConfigError::InvalidField` if the rate is not finite or the default
    /// volatility is not positive and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.risk_free_rate.is_finite() {
            return Err(invalid("market.risk_free_rate", "must be finite"));
        }
        if !(self.default_volatility.is_finite() && self.default_volatility > 0.0) {
            return Err(invalid(
                "market.default_volatility",
                format!("must be positive, got {}", self.default_volatility),
            ));
        }
        Ok(())
    }
}

/// Root-finding strategy for implied volatility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ImpliedVolMethod {
    /// Newton steps on analytic vega, falling back to Brent's method on the
    /// volatility bounds when Newton stalls or leaves them.
    #[default]
    NewtonWithBisection,
    /// Brent's method on the volatility bounds only.
    Bisection,
    /// Fixed correction `σ += (observed - price(σ)) / 100`, capped.
    FixedStep,
}

impl fmt::Display for ImpliedVolMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImpliedVolMethod::NewtonWithBisection => "newton_with_bisection",
            ImpliedVolMethod::Bisection => "bisection",
            ImpliedVolMethod::FixedStep => "fixed_step",
        };
        f.write_str(name)
    }
}

impl FromStr for ImpliedVolMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "newton" | "newton_with_bisection" => Ok(ImpliedVolMethod::NewtonWithBisection),
            "bisection" | "brent" => Ok(ImpliedVolMethod::Bisection),
            "fixed_step" | "fixed" => Ok(ImpliedVolMethod::FixedStep),
            _ => Err(ConfigError::UnknownMethod(s.to_string())),
        }
    }
}

/// Implied volatility solver settings.
///
/// # Examples
/// ```
/// use cashopt_engine::config::{ImpliedVolConfig, ImpliedVolMethod};
///
/// let config = ImpliedVolConfig::default();
/// assert_eq!(config.tolerance, 1e-4);
/// assert_eq!(config.method, ImpliedVolMethod::NewtonWithBisection);
///
/// let legacy = config.with_method(ImpliedVolMethod::FixedStep).with_max_iterations(1_000);
/// assert!(legacy.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImpliedVolConfig {
    /// Accepted absolute pricing error.
    pub tolerance: f64,
    /// Starting volatility for Newton and fixed-step iteration.
    pub initial_guess: f64,
    /// Iteration cap before `NonConvergent`.
    pub max_iterations: usize,
    /// Lowest volatility searched.
    pub lower_bound: f64,
    /// Highest volatility searched.
    pub upper_bound: f64,
    /// Root-finding strategy.
    pub method: ImpliedVolMethod,
}

impl Default for ImpliedVolConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            initial_guess: 0.1,
            max_iterations: 100,
            lower_bound: 1e-4,
            upper_bound: 5.0,
            method: ImpliedVolMethod::default(),
        }
    }
}

impl ImpliedVolConfig {
    /// Same settings with another method.
    pub fn with_method(self, method: ImpliedVolMethod) -> Self {
        Self { method, ..self }
    }

    /// Same settings with another iteration cap.
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    /// Same settings with another tolerance.
    pub fn with_tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `tolerance` is not positive and finite
    /// - `max_iterations` is 0
    /// - the bounds are not `0 < lower_bound < upper_bound < ∞`
    /// - `initial_guess` is not finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(invalid(
                "implied_vol.tolerance",
                format!("must be positive, got {}", self.tolerance),
            ));
        }
        if self.max_iterations == 0 {
            return Err(invalid("implied_vol.max_iterations", "must be > 0"));
        }
        let bounds_ok = self.lower_bound > 0.0
            && self.upper_bound.is_finite()
            && self.lower_bound < self.upper_bound;
        if !bounds_ok {
            return Err(invalid(
                "implied_vol.lower_bound",
                format!(
                    "bounds must satisfy 0 < lower < upper, got [{}, {}]",
                    self.lower_bound, self.upper_bound
                ),
            ));
        }
        if !self.initial_guess.is_finite() {
            return Err(invalid("implied_vol.initial_guess", "must be finite"));
        }
        Ok(())
    }
}

/// Complete engine configuration.
///
/// # Examples
/// ```
/// use cashopt_engine::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.market.risk_free_rate, 0.0475);
/// assert_eq!(config.schedule.cutoff_hour_utc, 8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Underlying ticker used in token names.
    pub underlying: String,
    /// Market constants.
    pub market: MarketParams,
    /// Implied volatility solver settings.
    pub implied_vol: ImpliedVolConfig,
    /// Daily settlement cutoff.
    pub schedule: SettlementSchedule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            underlying: "APT".to_string(),
            market: MarketParams::default(),
            implied_vol: ImpliedVolConfig::default(),
            schedule: SettlementSchedule::default(),
        }
    }
}

impl EngineConfig {
    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.underlying.is_empty() || self.underlying.contains('_') {
            return Err(invalid(
                "underlying",
                format!("must be a non-empty ticker without '_', got {:?}", self.underlying),
            ));
        }
        self.market.validate()?;
        self.implied_vol.validate()?;
        if self.schedule.cutoff_hour_utc >= 24 {
            return Err(invalid(
                "schedule.cutoff_hour_utc",
                format!("must be below 24, got {}", self.schedule.cutoff_hour_utc),
            ));
        }
        if !(0..=MAX_FEED_WINDOW_SECS).contains(&self.schedule.feed_window_secs) {
            return Err(invalid(
                "schedule.feed_window_secs",
                format!(
                    "must be within 0..={}, got {}",
                    MAX_FEED_WINDOW_SECS, self.schedule.feed_window_secs
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_market_validation() {
        let bad = MarketParams {
            default_volatility: 0.0,
            ..MarketParams::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidField { field: "market.default_volatility", .. })
        ));

        let bad = MarketParams {
            risk_free_rate: f64::NAN,
            ..MarketParams::default()
        };
        assert!(bad.validate().is_err());

        let negative_rate = MarketParams {
            risk_free_rate: -0.01,
            ..MarketParams::default()
        };
        assert!(negative_rate.validate().is_ok());
    }

    #[test]
    fn test_implied_vol_validation() {
        let base = ImpliedVolConfig::default();
        assert!(base.with_tolerance(0.0).validate().is_err());
        assert!(base.with_max_iterations(0).validate().is_err());

        let inverted = ImpliedVolConfig {
            lower_bound: 2.0,
            upper_bound: 1.0,
            ..base
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::InvalidField { field: "implied_vol.lower_bound", .. })
        ));

        let zero_lower = ImpliedVolConfig {
            lower_bound: 0.0,
            ..base
        };
        assert!(zero_lower.validate().is_err());
    }

    #[test]
    fn test_engine_validation() {
        let mut config = EngineConfig::default();
        config.schedule.cutoff_hour_utc = 24;
        assert!(config.validate().is_err());

        let config = EngineConfig {
            underlying: "A_B".to_string(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_feed_window_bounds() {
        let mut config = EngineConfig::default();
        config.schedule.feed_window_secs = MAX_FEED_WINDOW_SECS;
        assert!(config.validate().is_ok());

        for secs in [MAX_FEED_WINDOW_SECS + 1, i64::MAX, -1] {
            config.schedule.feed_window_secs = secs;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidField { field: "schedule.feed_window_secs", .. })
            ));
        }
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(
            "newton".parse::<ImpliedVolMethod>().unwrap(),
            ImpliedVolMethod::NewtonWithBisection
        );
        assert_eq!("Fixed-Step".parse::<ImpliedVolMethod>().unwrap(), ImpliedVolMethod::FixedStep);
        assert_eq!("brent".parse::<ImpliedVolMethod>().unwrap(), ImpliedVolMethod::Bisection);
        assert!(matches!(
            "secant".parse::<ImpliedVolMethod>(),
            Err(ConfigError::UnknownMethod(_))
        ));
        for method in [
            ImpliedVolMethod::NewtonWithBisection,
            ImpliedVolMethod::Bisection,
            ImpliedVolMethod::FixedStep,
        ] {
            assert_eq!(method.to_string().parse::<ImpliedVolMethod>().unwrap(), method);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial_sections() {
        let json = r#"{ "market": { "risk_free_rate": 0.03 }, "implied_vol": { "method": "bisection" } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.market.risk_free_rate, 0.03);
        assert_eq!(config.market.default_volatility, 0.75);
        assert_eq!(config.implied_vol.method, ImpliedVolMethod::Bisection);
        assert_eq!(config.underlying, "APT");
    }
}
