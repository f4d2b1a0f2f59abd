//! European Black-Scholes pricing, Greeks, and implied volatility.

use crate::types::OptionType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};
use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

const IV_LOWER: f64 = 0.001;
const IV_UPPER: f64 = 5.0;
const IV_TOLERANCE: f64 = 1e-6;
const IV_MAX_ITERATIONS: usize = 100;

/// Standard normal cumulative distribution.
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal density.
#[inline]
pub fn norm_pdf(x: f64) -> f64 {
    Normal::standard().pdf(x)
}

/// Year fraction between the valuation date and expiry (ACT/365).
///
/// Negative once the option has expired.
pub fn time_to_expiry(expiry: NaiveDate, as_of: NaiveDate) -> f64 {
    (expiry - as_of).num_days() as f64 / 365.0
}

/// Price and sensitivities of one option on one share.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Greeks {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
    /// Per calendar day
    pub theta: f64,
    /// Per 1 volatility point
    pub vega: f64,
}

/// Black-Scholes inputs for a single European option (no dividends).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholes {
    pub option_type: OptionType,
    pub spot: f64,
    pub strike: f64,
    pub rate: f64,
    pub volatility: f64,
    /// Years until expiry
    pub time_to_expiry: f64,
}

impl BlackScholes {
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        rate: f64,
        volatility: f64,
        time_to_expiry: f64,
    ) -> Self {
        Self {
            option_type,
            spot,
            strike,
            rate,
            volatility,
            time_to_expiry,
        }
    }

    fn intrinsic(&self) -> f64 {
        match self.option_type {
            OptionType::Call => (self.spot - self.strike).max(0.0),
            OptionType::Put => (self.strike - self.spot).max(0.0),
        }
    }

    /// Whether the closed form degenerates (expired, no vol, or no spot).
    fn is_degenerate(&self) -> bool {
        self.time_to_expiry <= 0.0 || self.volatility <= 0.0 || self.spot <= 0.0
    }

    fn d1_d2(&self) -> (f64, f64) {
        let sig_sqrt_t = self.volatility * self.time_to_expiry.sqrt();
        let d1 = ((self.spot / self.strike).ln()
            + (self.rate + 0.5 * self.volatility * self.volatility) * self.time_to_expiry)
            / sig_sqrt_t;
        (d1, d1 - sig_sqrt_t)
    }

    /// Option value per share.
    pub fn price(&self) -> f64 {
        if self.time_to_expiry <= 0.0 {
            return self.intrinsic();
        }
        let df = (-self.rate * self.time_to_expiry).exp();
        if self.is_degenerate() {
            return match self.option_type {
                OptionType::Call => (self.spot - self.strike * df).max(0.0),
                OptionType::Put => (self.strike * df - self.spot).max(0.0),
            };
        }

        let (d1, d2) = self.d1_d2();
        match self.option_type {
            OptionType::Call => self.spot * norm_cdf(d1) - self.strike * df * norm_cdf(d2),
            OptionType::Put => self.strike * df * norm_cdf(-d2) - self.spot * norm_cdf(-d1),
        }
    }

    /// Delta of one long option.
    pub fn delta(&self) -> f64 {
        if self.is_degenerate() {
            // Step function: fully in or fully out of the money.
            let forward_strike = if self.time_to_expiry > 0.0 {
                self.strike * (-self.rate * self.time_to_expiry).exp()
            } else {
                self.strike
            };
            return match self.option_type {
                OptionType::Call if self.spot > forward_strike => 1.0,
                OptionType::Call => 0.0,
                OptionType::Put if self.spot < forward_strike => -1.0,
                OptionType::Put => 0.0,
            };
        }

        let (d1, _) = self.d1_d2();
        match self.option_type {
            OptionType::Call => norm_cdf(d1),
            OptionType::Put => norm_cdf(d1) - 1.0,
        }
    }

    pub fn gamma(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        let (d1, _) = self.d1_d2();
        norm_pdf(d1) / (self.spot * self.volatility * self.time_to_expiry.sqrt())
    }

    /// Time decay per calendar day.
    pub fn theta(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        let (d1, d2) = self.d1_d2();
        let df = (-self.rate * self.time_to_expiry).exp();
        let decay =
            -self.spot * norm_pdf(d1) * self.volatility / (2.0 * self.time_to_expiry.sqrt());
        let carry = match self.option_type {
            OptionType::Call => -self.rate * self.strike * df * norm_cdf(d2),
            OptionType::Put => self.rate * self.strike * df * norm_cdf(-d2),
        };
        (decay + carry) / 365.0
    }

    /// Sensitivity to a 1 point (0.01) move in volatility.
    pub fn vega(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        let (d1, _) = self.d1_d2();
        self.spot * norm_pdf(d1) * self.time_to_expiry.sqrt() / 100.0
    }

    pub fn greeks(&self) -> Greeks {
        Greeks {
            price: self.price(),
            delta: self.delta(),
            gamma: self.gamma(),
            theta: self.theta(),
            vega: self.vega(),
        }
    }

    /// Same option at a different volatility.
    pub fn with_volatility(&self, volatility: f64) -> Self {
        Self {
            volatility,
            ..*self
        }
    }

    /// Same option at a different spot.
    pub fn with_spot(&self, spot: f64) -> Self {
        Self { spot, ..*self }
    }
}

/// Solve for the volatility that reproduces `premium`.
///
/// Bisection over `[0.001, 5.0]`. Returns `None` for expired options and for
/// premiums outside the no-arbitrage bounds; premiums inside the bounds but
/// beyond the search interval clamp to its edges.
pub fn implied_volatility(
    option_type: OptionType,
    premium: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    time_to_expiry: f64,
) -> Option<f64> {
    if time_to_expiry <= 0.0 || spot <= 0.0 || strike <= 0.0 || !premium.is_finite() {
        return None;
    }

    let df = (-rate * time_to_expiry).exp();
    let (lower_bound, upper_bound) = match option_type {
        OptionType::Call => ((spot - strike * df).max(0.0), spot),
        OptionType::Put => ((strike * df - spot).max(0.0), strike * df),
    };
    if premium < lower_bound - IV_TOLERANCE || premium > upper_bound + IV_TOLERANCE {
        return None;
    }

    let model = BlackScholes::new(option_type, spot, strike, rate, IV_LOWER, time_to_expiry);
    if premium <= model.price() {
        return Some(IV_LOWER);
    }
    if premium >= model.with_volatility(IV_UPPER).price() {
        return Some(IV_UPPER);
    }

    let mut lo = IV_LOWER;
    let mut hi = IV_UPPER;
    for _ in 0..IV_MAX_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        let diff = model.with_volatility(mid).price() - premium;
        if diff.abs() < IV_TOLERANCE || (hi - lo) < IV_TOLERANCE {
            return Some(mid);
        }
        if diff > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    Some(0.5 * (lo + hi))
}
