//! Option contracts, Black-Scholes analytics, and option position derivation.

mod black_scholes;
mod contract;

pub use black_scholes::{
    implied_volatility, norm_cdf, norm_pdf, time_to_expiry, BlackScholes, Greeks,
};
pub use contract::OptionContract;

use crate::config::FolioConfig;
use crate::types::OptionPosition;
use chrono::NaiveDate;

/// Sign of a quantity, with zero mapping to zero.
fn direction(quantity: f64) -> f64 {
    if quantity > 0.0 {
        1.0
    } else if quantity < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl OptionPosition {
    /// Build an option position and derive delta and exposures.
    ///
    /// Volatility is implied from `price` when possible and falls back to
    /// `config.default_volatility` otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: &str,
        contract: &OptionContract,
        quantity: f64,
        price: f64,
        underlying_price: f64,
        beta: f64,
        config: &FolioConfig,
        as_of: NaiveDate,
    ) -> Self {
        let t = time_to_expiry(contract.expiry, as_of);
        let implied_volatility = implied_volatility(
            contract.option_type,
            price,
            underlying_price,
            contract.strike,
            config.risk_free_rate,
            t,
        )
        .unwrap_or_else(|| {
            tracing::debug!(
                "No implied vol for {}, using default {}",
                symbol.trim(),
                config.default_volatility
            );
            config.default_volatility
        });

        let mut position = Self {
            symbol: symbol.trim().to_string(),
            underlying: contract.underlying.clone(),
            option_type: contract.option_type,
            strike: contract.strike,
            expiry: contract.expiry,
            quantity,
            price,
            underlying_price,
            beta,
            multiplier: config.contract_multiplier,
            implied_volatility,
            delta: 0.0,
            notional_value: 0.0,
            market_value: 0.0,
            delta_exposure: 0.0,
            beta_adjusted_exposure: 0.0,
        };
        position.rederive(config.risk_free_rate, as_of);
        position
    }

    /// The contract terms of this position.
    pub fn contract(&self) -> OptionContract {
        OptionContract {
            underlying: self.underlying.clone(),
            option_type: self.option_type,
            strike: self.strike,
            expiry: self.expiry,
        }
    }

    /// Black-Scholes model at the position's implied vol.
    pub fn model(&self, underlying_price: f64, rate: f64, as_of: NaiveDate) -> BlackScholes {
        BlackScholes::new(
            self.option_type,
            underlying_price,
            self.strike,
            rate,
            self.implied_volatility,
            time_to_expiry(self.expiry, as_of),
        )
    }

    /// Premium after the underlying moves to `underlying_price`.
    ///
    /// The model change is applied on top of the quoted premium, so an
    /// unchanged underlying always returns the quoted premium.
    pub fn repriced_premium(&self, underlying_price: f64, rate: f64, as_of: NaiveDate) -> f64 {
        let now = self.model(self.underlying_price, rate, as_of).price();
        let then = self.model(underlying_price, rate, as_of).price();
        (self.price + then - now).max(0.0)
    }

    /// Re-derive the position after the underlying moves.
    pub fn with_underlying_price(
        &self,
        underlying_price: f64,
        config: &FolioConfig,
        as_of: NaiveDate,
    ) -> Self {
        let price = self.repriced_premium(underlying_price, config.risk_free_rate, as_of);
        let mut position = Self {
            price,
            underlying_price,
            ..self.clone()
        };
        position.rederive(config.risk_free_rate, as_of);
        position
    }

    /// Re-derive the position with a new beta.
    pub fn with_beta(&self, beta: f64) -> Self {
        Self {
            beta,
            beta_adjusted_exposure: self.delta_exposure * beta,
            ..self.clone()
        }
    }

    fn rederive(&mut self, rate: f64, as_of: NaiveDate) {
        self.delta = self.model(self.underlying_price, rate, as_of).delta();
        self.notional_value = self.multiplier * self.underlying_price * self.quantity.abs();
        self.market_value = self.quantity * self.price * self.multiplier;
        self.delta_exposure = self.delta * self.notional_value * direction(self.quantity);
        self.beta_adjusted_exposure = self.delta_exposure * self.beta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OptionType;
    use approx::assert_abs_diff_eq;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn call_contract() -> OptionContract {
        OptionContract {
            underlying: "SPY".to_string(),
            option_type: OptionType::Call,
            strike: 100.0,
            expiry: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        }
    }

    fn config() -> FolioConfig {
        FolioConfig {
            risk_free_rate: 0.05,
            ..FolioConfig::default()
        }
    }

    fn position(contract: &OptionContract, quantity: f64, price: f64, beta: f64) -> OptionPosition {
        let (config, as_of) = (config(), as_of());
        OptionPosition::new("-SPY260101C100", contract, quantity, price, 100.0, beta, &config, as_of)
    }

    #[test]
    fn test_long_call_exposure() {
        let premium = BlackScholes::new(OptionType::Call, 100.0, 100.0, 0.05, 0.2, 1.0).price();
        let pos = position(&call_contract(), 2.0, premium, 1.0);

        assert_abs_diff_eq!(pos.implied_volatility, 0.2, epsilon = 1e-4);
        assert_abs_diff_eq!(pos.delta, 0.6368, epsilon = 1e-3);
        assert_eq!(pos.notional_value, 20_000.0);
        assert_abs_diff_eq!(pos.market_value, 2.0 * premium * 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pos.delta_exposure, pos.delta * 20_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pos.beta_adjusted_exposure, pos.delta_exposure, epsilon = 1e-9);
    }

    #[test]
    fn test_short_call_exposure_is_negative() {
        let premium = BlackScholes::new(OptionType::Call, 100.0, 100.0, 0.05, 0.2, 1.0).price();
        let pos = position(&call_contract(), -3.0, premium, 1.5);

        assert!(pos.delta > 0.0);
        assert_eq!(pos.notional_value, 30_000.0);
        assert!(pos.delta_exposure < 0.0);
        assert!(pos.market_value < 0.0);
        assert_abs_diff_eq!(pos.beta_adjusted_exposure, pos.delta_exposure * 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_long_put_exposure_is_negative() {
        let contract = OptionContract {
            option_type: OptionType::Put,
            ..call_contract()
        };
        let premium = BlackScholes::new(OptionType::Put, 100.0, 100.0, 0.05, 0.2, 1.0).price();
        let pos = position(&contract, 1.0, premium, 1.0);

        assert!(pos.delta < 0.0);
        assert!(pos.delta_exposure < 0.0);
        assert!(pos.market_value > 0.0);
    }

    #[test]
    fn test_unpriceable_premium_uses_default_vol() {
        // Premium above the stock price cannot be implied
        let pos = position(&call_contract(), 1.0, 500.0, 1.0);
        assert_eq!(pos.implied_volatility, config().default_volatility);
    }

    #[test]
    fn test_with_underlying_price_keeps_premium_when_unchanged() {
        let premium = 12.0;
        let pos = position(&call_contract(), 1.0, premium, 1.0);
        let same = pos.with_underlying_price(100.0, &config(), as_of());
        assert_abs_diff_eq!(same.price, premium, epsilon = 1e-12);

        let up = pos.with_underlying_price(110.0, &config(), as_of());
        assert!(up.price > premium);
        assert!(up.delta > pos.delta);
        assert_eq!(up.notional_value, 11_000.0);
    }

    #[test]
    fn test_zero_quantity_has_no_exposure() {
        let pos = position(&call_contract(), 0.0, 10.0, 1.0);
        assert_eq!(pos.delta_exposure, 0.0);
        assert_eq!(pos.market_value, 0.0);
    }
}
