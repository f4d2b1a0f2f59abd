//! "What-if" SPY shock simulation.
//!
//! Each position moves by its beta times the index move. Options are
//! re-priced with Black-Scholes at their implied vol; cash and pending
//! activity stay put.

use crate::config::FolioConfig;
use crate::portfolio::Portfolio;
use crate::types::PortfolioGroup;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Portfolio value at one SPY shock level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationPoint {
    /// Index move as a decimal (-0.1 = SPY down 10%)
    pub spy_change: f64,
    pub portfolio_value: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
    /// Value of each group at this shock
    pub group_values: BTreeMap<String, f64>,
}

/// Outcome of a full shock sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub current_value: f64,
    pub points: Vec<SimulationPoint>,
    pub min_value: f64,
    pub max_value: f64,
}

impl SimulationResult {
    /// The point with the lowest portfolio value.
    pub fn worst_case(&self) -> Option<&SimulationPoint> {
        self.points
            .iter()
            .min_by(|a, b| a.portfolio_value.total_cmp(&b.portfolio_value))
    }

    /// The point with the highest portfolio value.
    pub fn best_case(&self) -> Option<&SimulationPoint> {
        self.points
            .iter()
            .max_by(|a, b| a.portfolio_value.total_cmp(&b.portfolio_value))
    }
}

/// Evenly spaced shocks from `-range` to `range` inclusive.
///
/// An odd `steps` always includes an exact 0.
pub fn spy_changes(range: f64, steps: usize) -> Vec<f64> {
    if steps < 2 {
        return vec![0.0];
    }

    let span = (steps - 1) as f64;
    (0..steps)
        .map(|i| {
            let change = -range + 2.0 * range * i as f64 / span;
            if change.abs() < 1e-12 {
                0.0
            } else {
                change
            }
        })
        .collect()
}

/// Price after a beta-scaled index move, floored at zero.
fn shocked_price(price: f64, beta: f64, spy_change: f64) -> f64 {
    (price * (1.0 + beta * spy_change)).max(0.0)
}

/// Value of one group under an index move.
pub fn group_value_at(
    group: &PortfolioGroup,
    spy_change: f64,
    config: &FolioConfig,
    as_of: NaiveDate,
) -> f64 {
    let stock_value = group
        .stock_position
        .as_ref()
        .map(|s| s.quantity * shocked_price(s.price, s.beta, spy_change))
        .unwrap_or(0.0);

    let option_value: f64 = group
        .option_positions
        .iter()
        .map(|o| {
            let underlying = shocked_price(o.underlying_price, o.beta, spy_change);
            let premium = o.repriced_premium(underlying, config.risk_free_rate, as_of);
            o.quantity * premium * o.multiplier
        })
        .sum();

    stock_value + option_value
}

/// Sweep the portfolio across `changes`.
pub fn simulate_spy_shocks(
    portfolio: &Portfolio,
    changes: &[f64],
    config: &FolioConfig,
    as_of: NaiveDate,
) -> SimulationResult {
    let summary = &portfolio.summary;
    let fixed = summary.cash_like_value + summary.pending_activity_value;
    let current_value = summary.portfolio_estimate_value;

    let points: Vec<SimulationPoint> = changes
        .iter()
        .map(|&spy_change| {
            let group_values: BTreeMap<String, f64> = portfolio
                .groups
                .iter()
                .map(|g| (g.ticker.clone(), group_value_at(g, spy_change, config, as_of)))
                .collect();
            let portfolio_value = fixed + group_values.values().sum::<f64>();
            let pnl = portfolio_value - current_value;
            let pnl_percent = if current_value.abs() > f64::EPSILON {
                pnl / current_value.abs() * 100.0
            } else {
                0.0
            };

            SimulationPoint {
                spy_change,
                portfolio_value,
                pnl,
                pnl_percent,
                group_values,
            }
        })
        .collect();

    let min_value = points
        .iter()
        .map(|p| p.portfolio_value)
        .fold(f64::INFINITY, f64::min);
    let max_value = points
        .iter()
        .map(|p| p.portfolio_value)
        .fold(f64::NEG_INFINITY, f64::max);

    tracing::debug!(
        "Simulated {} shocks: value range {:.2}..{:.2}",
        points.len(),
        min_value,
        max_value
    );

    SimulationResult {
        current_value,
        min_value: if points.is_empty() { current_value } else { min_value },
        max_value: if points.is_empty() { current_value } else { max_value },
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::StaticMarketData;
    use crate::options::OptionContract;
    use crate::portfolio::{build_portfolio, OptionRow, ParsedPortfolio, StockRow};
    use crate::types::{OptionType, StockPosition};
    use approx::assert_abs_diff_eq;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
    }

    fn stock(symbol: &str, quantity: f64, price: f64) -> StockRow {
        StockRow {
            symbol: symbol.to_string(),
            description: String::new(),
            quantity,
            price,
            cost_basis: None,
        }
    }

    fn portfolio(parsed: ParsedPortfolio) -> Portfolio {
        let market = StaticMarketData::new()
            .with_beta("SPY", 1.0)
            .with_beta("TSLA", 2.0);
        build_portfolio(parsed, &market, &FolioConfig::default(), as_of())
    }

    #[test]
    fn test_spy_changes() {
        let changes = spy_changes(0.2, 5);
        assert_eq!(changes.len(), 5);
        assert_abs_diff_eq!(changes[0], -0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(changes[1], -0.1, epsilon = 1e-12);
        assert_eq!(changes[2], 0.0);
        assert_abs_diff_eq!(changes[4], 0.2, epsilon = 1e-12);

        assert_eq!(spy_changes(0.2, 1), vec![0.0]);
        assert_eq!(spy_changes(0.2, 11)[5], 0.0);
    }

    #[test]
    fn test_stock_shock_scales_with_beta() {
        let p = portfolio(ParsedPortfolio {
            stocks: vec![stock("SPY", 10.0, 500.0), stock("TSLA", 10.0, 200.0)],
            ..ParsedPortfolio::default()
        });

        let result = simulate_spy_shocks(&p, &[-0.1, 0.0, 0.1], &FolioConfig::default(), as_of());
        assert_eq!(result.current_value, 7_000.0);

        let down = &result.points[0];
        assert_abs_diff_eq!(down.group_values["SPY"], 4_500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(down.group_values["TSLA"], 1_600.0, epsilon = 1e-9);
        assert_abs_diff_eq!(down.pnl, -900.0, epsilon = 1e-9);

        let flat = &result.points[1];
        assert_abs_diff_eq!(flat.pnl, 0.0, epsilon = 1e-9);

        let up = &result.points[2];
        assert_abs_diff_eq!(up.portfolio_value, 7_900.0, epsilon = 1e-9);
        assert_abs_diff_eq!(up.pnl_percent, 900.0 / 7_000.0 * 100.0, epsilon = 1e-9);

        assert_eq!(result.worst_case().unwrap().spy_change, -0.1);
        assert_eq!(result.best_case().unwrap().spy_change, 0.1);
        assert_abs_diff_eq!(result.min_value, 6_100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.max_value, 7_900.0, epsilon = 1e-9);
    }

    #[test]
    fn test_short_stock_gains_when_market_falls() {
        let p = portfolio(ParsedPortfolio {
            stocks: vec![stock("TSLA", -10.0, 200.0)],
            ..ParsedPortfolio::default()
        });
        let result = simulate_spy_shocks(&p, &[-0.1], &FolioConfig::default(), as_of());
        assert_abs_diff_eq!(result.points[0].pnl, 400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_price_floored_at_zero() {
        let p = portfolio(ParsedPortfolio {
            stocks: vec![stock("TSLA", 10.0, 100.0)],
            ..ParsedPortfolio::default()
        });
        // Beta 2 with a 60% drop would take the price negative
        let result = simulate_spy_shocks(&p, &[-0.6], &FolioConfig::default(), as_of());
        assert_eq!(result.points[0].portfolio_value, 0.0);
    }

    #[test]
    fn test_cash_unchanged_and_options_repriced() {
        let p = portfolio(ParsedPortfolio {
            stocks: vec![stock("SPY", 10.0, 500.0)],
            options: vec![OptionRow {
                symbol: "-SPY250620P480".to_string(),
                description: String::new(),
                contract: OptionContract {
                    underlying: "SPY".to_string(),
                    option_type: OptionType::Put,
                    strike: 480.0,
                    expiry: NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
                },
                quantity: 1.0,
                price: 10.0,
            }],
            cash: vec![StockPosition::new("SPAXX", 2_000.0, 1.0, 0.0)],
            pending_activity_value: 100.0,
            ..ParsedPortfolio::default()
        });

        let config = FolioConfig::default();
        let result = simulate_spy_shocks(&p, &spy_changes(0.2, 5), &config, as_of());
        // 5000 stock + 1000 put + 2000 cash + 100 pending
        assert_abs_diff_eq!(result.current_value, 8_100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.points[2].portfolio_value, 8_100.0, epsilon = 1e-9);

        // The put cushions the drop: loss smaller than the stock's alone
        let crash = &result.points[0];
        assert!(crash.pnl > -1_000.0);
        assert!(crash.group_values["SPY"] > 4_000.0);

        // Put value shrinks in a rally, so the gain trails the stock's
        let rally = &result.points[4];
        assert!(rally.pnl < 1_000.0);
    }

    #[test]
    fn test_empty_sweep() {
        let p = portfolio(ParsedPortfolio::default());
        let result = simulate_spy_shocks(&p, &[], &FolioConfig::default(), as_of());
        assert!(result.points.is_empty());
        assert_eq!(result.min_value, result.current_value);
        assert!(result.worst_case().is_none());
    }
}
