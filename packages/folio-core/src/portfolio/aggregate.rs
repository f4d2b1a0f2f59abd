//! Exposure aggregation: rows to groups, groups to a portfolio summary.

use super::cash::is_cash_like;
use super::parser::{ParsedPortfolio, SkippedRow, StockRow};
use crate::config::FolioConfig;
use crate::market::MarketData;
use crate::types::{
    ExposureBreakdown, OptionPosition, PortfolioGroup, PortfolioSummary, StockPosition,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Groups plus the summary derived from them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Portfolio {
    pub groups: Vec<PortfolioGroup>,
    pub summary: PortfolioSummary,
    /// Rows dropped during import or aggregation
    pub skipped: Vec<SkippedRow>,
}

/// Positions collected for one underlying before the group is built.
#[derive(Debug, Default)]
struct GroupBuilder {
    stock: Option<StockPosition>,
    options: Vec<OptionPosition>,
    beta: f64,
}

/// Merge a repeated stock row (e.g. the same ticker in two accounts).
///
/// Quantities add; the cost basis is share-weighted across the rows that
/// carry one.
fn merge_stock(existing: &StockPosition, row: &StockRow) -> StockPosition {
    let quantity = existing.quantity + row.quantity;
    let cost_basis = match (existing.cost_basis, row.cost_basis) {
        (Some(a), Some(b)) if (existing.quantity + row.quantity).abs() > 0.0 => {
            Some((existing.quantity * a + row.quantity * b) / quantity)
        }
        (a, b) => a.or(b),
    };

    StockPosition::new(&existing.ticker, quantity, row.price, existing.beta)
        .with_description(existing.description.clone())
        .with_cost_basis(cost_basis)
}

/// Build groups and the summary from parsed rows.
///
/// Groups with a stock leg come first in file order, followed by
/// underlyings held only through options, also in file order.
pub fn build_portfolio<M: MarketData + ?Sized>(
    parsed: ParsedPortfolio,
    market: &M,
    config: &FolioConfig,
    as_of: NaiveDate,
) -> Portfolio {
    let ParsedPortfolio {
        stocks,
        options,
        mut cash,
        pending_activity_value,
        mut skipped,
    } = parsed;

    let mut order: Vec<String> = Vec::new();
    let mut builders: HashMap<String, GroupBuilder> = HashMap::new();
    // CSV prices hold for option underlyings even when the stock is cash-like
    let csv_prices: HashMap<&str, f64> = stocks
        .iter()
        .map(|row| (row.symbol.as_str(), row.price))
        .collect();

    for row in &stocks {
        let known_beta = market.beta(&row.symbol);
        if is_cash_like(&row.symbol, &row.description, known_beta, config) {
            tracing::debug!("{} treated as cash-like (beta {:?})", row.symbol, known_beta);
            cash.push(
                StockPosition::new(&row.symbol, row.quantity, row.price, 0.0)
                    .with_description(row.description.clone()),
            );
            continue;
        }

        let beta = known_beta.unwrap_or_else(|| {
            tracing::debug!("No beta for {}, using default {}", row.symbol, config.default_beta);
            config.default_beta
        });

        let builder = builders.entry(row.symbol.clone()).or_insert_with(|| {
            order.push(row.symbol.clone());
            GroupBuilder {
                beta,
                ..GroupBuilder::default()
            }
        });
        builder.stock = Some(match &builder.stock {
            Some(existing) => merge_stock(existing, row),
            None => StockPosition::new(&row.symbol, row.quantity, row.price, beta)
                .with_description(row.description.clone())
                .with_cost_basis(row.cost_basis),
        });
    }

    for row in &options {
        let underlying = &row.contract.underlying;
        let csv_price = csv_prices.get(underlying.as_str()).copied();
        let Some(underlying_price) = csv_price.or_else(|| market.price(underlying)) else {
            let reason = format!("no price for underlying {}", underlying);
            tracing::warn!("Skipping option {}: {}", row.symbol, reason);
            skipped.push(SkippedRow {
                line: 0,
                symbol: row.symbol.clone(),
                reason,
            });
            continue;
        };

        let builder = builders.entry(underlying.clone()).or_insert_with(|| {
            order.push(underlying.clone());
            GroupBuilder {
                beta: market.beta(underlying).unwrap_or(config.default_beta),
                ..GroupBuilder::default()
            }
        });
        builder.options.push(OptionPosition::new(
            &row.symbol,
            &row.contract,
            row.quantity,
            row.price,
            underlying_price,
            builder.beta,
            config,
            as_of,
        ));
    }

    let groups: Vec<PortfolioGroup> = order
        .iter()
        .filter_map(|ticker| {
            builders
                .remove(ticker)
                .map(|b| PortfolioGroup::new(ticker, b.stock, b.options, b.beta))
        })
        .collect();

    let summary = calculate_summary(&groups, &cash, pending_activity_value);
    tracing::info!(
        "Built {} groups: net exposure {:.2}, beta {:.2}",
        groups.len(),
        summary.net_market_exposure,
        summary.portfolio_beta
    );

    Portfolio {
        groups,
        summary,
        skipped,
    }
}

/// Compute the portfolio summary from groups and cash-like holdings.
pub fn calculate_summary(
    groups: &[PortfolioGroup],
    cash_like_positions: &[StockPosition],
    pending_activity_value: f64,
) -> PortfolioSummary {
    let mut long_stocks = 0.0;
    let mut long_stocks_beta = 0.0;
    let mut short_stocks = 0.0;
    let mut short_stocks_beta = 0.0;
    let mut long_options = 0.0;
    let mut long_options_beta = 0.0;
    let mut short_options = 0.0;
    let mut short_options_beta = 0.0;

    for group in groups {
        if let Some(stock) = &group.stock_position {
            if stock.market_exposure > 0.0 {
                long_stocks += stock.market_exposure;
                long_stocks_beta += stock.beta_adjusted_exposure;
            } else if stock.market_exposure < 0.0 {
                short_stocks += stock.market_exposure;
                short_stocks_beta += stock.beta_adjusted_exposure;
            }
        }

        // Options land on the side their delta points to.
        for option in &group.option_positions {
            if option.delta_exposure > 0.0 {
                long_options += option.delta_exposure;
                long_options_beta += option.beta_adjusted_exposure;
            } else if option.delta_exposure < 0.0 {
                short_options += option.delta_exposure;
                short_options_beta += option.beta_adjusted_exposure;
            }
        }
    }

    let long_exposure = ExposureBreakdown::new(
        "Long market exposure (Stocks + Options)",
        "Long Stocks + Long Options Delta Exp",
        long_stocks,
        long_stocks_beta,
        long_options,
        long_options_beta,
    )
    .with_component("Long Stocks Exposure", long_stocks)
    .with_component("Long Options Delta Exp", long_options);

    let short_exposure = ExposureBreakdown::new(
        "Short market exposure (Stocks + Options)",
        "Short Stocks + Short Options Delta Exp",
        short_stocks,
        short_stocks_beta,
        short_options,
        short_options_beta,
    )
    .with_component("Short Stocks Exposure", short_stocks)
    .with_component("Short Options Delta Exp", short_options);

    let net_options = long_options + short_options;
    let options_exposure = ExposureBreakdown::new(
        "Net delta exposure from options",
        "Long Options Delta Exp + Short Options Delta Exp",
        0.0,
        0.0,
        net_options,
        long_options_beta + short_options_beta,
    )
    .with_component("Long Options Delta Exp", long_options)
    .with_component("Short Options Delta Exp", short_options)
    .with_component("Net Options Delta Exp", net_options);

    let net_market_exposure = long_exposure.total_exposure + short_exposure.total_exposure;
    let net_beta_adjusted =
        long_exposure.total_beta_adjusted + short_exposure.total_beta_adjusted;
    let portfolio_beta = if net_market_exposure.abs() > f64::EPSILON {
        net_beta_adjusted / net_market_exposure
    } else {
        0.0
    };

    let gross = long_exposure.total_exposure + short_exposure.total_exposure.abs();
    let short_percentage = if gross > 0.0 {
        short_exposure.total_exposure.abs() / gross * 100.0
    } else {
        0.0
    };

    let cash_like_value: f64 = cash_like_positions.iter().map(|c| c.market_exposure).sum();
    let portfolio_estimate_value = groups.iter().map(|g| g.market_value()).sum::<f64>()
        + cash_like_value
        + pending_activity_value;
    let cash_percentage = if portfolio_estimate_value > 0.0 {
        cash_like_value / portfolio_estimate_value * 100.0
    } else {
        0.0
    };

    PortfolioSummary {
        net_market_exposure,
        portfolio_beta,
        long_exposure,
        short_exposure,
        options_exposure,
        short_percentage,
        cash_like_positions: cash_like_positions.to_vec(),
        cash_like_value,
        cash_like_count: cash_like_positions.len(),
        cash_percentage,
        pending_activity_value,
        portfolio_estimate_value,
        price_updated_at: Utc::now(),
    }
}

impl Portfolio {
    /// Re-price every position from `market` and re-derive all totals.
    ///
    /// Tickers the market does not know keep their current price and beta.
    /// An option whose own premium is quoted is rebuilt from that premium;
    /// otherwise it is re-priced from the move in its underlying.
    pub fn refresh_prices<M: MarketData + ?Sized>(
        &mut self,
        market: &M,
        config: &FolioConfig,
        as_of: NaiveDate,
    ) {
        for group in &mut self.groups {
            let beta = market.beta(&group.ticker).unwrap_or(group.beta);
            group.beta = beta;

            if let Some(stock) = &group.stock_position {
                let price = market.price(&group.ticker).unwrap_or(stock.price);
                group.stock_position = Some(stock.with_beta(beta).with_price(price));
            }

            let underlying_price = group
                .stock_position
                .as_ref()
                .map(|s| s.price)
                .or_else(|| market.price(&group.ticker));

            group.option_positions = group
                .option_positions
                .iter()
                .map(|option| match market.price(&option.symbol) {
                    Some(premium) => OptionPosition::new(
                        &option.symbol,
                        &option.contract(),
                        option.quantity,
                        premium,
                        underlying_price.unwrap_or(option.underlying_price),
                        beta,
                        config,
                        as_of,
                    ),
                    None => option
                        .with_underlying_price(
                            underlying_price.unwrap_or(option.underlying_price),
                            config,
                            as_of,
                        )
                        .with_beta(beta),
                })
                .collect();

            group.recompute();
        }

        let cash: Vec<StockPosition> = self
            .summary
            .cash_like_positions
            .iter()
            .map(|c| match market.price(&c.ticker) {
                Some(price) => c.with_price(price),
                None => c.clone(),
            })
            .collect();

        self.summary = calculate_summary(&self.groups, &cash, self.summary.pending_activity_value);
        tracing::info!("Refreshed prices for {} groups", self.groups.len());
    }

    /// Find a group by ticker.
    pub fn find_group(&self, ticker: &str) -> Option<&PortfolioGroup> {
        let ticker = ticker.trim().to_uppercase();
        self.groups.iter().find(|g| g.ticker == ticker)
    }
}
