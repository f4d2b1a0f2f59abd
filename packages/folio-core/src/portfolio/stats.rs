//! Return statistics used to derive betas from price histories.

use crate::{Error, Result};

const TRADING_DAYS: f64 = 252.0;

/// Simple period returns from a price series.
///
/// Periods starting from a non-positive price are skipped.
pub fn returns_from_prices(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let mean_a = mean(a);
    let mean_b = mean(b);
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (a.len() as f64 - 1.0)
}

/// Beta of an asset against the market: cov(asset, market) / var(market).
///
/// Series are aligned on their most recent observations. Returns `None`
/// with fewer than two aligned points or a flat market.
pub fn beta(asset_returns: &[f64], market_returns: &[f64]) -> Option<f64> {
    let n = asset_returns.len().min(market_returns.len());
    if n < 2 {
        return None;
    }

    let asset = &asset_returns[asset_returns.len() - n..];
    let market = &market_returns[market_returns.len() - n..];

    let market_variance = covariance(market, market);
    if market_variance <= f64::EPSILON {
        return None;
    }

    Some(covariance(asset, market) / market_variance)
}

/// Beta computed straight from two price histories.
pub fn beta_from_prices(asset_prices: &[f64], market_prices: &[f64]) -> Result<f64> {
    let asset = returns_from_prices(asset_prices);
    let market = returns_from_prices(market_prices);
    beta(&asset, &market).ok_or_else(|| {
        Error::InsufficientData(format!(
            "Need at least 3 aligned prices with market movement (got {} and {})",
            asset_prices.len(),
            market_prices.len()
        ))
    })
}

/// Pearson correlation of two return series, aligned on recent observations.
pub fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let a = &a[a.len() - n..];
    let b = &b[b.len() - n..];

    let denom = (covariance(a, a) * covariance(b, b)).sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some(covariance(a, b) / denom)
}

/// Annualized volatility of daily returns, as a decimal (0.2 = 20%).
pub fn volatility(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    covariance(returns, returns).sqrt() * TRADING_DAYS.sqrt()
}
