//! Market data seam: betas and prices for tickers.
//!
//! Live quote fetching is not part of this crate. Callers supply a
//! `MarketData` implementation; `StaticMarketData` covers files and tests.

use crate::portfolio::stats;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Source of betas and prices.
pub trait MarketData {
    /// Beta against the market index, if known.
    fn beta(&self, ticker: &str) -> Option<f64>;

    /// Latest price, if known.
    fn price(&self, ticker: &str) -> Option<f64>;
}

/// Known data for one ticker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TickerData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Daily closes, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<f64>,
}

/// Market data held in memory, optionally loaded from JSON.
///
/// ```json
/// {
///   "benchmark": [500.0, 505.0, 498.0],
///   "tickers": {
///     "AAPL": { "beta": 1.2, "price": 190.0 },
///     "MSFT": { "history": [400.0, 410.0, 395.0] }
///   }
/// }
/// ```
///
/// A ticker without an explicit beta gets one computed from its history
/// against `benchmark`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StaticMarketData {
    /// Benchmark (SPY) daily closes, oldest first
    #[serde(default)]
    pub benchmark: Vec<f64>,
    #[serde(default)]
    pub tickers: HashMap<String, TickerData>,
}

impl StaticMarketData {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document. Ticker keys are normalized to uppercase.
    pub fn from_json(content: &str) -> Result<Self> {
        let mut data: Self = serde_json::from_str(content)?;
        data.tickers = data
            .tickers
            .into_iter()
            .map(|(ticker, entry)| (ticker.trim().to_uppercase(), entry))
            .collect();
        Ok(data)
    }

    /// Load from a JSON file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let data = Self::from_json(&content)?;
        tracing::debug!(
            "Loaded market data for {} tickers from {}",
            data.tickers.len(),
            path.display()
        );
        Ok(data)
    }

    fn entry_mut(&mut self, ticker: &str) -> &mut TickerData {
        self.tickers.entry(ticker.trim().to_uppercase()).or_default()
    }

    /// Set a ticker's beta.
    pub fn with_beta(mut self, ticker: &str, beta: f64) -> Self {
        self.entry_mut(ticker).beta = Some(beta);
        self
    }

    /// Set a ticker's price.
    pub fn with_price(mut self, ticker: &str, price: f64) -> Self {
        self.set_price(ticker, price);
        self
    }

    /// Set a ticker's price history.
    pub fn with_history(mut self, ticker: &str, history: Vec<f64>) -> Self {
        self.entry_mut(ticker).history = history;
        self
    }

    /// Set the benchmark price history.
    pub fn with_benchmark(mut self, benchmark: Vec<f64>) -> Self {
        self.benchmark = benchmark;
        self
    }

    /// Update a ticker's price in place.
    pub fn set_price(&mut self, ticker: &str, price: f64) {
        self.entry_mut(ticker).price = Some(price);
    }

    fn get(&self, ticker: &str) -> Option<&TickerData> {
        self.tickers.get(&ticker.trim().to_uppercase())
    }
}

impl MarketData for StaticMarketData {
    fn beta(&self, ticker: &str) -> Option<f64> {
        let entry = self.get(ticker)?;
        if let Some(beta) = entry.beta {
            return Some(beta);
        }
        if entry.history.is_empty() || self.benchmark.is_empty() {
            return None;
        }
        match stats::beta_from_prices(&entry.history, &self.benchmark) {
            Ok(beta) => Some(beta),
            Err(e) => {
                tracing::warn!("Cannot derive beta for {}: {}", ticker, e);
                None
            }
        }
    }

    fn price(&self, ticker: &str) -> Option<f64> {
        let entry = self.get(ticker)?;
        entry.price.or_else(|| entry.history.last().copied())
    }
}
