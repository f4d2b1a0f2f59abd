//! Core data types for the Folio exposure engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A stock (or ETF) holding, long or short.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockPosition {
    /// Ticker symbol (uppercase)
    pub ticker: String,
    /// Signed share count (negative for short)
    pub quantity: f64,
    /// Last price per share
    pub price: f64,
    /// Beta against the market index
    pub beta: f64,
    /// quantity * price
    pub market_exposure: f64,
    /// market_exposure * beta
    pub beta_adjusted_exposure: f64,
    /// Broker description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Average cost per share (if the export carries it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_basis: Option<f64>,
}

impl StockPosition {
    /// Create a position and derive its exposures.
    pub fn new(ticker: &str, quantity: f64, price: f64, beta: f64) -> Self {
        let market_exposure = quantity * price;
        Self {
            ticker: ticker.trim().to_uppercase(),
            quantity,
            price,
            beta,
            market_exposure,
            beta_adjusted_exposure: market_exposure * beta,
            description: String::new(),
            cost_basis: None,
        }
    }

    /// Attach the broker description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach the average cost per share.
    pub fn with_cost_basis(mut self, cost_basis: Option<f64>) -> Self {
        self.cost_basis = cost_basis;
        self
    }

    /// Re-derive the position at a new price.
    pub fn with_price(&self, price: f64) -> Self {
        let market_exposure = self.quantity * price;
        Self {
            price,
            market_exposure,
            beta_adjusted_exposure: market_exposure * self.beta,
            ..self.clone()
        }
    }

    /// Re-derive the position with a new beta.
    pub fn with_beta(&self, beta: f64) -> Self {
        Self {
            beta,
            beta_adjusted_exposure: self.market_exposure * beta,
            ..self.clone()
        }
    }

    /// Whether the position is long.
    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    /// Unrealized gain/loss in dollars, when a cost basis is known.
    pub fn gain_loss(&self) -> Option<f64> {
        self.cost_basis.map(|cost| (self.price - cost) * self.quantity)
    }
}

/// Option right.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "CALL"),
            OptionType::Put => write!(f, "PUT"),
        }
    }
}

impl FromStr for OptionType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CALL" | "C" => Ok(OptionType::Call),
            "PUT" | "P" => Ok(OptionType::Put),
            other => Err(crate::Error::InvalidOption(format!(
                "unknown option type: {}",
                other
            ))),
        }
    }
}

/// An option holding with its Black-Scholes derived fields.
///
/// Built through `OptionPosition::new` in the options module so the derived
/// fields always agree with the inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionPosition {
    /// Broker option symbol (e.g. `-SPY250620C500`)
    pub symbol: String,
    /// Underlying ticker (uppercase)
    pub underlying: String,
    pub option_type: OptionType,
    pub strike: f64,
    pub expiry: NaiveDate,
    /// Signed contract count (negative for written contracts)
    pub quantity: f64,
    /// Premium per share
    pub price: f64,
    /// Underlying spot used for the Greeks
    pub underlying_price: f64,
    /// Beta of the underlying
    pub beta: f64,
    /// Shares per contract
    pub multiplier: f64,
    /// Volatility solved from the premium (or the configured default)
    pub implied_volatility: f64,
    /// Delta of one long contract
    pub delta: f64,
    /// multiplier * underlying_price * |quantity|
    pub notional_value: f64,
    /// quantity * price * multiplier
    pub market_value: f64,
    /// delta * notional_value * sign(quantity)
    pub delta_exposure: f64,
    /// delta_exposure * beta
    pub beta_adjusted_exposure: f64,
}

impl OptionPosition {
    /// Whether the contracts are held long.
    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }
}

/// All positions on one underlying: the stock leg plus any options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioGroup {
    /// Underlying ticker
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_position: Option<StockPosition>,
    pub option_positions: Vec<OptionPosition>,
    /// Beta of the underlying
    pub beta: f64,
    /// Stock exposure plus option delta exposure
    pub net_exposure: f64,
    /// Beta-adjusted exposure over every member
    pub beta_adjusted_exposure: f64,
    /// Option delta exposure alone
    pub options_delta_exposure: f64,
    pub call_count: usize,
    pub put_count: usize,
}

impl PortfolioGroup {
    /// Create a group and derive its totals.
    pub fn new(
        ticker: &str,
        stock_position: Option<StockPosition>,
        option_positions: Vec<OptionPosition>,
        beta: f64,
    ) -> Self {
        let mut group = Self {
            ticker: ticker.trim().to_uppercase(),
            stock_position,
            option_positions,
            beta,
            net_exposure: 0.0,
            beta_adjusted_exposure: 0.0,
            options_delta_exposure: 0.0,
            call_count: 0,
            put_count: 0,
        };
        group.recompute();
        group
    }

    /// Recompute the derived totals from the member positions.
    pub fn recompute(&mut self) {
        let stock_exposure = self
            .stock_position
            .as_ref()
            .map(|s| s.market_exposure)
            .unwrap_or(0.0);
        let stock_beta_adjusted = self
            .stock_position
            .as_ref()
            .map(|s| s.beta_adjusted_exposure)
            .unwrap_or(0.0);

        self.options_delta_exposure = self
            .option_positions
            .iter()
            .map(|o| o.delta_exposure)
            .sum();
        let options_beta_adjusted: f64 = self
            .option_positions
            .iter()
            .map(|o| o.beta_adjusted_exposure)
            .sum();

        self.net_exposure = stock_exposure + self.options_delta_exposure;
        self.beta_adjusted_exposure = stock_beta_adjusted + options_beta_adjusted;
        self.call_count = self
            .option_positions
            .iter()
            .filter(|o| o.option_type == OptionType::Call)
            .count();
        self.put_count = self.option_positions.len() - self.call_count;
    }

    /// Market value of the group: stock value plus option premiums.
    pub fn market_value(&self) -> f64 {
        let stock = self
            .stock_position
            .as_ref()
            .map(|s| s.market_exposure)
            .unwrap_or(0.0);
        stock
            + self
                .option_positions
                .iter()
                .map(|o| o.market_value)
                .sum::<f64>()
    }
}

/// One side of the exposure picture (long, short, or options).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ExposureBreakdown {
    pub stock_exposure: f64,
    pub stock_beta_adjusted: f64,
    pub option_delta_exposure: f64,
    pub option_beta_adjusted: f64,
    pub total_exposure: f64,
    pub total_beta_adjusted: f64,
    /// Human readable description
    pub description: String,
    /// How the total is formed
    pub formula: String,
    /// Named contributions for display
    pub components: BTreeMap<String, f64>,
}

impl ExposureBreakdown {
    /// Create a breakdown; totals are derived from the parts.
    pub fn new(
        description: impl Into<String>,
        formula: impl Into<String>,
        stock_exposure: f64,
        stock_beta_adjusted: f64,
        option_delta_exposure: f64,
        option_beta_adjusted: f64,
    ) -> Self {
        Self {
            stock_exposure,
            stock_beta_adjusted,
            option_delta_exposure,
            option_beta_adjusted,
            total_exposure: stock_exposure + option_delta_exposure,
            total_beta_adjusted: stock_beta_adjusted + option_beta_adjusted,
            description: description.into(),
            formula: formula.into(),
            components: BTreeMap::new(),
        }
    }

    /// Add a named component.
    pub fn with_component(mut self, name: &str, value: f64) -> Self {
        self.components.insert(name.to_string(), value);
        self
    }
}

/// Portfolio-level exposure and cash summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSummary {
    /// long.total_exposure + short.total_exposure
    pub net_market_exposure: f64,
    /// Net beta-adjusted exposure over net market exposure
    pub portfolio_beta: f64,
    pub long_exposure: ExposureBreakdown,
    pub short_exposure: ExposureBreakdown,
    pub options_exposure: ExposureBreakdown,
    /// |short| / (long + |short|) as a percentage
    pub short_percentage: f64,
    pub cash_like_positions: Vec<StockPosition>,
    pub cash_like_value: f64,
    pub cash_like_count: usize,
    /// Cash-like value over the portfolio estimate, as a percentage
    pub cash_percentage: f64,
    /// Unsettled activity reported by the broker
    pub pending_activity_value: f64,
    /// Stock values + option values + cash + pending activity
    pub portfolio_estimate_value: f64,
    /// When prices behind this summary were last set
    pub price_updated_at: DateTime<Utc>,
}

/// API response wrapper used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
