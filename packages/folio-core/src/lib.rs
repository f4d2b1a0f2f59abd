//! Folio Core - Portfolio exposure and risk library.
//!
//! This crate turns a brokerage CSV export into an exposure picture:
//!
//! - **Import**: Row classification into stock, option, and cash-like positions
//! - **Exposure**: Long/short/option breakdowns and beta-adjusted totals
//! - **Options**: Black-Scholes pricing, Greeks, and implied volatility
//! - **Simulation**: "What-if" SPY shocks re-derived across every position
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_core::{build_portfolio, parse_portfolio_csv, FolioConfig, StaticMarketData};
//!
//! let config = FolioConfig::default();
//! let file = std::fs::File::open("Portfolio_Positions.csv").unwrap();
//! let parsed = parse_portfolio_csv(file, &config).unwrap();
//!
//! let market = StaticMarketData::default();
//! let today = chrono::Local::now().date_naive();
//! let portfolio = build_portfolio(parsed, &market, &config, today);
//! println!("Net exposure: ${:.2}", portfolio.summary.net_market_exposure);
//! println!("Portfolio beta: {:.2}", portfolio.summary.portfolio_beta);
//! ```

pub mod config;
pub mod market;
pub mod options;
pub mod portfolio;
pub mod report;
pub mod simulator;
pub mod types;

// Re-export commonly used types
pub use config::{FolioConfig, SimulationConfig};
pub use market::{MarketData, StaticMarketData};
pub use types::{
    ApiResponse, ExposureBreakdown, OptionPosition, OptionType, PortfolioGroup, PortfolioSummary,
    StockPosition,
};

// Re-export main functionality
pub use options::{implied_volatility, BlackScholes, Greeks, OptionContract};
pub use portfolio::{
    build_portfolio, calculate_summary, is_cash_like, parse_portfolio_csv, ParsedPortfolio,
    Portfolio,
};
pub use report::portfolio_context;
pub use simulator::{simulate_spy_shocks, spy_changes, SimulationPoint, SimulationResult};

/// Error types for folio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
