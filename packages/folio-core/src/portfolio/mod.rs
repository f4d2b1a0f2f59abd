//! Portfolio import and exposure aggregation.
//!
//! Provides CSV row classification, cash-like detection, exposure
//! aggregation, and the return statistics behind derived betas.

mod aggregate;
mod cash;
mod parser;
pub mod stats;

pub use aggregate::{build_portfolio, calculate_summary, Portfolio};
pub use cash::is_cash_like;
pub use parser::{
    parse_amount, parse_portfolio_csv, parse_portfolio_file, OptionRow, ParsedPortfolio,
    SkippedRow, StockRow,
};
