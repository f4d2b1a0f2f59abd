//! Plain-text portfolio digest.
//!
//! Used by the CLI `report` command and as context handed to an external
//! assistant.

use crate::portfolio::Portfolio;
use crate::types::{ExposureBreakdown, PortfolioGroup};
use std::fmt::Write;

fn money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

fn write_breakdown(out: &mut String, name: &str, breakdown: &ExposureBreakdown) {
    let _ = writeln!(
        out,
        "  {:<8} {:>16} (beta-adjusted {})",
        name,
        money(breakdown.total_exposure),
        money(breakdown.total_beta_adjusted)
    );
}

fn write_group(out: &mut String, group: &PortfolioGroup) {
    let _ = writeln!(
        out,
        "- {}: net {} | beta {:.2} | beta-adjusted {}",
        group.ticker,
        money(group.net_exposure),
        group.beta,
        money(group.beta_adjusted_exposure)
    );
    if let Some(stock) = &group.stock_position {
        let _ = writeln!(
            out,
            "    stock {} sh @ {} = {}",
            stock.quantity,
            money(stock.price),
            money(stock.market_exposure)
        );
    }
    for option in &group.option_positions {
        let _ = writeln!(
            out,
            "    {} {} {} {} x{} delta {:.2} iv {:.0}% exposure {}",
            option.underlying,
            option.expiry.format("%Y-%m-%d"),
            money(option.strike),
            option.option_type,
            option.quantity,
            option.delta,
            option.implied_volatility * 100.0,
            money(option.delta_exposure)
        );
    }
}

/// Render the summary and every group as a text digest.
pub fn portfolio_context(portfolio: &Portfolio) -> String {
    let summary = &portfolio.summary;
    let mut out = String::new();

    let _ = writeln!(out, "PORTFOLIO SUMMARY");
    let _ = writeln!(
        out,
        "Estimated value: {}",
        money(summary.portfolio_estimate_value)
    );
    let _ = writeln!(
        out,
        "Net market exposure: {}",
        money(summary.net_market_exposure)
    );
    let _ = writeln!(out, "Portfolio beta: {:.2}", summary.portfolio_beta);
    let _ = writeln!(out, "Short exposure: {:.1}%", summary.short_percentage);
    let _ = writeln!(
        out,
        "Cash-like: {} across {} holdings ({:.1}%)",
        money(summary.cash_like_value),
        summary.cash_like_count,
        summary.cash_percentage
    );
    if summary.pending_activity_value != 0.0 {
        let _ = writeln!(
            out,
            "Pending activity: {}",
            money(summary.pending_activity_value)
        );
    }

    let _ = writeln!(out, "\nEXPOSURE");
    write_breakdown(&mut out, "Long", &summary.long_exposure);
    write_breakdown(&mut out, "Short", &summary.short_exposure);
    write_breakdown(&mut out, "Options", &summary.options_exposure);

    let _ = writeln!(out, "\nPOSITIONS");
    for group in &portfolio.groups {
        write_group(&mut out, group);
    }

    if !summary.cash_like_positions.is_empty() {
        let _ = writeln!(out, "\nCASH-LIKE");
        for cash in &summary.cash_like_positions {
            let _ = writeln!(out, "- {}: {}", cash.ticker, money(cash.market_exposure));
        }
    }

    let _ = writeln!(
        out,
        "\nPrices as of {}",
        summary.price_updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FolioConfig;
    use crate::market::StaticMarketData;
    use crate::portfolio::{build_portfolio, ParsedPortfolio, StockRow};
    use crate::types::StockPosition;
    use chrono::NaiveDate;

    #[test]
    fn test_money() {
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1234.5), "$1,234.50");
        assert_eq!(money(-1_234_567.891), "-$1,234,567.89");
        assert_eq!(money(999.999), "$1,000.00");
    }

    #[test]
    fn test_portfolio_context() {
        let parsed = ParsedPortfolio {
            stocks: vec![StockRow {
                symbol: "AAPL".to_string(),
                description: "APPLE INC".to_string(),
                quantity: 100.0,
                price: 190.0,
                cost_basis: None,
            }],
            cash: vec![StockPosition::new("SPAXX", 5_000.0, 1.0, 0.0)],
            pending_activity_value: 25.0,
            ..ParsedPortfolio::default()
        };
        let market = StaticMarketData::new().with_beta("AAPL", 1.2);
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let portfolio = build_portfolio(parsed, &market, &FolioConfig::default(), as_of);

        let text = portfolio_context(&portfolio);
        assert!(text.contains("Estimated value: $24,025.00"));
        assert!(text.contains("Portfolio beta: 1.20"));
        assert!(text.contains("- AAPL: net $19,000.00"));
        assert!(text.contains("- SPAXX: $5,000.00"));
        assert!(text.contains("Pending activity: $25.00"));
    }
}
