//! Brokerage CSV import and row classification.

use super::cash::is_cash_like;
use crate::config::FolioConfig;
use crate::options::OptionContract;
use crate::types::StockPosition;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const PENDING_ACTIVITY: &str = "PENDING ACTIVITY";

/// A stock or ETF row awaiting market data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockRow {
    pub symbol: String,
    pub description: String,
    pub quantity: f64,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_basis: Option<f64>,
}

/// An option row with its contract terms resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionRow {
    pub symbol: String,
    pub description: String,
    pub contract: OptionContract,
    pub quantity: f64,
    pub price: f64,
}

/// A row that could not be used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedRow {
    pub line: u64,
    pub symbol: String,
    pub reason: String,
}

/// Classified rows from one export, in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedPortfolio {
    pub stocks: Vec<StockRow>,
    pub options: Vec<OptionRow>,
    /// Cash-like holdings (beta 0)
    pub cash: Vec<StockPosition>,
    pub pending_activity_value: f64,
    pub skipped: Vec<SkippedRow>,
}

impl ParsedPortfolio {
    /// Number of rows that were classified.
    pub fn row_count(&self) -> usize {
        self.stocks.len() + self.options.len() + self.cash.len()
    }

    fn skip(&mut self, line: u64, symbol: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!("Skipping row {} ({}): {}", line, symbol, reason);
        self.skipped.push(SkippedRow {
            line,
            symbol: symbol.to_string(),
            reason,
        });
    }
}

/// Column positions resolved from the header row.
#[derive(Debug)]
struct Columns {
    symbol: usize,
    description: Option<usize>,
    quantity: Option<usize>,
    last_price: Option<usize>,
    current_value: Option<usize>,
    kind: Option<usize>,
    average_cost: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers.iter().position(|h| {
                h.trim_start_matches('\u{feff}')
                    .trim()
                    .eq_ignore_ascii_case(name)
            })
        };

        Ok(Self {
            symbol: find("Symbol").ok_or_else(|| Error::MissingColumn("Symbol".to_string()))?,
            description: find("Description"),
            quantity: find("Quantity"),
            last_price: find("Last Price"),
            current_value: find("Current Value"),
            kind: find("Type"),
            average_cost: find("Average Cost Basis"),
        })
    }
}

/// Parse a currency or quantity cell.
///
/// Handles `$1,234.56`, `+12.5`, `(45.00)` for negatives, and treats empty,
/// `--`, and `n/a` as missing.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "--" || trimmed.eq_ignore_ascii_case("n/a") {
        return None;
    }

    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '+' | ' '))
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Parse an export from any reader.
pub fn parse_portfolio_csv<R: Read>(reader: R, config: &FolioConfig) -> Result<ParsedPortfolio> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut parsed = ParsedPortfolio::default();

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                parsed.skip(line, "", e.to_string());
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        classify_row(&record, line, &columns, config, &mut parsed);
    }

    tracing::info!(
        "Imported {} stocks, {} options, {} cash-like rows ({} skipped)",
        parsed.stocks.len(),
        parsed.options.len(),
        parsed.cash.len(),
        parsed.skipped.len()
    );
    Ok(parsed)
}

/// Parse an export from a file.
pub fn parse_portfolio_file(path: &Path, config: &FolioConfig) -> Result<ParsedPortfolio> {
    let file = File::open(path)?;
    parse_portfolio_csv(file, config)
}

fn classify_row(
    record: &csv::StringRecord,
    line: u64,
    columns: &Columns,
    config: &FolioConfig,
    parsed: &mut ParsedPortfolio,
) {
    let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");
    let symbol = cell(Some(columns.symbol));
    if symbol.is_empty() || record.len() <= 1 {
        // Footer and disclaimer lines
        return;
    }

    let description = cell(columns.description);
    let current_value = parse_amount(cell(columns.current_value));
    let price = parse_amount(cell(columns.last_price));
    let mut quantity = parse_amount(cell(columns.quantity));
    if cell(columns.kind).eq_ignore_ascii_case("Short") {
        quantity = quantity.map(|q| -q.abs());
    }

    if symbol.eq_ignore_ascii_case(PENDING_ACTIVITY) {
        match current_value {
            Some(value) => parsed.pending_activity_value += value,
            None => parsed.skip(line, symbol, "pending activity without a value"),
        }
        return;
    }

    if OptionContract::looks_like_option(symbol, description) {
        let contract = match OptionContract::identify(symbol, description) {
            Ok(contract) => contract,
            Err(e) => return parsed.skip(line, symbol, e.to_string()),
        };
        let (Some(quantity), Some(price)) = (quantity, price) else {
            return parsed.skip(line, symbol, "option without quantity or price");
        };
        tracing::debug!("Row {}: option {} on {}", line, symbol, contract.underlying);
        parsed.options.push(OptionRow {
            symbol: symbol.to_string(),
            description: description.to_string(),
            contract,
            quantity,
            price,
        });
        return;
    }

    if is_cash_like(symbol, description, None, config) {
        let (quantity, price) = match (quantity, price, current_value) {
            (Some(q), Some(p), _) => (q, p),
            (_, _, Some(value)) => (value, 1.0),
            _ => return parsed.skip(line, symbol, "cash-like row without a value"),
        };
        tracing::debug!("Row {}: cash-like {}", line, symbol);
        let ticker = symbol.trim_end_matches('*');
        parsed.cash.push(
            StockPosition::new(ticker, quantity, price, 0.0).with_description(description),
        );
        return;
    }

    let Some(quantity) = quantity else {
        return parsed.skip(line, symbol, "missing quantity");
    };
    let Some(price) = price else {
        return parsed.skip(line, symbol, "missing price");
    };
    tracing::debug!("Row {}: stock {}", line, symbol);
    parsed.stocks.push(StockRow {
        symbol: symbol.to_uppercase(),
        description: description.to_string(),
        quantity,
        price,
        cost_basis: parse_amount(cell(columns.average_cost)),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OptionType;

    const EXPORT: &str = "\
Account Name,Symbol,Description,Quantity,Last Price,Current Value,Average Cost Basis,Type
Individual,SPAXX**,HELD IN MONEY MARKET,,,\"$12,500.00\",,Cash
Individual,AAPL,APPLE INC,100,$190.00,\"$19,000.00\",$150.00,Margin
Individual,TSLA,TESLA INC,-20,$250.00,\"-$5,000.00\",,Short
Individual,-SPY250620C500,SPY JUN 20 2025 $500 CALL,2,$12.50,\"$2,500.00\",,Margin
Individual,-AAPL250620P180,AAPL JUN 20 2025 $180 PUT,-1,$4.00,-$400.00,,Margin
Individual,SGOV,ISHARES 0-3 MONTH TREASURY BOND ETF,50,$100.50,\"$5,025.00\",,Cash
Individual,Pending Activity,,,,$300.00,,
Individual,MSFT,MICROSOFT CORP,,$410.00,,,Margin
Individual,NVDA,NVIDIA CORP,10,--,,,Margin
Individual,-XYZ,XYZ BAD OPTION,1,$1.00,$100.00,,Margin

\"The data and information in this spreadsheet is provided to you solely for your use\"
";

    fn parse(input: &str) -> ParsedPortfolio {
        parse_portfolio_csv(input.as_bytes(), &FolioConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("+12.5"), Some(12.5));
        assert_eq!(parse_amount("-$5,000.00"), Some(-5000.0));
        assert_eq!(parse_amount("($45.00)"), Some(-45.0));
        assert_eq!(parse_amount("--"), None);
        assert_eq!(parse_amount(" "), None);
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_classifies_rows() {
        let parsed = parse(EXPORT);

        assert_eq!(parsed.stocks.len(), 2);
        assert_eq!(parsed.stocks[0].symbol, "AAPL");
        assert_eq!(parsed.stocks[0].quantity, 100.0);
        assert_eq!(parsed.stocks[0].cost_basis, Some(150.0));
        assert_eq!(parsed.stocks[1].symbol, "TSLA");
        assert_eq!(parsed.stocks[1].quantity, -20.0);

        assert_eq!(parsed.options.len(), 2);
        assert_eq!(parsed.options[0].contract.underlying, "SPY");
        assert_eq!(parsed.options[0].contract.option_type, OptionType::Call);
        assert_eq!(parsed.options[1].quantity, -1.0);

        assert_eq!(parsed.cash.len(), 2);
        assert_eq!(parsed.cash[0].ticker, "SPAXX");
        assert_eq!(parsed.cash[0].market_exposure, 12_500.0);
        assert_eq!(parsed.cash[0].beta, 0.0);
        assert_eq!(parsed.cash[1].ticker, "SGOV");
        assert!((parsed.cash[1].market_exposure - 5025.0).abs() < 1e-9);

        assert_eq!(parsed.pending_activity_value, 300.0);
        assert_eq!(parsed.row_count(), 6);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let parsed = parse(EXPORT);
        let skipped: Vec<&str> = parsed.skipped.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(skipped, vec!["MSFT", "NVDA", "-XYZ"]);
        assert!(parsed.skipped[0].reason.contains("quantity"));
        assert!(parsed.skipped[1].reason.contains("price"));
    }

    #[test]
    fn test_short_type_forces_negative_quantity() {
        let parsed = parse("Symbol,Quantity,Last Price,Type\nGME,5,$20.00,Short\n");
        assert_eq!(parsed.stocks[0].quantity, -5.0);
    }

    #[test]
    fn test_header_match_is_case_insensitive() {
        let parsed = parse("\u{feff}symbol , QUANTITY,last price\nAAPL,1,$100\n");
        assert_eq!(parsed.stocks.len(), 1);
        assert_eq!(parsed.stocks[0].price, 100.0);
    }

    #[test]
    fn test_footer_lines_ignored_with_symbol_first() {
        let csv = "\
Symbol,Quantity,Last Price
AAPL,10,$190.00

\"The data and information in this spreadsheet is provided to you solely for your use.\"
Date downloaded Jan-02-2025 10:00 a.m ET
";
        let parsed = parse(csv);
        assert_eq!(parsed.stocks.len(), 1);
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_missing_symbol_column() {
        let csv = "Ticker,Quantity\nAAPL,1\n";
        let result = parse_portfolio_csv(csv.as_bytes(), &FolioConfig::default());
        assert!(matches!(result, Err(Error::MissingColumn(_))));
    }

    #[test]
    fn test_empty_input() {
        let result = parse_portfolio_csv("".as_bytes(), &FolioConfig::default());
        assert!(matches!(result, Err(Error::MissingColumn(_))));
    }
}
