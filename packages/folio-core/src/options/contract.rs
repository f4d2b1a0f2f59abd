//! Option contract identification from broker symbols and descriptions.

use crate::types::OptionType;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// The terms of an option contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionContract {
    pub underlying: String,
    pub option_type: OptionType,
    pub strike: f64,
    pub expiry: NaiveDate,
}

impl OptionContract {
    /// Parse a broker description such as `SPY JUN 20 2025 $500 CALL`.
    pub fn parse_description(description: &str) -> Result<Self> {
        let tokens: Vec<&str> = description.split_whitespace().collect();
        if tokens.len() < 6 {
            return Err(invalid(description, "expected 6 fields"));
        }

        let underlying = tokens[0].trim_start_matches('-').to_uppercase();
        let month = MONTHS
            .iter()
            .position(|m| m.eq_ignore_ascii_case(tokens[1]))
            .ok_or_else(|| invalid(description, "unknown month"))?;
        let day: u32 = tokens[2]
            .parse()
            .map_err(|_| invalid(description, "bad day"))?;
        let year: i32 = tokens[3]
            .parse()
            .map_err(|_| invalid(description, "bad year"))?;
        let expiry = NaiveDate::from_ymd_opt(year, month as u32 + 1, day)
            .ok_or_else(|| invalid(description, "bad date"))?;
        let strike: f64 = tokens[4]
            .trim_start_matches('$')
            .replace(',', "")
            .parse()
            .map_err(|_| invalid(description, "bad strike"))?;
        let option_type: OptionType = tokens[5].parse()?;

        Self::validated(underlying, option_type, strike, expiry, description)
    }

    /// Parse a compact broker symbol such as `-SPY250620C500`.
    pub fn parse_symbol(symbol: &str) -> Result<Self> {
        let compact = symbol.trim().trim_start_matches('-');
        if !compact.is_ascii() {
            return Err(invalid(symbol, "non-ascii symbol"));
        }
        let date_start = compact
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| invalid(symbol, "no expiry"))?;
        if date_start == 0 || compact.len() < date_start + 8 {
            return Err(invalid(symbol, "too short"));
        }

        let underlying = compact[..date_start].to_uppercase();
        let date_field = |offset: usize| -> Result<u32> {
            compact[date_start + offset..date_start + offset + 2]
                .parse()
                .map_err(|_| invalid(symbol, "bad expiry"))
        };
        let expiry = NaiveDate::from_ymd_opt(
            2000 + date_field(0)? as i32,
            date_field(2)?,
            date_field(4)?,
        )
        .ok_or_else(|| invalid(symbol, "bad expiry"))?;
        let option_type: OptionType = compact[date_start + 6..date_start + 7].parse()?;
        let strike: f64 = compact[date_start + 7..]
            .parse()
            .map_err(|_| invalid(symbol, "bad strike"))?;

        Self::validated(underlying, option_type, strike, expiry, symbol)
    }

    /// Try the description first, then the symbol.
    pub fn identify(symbol: &str, description: &str) -> Result<Self> {
        Self::parse_description(description).or_else(|_| Self::parse_symbol(symbol))
    }

    /// Whether a row looks like an option at all.
    pub fn looks_like_option(symbol: &str, description: &str) -> bool {
        symbol.trim().starts_with('-') || Self::parse_description(description).is_ok()
    }

    fn validated(
        underlying: String,
        option_type: OptionType,
        strike: f64,
        expiry: NaiveDate,
        source: &str,
    ) -> Result<Self> {
        let well_formed = underlying
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.');
        if underlying.is_empty() || !well_formed {
            return Err(invalid(source, "bad underlying"));
        }
        if !(strike.is_finite() && strike > 0.0) {
            return Err(invalid(source, "strike must be positive"));
        }
        Ok(Self {
            underlying,
            option_type,
            strike,
            expiry,
        })
    }
}

fn invalid(source: &str, reason: &str) -> Error {
    Error::InvalidOption(format!("{} ({})", source.trim(), reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_description() {
        let contract = OptionContract::parse_description("SPY JUN 20 2025 $500 CALL").unwrap();
        assert_eq!(contract.underlying, "SPY");
        assert_eq!(contract.option_type, OptionType::Call);
        assert_eq!(contract.strike, 500.0);
        assert_eq!(contract.expiry, NaiveDate::from_ymd_opt(2025, 6, 20).unwrap());
    }

    #[test]
    fn test_parse_description_fractional_strike() {
        let contract = OptionContract::parse_description("aapl Jan 16 2026 $187.5 put").unwrap();
        assert_eq!(contract.underlying, "AAPL");
        assert_eq!(contract.option_type, OptionType::Put);
        assert_eq!(contract.strike, 187.5);
    }

    #[test]
    fn test_parse_description_rejects_stock() {
        assert!(OptionContract::parse_description("APPLE INC").is_err());
        assert!(OptionContract::parse_description("SPY FOO 20 2025 $500 CALL").is_err());
        assert!(OptionContract::parse_description("SPY FEB 30 2025 $500 CALL").is_err());
    }

    #[test]
    fn test_non_finite_strike_rejected() {
        assert!(OptionContract::parse_description("SPY JUN 20 2025 $inf CALL").is_err());
        assert!(OptionContract::parse_description("SPY JUN 20 2025 $NaN PUT").is_err());
        assert!(OptionContract::parse_symbol("-SPY250620Cinf").is_err());
    }

    #[test]
    fn test_parse_symbol() {
        let contract = OptionContract::parse_symbol(" -SPY250620C500").unwrap();
        assert_eq!(contract.underlying, "SPY");
        assert_eq!(contract.option_type, OptionType::Call);
        assert_eq!(contract.strike, 500.0);
        assert_eq!(contract.expiry, NaiveDate::from_ymd_opt(2025, 6, 20).unwrap());

        let contract = OptionContract::parse_symbol("-AAPL260116P187.5").unwrap();
        assert_eq!(contract.option_type, OptionType::Put);
        assert_eq!(contract.strike, 187.5);
    }

    #[test]
    fn test_parse_symbol_invalid() {
        assert!(OptionContract::parse_symbol("-SPY").is_err());
        assert!(OptionContract::parse_symbol("-250620C500").is_err());
        assert!(OptionContract::parse_symbol("-SPY250620X500").is_err());
    }

    #[test]
    fn test_identify_falls_back_to_symbol() {
        let contract = OptionContract::identify("-QQQ250919P450", "").unwrap();
        assert_eq!(contract.underlying, "QQQ");
        assert_eq!(contract.option_type, OptionType::Put);
    }

    #[test]
    fn test_looks_like_option() {
        assert!(OptionContract::looks_like_option("-SPY250620C500", ""));
        assert!(OptionContract::looks_like_option("", "SPY JUN 20 2025 $500 CALL"));
        assert!(!OptionContract::looks_like_option("AAPL", "APPLE INC"));
    }
}
