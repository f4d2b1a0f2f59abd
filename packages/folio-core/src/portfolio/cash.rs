//! Cash-like holding detection.

use crate::config::FolioConfig;

/// Money-market funds and short-term treasury ETFs.
const CASH_LIKE_SYMBOLS: &[&str] = &[
    "SPAXX", "FDRXX", "FZFXX", "SPRXX", "FZDXX", "FTEXX", "FCASH", "CORE", "VMFXX", "SWVXX",
    "SNVXX", "SGOV", "BIL", "BILS", "SHV", "TFLO", "USFR", "CLTL", "GBIL", "TBIL", "XBIL", "BOXX",
];

const CASH_LIKE_KEYWORDS: &[&str] = &[
    "MONEY MARKET",
    "TREASURY BILL",
    "T-BILL",
    "GOVT CASH",
    "CASH RESERVES",
    "FDIC INSURED DEPOSIT",
];

/// Whether a holding behaves like cash.
///
/// Any one signal is enough: the broker's `**` money-market marker, a known
/// fund symbol (built in or configured), a money-market keyword in the
/// description, or a known beta within `cash_beta_threshold` of zero.
pub fn is_cash_like(
    symbol: &str,
    description: &str,
    beta: Option<f64>,
    config: &FolioConfig,
) -> bool {
    let symbol = symbol.trim();
    if symbol.ends_with("**") {
        return true;
    }

    let bare = symbol.trim_end_matches('*').to_uppercase();
    if CASH_LIKE_SYMBOLS.contains(&bare.as_str()) || config.is_extra_cash_symbol(&bare) {
        return true;
    }

    let description = description.to_uppercase();
    if CASH_LIKE_KEYWORDS.iter().any(|k| description.contains(k)) {
        return true;
    }

    matches!(beta, Some(b) if b.abs() < config.cash_beta_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_market_marker() {
        let config = FolioConfig::default();
        assert!(is_cash_like("SPAXX**", "HELD IN MONEY MARKET", None, &config));
        assert!(is_cash_like("XYZXX**", "", None, &config));
    }

    #[test]
    fn test_known_symbols() {
        let config = FolioConfig::default();
        assert!(is_cash_like("SGOV", "ISHARES 0-3 MONTH TREASURY", Some(0.01), &config));
        assert!(is_cash_like("bil", "", None, &config));
        assert!(!is_cash_like("AAPL", "APPLE INC", Some(1.2), &config));
    }

    #[test]
    fn test_description_keyword() {
        let config = FolioConfig::default();
        assert!(is_cash_like("XYZ", "Fidelity Government Money Market", None, &config));
        assert!(is_cash_like("ABC", "US TREASURY BILL 0% 06/2025", None, &config));
    }

    #[test]
    fn test_low_beta() {
        let config = FolioConfig::default();
        assert!(is_cash_like("LOWB", "", Some(0.05), &config));
        assert!(is_cash_like("LOWB", "", Some(-0.05), &config));
        assert!(!is_cash_like("LOWB", "", Some(0.3), &config));
        assert!(!is_cash_like("LOWB", "", None, &config));
    }

    #[test]
    fn test_configured_symbols() {
        let config = FolioConfig {
            extra_cash_symbols: vec!["MYMMF".to_string()],
            ..FolioConfig::default()
        };
        assert!(is_cash_like("mymmf", "", None, &config));
    }
}
