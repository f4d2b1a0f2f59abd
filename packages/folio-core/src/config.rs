//! Folio configuration loaded from TOML.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Tunables for pricing, cash detection, and simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FolioConfig {
    /// Annual risk-free rate (0.04 = 4%)
    pub risk_free_rate: f64,
    /// Volatility used when none can be implied from the premium
    pub default_volatility: f64,
    /// Shares per option contract
    pub contract_multiplier: f64,
    /// Beta assumed for tickers with no market data
    pub default_beta: f64,
    /// Holdings with |beta| below this are treated as cash-like
    pub cash_beta_threshold: f64,
    /// Additional symbols to treat as cash-like
    pub extra_cash_symbols: Vec<String>,
    pub simulation: SimulationConfig,
}

/// SPY shock grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Largest shock in either direction (0.20 = ±20%)
    pub range: f64,
    /// Number of shock levels
    pub steps: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            range: 0.20,
            steps: 11,
        }
    }
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.04,
            default_volatility: 0.30,
            contract_multiplier: 100.0,
            default_beta: 1.0,
            cash_beta_threshold: 0.1,
            extra_cash_symbols: Vec::new(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl FolioConfig {
    /// Get the default config file path.
    ///
    /// Default path: `<config dir>/folio/config.toml`
    /// Can be overridden with `FOLIO_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_CONFIG") {
            return PathBuf::from(path);
        }

        directories::ProjectDirs::from("", "", "folio")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("folio.toml"))
    }

    /// Load from the default path, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path, falling back to defaults when absent.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pricing and simulation code cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.default_volatility > 0.0) {
            return Err(Error::Config(
                "default_volatility must be positive".to_string(),
            ));
        }
        if !(self.contract_multiplier > 0.0) {
            return Err(Error::Config(
                "contract_multiplier must be positive".to_string(),
            ));
        }
        if self.cash_beta_threshold < 0.0 {
            return Err(Error::Config(
                "cash_beta_threshold must not be negative".to_string(),
            ));
        }
        if !(self.simulation.range > 0.0 && self.simulation.range < 1.0) {
            return Err(Error::Config(
                "simulation.range must be between 0 and 1".to_string(),
            ));
        }
        if self.simulation.steps < 2 {
            return Err(Error::Config(
                "simulation.steps must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a symbol was configured as cash-like.
    pub fn is_extra_cash_symbol(&self, symbol: &str) -> bool {
        self.extra_cash_symbols
            .iter()
            .any(|s| s.eq_ignore_ascii_case(symbol))
    }
}
