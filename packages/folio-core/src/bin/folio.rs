//! Folio CLI - Command line interface for portfolio exposure analysis.
//!
//! Every command except `report` prints an `ApiResponse` JSON document on
//! stdout. Logs go to stderr (`RUST_LOG` controls the level).

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use folio_core::{
    build_portfolio, implied_volatility,
    options::time_to_expiry,
    portfolio::parse_portfolio_file,
    portfolio_context, simulate_spy_shocks, spy_changes, ApiResponse, BlackScholes, FolioConfig,
    OptionType, Portfolio, StaticMarketData,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio CLI - portfolio exposure, beta, and SPY shock analysis")]
#[command(version)]
struct Cli {
    /// Market data JSON with betas, prices, and histories
    #[arg(long, global = true)]
    market: Option<PathBuf>,

    /// Config TOML (defaults to $FOLIO_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Valuation date as YYYY-MM-DD (defaults to today)
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Portfolio summary: exposures, beta, cash
    Summary {
        /// Brokerage CSV export
        csv: PathBuf,
    },
    /// Per-underlying position groups
    Groups {
        /// Brokerage CSV export
        csv: PathBuf,
    },
    /// Portfolio value across SPY shocks
    Simulate {
        /// Brokerage CSV export
        csv: PathBuf,
        /// Largest shock in either direction (0.2 = ±20%)
        #[arg(long)]
        range: Option<f64>,
        /// Number of shock levels
        #[arg(long)]
        steps: Option<usize>,
    },
    /// Plain-text digest of the portfolio
    Report {
        /// Brokerage CSV export
        csv: PathBuf,
    },
    /// Price a single option and its Greeks
    Option {
        /// Underlying price
        #[arg(long)]
        spot: f64,
        /// Strike price
        #[arg(long)]
        strike: f64,
        /// Expiration date (YYYY-MM-DD)
        #[arg(long)]
        expiry: NaiveDate,
        /// call or put
        #[arg(long = "type")]
        option_type: OptionType,
        /// Quoted premium, to solve for implied volatility
        #[arg(long, conflicts_with = "vol")]
        premium: Option<f64>,
        /// Volatility to price at (0.3 = 30%)
        #[arg(long)]
        vol: Option<f64>,
    },
}

/// Inputs shared by every command.
struct Session {
    config: FolioConfig,
    market: StaticMarketData,
    as_of: NaiveDate,
}

impl Session {
    fn open(cli: &Cli) -> folio_core::Result<Self> {
        let config = match &cli.config {
            Some(path) => FolioConfig::load_from_path(path)?,
            None => FolioConfig::load()?,
        };
        let market = match &cli.market {
            Some(path) => StaticMarketData::load_from_path(path)?,
            None => StaticMarketData::new(),
        };
        let as_of = cli
            .as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        Ok(Self {
            config,
            market,
            as_of,
        })
    }

    fn portfolio(&self, csv: &Path) -> folio_core::Result<Portfolio> {
        let parsed = parse_portfolio_file(csv, &self.config)?;
        Ok(build_portfolio(parsed, &self.market, &self.config, self.as_of))
    }
}

fn main() -> Result<()> {
    // Logs on stderr so stdout stays machine readable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Commands::Report { csv } = &cli.command {
        match Session::open(&cli).and_then(|s| s.portfolio(csv)) {
            Ok(portfolio) => print!("{}", portfolio_context(&portfolio)),
            Err(e) => {
                tracing::error!("Report failed: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let response = match run(&cli) {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            ApiResponse::err(e.to_string())
        }
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run(cli: &Cli) -> folio_core::Result<serde_json::Value> {
    let session = Session::open(cli)?;

    match &cli.command {
        Commands::Summary { csv } => {
            let portfolio = session.portfolio(csv)?;
            Ok(json!({
                "summary": portfolio.summary,
                "skipped": portfolio.skipped,
            }))
        }
        Commands::Groups { csv } => {
            let portfolio = session.portfolio(csv)?;
            Ok(json!({
                "groups": portfolio.groups,
                "group_count": portfolio.groups.len(),
            }))
        }
        Commands::Simulate { csv, range, steps } => {
            let portfolio = session.portfolio(csv)?;
            let mut config = session.config.clone();
            if let Some(range) = range {
                config.simulation.range = *range;
            }
            if let Some(steps) = steps {
                config.simulation.steps = *steps;
            }
            config.validate()?;

            let changes = spy_changes(config.simulation.range, config.simulation.steps);
            let result = simulate_spy_shocks(&portfolio, &changes, &config, session.as_of);
            Ok(serde_json::to_value(result)?)
        }
        Commands::Option {
            spot,
            strike,
            expiry,
            option_type,
            premium,
            vol,
        } => {
            let config = &session.config;
            let t = time_to_expiry(*expiry, session.as_of);
            let volatility = match premium {
                Some(premium) => implied_volatility(
                    *option_type,
                    *premium,
                    *spot,
                    *strike,
                    config.risk_free_rate,
                    t,
                )
                .ok_or_else(|| {
                    folio_core::Error::InvalidOption(format!(
                        "no implied volatility for premium {}",
                        premium
                    ))
                })?,
                None => vol.unwrap_or(config.default_volatility),
            };

            let greeks = BlackScholes::new(
                *option_type,
                *spot,
                *strike,
                config.risk_free_rate,
                volatility,
                t,
            )
            .greeks();
            Ok(json!({
                "option_type": option_type,
                "time_to_expiry": t,
                "volatility": volatility,
                "greeks": greeks,
            }))
        }
        Commands::Report { .. } => Err(folio_core::Error::InvalidOperation(
            "report prints text, not JSON".to_string(),
        )),
    }
}
