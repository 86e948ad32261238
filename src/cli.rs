//! # cli
//!
//! Command-line surface. Every flag is optional and overrides the matching
//! environment variable read by [`StrategyConfig::from_env`] /
//! [`RuntimeConfig::from_env`].

use anyhow::{ensure, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{OrderSize, RuntimeConfig, StrategyConfig};

#[derive(Debug, Parser)]
#[command(
    name = "dropshort",
    version,
    about = "Short a correlated asset when the reference asset drops"
)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll live prices until Ctrl-C.
    Run,

    /// Run a single tick against the given prices.
    Once {
        #[arg(long)]
        reference_price: f64,

        #[arg(long)]
        traded_price: f64,
    },

    /// Step paired price series through the engine on a simulated clock.
    /// Orders always go to the dry-run sink.
    Replay {
        /// Comma-separated reference prices, e.g. 100,99.5,98.9
        #[arg(long, value_delimiter = ',', required = true)]
        reference_prices: Vec<f64>,

        /// Comma-separated traded prices, same length as the reference series.
        #[arg(long, value_delimiter = ',', required = true)]
        traded_prices: Vec<f64>,

        /// Simulated seconds between ticks.
        #[arg(long, default_value_t = 2.0)]
        step_secs: f64,
    },
}

impl Command {
    /// Zip the replay series. Errors when lengths differ.
    pub fn replay_series(reference: &[f64], traded: &[f64]) -> Result<Vec<(f64, f64)>> {
        ensure!(
            reference.len() == traded.len(),
            "--reference-prices has {} values but --traded-prices has {}",
            reference.len(),
            traded.len()
        );
        Ok(reference.iter().copied().zip(traded.iter().copied()).collect())
    }
}

// ─── Overrides ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Args)]
pub struct Overrides {
    #[arg(long, global = true)]
    pub reference_symbol: Option<String>,

    #[arg(long, global = true)]
    pub traded_symbol: Option<String>,

    /// Drawdown % that triggers an entry.
    #[arg(long, global = true)]
    pub drop_pct: Option<f64>,

    #[arg(long, global = true)]
    pub lookback_secs: Option<u64>,

    #[arg(long, global = true)]
    pub entry_window_secs: Option<u64>,

    #[arg(long, global = true)]
    pub cooldown_secs: Option<u64>,

    /// Fixed order size in coins.
    #[arg(long, global = true, conflicts_with = "notional_usd")]
    pub qty: Option<f64>,

    /// Order size in USD, converted at the traded price.
    #[arg(long, global = true)]
    pub notional_usd: Option<f64>,

    #[arg(long, global = true)]
    pub leverage: Option<f64>,

    #[arg(long, global = true)]
    pub stop_loss_pct: Option<f64>,

    #[arg(long, global = true)]
    pub take_profit_pct: Option<f64>,

    #[arg(long, global = true)]
    pub poll_interval_secs: Option<f64>,

    /// Clear an expired trigger window at the start of every tick.
    #[arg(long, global = true)]
    pub eager_window_expiry: bool,

    #[arg(long, global = true, value_parser = ["binance", "hyperliquid"])]
    pub price_source: Option<String>,

    /// Order gateway base URL. `dry-run` forces the paper sink.
    #[arg(long, global = true)]
    pub order_gateway_url: Option<String>,

    /// CSV trade journal path.
    #[arg(long, global = true)]
    pub trade_log: Option<String>,

    /// Serve the HTTP/WebSocket monitor on this address, e.g. 0.0.0.0:3000
    #[arg(long, global = true)]
    pub monitor_addr: Option<String>,
}

impl Overrides {
    pub fn apply(&self, strategy: &mut StrategyConfig, runtime: &mut RuntimeConfig) {
        if let Some(v) = &self.reference_symbol {
            strategy.reference_symbol = v.clone();
        }
        if let Some(v) = &self.traded_symbol {
            strategy.traded_symbol = v.clone();
        }
        if let Some(v) = self.drop_pct {
            strategy.drop_pct_threshold = v;
        }
        if let Some(v) = self.lookback_secs {
            strategy.lookback_secs = v;
        }
        if let Some(v) = self.entry_window_secs {
            strategy.entry_window_secs = v;
        }
        if let Some(v) = self.cooldown_secs {
            strategy.cooldown_secs = v;
        }
        if let Some(v) = self.qty {
            strategy.order_size = OrderSize::Quantity(v);
        }
        if let Some(v) = self.notional_usd {
            strategy.order_size = OrderSize::Notional(v);
        }
        if let Some(v) = self.leverage {
            strategy.leverage = v;
        }
        if let Some(v) = self.stop_loss_pct {
            strategy.stop_loss_pct = v;
        }
        if let Some(v) = self.take_profit_pct {
            strategy.take_profit_pct = v;
        }
        if let Some(v) = self.poll_interval_secs {
            strategy.poll_interval_secs = v;
        }
        if self.eager_window_expiry {
            strategy.eager_window_expiry = true;
        }

        if let Some(v) = &self.price_source {
            runtime.price_source = v.clone();
        }
        if let Some(v) = &self.order_gateway_url {
            runtime.order_gateway_url = Some(v.clone()).filter(|v| !v.is_empty() && v != "dry-run");
        }
        if let Some(v) = &self.trade_log {
            runtime.trade_log_path = Some(v.clone());
        }
        if let Some(v) = &self.monitor_addr {
            runtime.monitor_addr = Some(v.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> RuntimeConfig {
        RuntimeConfig {
            price_source:         "binance".into(),
            binance_base_url:     "https://api.binance.com".into(),
            hyperliquid_base_url: "https://api.hyperliquid.xyz".into(),
            order_gateway_url:    Some("http://localhost:8081".into()),
            trade_log_path:       None,
            monitor_addr:         None,
        }
    }

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from([
            "dropshort",
            "replay",
            "--reference-prices", "100,99.5,98.9",
            "--traded-prices", "3000,3000,2900",
            "--step-secs", "60",
        ])
        .unwrap();

        let Command::Replay { reference_prices, traded_prices, step_secs } = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(reference_prices, vec![100.0, 99.5, 98.9]);
        assert_eq!(step_secs, 60.0);
        let series = Command::replay_series(&reference_prices, &traded_prices).unwrap();
        assert_eq!(series[2], (98.9, 2900.0));
    }

    #[test]
    fn test_mismatched_replay_series_is_error() {
        let err = Command::replay_series(&[100.0, 99.0], &[3000.0]).unwrap_err();
        assert!(err.to_string().contains("2 values"));
    }

    #[test]
    fn test_overrides_apply_after_env() {
        let cli = Cli::try_parse_from([
            "dropshort",
            "once",
            "--reference-price", "99",
            "--traded-price", "3000",
            "--notional-usd", "500",
            "--cooldown-secs", "60",
            "--order-gateway-url", "dry-run",
        ])
        .unwrap();

        let mut strategy = StrategyConfig::default();
        let mut runtime = runtime();
        cli.overrides.apply(&mut strategy, &mut runtime);

        assert_eq!(strategy.order_size, OrderSize::Notional(500.0));
        assert_eq!(strategy.cooldown_secs, 60);
        assert_eq!(strategy.lookback_secs, 300);
        assert_eq!(runtime.order_gateway_url, None);
    }

    #[test]
    fn test_qty_and_notional_conflict() {
        let result = Cli::try_parse_from(["dropshort", "run", "--qty", "1", "--notional-usd", "100"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_price_source_rejected() {
        assert!(Cli::try_parse_from(["dropshort", "run", "--price-source", "kraken"]).is_err());
    }
}
