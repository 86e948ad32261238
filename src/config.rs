//! # config
//!
//! Strategy parameters and runtime wiring, read from environment variables
//! (a `.env` file is loaded first by `main`). CLI flags override these after
//! loading; see `cli`. A variable that is set but does not parse is an error.
//! Flags accept `true/false`, `1/0` or `yes/no`, case-insensitive.
//!
//! | Variable                 | Default     | Meaning                                    |
//! |--------------------------|-------------|--------------------------------------------|
//! | `REFERENCE_SYMBOL`       | `BTCUSDT`   | Symbol whose drawdown is watched           |
//! | `TRADED_SYMBOL`          | `ETHUSDT`   | Symbol that gets shorted                   |
//! | `DROP_PCT_THRESHOLD`     | `1.0`       | Drawdown % from local max that triggers    |
//! | `LOOKBACK_SECS`          | `300`       | Window for the local maximum               |
//! | `ENTRY_WINDOW_SECS`      | `600`       | How long after first trigger entry is OK   |
//! | `COOLDOWN_SECS`          | `900`       | Minimum gap between entries                |
//! | `ORDER_QTY`              | `1.0`       | Order size in coins                        |
//! | `ORDER_NOTIONAL_USD`     | unset       | If set, size = notional / price instead    |
//! | `LEVERAGE`               | `3.0`       |                                            |
//! | `STOP_LOSS_PCT`          | `2.0`       |                                            |
//! | `TAKE_PROFIT_PCT`        | `2.0`       |                                            |
//! | `POLL_INTERVAL_SECS`     | `2.0`       |                                            |
//! | `HISTORY_RETENTION_SECS` | derived     | `max(2 × lookback, 1200)` when unset       |
//! | `EAGER_WINDOW_EXPIRY`    | `false`     | Expire stale trigger windows every tick    |

use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;

// ─── OrderSize ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OrderSize {
    /// Fixed size in coins of the traded symbol.
    Quantity(f64),
    /// USD notional, converted to coins at the traded symbol's current price.
    Notional(f64),
}

impl OrderSize {
    /// Coins to order at `price`. `price` must be positive.
    pub fn quantity_at(self, price: f64) -> f64 {
        match self {
            OrderSize::Quantity(qty) => qty,
            OrderSize::Notional(usd) => usd / price,
        }
    }
}

// ─── StrategyConfig ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyConfig {
    pub reference_symbol: String,
    pub traded_symbol: String,
    pub drop_pct_threshold: f64,
    pub lookback_secs: u64,
    pub entry_window_secs: u64,
    pub cooldown_secs: u64,
    pub order_size: OrderSize,
    pub leverage: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub poll_interval_secs: f64,
    /// Overrides the derived history retention when set.
    pub history_retention_secs: Option<u64>,
    /// When `true`, an expired trigger window is cleared at the start of every
    /// tick instead of only when the gate reaches its window check.
    pub eager_window_expiry: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            reference_symbol: "BTCUSDT".to_string(),
            traded_symbol: "ETHUSDT".to_string(),
            drop_pct_threshold: 1.0,
            lookback_secs: 300,
            entry_window_secs: 600,
            cooldown_secs: 900,
            order_size: OrderSize::Quantity(1.0),
            leverage: 3.0,
            stop_loss_pct: 2.0,
            take_profit_pct: 2.0,
            poll_interval_secs: 2.0,
            history_retention_secs: None,
            eager_window_expiry: false,
        }
    }
}

impl StrategyConfig {
    /// Read from the process environment. A variable that is set but does
    /// not parse is an error naming the key, never a silent default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader(lookup);
        let defaults = Self::default();

        let order_size = match env.opt::<f64>("ORDER_NOTIONAL_USD")? {
            Some(usd) => OrderSize::Notional(usd),
            None => OrderSize::Quantity(env.or("ORDER_QTY", 1.0)?),
        };

        Ok(Self {
            reference_symbol:       env.string("REFERENCE_SYMBOL", &defaults.reference_symbol),
            traded_symbol:          env.string("TRADED_SYMBOL", &defaults.traded_symbol),
            drop_pct_threshold:     env.or("DROP_PCT_THRESHOLD", defaults.drop_pct_threshold)?,
            lookback_secs:          env.or("LOOKBACK_SECS", defaults.lookback_secs)?,
            entry_window_secs:      env.or("ENTRY_WINDOW_SECS", defaults.entry_window_secs)?,
            cooldown_secs:          env.or("COOLDOWN_SECS", defaults.cooldown_secs)?,
            order_size,
            leverage:               env.or("LEVERAGE", defaults.leverage)?,
            stop_loss_pct:          env.or("STOP_LOSS_PCT", defaults.stop_loss_pct)?,
            take_profit_pct:        env.or("TAKE_PROFIT_PCT", defaults.take_profit_pct)?,
            poll_interval_secs:     env.or("POLL_INTERVAL_SECS", defaults.poll_interval_secs)?,
            history_retention_secs: env.opt("HISTORY_RETENTION_SECS")?,
            eager_window_expiry:    env.flag("EAGER_WINDOW_EXPIRY", false)?,
        })
    }

    /// Retention for price history: explicit override, else `max(2 × lookback, 1200)`.
    pub fn history_retention_secs(&self) -> u64 {
        self.history_retention_secs
            .unwrap_or_else(|| (self.lookback_secs * 2).max(1200))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reference_symbol.trim().is_empty() {
            return Err(ConfigError::invalid("REFERENCE_SYMBOL", "must not be empty"));
        }
        if self.traded_symbol.trim().is_empty() {
            return Err(ConfigError::invalid("TRADED_SYMBOL", "must not be empty"));
        }
        if self.reference_symbol == self.traded_symbol {
            return Err(ConfigError::invalid(
                "TRADED_SYMBOL",
                "must differ from REFERENCE_SYMBOL",
            ));
        }
        positive("DROP_PCT_THRESHOLD", self.drop_pct_threshold)?;
        if self.lookback_secs == 0 {
            return Err(ConfigError::invalid("LOOKBACK_SECS", "must be > 0"));
        }
        match self.order_size {
            OrderSize::Quantity(q) => positive("ORDER_QTY", q)?,
            OrderSize::Notional(n) => positive("ORDER_NOTIONAL_USD", n)?,
        }
        positive("LEVERAGE", self.leverage)?;
        positive("STOP_LOSS_PCT", self.stop_loss_pct)?;
        positive("TAKE_PROFIT_PCT", self.take_profit_pct)?;
        if self.take_profit_pct >= 100.0 {
            return Err(ConfigError::invalid("TAKE_PROFIT_PCT", "must be < 100"));
        }
        positive("POLL_INTERVAL_SECS", self.poll_interval_secs)?;
        if let Some(retention) = self.history_retention_secs {
            if retention < self.lookback_secs {
                return Err(ConfigError::invalid(
                    "HISTORY_RETENTION_SECS",
                    format!("must be ≥ LOOKBACK_SECS ({})", self.lookback_secs),
                ));
            }
        }
        Ok(())
    }
}

// ─── RuntimeConfig ────────────────────────────────────────────────────────────

/// Which collaborator implementations the binary wires up.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// `"binance"` or `"hyperliquid"`.
    pub price_source: String,
    pub binance_base_url: String,
    pub hyperliquid_base_url: String,
    /// `None` → dry-run order sink.
    pub order_gateway_url: Option<String>,
    pub trade_log_path: Option<String>,
    pub monitor_addr: Option<String>,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let env = EnvReader(|key: &str| std::env::var(key).ok());

        Self {
            price_source:         env.string("PRICE_SOURCE", "binance").to_lowercase(),
            binance_base_url:     env.string("BINANCE_BASE_URL", "https://api.binance.com"),
            hyperliquid_base_url: env.string("HYPERLIQUID_BASE_URL", "https://api.hyperliquid.xyz"),
            order_gateway_url:    env.raw("ORDER_GATEWAY_URL").filter(|v| v != "dry-run"),
            trade_log_path:       env.raw("TRADE_LOG_PATH"),
            monitor_addr:         env.raw("MONITOR_ADDR"),
        }
    }
}

// ─── Env Helpers ──────────────────────────────────────────────────────────────

/// Typed access to a key → value lookup. Blank values count as unset.
struct EnvReader<F>(F);

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn raw(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    fn opt<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        match self.raw(key) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::invalid(key, format!("cannot parse {v:?}"))),
        }
    }

    fn or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        Ok(self.opt(key)?.unwrap_or(default))
    }

    fn flag(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(v) = self.raw(key) else {
            return Ok(default);
        };
        match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::invalid(
                key,
                format!("expected true/false, 1/0 or yes/no, got {v:?}"),
            )),
        }
    }
}

fn positive(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("must be > 0 (got {value})")))
    }
}
