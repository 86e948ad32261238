//! # journal
//!
//! Append-only trade journal. One CSV row per closed trade; the header is
//! written only when the file is new or empty, so restarts keep appending.
//!
//! ```text
//! ts_open,ts_close,symbol,side,quantity,entry_price,exit_price,pnl,pnl_pct,reason
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use crate::error::JournalError;
use crate::models::ClosedTrade;

pub trait TradeLogger: Send + Sync {
    fn log_trade(&self, trade: &ClosedTrade) -> Result<(), JournalError>;
}

#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    ts_open: f64,
    ts_close: f64,
    symbol: &'a str,
    side: &'a str,
    quantity: f64,
    entry_price: f64,
    exit_price: f64,
    pnl: f64,
    pnl_pct: f64,
    reason: &'a str,
}

impl<'a> From<&'a ClosedTrade> for TradeRow<'a> {
    fn from(t: &'a ClosedTrade) -> Self {
        Self {
            ts_open: t.entry_ts,
            ts_close: t.exit_ts,
            symbol: &t.symbol,
            side: t.side.as_str(),
            quantity: t.quantity,
            entry_price: t.entry_price,
            exit_price: t.exit_price,
            pnl: t.pnl,
            pnl_pct: t.pnl_pct,
            reason: t.reason.as_str(),
        }
    }
}

// ─── CsvTradeLogger ───────────────────────────────────────────────────────────

pub struct CsvTradeLogger {
    path: PathBuf,
    // serialises appends from concurrent callers
    lock: Mutex<()>,
}

impl CsvTradeLogger {
    /// Creates parent directories if needed. The file itself is created on
    /// the first trade.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        Ok(Self { path, lock: Mutex::new(()) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TradeLogger for CsvTradeLogger {
    fn log_trade(&self, trade: &ClosedTrade) -> Result<(), JournalError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(TradeRow::from(trade))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExitReason, Side};
    use uuid::Uuid;

    fn trade(pnl: f64, reason: ExitReason) -> ClosedTrade {
        ClosedTrade {
            trade_id: Uuid::new_v4(),
            symbol: "ETHUSDT".into(),
            side: Side::Short,
            quantity: 1.0,
            entry_price: 100.0,
            exit_price: 100.0 - pnl,
            pnl,
            pnl_pct: pnl,
            entry_ts: 10.0,
            exit_ts: 70.0,
            duration_secs: 60.0,
            reason,
        }
    }

    #[test]
    fn test_header_written_once_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("trades.csv");

        let logger = CsvTradeLogger::new(&path).unwrap();
        assert_eq!(logger.path(), path.as_path());
        assert!(path.parent().unwrap().is_dir());
        logger.log_trade(&trade(2.0, ExitReason::Tp)).unwrap();
        drop(logger);

        let logger = CsvTradeLogger::new(&path).unwrap();
        logger.log_trade(&trade(-2.0, ExitReason::Sl)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "ts_open,ts_close,symbol,side,quantity,entry_price,exit_price,pnl,pnl_pct,reason"
        );
        assert_eq!(lines[1], "10.0,70.0,ETHUSDT,SHORT,1.0,100.0,98.0,2.0,2.0,tp");
        assert!(lines[2].ends_with(",sl"));
    }
}
