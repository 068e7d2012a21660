//! Position tracking and closed-trade records.

use serde::Serialize;
use std::fmt;

/// One open long position. At most one exists per asset at any time; the
/// ledger owns the map and is the only mutator.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub asset: String,
    pub entry_price: f64,
    pub quantity: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub opened_at_index: usize,
    pub hold_duration: usize,
    pub highest_price_seen: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.entry_price)
    }

    /// Stop level reached within a candle trading down to `low`.
    /// A zero stop disables the check.
    pub fn stop_crossed(&self, low: f64) -> bool {
        self.stop_loss > 0.0 && low <= self.stop_loss
    }

    /// Target level reached within a candle trading up to `high`.
    /// A zero target disables the check.
    pub fn target_crossed(&self, high: f64) -> bool {
        self.target > 0.0 && high >= self.target
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    TargetHit,
    StopLoss,
    TimeStop,
    TrendInvalidation,
    PanicExit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::TargetHit => "TARGET_HIT",
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::TimeStop => "TIME_STOP",
            ExitReason::TrendInvalidation => "TREND_INVALIDATION",
            ExitReason::PanicExit => "PANIC_EXIT",
        };
        f.write_str(s)
    }
}

/// Immutable record created when a position closes. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub asset: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    /// Raw price move: (exit - entry) / entry * 100, before commissions.
    pub pnl_percent: f64,
    /// Cash delta after entry and exit commissions.
    pub pnl_absolute: f64,
    pub exit_reason: ExitReason,
    pub hold_duration: usize,
    pub category: String,
}
