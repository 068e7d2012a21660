//! Portfolio ledger: sole owner and mutator of capital and open positions.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::candle::Candle;
use super::policy::EntrySignal;
use super::position::{ExitReason, Position, Trade};

/// Why an open or close request was rejected. Rejections are recorded and the
/// run continues; free capital never goes negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SkipReason {
    PositionAlreadyOpen,
    InsufficientCapital { required: f64, available: f64 },
    ZeroQuantity,
    NoOpenPosition,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::PositionAlreadyOpen => f.write_str("position already open"),
            SkipReason::InsufficientCapital {
                required,
                available,
            } => write!(
                f,
                "insufficient capital: need {required:.2}, have {available:.2}"
            ),
            SkipReason::ZeroQuantity => f.write_str("sized to zero quantity"),
            SkipReason::NoOpenPosition => f.write_str("no open position"),
        }
    }
}

/// One rejected action, kept for the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedAction {
    pub index: usize,
    pub asset: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    free_capital: f64,
    initial_capital: f64,
    entry_commission_rate: f64,
    exit_commission_rate: f64,
    positions: BTreeMap<String, Position>,
    trades: Vec<Trade>,
    skipped: Vec<SkippedAction>,
}

impl Ledger {
    pub fn new(initial_capital: f64, entry_commission_rate: f64, exit_commission_rate: f64) -> Self {
        Self {
            free_capital: initial_capital,
            initial_capital,
            entry_commission_rate,
            exit_commission_rate,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn free_capital(&self) -> f64 {
        self.free_capital
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn position(&self, asset: &str) -> Option<&Position> {
        self.positions.get(asset)
    }

    pub fn has_position(&self, asset: &str) -> bool {
        self.positions.contains_key(asset)
    }

    pub fn open_positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn skipped(&self) -> &[SkippedAction] {
        &self.skipped
    }

    pub fn into_parts(self) -> (Vec<Trade>, Vec<SkippedAction>) {
        (self.trades, self.skipped)
    }

    /// Open a long position from an entry signal and a sized quantity.
    /// Deducts `quantity * entry * (1 + entry_commission_rate)`.
    pub fn open(
        &mut self,
        asset: &str,
        signal: &EntrySignal,
        quantity: f64,
        index: usize,
    ) -> Result<(), SkipReason> {
        if self.positions.contains_key(asset) {
            return Err(self.skip(index, asset, SkipReason::PositionAlreadyOpen));
        }
        if quantity <= 0.0 {
            return Err(self.skip(index, asset, SkipReason::ZeroQuantity));
        }

        let cost = quantity * signal.entry_price * (1.0 + self.entry_commission_rate);
        if cost > self.free_capital {
            let reason = SkipReason::InsufficientCapital {
                required: cost,
                available: self.free_capital,
            };
            return Err(self.skip(index, asset, reason));
        }

        self.free_capital -= cost;
        self.positions.insert(
            asset.to_string(),
            Position {
                asset: asset.to_string(),
                entry_price: signal.entry_price,
                quantity,
                stop_loss: signal.stop_loss,
                target: signal.target,
                opened_at_index: index,
                hold_duration: 0,
                highest_price_seen: signal.entry_price,
            },
        );
        Ok(())
    }

    /// Advance position-local step state: hold duration and trailing high.
    pub fn touch(&mut self, asset: &str, candle: &Candle) {
        if let Some(pos) = self.positions.get_mut(asset) {
            pos.hold_duration += 1;
            if candle.high > pos.highest_price_seen {
                pos.highest_price_seen = candle.high;
            }
        }
    }

    /// Close the open position for `asset`, crediting
    /// `quantity * exit * (1 - exit_commission_rate)`.
    ///
    /// Long-only: pnl_percent is (exit - entry) / entry. A short-capable
    /// ledger would negate it; that variant is an extension point, not
    /// default behavior.
    pub fn close(
        &mut self,
        asset: &str,
        exit_price: f64,
        reason: ExitReason,
        index: usize,
        category: String,
    ) -> Result<Trade, SkipReason> {
        let Some(position) = self.positions.remove(asset) else {
            return Err(self.skip(index, asset, SkipReason::NoOpenPosition));
        };

        let proceeds = position.quantity * exit_price * (1.0 - self.exit_commission_rate);
        let entry_cost =
            position.quantity * position.entry_price * (1.0 + self.entry_commission_rate);
        self.free_capital += proceeds;

        let trade = Trade {
            asset: position.asset,
            entry_price: position.entry_price,
            exit_price,
            quantity: position.quantity,
            pnl_percent: (exit_price - position.entry_price) / position.entry_price * 100.0,
            pnl_absolute: proceeds - entry_cost,
            exit_reason: reason,
            hold_duration: position.hold_duration,
            category,
        };
        self.trades.push(trade.clone());
        Ok(trade)
    }

    /// Mark-to-market equity: free capital plus open positions at the given
    /// prices. Pure read. A position whose asset has no observed price yet is
    /// valued at its entry price.
    pub fn mark_to_market(&self, prices: &BTreeMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = prices.get(&pos.asset).copied().unwrap_or(pos.entry_price);
                pos.market_value(price)
            })
            .sum();
        self.free_capital + position_value
    }

    fn skip(&mut self, index: usize, asset: &str, reason: SkipReason) -> SkipReason {
        self.skipped.push(SkippedAction {
            index,
            asset: asset.to_string(),
            reason: reason.clone(),
        });
        reason
    }
}
