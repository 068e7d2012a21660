//! Equity tracking and the final performance report.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::ledger::{Ledger, SkippedAction};
use super::position::Trade;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub index: usize,
    pub equity: f64,
}

/// A ratio that may have no defined value (profit factor with no losing
/// trades, Calmar at zero drawdown). Never NaN or infinity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Value(f64),
    Undefined,
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ratio::Value(v) => serializer.serialize_f64(*v),
            Ratio::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Value(v) => write!(f, "{v:.2}"),
            Ratio::Undefined => f.write_str("undefined"),
        }
    }
}

/// Passive observer of the equity curve. Records one point per step and keeps
/// peak and drawdown tight against the recorded points.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    equity_curve: Vec<EquityPoint>,
    peak_equity: f64,
    max_drawdown: f64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            equity_curve: Vec::new(),
            peak_equity: 0.0,
            max_drawdown: 0.0,
        }
    }

    pub fn observe(&mut self, index: usize, equity: f64) {
        self.equity_curve.push(EquityPoint { index, equity });
        if equity > self.peak_equity {
            self.peak_equity = equity;
        } else if self.peak_equity > 0.0 {
            let drawdown = (self.peak_equity - equity) / self.peak_equity;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn peak_equity(&self) -> f64 {
        self.peak_equity
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Aggregate the trade log and the recorded curve into the final report.
    pub fn finish(self, ledger: Ledger) -> Report {
        let initial_capital = ledger.initial_capital();
        let final_capital = self
            .equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);
        let (trades, skipped) = ledger.into_parts();

        let roi = (final_capital - initial_capital) / initial_capital * 100.0;

        let wins = trades.iter().filter(|t| t.pnl_absolute > 0.0).count();
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            wins as f64 / trades.len() as f64
        };

        let gross_wins: f64 = trades
            .iter()
            .filter(|t| t.pnl_absolute > 0.0)
            .map(|t| t.pnl_absolute)
            .sum();
        let gross_losses: f64 = trades
            .iter()
            .filter(|t| t.pnl_absolute < 0.0)
            .map(|t| t.pnl_absolute.abs())
            .sum();
        let profit_factor = if gross_losses > 0.0 {
            Ratio::Value(gross_wins / gross_losses)
        } else {
            Ratio::Undefined
        };

        let max_drawdown_percent = self.max_drawdown * 100.0;
        let calmar_ratio = if max_drawdown_percent > 0.0 {
            Ratio::Value(roi / max_drawdown_percent)
        } else {
            Ratio::Undefined
        };

        let per_asset = group_stats(&trades, |t| t.asset.clone());
        let per_category = group_stats(&trades, |t| t.category.clone());

        Report {
            roi,
            trades: trades.len(),
            wins,
            win_rate,
            max_drawdown_percent,
            profit_factor,
            calmar_ratio,
            final_capital,
            per_asset,
            per_category,
            equity_curve: self.equity_curve,
            trade_log: trades,
            skipped,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub trades: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub pnl_absolute: f64,
}

fn group_stats(trades: &[Trade], key: impl Fn(&Trade) -> String) -> BTreeMap<String, GroupStats> {
    let mut groups: BTreeMap<String, GroupStats> = BTreeMap::new();
    for trade in trades {
        let stats = groups.entry(key(trade)).or_insert(GroupStats {
            trades: 0,
            wins: 0,
            win_rate: 0.0,
            pnl_absolute: 0.0,
        });
        stats.trades += 1;
        if trade.pnl_absolute > 0.0 {
            stats.wins += 1;
        }
        stats.pnl_absolute += trade.pnl_absolute;
    }
    for stats in groups.values_mut() {
        stats.win_rate = stats.wins as f64 / stats.trades as f64;
    }
    groups
}

/// Read-only snapshot produced at run end; the engine's only output artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Percent return on initial capital.
    pub roi: f64,
    pub trades: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub max_drawdown_percent: f64,
    pub profit_factor: Ratio,
    pub calmar_ratio: Ratio,
    pub final_capital: f64,
    pub per_asset: BTreeMap<String, GroupStats>,
    pub per_category: BTreeMap<String, GroupStats>,
    pub equity_curve: Vec<EquityPoint>,
    pub trade_log: Vec<Trade>,
    pub skipped: Vec<SkippedAction>,
}
