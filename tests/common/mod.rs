#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::BTreeMap;

use stratsim::domain::candle::{AssetSeries, Candle};
use stratsim::domain::config::SimConfig;
use stratsim::domain::error::StratsimError;
use stratsim::domain::indicator::IndicatorView;
use stratsim::domain::policy::{EntrySignal, ExitSignal, StrategyPolicy};
use stratsim::domain::position::Position;
use stratsim::domain::sizing::SizingMode;
use stratsim::ports::data_port::DataPort;

pub fn make_candle(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        time: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::days(i as i64),
        open,
        high,
        low,
        close,
        volume: 1000.0,
    }
}

/// Candle with open = high = low = close.
pub fn flat_candle(i: usize, close: f64) -> Candle {
    make_candle(i, close, close, close, close)
}

pub fn series_from_closes(asset: &str, closes: &[f64]) -> AssetSeries {
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| flat_candle(i, close))
        .collect();
    AssetSeries::new(asset, candles)
}

/// `n` closes evenly spaced from `start` to `end` inclusive.
pub fn linear_closes(start: f64, end: f64, n: usize) -> Vec<f64> {
    let step = if n > 1 {
        (end - start) / (n - 1) as f64
    } else {
        0.0
    };
    (0..n).map(|i| start + step * i as f64).collect()
}

pub fn identity(asset: &str) -> String {
    asset.to_string()
}

pub fn sample_config() -> SimConfig {
    SimConfig {
        initial_capital: 50_000.0,
        risk_fraction: 0.5,
        sizing_mode: SizingMode::FixedFraction,
        entry_commission_rate: 0.0,
        exit_commission_rate: 0.0,
        warmup_bars: 2,
        time_stop_bars: 0,
        min_trade_capital: 100.0,
    }
}

/// Strategy that never signals.
pub struct NeverPolicy;

impl StrategyPolicy for NeverPolicy {
    fn name(&self) -> &str {
        "never"
    }

    fn evaluate_entry(&self, _window: &[Candle]) -> Option<EntrySignal> {
        None
    }

    fn evaluate_exit(
        &self,
        _position: &Position,
        _candle: &Candle,
        _indicators: &IndicatorView,
    ) -> Option<ExitSignal> {
        None
    }
}

/// Buys whenever the close rises above the previous close, with percent
/// bracket levels. Exits are left entirely to the engine's default rule
/// (stop-loss wins over target on a gap, then the time stop).
pub struct BuyUptickPolicy {
    pub target_pct: f64,
    pub stop_pct: f64,
}

impl BuyUptickPolicy {
    pub fn new(target_pct: f64, stop_pct: f64) -> Self {
        Self {
            target_pct,
            stop_pct,
        }
    }
}

impl StrategyPolicy for BuyUptickPolicy {
    fn name(&self) -> &str {
        "buy-uptick"
    }

    fn evaluate_entry(&self, window: &[Candle]) -> Option<EntrySignal> {
        if window.len() < 2 {
            return None;
        }
        let close = window[window.len() - 1].close;
        let prev = window[window.len() - 2].close;
        if close > prev {
            return Some(EntrySignal {
                entry_price: close,
                stop_loss: close * (1.0 - self.stop_pct / 100.0),
                target: close * (1.0 + self.target_pct / 100.0),
                confidence: 1.0,
            });
        }
        None
    }

    fn evaluate_exit(
        &self,
        _position: &Position,
        _candle: &Candle,
        _indicators: &IndicatorView,
    ) -> Option<ExitSignal> {
        None
    }
}

#[derive(Default)]
pub struct MockDataPort {
    pub data: BTreeMap<String, AssetSeries>,
    pub errors: BTreeMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: AssetSeries) -> Self {
        self.data.insert(series.asset.clone(), series);
        self
    }

    pub fn with_error(mut self, asset: &str, reason: &str) -> Self {
        self.errors.insert(asset.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(&self, asset: &str) -> Result<AssetSeries, StratsimError> {
        if let Some(reason) = self.errors.get(asset) {
            return Err(StratsimError::Data {
                reason: reason.clone(),
            });
        }
        self.data
            .get(asset)
            .cloned()
            .ok_or_else(|| StratsimError::NoData {
                asset: asset.to_string(),
            })
    }

    fn list_assets(&self) -> Result<Vec<String>, StratsimError> {
        Ok(self.data.keys().cloned().collect())
    }

    fn data_range(
        &self,
        asset: &str,
    ) -> Result<Option<(chrono::NaiveDateTime, chrono::NaiveDateTime, usize)>, StratsimError> {
        match self.data.get(asset) {
            Some(series) if !series.is_empty() => {
                let first = series.candles.first().unwrap().time;
                let last = series.candles.last().unwrap().time;
                Ok(Some((first, last, series.len())))
            }
            _ => Ok(None),
        }
    }
}
