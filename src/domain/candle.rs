//! Candle and per-asset price series.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Named, ordered candle sequence for one instrument. Read-only during a run.
#[derive(Debug, Clone)]
pub struct AssetSeries {
    pub asset: String,
    pub candles: Vec<Candle>,
}

impl AssetSeries {
    pub fn new(asset: impl Into<String>, candles: Vec<Candle>) -> Self {
        Self {
            asset: asset.into(),
            candles,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Trailing slice ending at `index`, or `None` while the series has not
    /// yet accumulated `warmup` candles at that index.
    pub fn window(&self, index: usize, warmup: usize) -> Option<&[Candle]> {
        if index >= self.candles.len() || index + 1 < warmup {
            return None;
        }
        Some(&self.candles[..=index])
    }
}
