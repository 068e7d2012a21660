//! Trailing-window indicator provider.
//!
//! Every function answers "what is the indicator value at the last candle of
//! this window" and returns `None` when the window is shorter than the
//! requested period. The engine treats `None` as "no signal this step", never
//! as an error.

use super::candle::Candle;

/// Simple moving average of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// EMA series seeded with the SMA of the first `period` values, then
/// v*k + prev*(1-k) with k = 2/(period+1). Returns one value per input
/// index starting at `period - 1`.
fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    out.push(ema);
    for &v in &values[period..] {
        ema = v * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}

/// Exponential moving average at the end of the window.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    ema_series(values, period).last().copied()
}

/// Wilder RSI at the end of the window. Needs `period + 1` values for the
/// first `period` price changes; avg_loss of zero maps to RSI 100.
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }

    let mut gains = Vec::with_capacity(values.len() - 1);
    let mut losses = Vec::with_capacity(values.len() - 1);
    for pair in values.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
}

/// Wilder ATR at the end of the window: true-range series seeded with a
/// simple average over the first `period` entries, then Wilder smoothing.
pub fn atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }

    let mut tr_values = Vec::with_capacity(candles.len());
    for (i, candle) in candles.iter().enumerate() {
        let tr = if i == 0 {
            candle.high - candle.low
        } else {
            candle.true_range(candles[i - 1].close)
        };
        tr_values.push(tr);
    }

    let mut atr = tr_values[..period].iter().sum::<f64>() / period as f64;
    for &tr in &tr_values[period..] {
        atr = (atr * (period - 1) as f64 + tr) / period as f64;
    }
    Some(atr)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bollinger {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bollinger bands over the last `period` values with `mult` standard
/// deviations (population) around the SMA.
pub fn bollinger(values: &[f64], period: usize, mult: f64) -> Option<Bollinger> {
    let middle = sma(values, period)?;
    let tail = &values[values.len() - period..];
    let variance = tail.iter().map(|v| (v - middle).powi(2)).sum::<f64>() / period as f64;
    let band = variance.sqrt() * mult;
    Some(Bollinger {
        upper: middle + band,
        middle,
        lower: middle - band,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD at the end of the window: EMA(fast) - EMA(slow), with the signal
/// line an EMA over the MACD line itself.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || signal == 0 || fast >= slow {
        return None;
    }
    let fast_series = ema_series(values, fast);
    let slow_series = ema_series(values, slow);
    if slow_series.is_empty() {
        return None;
    }

    // Both series cover the window tail; align on the slow one.
    let offset = slow - fast;
    let line: Vec<f64> = slow_series
        .iter()
        .enumerate()
        .map(|(i, s)| fast_series[i + offset] - s)
        .collect();

    let signal_value = ema_series(&line, signal).last().copied()?;
    let line_value = *line.last()?;
    Some(Macd {
        line: line_value,
        signal: signal_value,
        histogram: line_value - signal_value,
    })
}

/// Lazy indicator access over the trailing window the engine hands a policy.
/// Pure: computes from the window on demand, holds no run state.
pub struct IndicatorView<'a> {
    window: &'a [Candle],
    closes: Vec<f64>,
}

impl<'a> IndicatorView<'a> {
    pub fn new(window: &'a [Candle]) -> Self {
        let closes = window.iter().map(|c| c.close).collect();
        Self { window, closes }
    }

    pub fn close(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn prev_close(&self) -> Option<f64> {
        if self.closes.len() < 2 {
            return None;
        }
        Some(self.closes[self.closes.len() - 2])
    }

    pub fn sma(&self, period: usize) -> Option<f64> {
        sma(&self.closes, period)
    }

    pub fn ema(&self, period: usize) -> Option<f64> {
        ema(&self.closes, period)
    }

    pub fn rsi(&self, period: usize) -> Option<f64> {
        rsi(&self.closes, period)
    }

    pub fn atr(&self, period: usize) -> Option<f64> {
        atr(self.window, period)
    }

    pub fn bollinger(&self, period: usize, mult: f64) -> Option<Bollinger> {
        bollinger(&self.closes, period, mult)
    }

    pub fn macd(&self, fast: usize, slow: usize, signal: usize) -> Option<Macd> {
        macd(&self.closes, fast, slow, signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                time: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn sma_short_window_is_none() {
        assert!(sma(&[1.0, 2.0], 3).is_none());
        assert!(sma(&[1.0, 2.0, 3.0], 0).is_none());
    }

    #[test]
    fn sma_uses_tail() {
        let got = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_relative_eq!(got, 4.0);
    }

    #[test]
    fn ema_seed_is_sma() {
        // Exactly `period` values: EMA == seed SMA.
        let got = ema(&[10.0, 20.0, 30.0], 3).unwrap();
        assert_relative_eq!(got, 20.0);
    }

    #[test]
    fn ema_folds_forward() {
        // seed = 20, k = 0.5: 40*0.5 + 20*0.5 = 30
        let got = ema(&[10.0, 20.0, 30.0, 40.0], 3).unwrap();
        assert_relative_eq!(got, 30.0);
    }

    #[test]
    fn ema_short_window_is_none() {
        assert!(ema(&[10.0, 20.0], 3).is_none());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_relative_eq!(rsi(&values, 14).unwrap(), 100.0);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert_relative_eq!(rsi(&values, 14).unwrap(), 0.0);
    }

    #[test]
    fn rsi_balanced_is_50() {
        // Two unit gains and two unit losses inside the seed window: RSI 50.
        let values = [100.0, 101.0, 100.0, 101.0, 100.0];
        let got = rsi(&values, 4).unwrap();
        assert_relative_eq!(got, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn rsi_needs_period_plus_one() {
        let values = vec![1.0; 14];
        assert!(rsi(&values, 14).is_none());
        let values = vec![1.0; 15];
        assert!(rsi(&values, 14).is_some());
    }

    #[test]
    fn atr_flat_candles() {
        let candles: Vec<Candle> = (0..10)
            .map(|i| Candle {
                time: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i),
                open: 100.0,
                high: 110.0,
                low: 90.0,
                close: 100.0,
                volume: 1000.0,
            })
            .collect();
        assert_relative_eq!(atr(&candles, 5).unwrap(), 20.0);
    }

    #[test]
    fn atr_short_window_is_none() {
        let candles = make_candles(&[1.0, 2.0]);
        assert!(atr(&candles, 3).is_none());
    }

    #[test]
    fn bollinger_flat_series_collapses() {
        let bands = bollinger(&[100.0; 10], 5, 2.0).unwrap();
        assert_relative_eq!(bands.upper, 100.0);
        assert_relative_eq!(bands.middle, 100.0);
        assert_relative_eq!(bands.lower, 100.0);
    }

    #[test]
    fn bollinger_symmetric_bands() {
        let bands = bollinger(&[98.0, 102.0, 98.0, 102.0], 4, 2.0).unwrap();
        assert_relative_eq!(bands.middle, 100.0);
        assert_relative_eq!(bands.upper - bands.middle, bands.middle - bands.lower);
        assert_relative_eq!(bands.upper, 104.0);
    }

    #[test]
    fn macd_flat_series_is_zero() {
        let values = vec![100.0; 50];
        let m = macd(&values, 12, 26, 9).unwrap();
        assert_relative_eq!(m.line, 0.0);
        assert_relative_eq!(m.signal, 0.0);
        assert_relative_eq!(m.histogram, 0.0);
    }

    #[test]
    fn macd_rising_series_is_positive() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let m = macd(&values, 12, 26, 9).unwrap();
        assert!(m.line > 0.0);
    }

    #[test]
    fn macd_short_window_is_none() {
        let values = vec![100.0; 20];
        assert!(macd(&values, 12, 26, 9).is_none());
    }

    #[test]
    fn view_exposes_closes() {
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        let view = IndicatorView::new(&candles);
        assert_relative_eq!(view.close().unwrap(), 3.0);
        assert_relative_eq!(view.prev_close().unwrap(), 2.0);
        assert_relative_eq!(view.sma(3).unwrap(), 2.0);
    }

    #[test]
    fn view_on_empty_window() {
        let view = IndicatorView::new(&[]);
        assert!(view.close().is_none());
        assert!(view.prev_close().is_none());
        assert!(view.rsi(14).is_none());
    }
}
