//! Strategy policies: pure entry/exit decisions over a trailing window.
//!
//! Policies never mutate the window or any shared state; the clock stays
//! deterministic because everything a policy sees is an immutable snapshot.

use std::fmt;
use std::str::FromStr;

use super::candle::Candle;
use super::indicator::IndicatorView;
use super::position::{ExitReason, Position};

/// Entry decision produced by a policy.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySignal {
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target: f64,
    /// 0.0-1.0, reporting only.
    pub confidence: f64,
}

/// Exit decision: reason plus the price the fill is simulated at.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitSignal {
    pub reason: ExitReason,
    pub exit_price: f64,
}

/// Pluggable entry/exit policy. Both operations are pure; any caching an
/// implementation does must not leak between independent runs.
pub trait StrategyPolicy {
    fn name(&self) -> &str;

    /// `window` is the trailing candle slice ending at the current index,
    /// at least `warmup_bars` long.
    fn evaluate_entry(&self, window: &[Candle]) -> Option<EntrySignal>;

    /// Called every step while a position is open. Returning `None` defers
    /// to the engine's default bracket rule (see [`bracket_exit`]) and then
    /// the time stop; returning a signal overrides both.
    fn evaluate_exit(
        &self,
        position: &Position,
        candle: &Candle,
        indicators: &IndicatorView,
    ) -> Option<ExitSignal>;
}

/// Default bracket rule applied by the engine when a policy declines to
/// decide: if both levels are crossed within one candle (gap move) the stop
/// wins. Stops fill at the stop price, targets at the target price.
pub fn bracket_exit(position: &Position, candle: &Candle) -> Option<ExitSignal> {
    if position.stop_crossed(candle.low) {
        return Some(ExitSignal {
            reason: ExitReason::StopLoss,
            exit_price: position.stop_loss,
        });
    }
    if position.target_crossed(candle.high) {
        return Some(ExitSignal {
            reason: ExitReason::TargetHit,
            exit_price: position.target,
        });
    }
    None
}

/// Which reference policy variant to run. Variants share one code path and
/// one parameter set; the kind is configuration, not a separate strategy
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    MomentumBreakout,
    MeanReversion,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::MomentumBreakout => f.write_str("momentum-breakout"),
            PolicyKind::MeanReversion => f.write_str("mean-reversion"),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "momentum-breakout" => Ok(PolicyKind::MomentumBreakout),
            "mean-reversion" => Ok(PolicyKind::MeanReversion),
            other => Err(format!(
                "unknown strategy kind '{other}' (expected momentum-breakout or mean-reversion)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyParams {
    pub rsi_period: usize,
    pub ema_period: usize,
    pub bollinger_period: usize,
    pub bollinger_mult: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub target_pct: f64,
    pub stop_pct: f64,
    /// Single-candle open→close drop that forces a PANIC_EXIT, percent.
    pub panic_drop_pct: f64,
}

impl Default for PolicyParams {
    fn default() -> Self {
        PolicyParams {
            rsi_period: 14,
            ema_period: 20,
            bollinger_period: 20,
            bollinger_mult: 2.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            target_pct: 5.0,
            stop_pct: 3.0,
            panic_drop_pct: 8.0,
        }
    }
}

/// The two reference policies behind one implementation.
///
/// Both defer bracket exits to the engine default, so the conservative
/// stop-before-target gap rule applies; they add only the discretionary
/// reasons (trend invalidation, panic exit) on top.
#[derive(Debug, Clone)]
pub struct ReferencePolicy {
    kind: PolicyKind,
    params: PolicyParams,
    name: String,
}

impl ReferencePolicy {
    pub fn new(kind: PolicyKind, params: PolicyParams) -> Self {
        let name = kind.to_string();
        Self { kind, params, name }
    }

    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    pub fn params(&self) -> &PolicyParams {
        &self.params
    }

    fn signal_at(&self, close: f64, confidence: f64) -> EntrySignal {
        EntrySignal {
            entry_price: close,
            stop_loss: close * (1.0 - self.params.stop_pct / 100.0),
            target: close * (1.0 + self.params.target_pct / 100.0),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    fn momentum_entry(&self, view: &IndicatorView) -> Option<EntrySignal> {
        let close = view.close()?;
        let prev_close = view.prev_close()?;
        let ema = view.ema(self.params.ema_period)?;
        let rsi = view.rsi(self.params.rsi_period)?;

        if close > ema && close > prev_close && rsi > 50.0 && rsi < self.params.rsi_overbought {
            let confidence = (rsi - 50.0) / (self.params.rsi_overbought - 50.0);
            return Some(self.signal_at(close, confidence));
        }
        None
    }

    fn reversion_entry(&self, view: &IndicatorView) -> Option<EntrySignal> {
        let close = view.close()?;
        let rsi = view.rsi(self.params.rsi_period)?;
        let bands = view.bollinger(self.params.bollinger_period, self.params.bollinger_mult)?;

        if rsi < self.params.rsi_oversold && close < bands.lower {
            let confidence = (self.params.rsi_oversold - rsi) / self.params.rsi_oversold;
            return Some(self.signal_at(close, confidence));
        }
        None
    }
}

impl StrategyPolicy for ReferencePolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate_entry(&self, window: &[Candle]) -> Option<EntrySignal> {
        let view = IndicatorView::new(window);
        match self.kind {
            PolicyKind::MomentumBreakout => self.momentum_entry(&view),
            PolicyKind::MeanReversion => self.reversion_entry(&view),
        }
    }

    fn evaluate_exit(
        &self,
        position: &Position,
        candle: &Candle,
        indicators: &IndicatorView,
    ) -> Option<ExitSignal> {
        // Either bracket level crossed: let the engine's stop-first rule decide.
        if position.stop_crossed(candle.low) || position.target_crossed(candle.high) {
            return None;
        }

        if candle.open > 0.0 {
            let drop_pct = (candle.open - candle.close) / candle.open * 100.0;
            if drop_pct >= self.params.panic_drop_pct {
                return Some(ExitSignal {
                    reason: ExitReason::PanicExit,
                    exit_price: candle.close,
                });
            }
        }

        match self.kind {
            PolicyKind::MomentumBreakout => {
                let ema = indicators.ema(self.params.ema_period)?;
                if candle.close < ema {
                    return Some(ExitSignal {
                        reason: ExitReason::TrendInvalidation,
                        exit_price: candle.close,
                    });
                }
                None
            }
            PolicyKind::MeanReversion => {
                let rsi = indicators.rsi(self.params.rsi_period)?;
                if rsi > self.params.rsi_overbought {
                    return Some(ExitSignal {
                        reason: ExitReason::TrendInvalidation,
                        exit_price: candle.close,
                    });
                }
                None
            }
        }
    }
}
