//! Simulation run configuration.

use super::error::StratsimError;
use super::sizing::SizingMode;

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub initial_capital: f64,
    /// Fraction of free capital risked per trade, 0-1.
    pub risk_fraction: f64,
    pub sizing_mode: SizingMode,
    pub entry_commission_rate: f64,
    pub exit_commission_rate: f64,
    /// Minimum trailing window before any signal is evaluated.
    pub warmup_bars: usize,
    /// Bars an open position may be held before a TIME_STOP exit; 0 disables.
    pub time_stop_bars: usize,
    /// Free capital at or below this level stops new entries.
    pub min_trade_capital: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            initial_capital: 100_000.0,
            risk_fraction: 0.02,
            sizing_mode: SizingMode::FixedFraction,
            entry_commission_rate: 0.001,
            exit_commission_rate: 0.001,
            warmup_bars: 50,
            time_stop_bars: 0,
            min_trade_capital: 100.0,
        }
    }
}

impl SimConfig {
    /// Fatal checks, applied before a run starts.
    pub fn validate(&self) -> Result<(), StratsimError> {
        if self.initial_capital <= 0.0 {
            return Err(invalid("initial_capital", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.risk_fraction) {
            return Err(invalid("risk_fraction", "must be between 0 and 1"));
        }
        if !(0.0..1.0).contains(&self.entry_commission_rate) {
            return Err(invalid("entry_commission_rate", "must be in [0, 1)"));
        }
        if !(0.0..1.0).contains(&self.exit_commission_rate) {
            return Err(invalid("exit_commission_rate", "must be in [0, 1)"));
        }
        if self.warmup_bars == 0 {
            return Err(invalid("warmup_bars", "must be at least 1"));
        }
        if self.min_trade_capital < 0.0 {
            return Err(invalid("min_trade_capital", "must be non-negative"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> StratsimError {
    StratsimError::ConfigInvalid {
        section: "simulation".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
