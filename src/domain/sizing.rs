//! Risk-budget position sizing.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizingMode {
    /// Risked amount is a fraction of free capital: qty = capital*fraction / entry.
    FixedFraction,
    /// Risked amount is a fraction of capital regardless of stop width:
    /// qty = capital*fraction / |entry - stop|.
    RiskParity,
}

impl fmt::Display for SizingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingMode::FixedFraction => f.write_str("fixed-fraction"),
            SizingMode::RiskParity => f.write_str("risk-parity"),
        }
    }
}

impl FromStr for SizingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed-fraction" => Ok(SizingMode::FixedFraction),
            "risk-parity" => Ok(SizingMode::RiskParity),
            other => Err(format!(
                "unknown sizing mode '{other}' (expected fixed-fraction or risk-parity)"
            )),
        }
    }
}

/// Translate a risk budget into a trade quantity.
///
/// Returns 0.0 (no trade) when the entry price is not positive, free capital
/// is at or below `min_trade_capital`, or the stop distance is zero.
pub fn size(
    mode: SizingMode,
    free_capital: f64,
    risk_fraction: f64,
    entry_price: f64,
    stop_price: f64,
    min_trade_capital: f64,
) -> f64 {
    if entry_price <= 0.0 || free_capital <= min_trade_capital {
        return 0.0;
    }
    let stop_distance = (entry_price - stop_price).abs();
    if stop_distance == 0.0 {
        return 0.0;
    }

    let budget = free_capital * risk_fraction;
    match mode {
        SizingMode::FixedFraction => budget / entry_price,
        SizingMode::RiskParity => budget / stop_distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_fraction_reference_quantity() {
        // (50000 * 0.01) / 100 = 5
        let qty = size(SizingMode::FixedFraction, 50_000.0, 0.01, 100.0, 98.0, 100.0);
        assert!((qty - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn risk_parity_reference_quantity() {
        // (50000 * 0.01) / |100 - 98| = 250
        let qty = size(SizingMode::RiskParity, 50_000.0, 0.01, 100.0, 98.0, 100.0);
        assert!((qty - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_non_positive_entry() {
        let qty = size(SizingMode::FixedFraction, 50_000.0, 0.01, 0.0, 98.0, 100.0);
        assert_eq!(qty, 0.0);
        let qty = size(SizingMode::RiskParity, 50_000.0, 0.01, -1.0, 98.0, 100.0);
        assert_eq!(qty, 0.0);
    }

    #[test]
    fn rejects_capital_at_or_below_minimum() {
        let qty = size(SizingMode::FixedFraction, 100.0, 0.01, 100.0, 98.0, 100.0);
        assert_eq!(qty, 0.0);
        let qty = size(SizingMode::FixedFraction, 99.0, 0.01, 100.0, 98.0, 100.0);
        assert_eq!(qty, 0.0);
    }

    #[test]
    fn rejects_zero_stop_distance_in_both_modes() {
        let qty = size(SizingMode::RiskParity, 50_000.0, 0.01, 100.0, 100.0, 100.0);
        assert_eq!(qty, 0.0);
        let qty = size(SizingMode::FixedFraction, 50_000.0, 0.01, 100.0, 100.0, 100.0);
        assert_eq!(qty, 0.0);
    }

    #[test]
    fn fixed_fraction_ignores_stop_distance() {
        let narrow = size(SizingMode::FixedFraction, 50_000.0, 0.01, 100.0, 99.9, 100.0);
        let wide = size(SizingMode::FixedFraction, 50_000.0, 0.01, 100.0, 50.0, 100.0);
        assert!((narrow - wide).abs() < f64::EPSILON);
    }

    #[test]
    fn risk_parity_shrinks_with_wider_stops() {
        let narrow = size(SizingMode::RiskParity, 50_000.0, 0.01, 100.0, 99.0, 100.0);
        let wide = size(SizingMode::RiskParity, 50_000.0, 0.01, 100.0, 90.0, 100.0);
        assert!(narrow > wide);
    }

    #[test]
    fn sizing_mode_parse() {
        assert_eq!(
            "fixed-fraction".parse::<SizingMode>().unwrap(),
            SizingMode::FixedFraction
        );
        assert_eq!(
            " Risk-Parity ".parse::<SizingMode>().unwrap(),
            SizingMode::RiskParity
        );
        assert!("martingale".parse::<SizingMode>().is_err());
    }
}
