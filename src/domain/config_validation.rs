//! Configuration file validation.
//!
//! Checks every field read from a [`ConfigPort`] before a run starts, so a
//! bad value fails fast with the offending section and key instead of deep in
//! the pipeline.

use crate::domain::error::StratsimError;
use crate::domain::policy::PolicyKind;
use crate::domain::sizing::SizingMode;
use crate::ports::config_port::ConfigPort;

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    validate_initial_capital(config)?;
    validate_risk_fraction(config)?;
    validate_sizing_mode(config)?;
    validate_commissions(config)?;
    validate_warmup(config)?;
    validate_assets(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    validate_kind(config)?;
    validate_strategy_percents(config)?;
    validate_periods(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StratsimError {
    StratsimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    let value = config.get_double("simulation", "initial_capital", 0.0);
    if value <= 0.0 {
        return Err(invalid(
            "simulation",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_risk_fraction(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    let value = config.get_double("simulation", "risk_fraction", 0.02);
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(
            "simulation",
            "risk_fraction",
            "risk_fraction must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_sizing_mode(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    if let Some(raw) = config.get_string("simulation", "sizing_mode") {
        raw.parse::<SizingMode>()
            .map_err(|reason| invalid("simulation", "sizing_mode", reason))?;
    }
    Ok(())
}

fn validate_commissions(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    for key in ["entry_commission_rate", "exit_commission_rate"] {
        let value = config.get_double("simulation", key, 0.0);
        if !(0.0..1.0).contains(&value) {
            return Err(invalid("simulation", key, format!("{key} must be in [0, 1)")));
        }
    }
    Ok(())
}

fn validate_warmup(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    let warmup = config.get_int("simulation", "warmup_bars", 50);
    if warmup < 1 {
        return Err(invalid(
            "simulation",
            "warmup_bars",
            "warmup_bars must be at least 1",
        ));
    }
    let time_stop = config.get_int("simulation", "time_stop_bars", 0);
    if time_stop < 0 {
        return Err(invalid(
            "simulation",
            "time_stop_bars",
            "time_stop_bars must be non-negative",
        ));
    }
    Ok(())
}

fn validate_assets(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    match config.get_string("simulation", "assets") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(StratsimError::ConfigMissing {
            section: "simulation".to_string(),
            key: "assets".to_string(),
        }),
    }
}

fn validate_kind(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    match config.get_string("strategy", "kind") {
        None => Err(StratsimError::ConfigMissing {
            section: "strategy".to_string(),
            key: "kind".to_string(),
        }),
        Some(raw) => {
            raw.parse::<PolicyKind>()
                .map_err(|reason| invalid("strategy", "kind", reason))?;
            Ok(())
        }
    }
}

fn validate_strategy_percents(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    for (key, default) in [
        ("target_pct", 5.0),
        ("stop_pct", 3.0),
        ("panic_drop_pct", 8.0),
    ] {
        let value = config.get_double("strategy", key, default);
        if value <= 0.0 || value >= 100.0 {
            return Err(invalid(
                "strategy",
                key,
                format!("{key} must be between 0 and 100"),
            ));
        }
    }
    Ok(())
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    for (key, default) in [
        ("rsi_period", 14),
        ("ema_period", 20),
        ("bollinger_period", 20),
    ] {
        let value = config.get_int("strategy", key, default);
        if value < 1 {
            return Err(invalid(
                "strategy",
                key,
                format!("{key} must be at least 1"),
            ));
        }
    }
    Ok(())
}
