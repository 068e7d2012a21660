//! Simulation clock: advances a shared time index across all asset series in
//! lockstep and orchestrates policy, sizer, ledger and metrics per step.

use std::collections::BTreeMap;

use super::candle::{AssetSeries, Candle};
use super::config::SimConfig;
use super::error::StratsimError;
use super::indicator::IndicatorView;
use super::ledger::Ledger;
use super::policy::{StrategyPolicy, ExitSignal, bracket_exit};
use super::position::{ExitReason, Position};
use super::report::{MetricsCollector, Report};
use super::sizing;

/// Run one simulation to completion.
///
/// Assets are processed in name order at every index, so the caller's series
/// ordering cannot change the report. Series shorter than the current index
/// are skipped (padded by omission); indices below `warmup_bars` only seed
/// indicator windows. All-empty input yields an empty report, not an error.
pub fn run(
    series: &[AssetSeries],
    policy: &dyn StrategyPolicy,
    config: &SimConfig,
    categorize: &dyn Fn(&str) -> String,
) -> Result<Report, StratsimError> {
    config.validate()?;

    let mut ordered: Vec<&AssetSeries> = series.iter().collect();
    ordered.sort_by(|a, b| a.asset.cmp(&b.asset));
    for pair in ordered.windows(2) {
        if pair[0].asset == pair[1].asset {
            return Err(StratsimError::DuplicateAsset {
                asset: pair[0].asset.clone(),
            });
        }
    }

    let max_len = ordered.iter().map(|s| s.len()).max().unwrap_or(0);

    let mut ledger = Ledger::new(
        config.initial_capital,
        config.entry_commission_rate,
        config.exit_commission_rate,
    );
    let mut collector = MetricsCollector::new();
    let mut last_prices: BTreeMap<String, f64> = BTreeMap::new();

    for index in 0..max_len {
        for s in &ordered {
            let Some(candle) = s.candles.get(index) else {
                continue;
            };
            last_prices.insert(s.asset.clone(), candle.close);

            let Some(window) = s.window(index, config.warmup_bars) else {
                continue;
            };

            if ledger.has_position(&s.asset) {
                ledger.touch(&s.asset, candle);
                let view = IndicatorView::new(window);
                let decision = ledger
                    .position(&s.asset)
                    .and_then(|position| decide_exit(policy, position, candle, &view, config));
                if let Some(exit) = decision {
                    let category = categorize(&s.asset);
                    // Rejection is impossible here, but the ledger records it
                    // as a skipped action either way.
                    let _ = ledger.close(&s.asset, exit.exit_price, exit.reason, index, category);
                }
            } else if let Some(signal) = policy.evaluate_entry(window) {
                let quantity = sizing::size(
                    config.sizing_mode,
                    ledger.free_capital(),
                    config.risk_fraction,
                    signal.entry_price,
                    signal.stop_loss,
                    config.min_trade_capital,
                );
                // Undersized or unaffordable entries become skipped actions.
                let _ = ledger.open(&s.asset, &signal, quantity, index);
            }
        }

        collector.observe(index, ledger.mark_to_market(&last_prices));
    }

    Ok(collector.finish(ledger))
}

/// Exit decision order: the policy first (it may override with its own
/// reason), then the default bracket rule (stop wins over target on a gap),
/// then the time stop.
fn decide_exit(
    policy: &dyn StrategyPolicy,
    position: &Position,
    candle: &Candle,
    view: &IndicatorView,
    config: &SimConfig,
) -> Option<ExitSignal> {
    if let Some(signal) = policy.evaluate_exit(position, candle, view) {
        return Some(signal);
    }
    if let Some(signal) = bracket_exit(position, candle) {
        return Some(signal);
    }
    if config.time_stop_bars > 0 && position.hold_duration >= config.time_stop_bars {
        return Some(ExitSignal {
            reason: ExitReason::TimeStop,
            exit_price: candle.close,
        });
    }
    None
}
