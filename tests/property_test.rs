//! Engine invariants over generated random-walk series.

mod common;

use common::*;
use proptest::prelude::*;
use stratsim::domain::simulation::run;

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-3.0f64..3.0, 10..60).prop_map(|steps| {
        let mut price = 100.0;
        let mut closes = Vec::with_capacity(steps.len());
        for step in steps {
            price = (price + step).max(5.0);
            closes.push(price);
        }
        closes
    })
}

proptest! {
    #[test]
    fn reports_are_idempotent(closes in arb_closes()) {
        let series = vec![series_from_closes("BTC", &closes)];
        let policy = BuyUptickPolicy::new(2.0, 2.0);
        let config = sample_config();

        let first = run(&series, &policy, &config, &identity).unwrap();
        let second = run(&series, &policy, &config, &identity).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn drawdown_is_tight_for_any_walk(closes in arb_closes()) {
        let series = vec![series_from_closes("BTC", &closes)];
        let policy = BuyUptickPolicy::new(3.0, 3.0);
        let config = sample_config();

        let report = run(&series, &policy, &config, &identity).unwrap();

        let mut peak = 0.0_f64;
        let mut max_dd = 0.0_f64;
        for point in &report.equity_curve {
            if point.equity > peak {
                peak = point.equity;
            } else if peak > 0.0 {
                let dd = (peak - point.equity) / peak;
                if dd > max_dd {
                    max_dd = dd;
                }
            }
        }
        prop_assert!((report.max_drawdown_percent - max_dd * 100.0).abs() < 1e-12);
    }

    #[test]
    fn trade_log_obeys_pnl_formula(closes in arb_closes()) {
        let series = vec![series_from_closes("BTC", &closes)];
        let policy = BuyUptickPolicy::new(2.0, 2.0);
        let config = sample_config();

        let report = run(&series, &policy, &config, &identity).unwrap();

        for trade in &report.trade_log {
            let expected = (trade.exit_price - trade.entry_price) / trade.entry_price * 100.0;
            prop_assert_eq!(trade.pnl_percent, expected);
            prop_assert!(trade.quantity > 0.0);
        }
    }

    #[test]
    fn aggregate_stats_stay_in_bounds(closes in arb_closes()) {
        let series = vec![series_from_closes("BTC", &closes)];
        let policy = BuyUptickPolicy::new(2.0, 2.0);
        let config = sample_config();

        let report = run(&series, &policy, &config, &identity).unwrap();

        prop_assert!(report.win_rate >= 0.0 && report.win_rate <= 1.0);
        prop_assert!(report.wins <= report.trades);
        prop_assert!(report.max_drawdown_percent >= 0.0);
        prop_assert!(report.final_capital.is_finite());

        let last_equity = report
            .equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(config.initial_capital);
        prop_assert!((report.final_capital - last_equity).abs() < 1e-12);

        let expected_roi =
            (report.final_capital - config.initial_capital) / config.initial_capital * 100.0;
        prop_assert!((report.roi - expected_roi).abs() < 1e-9);
    }
}
