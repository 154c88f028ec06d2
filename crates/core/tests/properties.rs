//! Property tests for the engine's risk and decision invariants.

use aitrader_core::analytics::{self, indicators};
use aitrader_core::decision::{self, Classification};
use aitrader_core::domain::price::PriceSeries;
use aitrader_core::domain::recommendation::{CompositeScores, Decision, Evaluation};
use aitrader_core::domain::signals::AuxiliarySignals;
use aitrader_core::engine::{evaluate_series, EngineConfig};
use aitrader_core::risk;
use aitrader_core::scoring;
use chrono::NaiveDate;
use proptest::prelude::*;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn arb_closes(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, min..max)
}

fn arb_scores() -> impl Strategy<Value = CompositeScores> {
    (0..120i32, 0..120i32, 30..=98i32, prop::option::of(-50.0..150.0_f64)).prop_map(
        |(ensemble_score, momentum_score, sentiment_score, swing_score)| CompositeScores {
            ensemble_score,
            momentum_score,
            sentiment_score,
            swing_score,
        },
    )
}

proptest! {
    #[test]
    fn stop_loss_stays_within_bounds(vol in prop::num::f64::ANY) {
        let cfg = EngineConfig::default();
        let sl = risk::stop_loss_percent(vol, &cfg);
        prop_assert!(sl >= cfg.stop_loss_min && sl <= cfg.stop_loss_max, "{sl}");
    }

    #[test]
    fn stop_loss_is_monotonic_in_volatility(a in 0.0..100.0_f64, b in 0.0..100.0_f64) {
        let cfg = EngineConfig::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(risk::stop_loss_percent(lo, &cfg) <= risk::stop_loss_percent(hi, &cfg));
    }

    #[test]
    fn take_profit_is_exact_multiple(vol in 0.0..50.0_f64, price in 1.0..5000.0_f64) {
        let cfg = EngineConfig::default();
        let levels = risk::levels_for(price, vol, &cfg);
        prop_assert_eq!(levels.take_profit_percent, levels.stop_loss_percent * cfg.reward_ratio);
        prop_assert!(levels.stop_loss_price < price);
        prop_assert!(levels.take_profit_price > price);
    }

    #[test]
    fn volatility_is_non_negative(closes in arb_closes(14, 120)) {
        let v = indicators::return_volatility_percent(&closes, 14).unwrap();
        prop_assert!(v >= 0.0);
    }

    #[test]
    fn rsi_is_bounded(closes in arb_closes(14, 120)) {
        let v = indicators::rsi(&closes, 14).unwrap();
        prop_assert!((0.0..=100.0).contains(&v), "{v}");
    }

    #[test]
    fn ensemble_score_is_deterministic(closes in arb_closes(2, 60)) {
        let cfg = EngineConfig::default();
        let series = PriceSeries::from_closes("PROP", start(), &closes).unwrap();
        let snapshot = analytics::analyze(&series, &cfg).unwrap();
        prop_assert_eq!(
            scoring::ensemble_score(&snapshot, &cfg),
            scoring::ensemble_score(&snapshot.clone(), &cfg)
        );
    }

    #[test]
    fn earnings_urgency_always_avoids(scores in arb_scores()) {
        let cfg = EngineConfig::default();
        match decision::classify(Some(&scores), true, &cfg) {
            Classification::Decided { decision, .. } => prop_assert_eq!(decision, Decision::Avoid),
            Classification::InsufficientData => prop_assert!(false, "scores were present"),
        }
    }

    #[test]
    fn buy_requires_swing_confirmation(scores in arb_scores()) {
        let cfg = EngineConfig::default();
        if let Classification::Decided { decision: Decision::Buy, .. } =
            decision::classify(Some(&scores), false, &cfg)
        {
            prop_assert!(scores.swing_score.is_some_and(|s| s > cfg.swing_threshold));
            prop_assert!(decision::is_bullish(&scores, &cfg));
        }
    }

    #[test]
    fn series_without_volatility_never_buys(closes in arb_closes(2, 14), sentiment in 30..=98i32) {
        let series = PriceSeries::from_closes("PROP", start(), &closes).unwrap();
        let signals = AuxiliarySignals {
            sentiment_score: Some(sentiment),
            ..AuxiliarySignals::default()
        };
        let cfg = EngineConfig::default();
        let eval = evaluate_series(&series, signals, &cfg);
        let rec = eval.recommendation().unwrap();
        prop_assert_ne!(rec.decision, Decision::Buy);
        prop_assert_eq!(rec.risk.stop_loss_percent, cfg.stop_loss_max);
    }

    #[test]
    fn urgent_series_never_buys(closes in arb_closes(2, 60), sentiment in 30..=98i32) {
        let series = PriceSeries::from_closes("PROP", start(), &closes).unwrap();
        let signals = AuxiliarySignals {
            sentiment_score: Some(sentiment),
            earnings_date_text: Some("2025-06-03".to_string()),
            earnings_urgent: true,
        };
        let eval = evaluate_series(&series, signals, &EngineConfig::default());
        prop_assert_eq!(eval.decision(), Some(Decision::Avoid));
    }
}

#[test]
fn one_bar_never_yields_a_decision() {
    let series = PriceSeries::from_closes("ONE", start(), &[42.0]).unwrap();
    let eval = evaluate_series(&series, AuxiliarySignals::unavailable(), &EngineConfig::default());
    assert!(matches!(eval, Evaluation::Unavailable(_)));
    assert!(eval.decision().is_none());
}
