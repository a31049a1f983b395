//! Look-ahead contamination tests.
//!
//! Invariants:
//! - The indicator window is closed history followed by the in-progress bar,
//!   and never holds a price newer than the latest tick.
//! - A window indicator's value for bar t does not depend on bar t+1 or later.
//! - The PSAR state only ever sees closed bars.
//!
//! Method: run the same data truncated and in full and compare everything up
//! to the truncation point.

use chrono::{DateTime, Duration, TimeZone, Utc};
use squeezelab_core::domain::Bar;
use squeezelab_core::indicators::*;
use squeezelab_core::{InstrumentEngine, Signal, StrategyConfig, Tick};

fn session_open() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 21, 13, 30, 0).unwrap()
}

/// Deterministic pseudo-random walk using a simple LCG.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let mut price = 100.0;
    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            let change = ((seed % 200) as f64 - 100.0) * 0.05;
            price = f64::max(price + change, 10.0);
            let open = price - 0.5;
            let close = price + 0.3;
            Bar {
                start_time: session_open() + Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 2.0,
                low: open.min(close) - 2.0,
                close,
                volume: 1000 + i as u64 * 100,
            }
        })
        .collect()
}

/// Ticks that trace each bar's open, high, low and close in turn.
fn make_test_ticks(bars: &[Bar]) -> Vec<Tick> {
    bars.iter()
        .flat_map(|bar| {
            [bar.open, bar.high, bar.low, bar.close]
                .into_iter()
                .enumerate()
                .map(move |(k, price)| {
                    Tick::new("ES", price, 1, bar.start_time + Duration::seconds(60 * k as i64 + 5))
                })
        })
        .collect()
}

fn assert_no_lookahead<I>(indicator: &I, bars: &[Bar], truncated_len: usize)
where
    I: Indicator,
    I::Output: PartialEq + std::fmt::Debug,
{
    let mut altered = bars.to_vec();
    for bar in &mut altered[truncated_len..] {
        bar.close *= 3.0;
        bar.high *= 3.0;
    }
    assert_eq!(
        indicator.compute(&bars[..truncated_len]),
        indicator.compute(&altered[..truncated_len]),
        "{}: value depends on bars after the window",
        indicator.name()
    );
    for end in 1..=truncated_len {
        let value = indicator.compute(&bars[..end]);
        assert_eq!(value, indicator.compute(&altered[..end]), "{} at {end}", indicator.name());
    }
}

#[test]
fn window_indicators_ignore_future_bars() {
    let bars = make_test_bars(120);
    assert_no_lookahead(&Bollinger::new(18, 2.0), &bars, 60);
    assert_no_lookahead(&Keltner::new(18, 1.5), &bars, 60);
    assert_no_lookahead(&Atr::new(18), &bars, 60);
    assert_no_lookahead(&TtmMomentum::new(18), &bars, 60);
    assert_no_lookahead(&MacdHistogram::new(8, 17, 9), &bars, 60);
    assert_no_lookahead(&LowestLow::new(18), &bars, 60);
    assert_no_lookahead(&ParabolicSar::default_params(), &bars, 60);
}

#[test]
fn window_is_history_plus_partial_bar() {
    let bars = make_test_bars(30);
    let ticks = make_test_ticks(&bars);
    let mut engine = InstrumentEngine::new("ES", &StrategyConfig::default()).unwrap();

    for tick in &ticks {
        engine.on_tick(tick).unwrap();
        let agg = engine.aggregator();
        let window = agg.window();
        let newest = window.last().unwrap();

        assert_eq!(window.len(), agg.history().len() + 1);
        assert_eq!(newest.start_time, agg.boundary(tick.timestamp));
        assert_eq!(newest.close, tick.price);
        assert!(window.windows(2).all(|w| w[0].start_time < w[1].start_time));
        if let Some(snapshot) = engine.snapshot().filter(|_| engine.status().snapshot_fresh) {
            assert_eq!(snapshot.bar_time, newest.start_time);
            assert_eq!(snapshot.bars_used, window.len());
        }
    }
}

#[test]
fn psar_tracks_closed_bars_only() {
    let bars = make_test_bars(60);
    let ticks = make_test_ticks(&bars);
    let mut engine = InstrumentEngine::new("ES", &StrategyConfig::default()).unwrap();

    for tick in &ticks {
        engine.on_tick(tick).unwrap();
        let closed: Vec<Bar> = engine.aggregator().history().iter().cloned().collect();
        assert_eq!(
            engine.psar().value(),
            ParabolicSar::default_params().compute(&closed),
            "PSAR diverged from a replay over closed bars at {}",
            tick.timestamp
        );
    }
}

#[test]
fn signals_do_not_depend_on_future_ticks() {
    let bars = make_test_bars(80);
    let ticks = make_test_ticks(&bars);
    let cut = ticks.len() / 2;

    let run = |ticks: &[Tick]| -> (Vec<Signal>, Option<IndicatorSnapshot>) {
        let mut engine = InstrumentEngine::new("ES", &StrategyConfig::default()).unwrap();
        let signals = ticks
            .iter()
            .filter_map(|t| engine.on_tick(t).unwrap())
            .collect();
        (signals, engine.snapshot().cloned())
    };

    let (truncated_signals, truncated_snapshot) = run(&ticks[..cut]);
    let (full_signals, _) = run(&ticks);
    let full_prefix: Vec<Signal> = full_signals
        .into_iter()
        .filter(|s| s.timestamp <= ticks[cut - 1].timestamp)
        .collect();
    assert_eq!(truncated_signals, full_prefix);

    // Re-running the prefix reproduces the same snapshot.
    let (_, again) = run(&ticks[..cut]);
    assert_eq!(truncated_snapshot, again);
}
