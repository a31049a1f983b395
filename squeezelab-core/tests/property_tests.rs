//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Bar bounds: high/low bound every price folded in, close is the last price
//! 2. History: never exceeds capacity, evicts oldest first
//! 3. Squeeze: equals strict band containment, snapshots are deterministic
//! 4. Entries: bar times strictly increase across entries
//! 5. Ratchet monotonicity: a trailing stop never falls

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use squeezelab_core::bars::{BarAggregator, BarHistory};
use squeezelab_core::indicators::IndicatorSet;
use squeezelab_core::{Bar, InstrumentEngine, StrategyConfig, Tick};

fn session_open() -> DateTime<Utc> {
    // Monday 2024-10-21 09:30 New York
    Utc.with_ymd_and_hms(2024, 10, 21, 13, 30, 0).unwrap()
}

/// Short windows and one-minute bars so a few hundred ticks exercise
/// every branch of the state machine.
fn fast_config() -> StrategyConfig {
    StrategyConfig {
        symbols: vec!["ES".into()],
        bar_interval_minutes: 1,
        history_capacity: 30,
        bb_length: 6,
        kc_length: 6,
        kc_mom_length: 6,
        macd_fast: 3,
        macd_slow: 6,
        macd_signal: 3,
        stop_loss_length: 6,
        ..StrategyConfig::default()
    }
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (50.0..150.0_f64).prop_map(|p| (p * 4.0).round() / 4.0)
}

/// Random walk of (price, seconds since previous tick).
fn arb_tick_path(max_len: usize) -> impl Strategy<Value = Vec<(f64, i64)>> {
    prop::collection::vec((-1.5..1.5_f64, 1..45_i64), 20..max_len).prop_map(|steps| {
        let mut price = 100.0_f64;
        steps
            .into_iter()
            .map(|(change, gap)| {
                price = (price + change).max(1.0);
                ((price * 4.0).round() / 4.0, gap)
            })
            .collect()
    })
}

fn arb_bars(min: usize, max: usize) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((arb_price(), 0.0..3.0_f64, 0.0..3.0_f64, 0.0..1.0_f64), min..max)
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (open, up, down, frac))| {
                    let high = open + up;
                    let low = open - down;
                    Bar {
                        start_time: session_open() + Duration::minutes(i as i64),
                        open,
                        high,
                        low,
                        close: low + (high - low) * frac,
                        volume: 10,
                    }
                })
                .collect()
        })
}

fn ticks_from_path(path: &[(f64, i64)]) -> Vec<Tick> {
    let mut ts = session_open();
    path.iter()
        .map(|&(price, gap)| {
            ts += Duration::seconds(gap);
            Tick::new("ES", price, 1, ts)
        })
        .collect()
}

// ── 1. Bar bounds ────────────────────────────────────────────────────

proptest! {
    /// Within one interval the bar's range covers every price and the close
    /// is the latest price.
    #[test]
    fn bar_bounds_every_tick(prices in prop::collection::vec(arb_price(), 1..60)) {
        let mut agg = BarAggregator::new("ES", 300, 10);
        for (i, &price) in prices.iter().enumerate() {
            let ts = session_open() + Duration::seconds(i as i64 * 4);
            prop_assert!(agg.on_tick(&Tick::new("ES", price, 1, ts)).unwrap().is_none());

            let bar = agg.current().unwrap();
            let seen = &prices[..=i];
            prop_assert!(seen.iter().all(|&p| bar.low <= p && p <= bar.high));
            prop_assert_eq!(bar.close, price);
            prop_assert_eq!(bar.open, prices[0]);
            prop_assert_eq!(bar.volume, i as u64 + 1);
        }
    }
}

// ── 2. History ───────────────────────────────────────────────────────

proptest! {
    /// Length is min(pushed, capacity) and the survivors are the newest bars
    /// in arrival order.
    #[test]
    fn history_bounded_fifo(capacity in 1usize..20, pushed in 0usize..60) {
        let mut history = BarHistory::new(capacity);
        for i in 0..pushed {
            let bar = Bar::open_at(session_open() + Duration::minutes(i as i64), 100.0 + i as f64, 1);
            let evicted = history.push(bar);
            prop_assert_eq!(evicted.is_some(), i >= capacity);
            prop_assert!(history.len() <= capacity);
        }
        prop_assert_eq!(history.len(), pushed.min(capacity));
        let first_kept = pushed.saturating_sub(capacity);
        for (offset, bar) in history.iter().enumerate() {
            prop_assert_eq!(bar.open, 100.0 + (first_kept + offset) as f64);
        }
    }
}

// ── 3. Squeeze ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn squeeze_is_strict_containment(bars in arb_bars(18, 60)) {
        let set = IndicatorSet::from_config(&StrategyConfig::default());
        let snap = set.compute(&bars, None, None).unwrap();
        let expected = snap.bollinger.upper < snap.keltner.upper
            && snap.bollinger.lower > snap.keltner.lower;
        prop_assert_eq!(snap.squeeze, expected);
        prop_assert_eq!(snap.bars_used, bars.len());
    }

    #[test]
    fn snapshot_deterministic(bars in arb_bars(18, 60), psar in prop::option::of(arb_price())) {
        let set = IndicatorSet::from_config(&StrategyConfig::default());
        let previous = set.compute(&bars[..bars.len() - 1], None, None);
        let a = set.compute(&bars, previous.as_ref(), psar);
        let b = set.compute(&bars, previous.as_ref(), psar);
        prop_assert_eq!(a, b);
    }
}

// ── 4. Entries ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Entries never repeat a bar and never go back in time, with exits
    /// interleaved.
    #[test]
    fn entry_bar_times_strictly_increase(path in arb_tick_path(400)) {
        let mut engine = InstrumentEngine::new("ES", &fast_config()).unwrap();
        let mut last_entry: Option<DateTime<Utc>> = None;
        for tick in ticks_from_path(&path) {
            if let Some(signal) = engine.on_tick(&tick).unwrap() {
                if signal.is_entry() {
                    if let Some(prev) = last_entry {
                        prop_assert!(signal.bar_time > prev);
                    }
                    last_entry = Some(signal.bar_time);
                }
            }
        }
    }

    /// Once trailing, the stop of an open position only rises.
    #[test]
    fn trailing_stop_monotonic(path in arb_tick_path(400)) {
        let mut engine = InstrumentEngine::new("ES", &fast_config()).unwrap();
        let mut trailing_stop: Option<f64> = None;
        for tick in ticks_from_path(&path) {
            let signal = engine.on_tick(&tick).unwrap();
            let position = engine.machine().position();
            if signal.as_ref().is_some_and(|s| s.is_exit()) || !position.is_trailing() {
                trailing_stop = None;
                continue;
            }
            let stop = position.stop_price().unwrap();
            if let Some(prev) = trailing_stop {
                prop_assert!(stop >= prev, "stop fell from {prev} to {stop}");
            }
            trailing_stop = Some(stop);
        }
    }
}
