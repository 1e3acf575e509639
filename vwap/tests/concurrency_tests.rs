use std::sync::{Arc, Barrier};
use std::thread;

use vwap::{CollectingSink, EngineConfig, FailurePolicy, RawTradeRecord, VwapEngine};

fn batch(rows: &[[&str; 4]]) -> Vec<RawTradeRecord> {
    rows.iter().map(|r| RawTradeRecord::from(*r)).collect()
}

#[test]
fn ten_thousand_trades_from_ten_threads() {
    let engine = Arc::new(VwapEngine::new(EngineConfig::default()));
    let chunk = vec![RawTradeRecord::from(["9:31 AM", "EUR/USD", "1.1000", "100"]); 1_000];

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let chunk = chunk.clone();
            thread::spawn(move || engine.submit(&chunk).unwrap())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap().accepted, 1_000);
    }

    let buckets = engine.buckets();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].display_key(), "EUR/USD 9:00 AM");
    assert_eq!(buckets[0].total_volume, 10_000 * 100);
    assert_eq!(buckets[0].trade_count, 10_000);
    assert!((buckets[0].vwap - 1.1).abs() < 1e-9);
}

#[test]
fn concurrent_batches_for_two_instruments() {
    let engine = VwapEngine::new(EngineConfig::default());

    let eur_a = batch(&[
        ["9:31 AM", "EUR/USD", "1.1000", "100"],
        ["9:32 AM", "EUR/USD", "1.1001", "200"],
    ]);
    let gbp = batch(&[
        ["9:31 AM", "GBP/USD", "1.3000", "100"],
        ["9:32 AM", "GBP/USD", "1.3001", "200"],
    ]);
    let eur_b = batch(&[
        ["9:31 AM", "EUR/USD", "1.1002", "100"],
        ["9:32 AM", "EUR/USD", "1.1003", "200"],
    ]);

    thread::scope(|s| {
        for b in [&eur_a, &gbp, &eur_b] {
            let engine = &engine;
            s.spawn(move || engine.submit(b).unwrap());
        }
    });

    let eur = (1.1000 * 100.0 + 1.1001 * 200.0 + 1.1002 * 100.0 + 1.1003 * 200.0) / 600.0;
    let gbp_vwap = (1.3000 * 100.0 + 1.3001 * 200.0) / 300.0;

    assert!((engine.lookup("EUR/USD", "9:00 AM").unwrap() - eur).abs() < 1e-5);
    assert!((engine.lookup("GBP/USD", "9:00 AM").unwrap() - gbp_vwap).abs() < 1e-5);
    assert!((engine.lookup("EUR/USD", "9:00 AM").unwrap() - 1.10016).abs() < 1e-5);
    assert_eq!(engine.bucket_count(), 2);
}

#[test]
fn same_batch_from_ten_threads() {
    let engine = VwapEngine::new(EngineConfig::default());
    let trades = batch(&[
        ["9:31 AM", "EUR/USD", "1.1000", "100"],
        ["9:32 AM", "EUR/USD", "1.1001", "200"],
        ["9:33 AM", "EUR/USD", "1.1002", "300"],
        ["9:34 AM", "EUR/USD", "1.1003", "400"],
        ["9:35 AM", "EUR/USD", "1.1004", "500"],
    ]);

    thread::scope(|s| {
        for _ in 0..10 {
            s.spawn(|| engine.submit(&trades).unwrap());
        }
    });

    assert_eq!(engine.snapshot().len(), 1);
    assert!((engine.lookup("EUR/USD", "9:00 AM").unwrap() - 1.1002667).abs() < 1e-4);
    assert_eq!(engine.buckets()[0].total_volume, 10 * 1_500);
}

#[test]
fn concurrent_equals_sequential() {
    let hours = ["9", "10", "11", "12", "1", "2"];
    let instruments = ["EUR/USD", "USD/JPY", "GBP/USD"];

    let batches: Vec<Vec<RawTradeRecord>> = (0..24)
        .map(|i| {
            (0..200)
                .map(|j| {
                    let hour = hours[(i + j) % hours.len()];
                    let marker = if j % 2 == 0 { "AM" } else { "PM" };
                    RawTradeRecord::new(vec![
                        format!("{hour}:{:02} {marker}", (i * 7 + j) % 60),
                        instruments[j % instruments.len()].to_string(),
                        format!("{}.{:03}", 1 + j % 5, (i * 13 + j) % 1000),
                        (1 + (i * j) % 997).to_string(),
                    ])
                })
                .collect()
        })
        .collect();

    let sequential = VwapEngine::new(EngineConfig::default());
    for b in &batches {
        sequential.submit(b).unwrap();
    }

    let concurrent = VwapEngine::new(EngineConfig::default());
    let barrier = Barrier::new(batches.len());
    thread::scope(|s| {
        for b in &batches {
            let (engine, barrier) = (&concurrent, &barrier);
            s.spawn(move || {
                barrier.wait();
                engine.submit(b).unwrap();
            });
        }
    });

    let seq = sequential.buckets();
    let con = concurrent.buckets();
    assert_eq!(seq.len(), con.len());
    for (a, b) in seq.iter().zip(&con) {
        assert_eq!(a.display_key(), b.display_key());
        assert_eq!(a.total_volume, b.total_volume);
        assert_eq!(a.trade_count, b.trade_count);
        assert!((a.vwap - b.vwap).abs() < 1e-9, "{}: {} vs {}", a.display_key(), a.vwap, b.vwap);
    }
}

#[test]
fn first_touch_of_many_new_buckets_under_contention() {
    let engine = VwapEngine::new(EngineConfig::default());
    let threads = 12;
    let barrier = Barrier::new(threads);

    // every thread hits the same 24 fresh buckets in the same order
    let rows: Vec<RawTradeRecord> = (1..=12)
        .flat_map(|h| {
            ["AM", "PM"].map(|m| RawTradeRecord::new(vec![
                format!("{h}:30 {m}"),
                "USD/CHF".into(),
                "0.9".into(),
                "3".into(),
            ]))
        })
        .collect();

    thread::scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                barrier.wait();
                engine.submit(&rows).unwrap();
            });
        }
    });

    let buckets = engine.buckets();
    assert_eq!(buckets.len(), 24);
    for b in buckets {
        assert_eq!(b.trade_count, threads as u64, "{}", b.display_key());
        assert_eq!(b.total_volume, 3 * threads as u64);
    }
}

#[test]
fn concurrent_lenient_rejections_never_touch_buckets() {
    let sink = Arc::new(CollectingSink::new());
    let engine = VwapEngine::with_sink(
        EngineConfig::default().with_failure_policy(FailurePolicy::Lenient),
        sink.clone(),
    );
    let rows = batch(&[
        ["9:31 AM", "EUR/USD", "1.1", "10"],
        ["9:31 AM", "EUR/USD", "0", "10"],
        ["9:31 AM", "EUR/USD", "1.1", "-3"],
        ["9:31 AM", "XAU/USD", "2000", "1"],
    ]);

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| engine.submit(&rows).unwrap());
        }
    });

    assert_eq!(sink.len(), 8 * 3);
    let buckets = engine.buckets();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].total_volume, 80);
    assert!((buckets[0].vwap - 1.1).abs() < 1e-12);
}

#[test]
fn snapshot_while_writing() {
    let engine = VwapEngine::new(EngineConfig::default());
    let rows = vec![RawTradeRecord::from(["2:05 PM", "AUD/USD", "0.65", "10"]); 500];

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..10 {
                    engine.submit(&rows).unwrap();
                }
            });
        }
        s.spawn(|| {
            for _ in 0..200 {
                // numerator and denominator are read separately, so only
                // sanity of the value is checked mid-flight
                for (key, v) in engine.snapshot() {
                    assert_eq!(key, "AUD/USD 2:00 PM");
                    assert!(v.is_finite() && v > 0.0);
                }
            }
        });
    });

    assert_eq!(engine.buckets()[0].total_volume, 4 * 10 * 500 * 10);
    assert!((engine.lookup("AUD/USD", "2:59 PM").unwrap() - 0.65).abs() < 1e-9);
}
