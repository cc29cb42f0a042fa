use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::covert::EmissionRecord;
use crate::stats::{DelayModel, SampleSeries, StatsAggregator, Summary, channel_capacity};

fn record(index: usize, timestamp: f64) -> EmissionRecord {
    EmissionRecord {
        character: 'A',
        value: b'A',
        index,
        timestamp,
    }
}

#[test]
fn summary_of_empty_and_single_sample() {
    assert_eq!(Summary::of(&[]), Summary { avg: 0.0, ci95: 0.0 });
    assert_eq!(Summary::of(&[3.5]), Summary { avg: 3.5, ci95: 0.0 });
}

#[test]
fn summary_uses_sample_standard_deviation() {
    let s = Summary::of(&[1.0, 2.0, 3.0, 4.0]);
    assert!((s.avg - 2.5).abs() < 1e-12);
    // s = sqrt(5/3)，半宽 = 1.96 * s / 2
    let expected = 1.96 * (5.0_f64 / 3.0).sqrt() / 2.0;
    assert!((s.ci95 - expected).abs() < 1e-12);
    assert!((s.ci95 - 1.26517).abs() < 1e-4);
}

#[test]
fn constant_series_has_zero_interval() {
    let s = Summary::of(&[0.2; 8]);
    assert!((s.avg - 0.2).abs() < 1e-12);
    assert!(s.ci95.abs() < 1e-12);
}

#[test]
fn series_serializes_as_plain_array() {
    let mut series = SampleSeries::new();
    assert!(series.is_empty());
    series.push(0.5);
    series.push(1.5);
    assert_eq!(series.len(), 2);
    assert_eq!(series.summary().avg, 1.0);
    assert_eq!(serde_json::to_string(&series).expect("serialize"), "[0.5,1.5]");
    assert_eq!(SampleSeries::from(vec![0.5, 1.5]), series);
}

#[test]
fn aggregator_keeps_series_in_order() {
    let agg = StatsAggregator::new();
    for v in [0.3, 0.1, 0.2] {
        agg.record_delay(v);
        agg.record_rtt(v * 2.0);
    }
    let snap = agg.snapshot();
    assert_eq!(snap.delays, vec![0.3, 0.1, 0.2]);
    assert_eq!(snap.rtts, vec![0.6, 0.2, 0.4]);
    assert_eq!(agg.delay_count(), 3);
    assert_eq!(agg.rtt_count(), 3);
    assert!((snap.delay.avg - 0.2).abs() < 1e-12);
    assert_eq!(snap.delay, agg.delay_summary());
    assert_eq!(snap.rtt, agg.rtt_summary());
}

#[test]
fn capacity_from_emission_span() {
    let log = vec![record(1, 10.0), record(2, 11.0), record(3, 12.0)];
    assert!((channel_capacity(&log) - 12.0).abs() < 1e-12);
}

#[test]
fn capacity_degenerate_logs_are_zero() {
    assert_eq!(channel_capacity(&[]), 0.0);
    assert_eq!(channel_capacity(&[record(1, 5.0)]), 0.0);
    assert_eq!(channel_capacity(&[record(1, 5.0), record(2, 5.0)]), 0.0);
}

#[test]
fn delay_samples_are_non_negative_with_expected_mean() {
    let model = DelayModel::new(0.001);
    let mut rng = StdRng::seed_from_u64(7);
    let n = 20_000;
    let mut sum = 0.0;
    for _ in 0..n {
        let s = model.sample_secs(&mut rng);
        assert!(s >= 0.0);
        sum += s;
    }
    let mean = sum / n as f64;
    assert!((mean - 0.001).abs() < 0.001 * 0.05, "mean={mean}");
}

#[test]
fn same_seed_gives_same_delays() {
    let model = DelayModel::new(5e-6);
    let mut a = StdRng::seed_from_u64(42);
    let mut b = StdRng::seed_from_u64(42);
    for _ in 0..16 {
        assert_eq!(model.sample(&mut a), model.sample(&mut b));
    }
    assert_eq!(model.mean_secs(), 5e-6);
}
