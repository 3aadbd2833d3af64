use std::path::Path;

use memsweep::system::sampler::{CounterState, MetricsSampler};

#[test]
fn cpu_usage_without_explicit_initialization() {
    let mut sampler = MetricsSampler::new();
    assert_eq!(sampler.state(), CounterState::Uninitialized);

    let cpu = sampler.cpu_usage();
    assert_eq!(sampler.state(), CounterState::Ready);
    assert!((0.0..=100.0).contains(&cpu), "cpu out of range: {cpu}");
    // One decimal of precision.
    assert!(((cpu * 10.0).round() - cpu * 10.0).abs() < 1e-3);
}

#[test]
fn memory_used_plus_available_is_total() {
    let mut sampler = MetricsSampler::new();
    let usage = sampler.memory_usage().expect("memory totals");
    assert!(usage.used_mb >= 0.0);
    assert!(usage.available_mb > 0.0);
    assert!(usage.total_mb() > usage.used_mb);
}

#[test]
fn missing_volume_reports_zeroes() {
    let mut sampler = MetricsSampler::new();
    let disk = sampler.disk_usage(Path::new("/no/such/volume/here"));
    assert_eq!(disk.free_gb, 0.0);
    assert_eq!(disk.total_gb, 0.0);
}
