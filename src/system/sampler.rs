use std::path::Path;
use std::thread;
use std::time::Duration;

use super::probe::{ProbeError, ResourceProbe, SysinfoProbe};
use super::snapshot::{DiskSample, MemoryUsage, SystemSnapshot};

/// Wait after the discarded first CPU read before readings mean anything.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterState {
    Uninitialized,
    Warming,
    Ready,
}

/// Delta-based CPU counter. The first read after creation has no baseline,
/// so it is thrown away and the counter is given time to accumulate one.
#[derive(Debug)]
struct CpuCounter {
    state: CounterState,
    last_reading: Option<f32>,
    settle_delay: Duration,
}

impl CpuCounter {
    fn new(settle_delay: Duration) -> Self {
        CpuCounter {
            state: CounterState::Uninitialized,
            last_reading: None,
            settle_delay,
        }
    }
}

/// Point-in-time CPU, memory and disk readings.
///
/// Holds the one CPU counter for its lifetime. Every method takes `&mut self`,
/// so at most one query is ever in flight; hand the sampler to whichever
/// thread polls it instead of sharing it.
pub struct MetricsSampler<P: ResourceProbe = SysinfoProbe> {
    probe: P,
    cpu: CpuCounter,
}

impl Default for MetricsSampler<SysinfoProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSampler<SysinfoProbe> {
    pub fn new() -> Self {
        Self::with_probe(SysinfoProbe::new(), DEFAULT_SETTLE_DELAY)
    }
}

impl<P: ResourceProbe> MetricsSampler<P> {
    /// `settle_delay` is raised to sysinfo's minimum CPU update interval when
    /// it is non-zero; a zero delay is kept as-is for fixed-reading probes.
    pub fn with_probe(probe: P, settle_delay: Duration) -> Self {
        let settle_delay = if settle_delay.is_zero() {
            settle_delay
        } else {
            settle_delay.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)
        };
        MetricsSampler {
            probe,
            cpu: CpuCounter::new(settle_delay),
        }
    }

    pub fn state(&self) -> CounterState {
        self.cpu.state
    }

    #[cfg(test)]
    fn probe(&self) -> &P {
        &self.probe
    }

    /// Warm up the CPU counter. No-op once it is ready.
    pub fn initialize_cpu_counter(&mut self) {
        if self.cpu.state == CounterState::Ready {
            return;
        }
        let discarded = self.probe.refresh_cpu();
        self.cpu.state = CounterState::Warming;
        tracing::debug!(
            discarded,
            settle_ms = self.cpu.settle_delay.as_millis() as u64,
            "cpu counter warming"
        );
        if !self.cpu.settle_delay.is_zero() {
            thread::sleep(self.cpu.settle_delay);
        }
        self.cpu.state = CounterState::Ready;
    }

    /// CPU usage since the previous call, 0-100 with one decimal.
    ///
    /// The first call pays the settle delay. Poll no faster than about once a
    /// second or readings drift toward 0 or noise.
    pub fn cpu_usage(&mut self) -> f32 {
        self.initialize_cpu_counter();
        let raw = self.probe.refresh_cpu();
        self.cpu.last_reading = Some(raw);
        round_percent(raw)
    }

    /// Unrounded value behind the last `cpu_usage` result.
    pub fn last_cpu_reading(&self) -> Option<f32> {
        self.cpu.last_reading
    }

    pub fn memory_usage(&mut self) -> Result<MemoryUsage, ProbeError> {
        self.probe.memory().map(|sample| sample.usage())
    }

    /// Free and total capacity of `volume`, or `(0, 0)` when it is absent.
    pub fn disk_usage(&mut self, volume: &Path) -> DiskSample {
        self.probe.disk(volume).unwrap_or(DiskSample::UNKNOWN)
    }

    pub fn snapshot(&mut self, volume: &Path) -> Result<SystemSnapshot, ProbeError> {
        let cpu_percent = self.cpu_usage();
        let memory = self.memory_usage()?;
        let disk = self.disk_usage(volume);
        Ok(SystemSnapshot {
            cpu_percent,
            memory,
            disk,
        })
    }
}

fn round_percent(raw: f32) -> f32 {
    if !raw.is_finite() {
        return 0.0;
    }
    (raw.clamp(0.0, 100.0) * 10.0).round() / 10.0
}
