use std::path::Path;

use sysinfo::{Disks, System};
use thiserror::Error;

use super::snapshot::{DiskSample, MemorySample};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("physical memory totals are unavailable")]
    MemoryUnavailable,
}

/// Source of system-wide physical memory readings.
pub trait MemoryProbe {
    fn memory(&mut self) -> Result<MemorySample, ProbeError>;
}

/// Full set of readings the metrics sampler needs.
pub trait ResourceProbe: MemoryProbe {
    /// Advance the CPU counter and return the usage percentage accumulated
    /// since the previous call.
    fn refresh_cpu(&mut self) -> f32;

    /// Capacity of the volume mounted at `volume`, if it is present.
    fn disk(&mut self, volume: &Path) -> Option<DiskSample>;
}

pub struct SysinfoProbe {
    sys: System,
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProbe {
    pub fn new() -> Self {
        SysinfoProbe { sys: System::new() }
    }
}

impl MemoryProbe for SysinfoProbe {
    fn memory(&mut self) -> Result<MemorySample, ProbeError> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(ProbeError::MemoryUnavailable);
        }
        // "Available" is what the OS can hand out without paging, which is
        // the figure Windows reports as free physical memory.
        let free = self.sys.available_memory().min(total);
        Ok(MemorySample::from_bytes(total, free))
    }
}

impl ResourceProbe for SysinfoProbe {
    fn refresh_cpu(&mut self) -> f32 {
        self.sys.refresh_cpu_usage();
        self.sys.global_cpu_usage()
    }

    fn disk(&mut self, volume: &Path) -> Option<DiskSample> {
        // Volumes come and go (removable media), so list them fresh each time.
        let disks = Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == volume)
            .map(|disk| DiskSample::from_bytes(disk.available_space(), disk.total_space()))
    }
}
