use serde::Serialize;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Physical memory totals at the instant of query, in megabytes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MemorySample {
    pub total_mb: f64,
    pub free_mb: f64,
}

impl MemorySample {
    pub fn from_bytes(total: u64, free: u64) -> Self {
        MemorySample {
            total_mb: total as f64 / BYTES_PER_MB,
            free_mb: free as f64 / BYTES_PER_MB,
        }
    }

    pub fn used_mb(&self) -> f64 {
        self.total_mb - self.free_mb
    }

    pub fn usage(&self) -> MemoryUsage {
        MemoryUsage {
            used_mb: self.used_mb(),
            available_mb: self.free_mb,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MemoryUsage {
    pub used_mb: f64,
    pub available_mb: f64,
}

impl MemoryUsage {
    pub fn total_mb(&self) -> f64 {
        self.used_mb + self.available_mb
    }
}

/// Free and total capacity of one volume. `(0, 0)` means the volume was not
/// present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct DiskSample {
    pub free_gb: f64,
    pub total_gb: f64,
}

impl DiskSample {
    pub const UNKNOWN: DiskSample = DiskSample {
        free_gb: 0.0,
        total_gb: 0.0,
    };

    pub fn from_bytes(free: u64, total: u64) -> Self {
        DiskSample {
            free_gb: free as f64 / BYTES_PER_GB,
            total_gb: total as f64 / BYTES_PER_GB,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.total_gb == 0.0 && self.free_gb == 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub cpu_percent: f32,
    pub memory: MemoryUsage,
    pub disk: DiskSample,
}
