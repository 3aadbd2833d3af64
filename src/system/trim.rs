use std::io;

use serde::Serialize;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use super::platform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimResult {
    Trimmed(u32),
    Denied(u32),
    Vanished(u32),
    Unsupported(u32),
    Failed(u32, String),
}

impl TrimResult {
    pub fn from_io(pid: u32, result: io::Result<()>) -> Self {
        let Err(err) = result else {
            return TrimResult::Trimmed(pid);
        };
        match err.kind() {
            io::ErrorKind::PermissionDenied => TrimResult::Denied(pid),
            // Windows reports an exited pid as ERROR_INVALID_PARAMETER.
            io::ErrorKind::NotFound | io::ErrorKind::InvalidInput => TrimResult::Vanished(pid),
            io::ErrorKind::Unsupported => TrimResult::Unsupported(pid),
            _ => TrimResult::Failed(pid, err.to_string()),
        }
    }

    pub fn pid(&self) -> u32 {
        match self {
            TrimResult::Trimmed(pid)
            | TrimResult::Denied(pid)
            | TrimResult::Vanished(pid)
            | TrimResult::Unsupported(pid)
            | TrimResult::Failed(pid, _) => *pid,
        }
    }
}

pub fn trim_process(pid: u32) -> TrimResult {
    TrimResult::from_io(pid, platform::trim_working_set(pid))
}

/// Per-category counts of a trimming pass. Individual failures never abort a
/// pass; they land here instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrimSummary {
    pub trimmed: usize,
    pub denied: usize,
    pub vanished: usize,
    pub unsupported: usize,
    pub failed: usize,
    pub self_trimmed: bool,
}

impl TrimSummary {
    pub fn record(&mut self, result: &TrimResult) {
        match result {
            TrimResult::Trimmed(_) => self.trimmed += 1,
            TrimResult::Denied(_) => self.denied += 1,
            TrimResult::Vanished(_) => self.vanished += 1,
            TrimResult::Unsupported(_) => self.unsupported += 1,
            TrimResult::Failed(_, _) => self.failed += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.trimmed + self.denied + self.vanished + self.unsupported + self.failed
    }

    pub fn skipped(&self) -> usize {
        self.attempted() - self.trimmed
    }
}

/// What the reclaim engine needs to shrink resident memory.
pub trait ProcessTrimmer {
    /// Every process visible at the current privilege level, this one excluded.
    fn process_ids(&mut self) -> Vec<u32>;
    fn trim(&mut self, pid: u32) -> TrimResult;
    fn release_heap(&mut self);
    fn trim_self(&mut self) -> TrimResult;
}

pub struct SystemTrimmer {
    sys: System,
}

impl Default for SystemTrimmer {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTrimmer {
    pub fn new() -> Self {
        SystemTrimmer { sys: System::new() }
    }
}

impl ProcessTrimmer for SystemTrimmer {
    fn process_ids(&mut self) -> Vec<u32> {
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );
        let own = std::process::id();
        let mut pids: Vec<u32> = self
            .sys
            .processes()
            .keys()
            .map(|pid| pid.as_u32())
            .filter(|&pid| pid != own)
            .collect();
        pids.sort_unstable();
        pids
    }

    fn trim(&mut self, pid: u32) -> TrimResult {
        trim_process(pid)
    }

    fn release_heap(&mut self) {
        platform::release_heap();
    }

    fn trim_self(&mut self) -> TrimResult {
        TrimResult::from_io(std::process::id(), platform::trim_own_working_set())
    }
}
