use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use super::cleanup::{self, CleanupError, CleanupReport};
use super::probe::{MemoryProbe, ProbeError, SysinfoProbe};
use super::progress::ProgressReporter;
use super::trim::{ProcessTrimmer, SystemTrimmer, TrimResult, TrimSummary};

#[derive(Debug, Error)]
pub enum ReclaimError {
    #[error("could not read memory usage")]
    Snapshot(#[from] ProbeError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReclaimReport {
    pub used_before_mb: f64,
    pub used_after_mb: f64,
    /// `before - after`. Negative when other processes allocated during the
    /// run; that is a real measurement and is not clamped.
    pub freed_mb: f64,
    pub trims: TrimSummary,
}

impl ReclaimReport {
    pub fn new(used_before_mb: f64, used_after_mb: f64, trims: TrimSummary) -> Self {
        ReclaimReport {
            used_before_mb,
            used_after_mb,
            freed_mb: used_before_mb - used_after_mb,
            trims,
        }
    }
}

/// Frees disk space (temp files) and physical memory (working sets).
pub struct ReclaimEngine<M: MemoryProbe = SysinfoProbe, T: ProcessTrimmer = SystemTrimmer> {
    memory: M,
    trimmer: T,
    scratch_dir: Option<PathBuf>,
}

impl Default for ReclaimEngine<SysinfoProbe, SystemTrimmer> {
    fn default() -> Self {
        Self::new()
    }
}

impl ReclaimEngine<SysinfoProbe, SystemTrimmer> {
    pub fn new() -> Self {
        Self::with_parts(SysinfoProbe::new(), SystemTrimmer::new())
    }
}

impl<M: MemoryProbe, T: ProcessTrimmer> ReclaimEngine<M, T> {
    pub fn with_parts(memory: M, trimmer: T) -> Self {
        ReclaimEngine {
            memory,
            trimmer,
            scratch_dir: None,
        }
    }

    /// Clean `dir` instead of the OS temp location.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    #[cfg(test)]
    fn trimmer(&self) -> &T {
        &self.trimmer
    }

    pub fn clean_temporary_files(
        &mut self,
        progress: impl FnMut(u8),
    ) -> Result<CleanupReport, CleanupError> {
        cleanup::clean_directory(&self.scratch_dir(), progress)
    }

    /// Trim every visible process, then this one, reporting 10, 50 and 100.
    ///
    /// Per-process failures are counted in the report's `trims`. Only a
    /// failed memory reading aborts; if the first one fails nothing is
    /// reported.
    pub fn free_memory(
        &mut self,
        progress: impl FnMut(u8),
    ) -> Result<ReclaimReport, ReclaimError> {
        let before = self.memory.memory()?.used_mb();
        let mut progress = ProgressReporter::new(progress);
        progress.report(10);

        let mut trims = TrimSummary::default();
        for pid in self.trimmer.process_ids() {
            let result = self.trimmer.trim(pid);
            if let TrimResult::Failed(_, reason) = &result {
                tracing::debug!(pid, reason, "working-set trim failed");
            }
            trims.record(&result);
        }
        progress.report(50);

        self.trimmer.release_heap();
        let own = self.trimmer.trim_self();
        trims.self_trimmed = matches!(own, TrimResult::Trimmed(_));
        progress.report(100);

        let after = self.memory.memory()?.used_mb();
        let report = ReclaimReport::new(before, after, trims);
        tracing::info!(
            before_mb = report.used_before_mb,
            after_mb = report.used_after_mb,
            freed_mb = report.freed_mb,
            trimmed = report.trims.trimmed,
            skipped = report.trims.skipped(),
            "memory reclaim finished"
        );
        Ok(report)
    }
}
