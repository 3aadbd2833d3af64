use std::fmt::Write;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::system::cleanup::{CleanupEntry, CleanupOutcome, CleanupReport, EntryKind};
use crate::system::reclaim::ReclaimReport;
use crate::system::snapshot::SystemSnapshot;

const PATH_WIDTH: usize = 72;
const BAR_WIDTH: usize = 30;

/// Keep the last `max_width` columns of `s`, marking the cut with an ellipsis.
/// Paths are cut from the front since the file name is the useful part.
pub fn truncate_start(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut kept = Vec::new();
    let mut width = 0;
    for ch in s.chars().rev() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > budget {
            break;
        }
        kept.push(ch);
        width += ch_width;
    }
    let mut result = String::from('\u{2026}');
    result.extend(kept.into_iter().rev());
    result
}

pub fn format_mb(mb: f64) -> String {
    if mb.abs() >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else {
        format!("{mb:.1} MB")
    }
}

pub fn progress_bar(percent: u8) -> String {
    let percent = usize::from(percent.min(100));
    let filled = percent * BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

pub fn render_snapshot(snapshot: &SystemSnapshot) -> String {
    let memory = &snapshot.memory;
    let disk = &snapshot.disk;
    let disk_line = if disk.is_unknown() {
        "Disk Space: unavailable".to_string()
    } else {
        format!(
            "Disk Space: {:.1} GB / {:.1} GB Free",
            disk.free_gb, disk.total_gb
        )
    };
    format!(
        "CPU Usage: {:.1} %\nRAM Usage: {:.1} MB / {:.1} MB\n{disk_line}",
        snapshot.cpu_percent,
        memory.used_mb,
        memory.total_mb(),
    )
}

fn outcome_label(entry: &CleanupEntry) -> &'static str {
    match (entry.kind, entry.outcome) {
        (EntryKind::File, CleanupOutcome::Deleted) => "Deleted",
        (EntryKind::Directory, CleanupOutcome::Deleted) => "Deleted folder",
        (EntryKind::File, CleanupOutcome::SkippedAccessDenied) => "Skipped (access denied)",
        (EntryKind::Directory, CleanupOutcome::SkippedAccessDenied) => {
            "Skipped folder (access denied)"
        }
        (EntryKind::File, CleanupOutcome::SkippedInUse) => "Skipped (in use)",
        (EntryKind::Directory, CleanupOutcome::SkippedInUse) => "Skipped folder (in use)",
    }
}

pub fn render_cleanup_report(report: &CleanupReport) -> String {
    let mut out = String::new();
    for entry in &report.entries {
        let path = entry.path.display().to_string();
        let _ = writeln!(
            out,
            "{:<31} {}",
            outcome_label(entry),
            truncate_start(&path, PATH_WIDTH)
        );
    }
    if !report.entries.is_empty() {
        out.push('\n');
    }
    let _ = write!(
        out,
        "Cleanup finished: {} of {} items deleted ({} access denied, {} in use)",
        report.succeeded,
        report.attempted,
        report.count(CleanupOutcome::SkippedAccessDenied),
        report.count(CleanupOutcome::SkippedInUse),
    );
    out
}

pub fn render_reclaim_report(report: &ReclaimReport) -> String {
    let trims = &report.trims;
    format!(
        "RAM has been optimized!\nFreed: {} (before {}, after {})\n\
         Processes trimmed: {} of {} ({} denied, {} exited, {} unsupported, {} failed)",
        format_mb(report.freed_mb),
        format_mb(report.used_before_mb),
        format_mb(report.used_after_mb),
        trims.trimmed,
        trims.attempted(),
        trims.denied,
        trims.vanished,
        trims.unsupported,
        trims.failed,
    )
}
