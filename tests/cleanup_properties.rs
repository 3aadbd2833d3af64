use std::fs;

use memsweep::system::cleanup::{CleanupError, clean_directory};
use proptest::prelude::*;

fn populate(root: &std::path::Path, files: usize, dirs: usize) {
    for i in 0..files {
        fs::write(root.join(format!("file_{i:03}.tmp")), vec![b'x'; i]).unwrap();
    }
    for i in 0..dirs {
        let nested = root.join(format!("dir_{i:03}")).join("inner");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("leaf.tmp"), b"leaf").unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn progress_is_monotonic_and_accounting_balances(files in 0usize..24, dirs in 0usize..6) {
        let scratch = tempfile::tempdir().unwrap();
        populate(scratch.path(), files, dirs);

        let mut seen = Vec::new();
        let report = clean_directory(scratch.path(), |p| seen.push(p)).unwrap();

        prop_assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", seen);
        prop_assert_eq!(seen.last().copied(), Some(100));
        prop_assert!(seen.iter().all(|&p| p <= 100));
        prop_assert_eq!(report.attempted, files + dirs);
        prop_assert_eq!(report.succeeded + report.skipped(), report.attempted);
        prop_assert_eq!(report.entries.len(), report.attempted);
        // One report per item plus the closing 100.
        prop_assert_eq!(seen.len(), files + dirs + 1);
    }
}

#[test]
fn empty_scratch_reports_single_completion() {
    let scratch = tempfile::tempdir().unwrap();
    let mut seen = Vec::new();
    let report = clean_directory(scratch.path(), |p| seen.push(p)).unwrap();
    assert_eq!(seen, vec![100]);
    assert_eq!(report.attempted, 0);
    assert!(report.entries.is_empty());
}

#[test]
fn missing_scratch_reports_nothing() {
    let scratch = tempfile::tempdir().unwrap();
    let missing = scratch.path().join("missing");
    let mut seen = Vec::new();
    let result = clean_directory(&missing, |p| seen.push(p));
    assert!(matches!(result, Err(CleanupError::ScratchMissing(_))));
    assert!(seen.is_empty());
}
