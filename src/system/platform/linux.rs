use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{PlatformExtensions, unix};

/// Kernel limit on iovecs per process_madvise call (UIO_MAXIOV).
const MAX_IOVECS: usize = 1024;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn trim_working_set(pid: u32) -> io::Result<()> {
        let pid = i32::try_from(pid).map_err(|_| io::Error::from(io::ErrorKind::NotFound))?;
        let ranges = private_anonymous_ranges(pid)?;
        // Kernel threads and similar have nothing that can be paged out.
        if ranges.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "no private anonymous memory to page out",
            ));
        }
        let pidfd = PidFd::open(pid)?;
        pidfd.page_out(&ranges)
    }

    fn trim_own_working_set() -> io::Result<()> {
        Self::trim_working_set(std::process::id())
    }

    fn release_heap() {
        #[cfg(target_env = "gnu")]
        unsafe {
            libc::malloc_trim(0);
        }
    }

    fn clear_file_attributes(path: &Path) -> io::Result<()> {
        unix::clear_file_attributes(path)
    }

    fn remove_link(path: &Path) -> io::Result<()> {
        unix::remove_link(path)
    }

    fn is_elevated() -> bool {
        unix::is_elevated()
    }

    fn relaunch_elevated() -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "re-run the command with sudo",
        ))
    }

    fn system_volume() -> PathBuf {
        PathBuf::from("/")
    }
}

/// VmFlags that make MADV_PAGEOUT fail with EINVAL for the whole call:
/// locked, PFN-mapped, I/O and hugetlb ranges.
const UNPAGEABLE_FLAGS: [&str; 4] = ["lo", "pf", "io", "ht"];

/// Read `/proc/<pid>/smaps` and keep the readable private mappings that are
/// not file-backed (heap, stack, anonymous) and carry no unpageable VmFlags.
/// Those are the pages that go to swap on MADV_PAGEOUT; special mappings like
/// [vdso] make the call fail.
fn private_anonymous_ranges(pid: i32) -> io::Result<Vec<(usize, usize)>> {
    let contents = fs::read_to_string(format!("/proc/{pid}/smaps"))?;
    Ok(pageable_ranges(&contents))
}

fn pageable_ranges(smaps: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    // Candidate from the last header line, waiting for its VmFlags line.
    let mut pending: Option<(usize, usize)> = None;

    for line in smaps.lines() {
        if let Some(flags) = line.strip_prefix("VmFlags:") {
            if let Some(range) = pending.take()
                && !flags
                    .split_whitespace()
                    .any(|flag| UNPAGEABLE_FLAGS.contains(&flag))
            {
                ranges.push(range);
            }
        } else if is_mapping_header(line) {
            // Kernels without VmFlags never clear the previous candidate.
            ranges.extend(pending.take());
            pending = parse_anonymous_range(line);
        }
    }
    ranges.extend(pending);
    ranges
}

fn is_mapping_header(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .and_then(|first| first.split_once('-'))
        .is_some_and(|(start, end)| {
            !start.is_empty()
                && start.bytes().all(|b| b.is_ascii_hexdigit())
                && end.bytes().all(|b| b.is_ascii_hexdigit())
        })
}

fn parse_anonymous_range(line: &str) -> Option<(usize, usize)> {
    // start-end perms offset dev inode [pathname]
    let mut fields = line.split_whitespace();
    let range = fields.next()?;
    let perms = fields.next()?;
    let pathname = fields.nth(3).unwrap_or("");

    if !perms.starts_with('r') || perms.as_bytes().get(3) != Some(&b'p') {
        return None;
    }
    if !matches!(pathname, "" | "[heap]" | "[stack]") {
        return None;
    }

    let (start, end) = range.split_once('-')?;
    let start = usize::from_str_radix(start, 16).ok()?;
    let end = usize::from_str_radix(end, 16).ok()?;
    (end > start).then_some((start, end - start))
}

struct PidFd(libc::c_int);

impl PidFd {
    fn open(pid: i32) -> io::Result<Self> {
        let fd = unsafe { libc::syscall(libc::SYS_pidfd_open, pid, 0) };
        if fd < 0 {
            return Err(map_errno(io::Error::last_os_error()));
        }
        Ok(PidFd(fd as libc::c_int))
    }

    fn page_out(&self, ranges: &[(usize, usize)]) -> io::Result<()> {
        let iovecs: Vec<libc::iovec> = ranges
            .iter()
            .map(|&(base, len)| libc::iovec {
                iov_base: base as *mut libc::c_void,
                iov_len: len,
            })
            .collect();

        for chunk in iovecs.chunks(MAX_IOVECS) {
            let rc = unsafe {
                libc::syscall(
                    libc::SYS_process_madvise,
                    self.0,
                    chunk.as_ptr(),
                    chunk.len(),
                    libc::MADV_PAGEOUT,
                    0,
                )
            };
            if rc < 0 {
                let err = io::Error::last_os_error();
                // Unpageable ranges are filtered out above, so what is left
                // is a kernel without remote MADV_PAGEOUT (before 5.10).
                if err.raw_os_error() == Some(libc::EINVAL) {
                    return Err(io::Error::new(io::ErrorKind::Unsupported, err));
                }
                return Err(map_errno(err));
            }
        }
        Ok(())
    }
}

impl Drop for PidFd {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.0);
        }
    }
}

fn map_errno(err: io::Error) -> io::Error {
    match err.raw_os_error() {
        Some(libc::ESRCH) => io::Error::new(io::ErrorKind::NotFound, err),
        Some(libc::ENOSYS) => io::Error::new(io::ErrorKind::Unsupported, err),
        _ => err,
    }
}
