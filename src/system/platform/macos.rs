use std::io;
use std::path::{Path, PathBuf};

use super::{PlatformExtensions, unix};

pub struct Platform;

impl PlatformExtensions for Platform {
    fn trim_working_set(_pid: u32) -> io::Result<()> {
        // The kernel decides what to compress or page out; there is no
        // supported per-process request to evict resident pages.
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    fn trim_own_working_set() -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    fn release_heap() {}

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
