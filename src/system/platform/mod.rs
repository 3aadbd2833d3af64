use std::io;
use std::path::{Path, PathBuf};

/// OS-specific operations the core needs beyond what sysinfo exposes.
pub trait PlatformExtensions {
    /// Ask the OS to evict a process's resident pages to backing store.
    fn trim_working_set(pid: u32) -> io::Result<()>;
    /// Shrink this process's own working set to the minimum.
    fn trim_own_working_set() -> io::Result<()>;
    /// Give free heap pages held by the allocator back to the OS.
    fn release_heap();
    /// Clear read-only/system attributes so a delete is not refused for them.
    fn clear_file_attributes(path: &Path) -> io::Result<()>;
    /// Delete a symlink or junction itself, never its target.
    fn remove_link(path: &Path) -> io::Result<()>;
    fn is_elevated() -> bool;
    /// Start a new elevated instance with the same arguments.
    fn relaunch_elevated() -> io::Result<()>;
    /// Mount point of the volume the OS boots from.
    fn system_volume() -> PathBuf;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(unix)]
mod unix;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn trim_working_set(pid: u32) -> io::Result<()> {
    platform_impl::Platform::trim_working_set(pid)
}

pub fn trim_own_working_set() -> io::Result<()> {
    platform_impl::Platform::trim_own_working_set()
}

pub fn release_heap() {
    platform_impl::Platform::release_heap()
}

pub fn clear_file_attributes(path: &Path) -> io::Result<()> {
    platform_impl::Platform::clear_file_attributes(path)
}

pub fn remove_link(path: &Path) -> io::Result<()> {
    platform_impl::Platform::remove_link(path)
}

pub fn is_elevated() -> bool {
    platform_impl::Platform::is_elevated()
}

pub fn relaunch_elevated() -> io::Result<()> {
    platform_impl::Platform::relaunch_elevated()
}

pub fn system_volume() -> PathBuf {
    platform_impl::Platform::system_volume()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_do_not_panic_for_current_process() {
        let _ = is_elevated();
        release_heap();
        let _ = trim_own_working_set();
        assert!(system_volume().is_absolute());
    }

    #[test]
    fn clearing_attributes_keeps_file_deletable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.txt");
        std::fs::write(&path, b"x").unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&path, perms).unwrap();

        clear_file_attributes(&path).unwrap();
        assert!(!std::fs::metadata(&path).unwrap().permissions().readonly());
        std::fs::remove_file(&path).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn removing_link_leaves_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), b"x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        remove_link(&link).unwrap();
        assert!(std::fs::symlink_metadata(&link).is_err());
        assert!(target.join("keep.txt").exists());
    }

    #[test]
    fn missing_process_is_not_trimmed() {
        assert!(trim_working_set(u32::MAX).is_err());
    }
}
