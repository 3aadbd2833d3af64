use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

pub(super) fn clear_file_attributes(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    // set_permissions follows links; the link itself carries no mode to clear.
    if metadata.file_type().is_symlink() {
        return Ok(());
    }
    let mut perms = metadata.permissions();
    let mode = perms.mode();
    if mode & 0o200 == 0 {
        perms.set_mode(mode | 0o200);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

pub(super) fn remove_link(path: &Path) -> io::Result<()> {
    // unlink never follows the link, whatever it points at.
    fs::remove_file(path)
}

pub(super) fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}
