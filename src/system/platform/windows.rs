use std::ffi::OsStr;
use std::fs;
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::os::windows::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::ptr;

use super::PlatformExtensions;

use windows_sys::Win32::{
    Foundation::{CloseHandle, HANDLE},
    Security::{GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation},
    Storage::FileSystem::{FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_NORMAL, SetFileAttributesW},
    System::{
        Memory::{GetProcessHeap, HeapCompact},
        ProcessStatus::K32EmptyWorkingSet,
        Threading::{
            GetCurrentProcess, OpenProcess, OpenProcessToken, PROCESS_QUERY_LIMITED_INFORMATION,
            PROCESS_SET_QUOTA, SetProcessWorkingSetSize,
        },
    },
    UI::{Shell::ShellExecuteW, WindowsAndMessaging::SW_SHOWNORMAL},
};

pub struct Platform;

/// Closes the wrapped handle on drop.
struct OwnedHandle(HANDLE);

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.0);
        }
    }
}

impl PlatformExtensions for Platform {
    fn trim_working_set(pid: u32) -> io::Result<()> {
        unsafe {
            let handle = OpenProcess(
                PROCESS_SET_QUOTA | PROCESS_QUERY_LIMITED_INFORMATION,
                0,
                pid,
            );
            if handle.is_null() {
                return Err(io::Error::last_os_error());
            }
            let handle = OwnedHandle(handle);
            if K32EmptyWorkingSet(handle.0) == 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    fn trim_own_working_set() -> io::Result<()> {
        // (SIZE_T)-1 for both bounds asks the OS to remove as many pages as it can.
        let ok = unsafe { SetProcessWorkingSetSize(GetCurrentProcess(), usize::MAX, usize::MAX) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn release_heap() {
        unsafe {
            let heap = GetProcessHeap();
            if !heap.is_null() {
                HeapCompact(heap, 0);
            }
        }
    }

    fn clear_file_attributes(path: &Path) -> io::Result<()> {
        let wide = to_wide(path.as_os_str());
        if unsafe { SetFileAttributesW(wide.as_ptr(), FILE_ATTRIBUTE_NORMAL) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn remove_link(path: &Path) -> io::Result<()> {
        // Directory symlinks and junctions are directory entries; DeleteFileW
        // refuses them.
        let attributes = fs::symlink_metadata(path)?.file_attributes();
        if attributes & FILE_ATTRIBUTE_DIRECTORY != 0 {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn is_elevated() -> bool {
        unsafe {
            let mut token: HANDLE = ptr::null_mut();
            if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) == 0 {
                return false;
            }
            let token = OwnedHandle(token);
            let mut elevation = std::mem::zeroed::<TOKEN_ELEVATION>();
            let mut returned = 0u32;
            let ok = GetTokenInformation(
                token.0,
                TokenElevation,
                &mut elevation as *mut TOKEN_ELEVATION as *mut _,
                std::mem::size_of::<TOKEN_ELEVATION>() as u32,
                &mut returned,
            );
            ok != 0 && elevation.TokenIsElevated != 0
        }
    }

    fn relaunch_elevated() -> io::Result<()> {
        let exe = std::env::current_exe()?;
        let params = std::env::args()
            .skip(1)
            .map(|arg| quote_arg(&arg))
            .collect::<Vec<_>>()
            .join(" ");

        let verb = to_wide(OsStr::new("runas"));
        let file = to_wide(exe.as_os_str());
        let params = to_wide(OsStr::new(&params));

        let instance = unsafe {
            ShellExecuteW(
                ptr::null_mut(),
                verb.as_ptr(),
                file.as_ptr(),
                params.as_ptr(),
                ptr::null(),
                SW_SHOWNORMAL,
            )
        };
        // Values above 32 mean the launch succeeded.
        if instance as usize <= 32 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn system_volume() -> PathBuf {
        let drive = std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string());
        PathBuf::from(format!("{drive}\\"))
    }
}

fn to_wide(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(std::iter::once(0)).collect()
}

fn quote_arg(arg: &str) -> String {
    if arg.is_empty() || arg.contains([' ', '\t', '"']) {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}
