//! Process elevation checks.
//!
//! Cleaning system locations (`C:\Windows\Temp`, Prefetch) needs an
//! elevated token. The check is advisory: nothing here elevates the
//! process, it only tells the caller to relaunch properly.

use log::debug;

use crate::error::{Result, SweepError};

/// True when the current process has administrative rights.
#[cfg(windows)]
pub fn is_elevated() -> bool {
    use std::mem;
    use std::ptr;
    use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};
    use windows_sys::Win32::Security::{
        GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
    };
    use windows_sys::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    unsafe {
        let mut token: HANDLE = ptr::null_mut();
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) == 0 {
            return false;
        }

        let mut elevation: TOKEN_ELEVATION = mem::zeroed();
        let mut returned = 0u32;
        let ok = GetTokenInformation(
            token,
            TokenElevation,
            &mut elevation as *mut TOKEN_ELEVATION as *mut _,
            mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        );
        CloseHandle(token);

        ok != 0 && elevation.TokenIsElevated != 0
    }
}

/// True when the current process has administrative rights.
#[cfg(not(windows))]
pub fn is_elevated() -> bool {
    // Root is the closest analogue elsewhere.
    unsafe { libc::geteuid() == 0 }
}

/// Fails with an instructional error when the process is not elevated.
/// `operation` names what the user was trying to do.
pub fn require_admin(operation: &str) -> Result<()> {
    if is_elevated() {
        return Ok(());
    }
    debug!("elevation check failed for: {operation}");
    Err(SweepError::ElevationRequired {
        operation: operation.to_string(),
    })
}
