use anyhow::{bail, Result};
use windows_sys::Win32::Foundation::HWND;
use windows_sys::Win32::UI::WindowsAndMessaging::{
    GetTopWindow, GetWindow, GetWindowTextW, GetWindowThreadProcessId, IsWindowVisible,
    GW_HWNDNEXT,
};

use super::{TopLevelWindow, WindowHandle, WindowStack};

const TITLE_CAPACITY: usize = 256;
/// Hard stop for full enumeration in case the Z-order chain loops.
const MAX_ENUMERATED_WINDOWS: usize = 4096;

/// Z-order window stack read through user32.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32WindowStack;

fn to_hwnd(handle: WindowHandle) -> HWND {
    handle.0 as HWND
}

fn from_hwnd(hwnd: HWND) -> Option<WindowHandle> {
    if hwnd.is_null() {
        None
    } else {
        Some(WindowHandle(hwnd as isize))
    }
}

impl WindowStack for Win32WindowStack {
    fn top_window(&self) -> Option<WindowHandle> {
        unsafe { from_hwnd(GetTopWindow(std::ptr::null_mut())) }
    }

    fn next_window(&self, current: WindowHandle) -> Option<WindowHandle> {
        unsafe { from_hwnd(GetWindow(to_hwnd(current), GW_HWNDNEXT)) }
    }

    fn is_visible(&self, handle: WindowHandle) -> bool {
        unsafe { IsWindowVisible(to_hwnd(handle)) != 0 }
    }

    fn owner_pid(&self, handle: WindowHandle) -> Result<u32> {
        let mut pid: u32 = 0;
        let thread_id = unsafe { GetWindowThreadProcessId(to_hwnd(handle), &mut pid) };
        if thread_id == 0 {
            bail!("window {:?} has no owning thread", handle);
        }
        Ok(pid)
    }

    fn title(&self, handle: WindowHandle) -> Result<String> {
        let mut buffer = [0u16; TITLE_CAPACITY];
        let copied = unsafe {
            GetWindowTextW(to_hwnd(handle), buffer.as_mut_ptr(), TITLE_CAPACITY as i32)
        };
        let len = usize::try_from(copied).unwrap_or(0).min(TITLE_CAPACITY);
        Ok(String::from_utf16_lossy(&buffer[..len]))
    }

    fn enumerate_top_level(&self) -> Result<Vec<TopLevelWindow>> {
        let mut windows = Vec::new();
        let mut current = self.top_window();

        while let Some(handle) = current {
            if windows.len() >= MAX_ENUMERATED_WINDOWS {
                log::warn!("window enumeration stopped after {MAX_ENUMERATED_WINDOWS} windows");
                break;
            }
            // Windows can disappear mid-walk; skip them.
            if let Ok(owner_pid) = self.owner_pid(handle) {
                windows.push(TopLevelWindow {
                    handle,
                    visible: self.is_visible(handle),
                    owner_pid,
                });
            }
            current = self.next_window(handle);
        }

        Ok(windows)
    }
}
