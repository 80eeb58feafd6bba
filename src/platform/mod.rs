//! Capability contracts for everything the engine reads from the desktop.
//!
//! Each capability is a narrow synchronous trait so the orchestrator can run
//! it on the blocking pool under a timeout, and tests can substitute in-memory
//! window stacks, process tables and command output.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub mod system;
pub mod unsupported;
#[cfg(windows)]
pub mod windows;

/// Native top-level window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub isize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopLevelWindow {
    pub handle: WindowHandle,
    pub visible: bool,
    pub owner_pid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

/// A file-manager style window exposed by the shell automation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellWindow {
    pub handle: WindowHandle,
    pub location_url: String,
    /// Executable path (or name) of the hosting process.
    pub host_process: String,
}

/// Snapshot of an accessibility element. `element_ref` is an opaque token the
/// provider uses to walk to the element's parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiElement {
    pub element_ref: u64,
    pub name: String,
    pub control_type: String,
    pub automation_id: String,
    pub value: Option<String>,
    pub process_id: u32,
    pub is_window: bool,
}

/// Z-ordered window stack of the desktop.
pub trait WindowStack: Send + Sync {
    fn top_window(&self) -> Option<WindowHandle>;
    fn next_window(&self, current: WindowHandle) -> Option<WindowHandle>;
    fn is_visible(&self, handle: WindowHandle) -> bool;
    fn owner_pid(&self, handle: WindowHandle) -> Result<u32>;
    fn title(&self, handle: WindowHandle) -> Result<String>;
    fn enumerate_top_level(&self) -> Result<Vec<TopLevelWindow>>;
}

pub trait ProcessTable: Send + Sync {
    fn current_pid(&self) -> u32;
    fn processes(&self) -> Result<Vec<ProcessEntry>>;
    fn process_name(&self, pid: u32) -> Result<String>;
    fn executable_path(&self, pid: u32) -> Result<Option<PathBuf>>;
}

pub trait ShellWindows: Send + Sync {
    fn shell_windows(&self) -> Result<Vec<ShellWindow>>;
}

pub trait Accessibility: Send + Sync {
    fn focused_element(&self) -> Result<Option<UiElement>>;
    fn parent(&self, element: &UiElement) -> Result<Option<UiElement>>;
}

/// Status listing of the virtualized Linux subsystem.
pub trait Virtualization: Send + Sync {
    fn status_report(&self, timeout: Duration) -> Result<String>;
}

pub trait ScreenCapture: Send + Sync {
    fn capture(&self) -> Result<Vec<u8>>;
}

pub trait HostEnvironment: Send + Sync {
    fn var(&self, name: &str) -> Result<Option<String>>;
    fn current_dir(&self) -> Result<PathBuf>;
    fn os_description(&self) -> String;
    fn user_name(&self) -> Option<String>;
}

/// The full set of providers one engine queries.
#[derive(Clone)]
pub struct Platform {
    pub windows: Arc<dyn WindowStack>,
    pub processes: Arc<dyn ProcessTable>,
    pub shell: Arc<dyn ShellWindows>,
    pub accessibility: Arc<dyn Accessibility>,
    pub virtualization: Arc<dyn Virtualization>,
    pub screen: Arc<dyn ScreenCapture>,
    pub host: Arc<dyn HostEnvironment>,
}

impl Platform {
    /// Providers for the machine the engine runs on. Capabilities without a
    /// native backend report themselves as unavailable.
    pub fn native() -> Self {
        Self {
            windows: native_window_stack(),
            processes: Arc::new(system::SysinfoProcessTable),
            shell: Arc::new(unsupported::Unsupported::new("shell window automation")),
            accessibility: Arc::new(unsupported::Unsupported::new("accessibility focus")),
            virtualization: Arc::new(system::WslCli::default()),
            screen: Arc::new(unsupported::Unsupported::new("screen capture")),
            host: Arc::new(system::SystemHost),
        }
    }
}

#[cfg(windows)]
fn native_window_stack() -> Arc<dyn WindowStack> {
    Arc::new(windows::Win32WindowStack)
}

#[cfg(not(windows))]
fn native_window_stack() -> Arc<dyn WindowStack> {
    Arc::new(unsupported::Unsupported::new("window stack"))
}

/// File stem of a process name or executable path, without an `.exe` suffix.
/// Both separators are accepted so Windows paths parse on any host.
pub fn process_stem(name: &str) -> &str {
    let file = name.rsplit(['\\', '/']).next().unwrap_or(name);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.eq_ignore_ascii_case("exe") => stem,
        _ => file,
    }
}
