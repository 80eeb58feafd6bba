//! In-memory providers for driving the engine without a desktop.

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use desk_context::platform::{
    Accessibility, HostEnvironment, Platform, ProcessEntry, ProcessTable, ScreenCapture,
    ShellWindow, ShellWindows, TopLevelWindow, UiElement, Virtualization, WindowHandle,
    WindowStack,
};
use desk_context::EngineSettings;

pub const OWN_PID: u32 = 4242;

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub handle: WindowHandle,
    pub visible: bool,
    pub pid: u32,
    pub title: String,
}

impl FakeWindow {
    pub fn new(handle: isize, pid: u32, title: &str) -> Self {
        Self {
            handle: WindowHandle(handle),
            visible: true,
            pid,
            title: title.to_string(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Z-ordered windows, first element on top.
#[derive(Default)]
pub struct FakeDesktop {
    pub windows: Vec<FakeWindow>,
    pub inspected: AtomicUsize,
    pub panic_on_walk: bool,
    pub walk_delay: Option<Duration>,
    pub fail_enumeration: bool,
}

impl FakeDesktop {
    pub fn new(windows: Vec<FakeWindow>) -> Self {
        Self {
            windows,
            ..Self::default()
        }
    }

    pub fn inspected(&self) -> usize {
        self.inspected.load(Ordering::SeqCst)
    }

    fn find(&self, handle: WindowHandle) -> Result<&FakeWindow> {
        self.windows
            .iter()
            .find(|window| window.handle == handle)
            .ok_or_else(|| anyhow!("window {handle:?} is gone"))
    }
}

impl WindowStack for FakeDesktop {
    fn top_window(&self) -> Option<WindowHandle> {
        if self.panic_on_walk {
            panic!("window manager crashed");
        }
        if let Some(delay) = self.walk_delay {
            std::thread::sleep(delay);
        }
        self.windows.first().map(|window| window.handle)
    }

    fn next_window(&self, current: WindowHandle) -> Option<WindowHandle> {
        let index = self.windows.iter().position(|window| window.handle == current)?;
        self.windows.get(index + 1).map(|window| window.handle)
    }

    fn is_visible(&self, handle: WindowHandle) -> bool {
        self.inspected.fetch_add(1, Ordering::SeqCst);
        self.find(handle).map(|window| window.visible).unwrap_or(false)
    }

    fn owner_pid(&self, handle: WindowHandle) -> Result<u32> {
        Ok(self.find(handle)?.pid)
    }

    fn title(&self, handle: WindowHandle) -> Result<String> {
        Ok(self.find(handle)?.title.clone())
    }

    fn enumerate_top_level(&self) -> Result<Vec<TopLevelWindow>> {
        if self.fail_enumeration {
            bail!("EnumWindows failed");
        }
        Ok(self
            .windows
            .iter()
            .map(|window| TopLevelWindow {
                handle: window.handle,
                visible: window.visible,
                owner_pid: window.pid,
            })
            .collect())
    }
}

/// A chain where every window points at the next one, forever.
pub struct EndlessDesktop {
    pub inspected: AtomicUsize,
}

impl WindowStack for EndlessDesktop {
    fn top_window(&self) -> Option<WindowHandle> {
        Some(WindowHandle(1))
    }

    fn next_window(&self, current: WindowHandle) -> Option<WindowHandle> {
        // cycles back to the top after 500 windows
        Some(WindowHandle(current.0 % 500 + 1))
    }

    fn is_visible(&self, _handle: WindowHandle) -> bool {
        self.inspected.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn owner_pid(&self, _handle: WindowHandle) -> Result<u32> {
        Ok(7)
    }

    fn title(&self, handle: WindowHandle) -> Result<String> {
        Ok(format!("Untitled {}", handle.0))
    }

    fn enumerate_top_level(&self) -> Result<Vec<TopLevelWindow>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct FakeProcesses {
    pub names: HashMap<u32, String>,
    pub executables: HashMap<u32, PathBuf>,
    pub listings: AtomicUsize,
}

impl FakeProcesses {
    pub fn with(entries: &[(u32, &str)]) -> Self {
        Self {
            names: entries
                .iter()
                .map(|(pid, name)| (*pid, name.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

impl ProcessTable for FakeProcesses {
    fn current_pid(&self) -> u32 {
        OWN_PID
    }

    fn processes(&self) -> Result<Vec<ProcessEntry>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        let mut entries: Vec<_> = self
            .names
            .iter()
            .map(|(pid, name)| ProcessEntry {
                pid: *pid,
                name: name.clone(),
            })
            .collect();
        entries.sort_by_key(|entry| entry.pid);
        Ok(entries)
    }

    fn process_name(&self, pid: u32) -> Result<String> {
        self.names
            .get(&pid)
            .cloned()
            .ok_or_else(|| anyhow!("access denied to process {pid}"))
    }

    fn executable_path(&self, pid: u32) -> Result<Option<PathBuf>> {
        Ok(self.executables.get(&pid).cloned())
    }
}

#[derive(Default)]
pub struct FakeShell {
    pub windows: Vec<ShellWindow>,
    pub fail: bool,
}

impl FakeShell {
    pub fn explorer(windows: &[(isize, &Path)]) -> Self {
        Self {
            windows: windows
                .iter()
                .map(|(handle, path)| ShellWindow {
                    handle: WindowHandle(*handle),
                    location_url: file_url(path),
                    host_process: r"C:\Windows\explorer.exe".to_string(),
                })
                .collect(),
            fail: false,
        }
    }
}

impl ShellWindows for FakeShell {
    fn shell_windows(&self) -> Result<Vec<ShellWindow>> {
        if self.fail {
            bail!("Shell.Application unavailable");
        }
        Ok(self.windows.clone())
    }
}

pub fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path)
        .map(|url| url.to_string())
        .unwrap_or_default()
}

#[derive(Default)]
pub struct FakeAccessibility {
    pub focused: Option<UiElement>,
    pub parents: HashMap<u64, UiElement>,
    pub fail: bool,
}

impl Accessibility for FakeAccessibility {
    fn focused_element(&self) -> Result<Option<UiElement>> {
        if self.fail {
            bail!("UI Automation threw");
        }
        Ok(self.focused.clone())
    }

    fn parent(&self, element: &UiElement) -> Result<Option<UiElement>> {
        Ok(self.parents.get(&element.element_ref).cloned())
    }
}

#[derive(Default)]
pub struct FakeVirtualization {
    pub listing: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeVirtualization {
    pub fn listing(text: &str) -> Self {
        Self {
            listing: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Virtualization for FakeVirtualization {
    fn status_report(&self, _timeout: Duration) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.listing
            .clone()
            .ok_or_else(|| anyhow!("wsl.exe not found"))
    }
}

#[derive(Default)]
pub struct FakeScreen {
    pub captures: AtomicUsize,
    pub delay: Option<Duration>,
    pub fail: bool,
}

impl FakeScreen {
    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl ScreenCapture for FakeScreen {
    fn capture(&self) -> Result<Vec<u8>> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            bail!("BitBlt failed");
        }
        Ok(vec![0xff, 0xd8, 0xff, 0xe0])
    }
}

#[derive(Default)]
pub struct FakeHost {
    pub vars: HashMap<String, String>,
    pub fail_vars: bool,
}

impl FakeHost {
    pub fn with_vars(vars: &[(&str, &str)]) -> Self {
        Self {
            vars: vars
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            fail_vars: false,
        }
    }
}

impl HostEnvironment for FakeHost {
    fn var(&self, name: &str) -> Result<Option<String>> {
        if self.fail_vars {
            bail!("environment block is unreadable");
        }
        Ok(self.vars.get(name).cloned())
    }

    fn current_dir(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/home/alice/work"))
    }

    fn os_description(&self) -> String {
        "Windows 11 Pro 23H2".to_string()
    }

    fn user_name(&self) -> Option<String> {
        Some("alice".to_string())
    }
}

/// Fakes wired into a `Platform`, kept around for assertions.
pub struct FakePlatform {
    pub windows: Arc<dyn WindowStack>,
    pub desktop: Option<Arc<FakeDesktop>>,
    pub processes: Arc<FakeProcesses>,
    pub shell: Arc<FakeShell>,
    pub accessibility: Arc<FakeAccessibility>,
    pub virtualization: Arc<FakeVirtualization>,
    pub screen: Arc<FakeScreen>,
    pub host: Arc<FakeHost>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        let desktop = Arc::new(FakeDesktop::default());
        Self {
            windows: desktop.clone(),
            desktop: Some(desktop),
            processes: Arc::new(FakeProcesses::default()),
            shell: Arc::new(FakeShell::default()),
            accessibility: Arc::new(FakeAccessibility::default()),
            virtualization: Arc::new(FakeVirtualization::default()),
            screen: Arc::new(FakeScreen::default()),
            host: Arc::new(FakeHost::default()),
        }
    }
}

impl FakePlatform {
    pub fn with_desktop(mut self, desktop: FakeDesktop) -> Self {
        let desktop = Arc::new(desktop);
        self.windows = desktop.clone();
        self.desktop = Some(desktop);
        self
    }

    pub fn desktop(&self) -> &FakeDesktop {
        self.desktop.as_deref().expect("platform uses a FakeDesktop")
    }

    pub fn platform(&self) -> Platform {
        Platform {
            windows: self.windows.clone(),
            processes: self.processes.clone(),
            shell: self.shell.clone(),
            accessibility: self.accessibility.clone(),
            virtualization: self.virtualization.clone(),
            screen: self.screen.clone(),
            host: self.host.clone(),
        }
    }
}

/// Defaults with `;` as the PATH separator so Windows-style fixtures parse
/// the same on every host.
pub fn settings() -> EngineSettings {
    EngineSettings {
        path_separator: ';',
        ..EngineSettings::default()
    }
}
