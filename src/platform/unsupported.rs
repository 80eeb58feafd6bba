use anyhow::{bail, Result};
use std::time::Duration;

use super::{
    Accessibility, ScreenCapture, ShellWindow, ShellWindows, TopLevelWindow, UiElement,
    Virtualization, WindowHandle, WindowStack,
};

/// Stand-in for a capability this build has no backend for. Every query
/// fails with a descriptive error, which the engine treats as a tier failure.
#[derive(Debug, Clone)]
pub struct Unsupported {
    capability: &'static str,
}

impl Unsupported {
    pub fn new(capability: &'static str) -> Self {
        Self { capability }
    }

    fn fail<T>(&self) -> Result<T> {
        bail!("{} is not available on this platform", self.capability)
    }
}

impl WindowStack for Unsupported {
    fn top_window(&self) -> Option<WindowHandle> {
        None
    }

    fn next_window(&self, _current: WindowHandle) -> Option<WindowHandle> {
        None
    }

    fn is_visible(&self, _handle: WindowHandle) -> bool {
        false
    }

    fn owner_pid(&self, _handle: WindowHandle) -> Result<u32> {
        self.fail()
    }

    fn title(&self, _handle: WindowHandle) -> Result<String> {
        self.fail()
    }

    fn enumerate_top_level(&self) -> Result<Vec<TopLevelWindow>> {
        self.fail()
    }
}

impl ShellWindows for Unsupported {
    fn shell_windows(&self) -> Result<Vec<ShellWindow>> {
        self.fail()
    }
}

impl Accessibility for Unsupported {
    fn focused_element(&self) -> Result<Option<UiElement>> {
        self.fail()
    }

    fn parent(&self, _element: &UiElement) -> Result<Option<UiElement>> {
        self.fail()
    }
}

impl Virtualization for Unsupported {
    fn status_report(&self, _timeout: Duration) -> Result<String> {
        self.fail()
    }
}

impl ScreenCapture for Unsupported {
    fn capture(&self) -> Result<Vec<u8>> {
        self.fail()
    }
}
