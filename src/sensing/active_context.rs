//! Tier 1: find the single most relevant thing the user is looking at.
//!
//! Priority: a file-manager window in the Z-order, then a terminal or IDE
//! window, then any open file-manager folder, then the focused accessibility
//! element, then the working directory. The first three are strong signals;
//! the last two leave the orchestrator to gather more evidence.

use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::models::ConfidenceResult;
use crate::platform::{process_stem, Platform, WindowHandle};
use crate::settings::{EngineSettings, TerminalHost};

use super::accessibility::AccessibilityResolver;
use super::explorer::explorer_windows;
use super::virtualization::{parse_running_distros, status_text};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// `user@host` followed by `:`, `/` or `~`, as Unix shells title terminals.
pub fn is_shell_prompt_title(title: &str) -> bool {
    static PROMPT: OnceLock<Regex> = OnceLock::new();
    PROMPT
        .get_or_init(|| Regex::new(r"^[\w.-]+@[\w.-]+[:/~]").expect("shell prompt pattern is valid"))
        .is_match(title)
}

/// Shell name from a `"<shell> - Terminal"` style title.
pub fn shell_name_from_title(title: &str) -> &str {
    let name = title.split_once('-').map_or(title, |(head, _)| head).trim();
    if name.is_empty() {
        "Unknown Shell"
    } else {
        name
    }
}

/// Describes a terminal showing a Unix prompt, using the running distros to
/// guess which one it belongs to. With one running distro that distro is
/// assumed, even though the session might be SSH or another distro.
pub fn describe_prompt_session(host_label: &str, title: &str, running: &[String]) -> String {
    match running {
        [only] => format!("Active Application: {host_label} (running {only} shell: {title})"),
        [] => format!("Active Application: {host_label} (running shell: {title})"),
        several => format!(
            "Active Application: {host_label} (running WSL shell: {title}, possible distros: {})",
            several.join(", ")
        ),
    }
}

pub struct ActiveContextResolver<'a> {
    platform: &'a Platform,
    settings: &'a EngineSettings,
}

impl<'a> ActiveContextResolver<'a> {
    pub fn new(platform: &'a Platform, settings: &'a EngineSettings) -> Self {
        Self { platform, settings }
    }

    pub fn resolve(&self) -> ConfidenceResult {
        match self.try_resolve() {
            Ok(result) => result,
            Err(err) => ConfidenceResult::weak(format!("Error getting active context: {err:#}")),
        }
    }

    fn try_resolve(&self) -> Result<ConfidenceResult> {
        let explorers: HashMap<WindowHandle, PathBuf> =
            match explorer_windows(self.platform.shell.as_ref(), &self.settings.file_manager_process)
            {
                Ok(windows) => windows.into_iter().collect(),
                Err(err) => {
                    log_debug!("shell window enumeration failed: {err:#}");
                    HashMap::new()
                }
            };

        if let Some(result) = self.walk_window_stack(&explorers) {
            return Ok(result);
        }

        if let Some((_, path)) = explorers.iter().min_by_key(|(handle, _)| **handle) {
            return Ok(ConfidenceResult::strong(format!(
                "Active Explorer Path (Fallback): {}",
                path.display()
            )));
        }

        let accessibility = AccessibilityResolver::new(
            self.platform.accessibility.as_ref(),
            self.platform.processes.as_ref(),
            self.settings.value_display_limit,
        )
        .resolve();
        if !accessibility.is_empty() {
            return Ok(ConfidenceResult::weak(accessibility));
        }

        let cwd = self.platform.host.current_dir()?;
        Ok(ConfidenceResult::weak(format!(
            "Current Directory: {}",
            cwd.display()
        )))
    }

    /// Walks the Z-order from the top, inspecting at most `max_window_hops`
    /// windows.
    fn walk_window_stack(
        &self,
        explorers: &HashMap<WindowHandle, PathBuf>,
    ) -> Option<ConfidenceResult> {
        let windows = self.platform.windows.as_ref();
        let own_pid = self.platform.processes.current_pid();
        let mut current = windows.top_window();
        let mut hops = 0;

        while let Some(handle) = current {
            if hops >= self.settings.max_window_hops {
                log_debug!("window walk stopped after {hops} windows");
                break;
            }

            if windows.is_visible(handle) {
                if let Some(path) = explorers.get(&handle) {
                    return Some(ConfidenceResult::strong(format!(
                        "Active Explorer Path: {}",
                        path.display()
                    )));
                }

                match self.inspect_window(handle, own_pid) {
                    Ok(Some(result)) => return Some(result),
                    Ok(None) => {}
                    Err(err) => log_debug!("skipping window {handle:?}: {err:#}"),
                }
            }

            current = windows.next_window(handle);
            hops += 1;
        }

        None
    }

    fn inspect_window(&self, handle: WindowHandle, own_pid: u32) -> Result<Option<ConfidenceResult>> {
        let windows = self.platform.windows.as_ref();
        let pid = windows.owner_pid(handle)?;
        if pid == own_pid {
            return Ok(None);
        }

        let process = self.platform.processes.process_name(pid)?;
        let process = process_stem(&process);
        let title = windows.title(handle)?;
        if title.is_empty() {
            return Ok(None);
        }

        if let Some(host) = self.settings.terminal_host(process) {
            return Ok(Some(self.describe_terminal(host, &title)));
        }

        if self.settings.is_ide(process) {
            return Ok(Some(ConfidenceResult::strong(format!(
                "Active IDE: {process} - {title}"
            ))));
        }

        Ok(None)
    }

    fn describe_terminal(&self, host: &TerminalHost, title: &str) -> ConfidenceResult {
        if is_shell_prompt_title(title) {
            let listing = status_text(
                self.platform.virtualization.as_ref(),
                self.settings.virtualization_timeout(),
            );
            let running = parse_running_distros(&listing);
            return ConfidenceResult::strong(describe_prompt_session(&host.label, title, &running));
        }

        ConfidenceResult::strong(format!(
            "Active Application: {} (running {})",
            host.label,
            shell_name_from_title(title)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn prompt_titles_match() {
        assert!(is_shell_prompt_title("alice@laptop:~/proj$"));
        assert!(is_shell_prompt_title("hayden@WDK2023:~"));
        assert!(is_shell_prompt_title("dev.user@build-01/srv"));
        assert!(!is_shell_prompt_title("PowerShell - Windows Terminal"));
        assert!(!is_shell_prompt_title("mail me@example.com: hi"));
        assert!(!is_shell_prompt_title("alice@laptop"));
    }

    #[test]
    fn shell_name_is_text_before_dash() {
        assert_eq!(shell_name_from_title("PowerShell - Windows Terminal"), "PowerShell");
        assert_eq!(shell_name_from_title("Command Prompt"), "Command Prompt");
        assert_eq!(shell_name_from_title(" - Windows Terminal"), "Unknown Shell");
    }

    #[test]
    fn prompt_session_descriptions() {
        let title = "alice@laptop:~/proj$";
        assert_eq!(
            describe_prompt_session("Windows Terminal", title, &["Ubuntu".to_string()]),
            "Active Application: Windows Terminal (running Ubuntu shell: alice@laptop:~/proj$)"
        );
        assert_eq!(
            describe_prompt_session(
                "Windows Terminal",
                title,
                &["Ubuntu".to_string(), "Debian".to_string()]
            ),
            "Active Application: Windows Terminal (running WSL shell: alice@laptop:~/proj$, possible distros: Ubuntu, Debian)"
        );
        assert_eq!(
            describe_prompt_session("Windows Terminal", title, &[]),
            "Active Application: Windows Terminal (running shell: alice@laptop:~/proj$)"
        );
    }
}
