use anyhow::Result;

use crate::platform::{process_stem, Accessibility, ProcessTable, UiElement};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Parent hops allowed while looking for the element's window.
const MAX_ANCESTOR_HOPS: usize = 64;

/// Describes the focused UI element when nothing stronger is known.
pub struct AccessibilityResolver<'a> {
    accessibility: &'a dyn Accessibility,
    processes: &'a dyn ProcessTable,
    value_limit: usize,
}

impl<'a> AccessibilityResolver<'a> {
    pub fn new(
        accessibility: &'a dyn Accessibility,
        processes: &'a dyn ProcessTable,
        value_limit: usize,
    ) -> Self {
        Self {
            accessibility,
            processes,
            value_limit,
        }
    }

    /// `Active Focus (Accessibility): ...`, or empty when there is no focused
    /// element or the accessibility API fails.
    pub fn resolve(&self) -> String {
        match self.try_resolve() {
            Ok(text) => text,
            Err(err) => {
                log_debug!("accessibility context failed: {err:#}");
                String::new()
            }
        }
    }

    fn try_resolve(&self) -> Result<String> {
        let Some(element) = self.accessibility.focused_element()? else {
            return Ok(String::new());
        };

        let mut fragments = Vec::new();

        if !element.name.is_empty() {
            fragments.push(format!("Focused Element: {}", element.name));
        }

        let control_type = element
            .control_type
            .strip_prefix("ControlType.")
            .unwrap_or(element.control_type.as_str());
        if !control_type.is_empty() {
            fragments.push(format!("Type: {control_type}"));
        }

        if !element.automation_id.is_empty() {
            fragments.push(format!("Control ID: {}", element.automation_id));
        }

        if let Some(value) = element.value.as_deref() {
            if !value.is_empty() && value.chars().count() <= self.value_limit {
                fragments.push(format!("Current Value: {value}"));
            }
        }

        match self.ancestor_window_name(&element) {
            Ok(Some(name)) if !name.is_empty() => fragments.push(format!("Window: {name}")),
            Ok(_) => {}
            Err(err) => log_debug!("accessibility parent walk failed: {err:#}"),
        }

        if element.process_id > 0 {
            self.push_process_fragments(element.process_id, &mut fragments);
        }

        if fragments.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(
            "Active Focus (Accessibility): {}",
            fragments.join(" | ")
        ))
    }

    fn ancestor_window_name(&self, element: &UiElement) -> Result<Option<String>> {
        let mut current = Some(element.clone());
        let mut hops = 0;

        while let Some(candidate) = current {
            if candidate.is_window {
                return Ok(Some(candidate.name));
            }
            if hops >= MAX_ANCESTOR_HOPS {
                break;
            }
            current = self.accessibility.parent(&candidate)?;
            hops += 1;
        }

        Ok(None)
    }

    fn push_process_fragments(&self, pid: u32, fragments: &mut Vec<String>) {
        let name = match self.processes.process_name(pid) {
            Ok(name) => name,
            Err(err) => {
                // process may have exited
                log_debug!("accessibility process lookup failed for {pid}: {err:#}");
                return;
            }
        };
        fragments.push(format!("Application: {}", process_stem(&name)));

        match self.processes.executable_path(pid) {
            Ok(Some(path)) => {
                if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    fragments.push(format!("App Path: {}", dir.display()));
                }
            }
            Ok(None) => {}
            Err(err) => log_debug!("executable path unavailable for {pid}: {err:#}"),
        }
    }
}
