use anyhow::Result;
use std::path::{Path, PathBuf};
use url::Url;

use crate::platform::{process_stem, ShellWindows, WindowHandle, WindowStack};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// File-manager windows with the on-disk folder each one shows.
pub fn explorer_windows(
    shell: &dyn ShellWindows,
    file_manager: &str,
) -> Result<Vec<(WindowHandle, PathBuf)>> {
    let mut found = Vec::new();

    for window in shell.shell_windows()? {
        if !process_stem(&window.host_process).eq_ignore_ascii_case(file_manager) {
            continue;
        }
        let Some(path) = location_to_path(&window.location_url) else {
            log_debug!(
                "skipping shell window {:?} with non-file location {:?}",
                window.handle,
                window.location_url
            );
            continue;
        };
        if path.is_dir() {
            found.push((window.handle, path));
        }
    }

    Ok(found)
}

pub fn list_open_folders(shell: &dyn ShellWindows, file_manager: &str) -> Result<Vec<PathBuf>> {
    Ok(explorer_windows(shell, file_manager)?
        .into_iter()
        .map(|(_, path)| path)
        .collect())
}

/// Titles of visible top-level windows owned by other processes.
pub fn list_open_windows(
    windows: &dyn WindowStack,
    own_pid: u32,
    desktop_shell_title: &str,
) -> Result<Vec<String>> {
    let mut titles = Vec::new();

    for window in windows.enumerate_top_level()? {
        if !window.visible || window.owner_pid == own_pid {
            continue;
        }
        let title = match windows.title(window.handle) {
            Ok(title) => title,
            Err(err) => {
                log_debug!("skipping window {:?}: {err:#}", window.handle);
                continue;
            }
        };
        if title.trim().is_empty() || title == desktop_shell_title {
            continue;
        }
        titles.push(title);
    }

    Ok(titles)
}

/// Native path for a `file:` location URL; other schemes yield `None`.
pub fn location_to_path(location: &str) -> Option<PathBuf> {
    let url = Url::parse(location).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}

/// True when one of the path's segments is a workspace marker such as
/// `dev` or `repos`, compared case-insensitively.
pub fn contains_workspace_marker(path: &Path, markers: &[String]) -> bool {
    let normalized = format!(
        "/{}/",
        path.to_string_lossy().replace('\\', "/").to_lowercase()
    );
    markers
        .iter()
        .filter(|marker| !marker.is_empty())
        .any(|marker| normalized.contains(&format!("/{}/", marker.to_lowercase())))
}
