use anyhow::Result;
use std::time::Duration;

use crate::platform::Virtualization;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Trimmed status listing from the virtualization subsystem.
pub fn query_status(provider: &dyn Virtualization, timeout: Duration) -> Result<String> {
    Ok(provider.status_report(timeout)?.trim().to_string())
}

/// Like [`query_status`], but a missing or disabled subsystem is just an
/// empty listing.
pub fn status_text(provider: &dyn Virtualization, timeout: Duration) -> String {
    match query_status(provider, timeout) {
        Ok(text) => text,
        Err(err) => {
            log_debug!("virtualization status unavailable: {err:#}");
            String::new()
        }
    }
}

/// Names of running distributions, in listing order.
///
/// Rows look like `* Ubuntu   Running   2`; the default marker is stripped,
/// and a row counts when it mentions `Running` and has a name plus at least
/// one more column.
pub fn parse_running_distros(report: &str) -> Vec<String> {
    report
        .lines()
        .filter_map(|line| {
            let row = line.trim().trim_start_matches('*').trim();
            if !row.to_ascii_lowercase().contains("running") {
                return None;
            }
            let mut columns = row.split_whitespace();
            let name = columns.next()?;
            columns.next()?;
            Some(name.to_string())
        })
        .collect()
}
