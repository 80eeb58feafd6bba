use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use crate::error::{ProbeError, ProbeOutcome};
use crate::metrics::{MetricsRecorder, Timed};
use crate::models::{ConfidenceResult, ContextReport, ContextReportBuilder, SectionKind, VisualSnapshot};
use crate::platform::Platform;
use crate::settings::EngineSettings;

use super::active_context::ActiveContextResolver;
use super::environment::{render_entries, system_summary, EnvironmentFilter};
use super::explorer::{contains_workspace_marker, list_open_folders, list_open_windows};
use super::process_scan::ProcessSignalScanner;
use super::virtualization::query_status;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const PROBE_ACTIVE_CONTEXT: &str = "active_context";
pub const PROBE_OPEN_FOLDERS: &str = "open_folders";
pub const PROBE_OPEN_WINDOWS: &str = "open_windows";
pub const PROBE_SCREEN_CAPTURE: &str = "screen_capture";
pub const PROBE_VIRTUALIZATION: &str = "virtualization_status";
pub const PROBE_PROCESS_SCAN: &str = "process_scan";
pub const PROBE_ENVIRONMENT: &str = "environment";

/// Answers "what is the user doing right now?" by escalating through the
/// probe tiers. Cheap to clone; every `resolve` queries the desktop afresh.
#[derive(Clone)]
pub struct ContextEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    platform: Platform,
    settings: EngineSettings,
}

impl ContextEngine {
    pub fn new(platform: Platform, settings: EngineSettings) -> Self {
        Self {
            inner: Arc::new(EngineInner { platform, settings }),
        }
    }

    /// Engine over this machine's native providers.
    pub fn native(settings: EngineSettings) -> Self {
        Self::new(Platform::native(), settings)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    /// Build a context report. Never fails: a crashed pipeline becomes a
    /// single-line diagnostic report. Dropping the returned future aborts the
    /// pipeline before its next tier starts.
    pub async fn resolve(&self) -> ContextReport {
        let engine = self.clone();
        let mut worker = AbortOnDrop(tokio::spawn(async move { engine.run_pipeline().await }));
        match (&mut worker.0).await {
            Ok(report) => report,
            Err(join_err) => {
                let reason = describe_join_error(&join_err);
                log_error!("context resolve worker stopped: {reason}");
                ContextReport::failure(reason)
            }
        }
    }

    /// [`resolve`](Self::resolve) with a caller-level deadline.
    pub async fn resolve_within(&self, timeout: Duration) -> ContextReport {
        match tokio::time::timeout(timeout, self.resolve()).await {
            Ok(report) => report,
            Err(_) => {
                log_warn!("context resolve exceeded {}ms", timeout.as_millis());
                ContextReport::failure(format!(
                    "context lookup timed out after {}ms",
                    timeout.as_millis()
                ))
            }
        }
    }

    async fn run_pipeline(&self) -> ContextReport {
        let settings = &self.inner.settings;
        let mut recorder = MetricsRecorder::new();

        // Tier 1: quick window-stack checks.
        let tier1_start = Instant::now();
        let tier1 = self.probe_active_context().await;
        recorder.record(PROBE_ACTIVE_CONTEXT, &tier1);
        let focus = match tier1.outcome {
            ProbeOutcome::Ok(result) => result,
            ProbeOutcome::Failed(err) => {
                log_warn!("{err}");
                ConfidenceResult::weak(format!("Error getting active context: {err}"))
            }
        };
        recorder.tier1(tier1_start.elapsed(), focus.strong);

        // Tier 2: folders always; windows and a screenshot only without a
        // strong signal.
        let tier2_start = Instant::now();
        let (folders, windows, snapshot) = if focus.strong {
            let folders = self.probe_open_folders().await;
            recorder.record(PROBE_OPEN_FOLDERS, &folders);
            (settle(folders), Vec::new(), None)
        } else {
            let (folders, windows, capture) = tokio::join!(
                self.probe_open_folders(),
                self.probe_open_windows(),
                self.probe_screen_capture()
            );
            recorder.record(PROBE_OPEN_FOLDERS, &folders);
            recorder.record(PROBE_OPEN_WINDOWS, &windows);
            recorder.record(PROBE_SCREEN_CAPTURE, &capture);
            (
                settle(folders),
                settle(windows),
                settle(capture).filter(|snapshot| !snapshot.is_empty()),
            )
        };
        recorder.tier2(tier2_start.elapsed());

        // Tier 3: heavy probes, only when context is weak or a development
        // workspace is open.
        let (wsl_listing, services) = if needs_heavy_probes(&focus, &folders, settings) {
            let tier3_start = Instant::now();
            let (wsl, services) = tokio::join!(
                self.probe_virtualization(),
                self.probe_process_scan()
            );
            recorder.record(PROBE_VIRTUALIZATION, &wsl);
            recorder.record(PROBE_PROCESS_SCAN, &services);
            recorder.tier3(tier3_start.elapsed());
            (settle(wsl), settle(services))
        } else {
            (String::new(), String::new())
        };

        let environment = self.probe_environment().await;
        recorder.record(PROBE_ENVIRONMENT, &environment);
        let (system, variables) = settle(environment);

        let metrics = recorder.finish();
        let report = ContextReportBuilder::new()
            .text(SectionKind::ActiveFocus, focus.text)
            .list(
                SectionKind::OpenFolders,
                folders.iter().map(|path| path.display().to_string()),
            )
            .list(SectionKind::OpenApplications, &windows)
            .text(SectionKind::WslDistros, wsl_listing)
            .text(SectionKind::BackgroundServices, services)
            .text(SectionKind::SystemEnvironment, system)
            .text(SectionKind::EnvironmentVariables, variables)
            .snapshot(snapshot)
            .build(metrics);

        log_info!(
            "Context {} resolved in {}ms (tier1: {}ms, tier2: {}ms, tier3: {}, strong: {}, sections: {})",
            report.request_id,
            report.metrics.total_ms,
            report.metrics.tier1_ms,
            report.metrics.tier2_ms.unwrap_or_default(),
            report
                .metrics
                .tier3_ms
                .map_or_else(|| "skipped".to_string(), |ms| format!("{ms}ms")),
            report.metrics.strong_context,
            report.sections().len()
        );

        report
    }

    async fn probe_active_context(&self) -> Timed<ConfidenceResult> {
        let inner = Arc::clone(&self.inner);
        run_probe(PROBE_ACTIVE_CONTEXT, self.inner.settings.tier1_timeout(), move || {
            Ok(ActiveContextResolver::new(&inner.platform, &inner.settings).resolve())
        })
        .await
    }

    async fn probe_open_folders(&self) -> Timed<Vec<PathBuf>> {
        let inner = Arc::clone(&self.inner);
        run_probe(PROBE_OPEN_FOLDERS, self.inner.settings.probe_timeout(), move || {
            list_open_folders(
                inner.platform.shell.as_ref(),
                &inner.settings.file_manager_process,
            )
        })
        .await
    }

    async fn probe_open_windows(&self) -> Timed<Vec<String>> {
        let inner = Arc::clone(&self.inner);
        run_probe(PROBE_OPEN_WINDOWS, self.inner.settings.probe_timeout(), move || {
            list_open_windows(
                inner.platform.windows.as_ref(),
                inner.platform.processes.current_pid(),
                &inner.settings.desktop_shell_title,
            )
        })
        .await
    }

    async fn probe_screen_capture(&self) -> Timed<Option<VisualSnapshot>> {
        let inner = Arc::clone(&self.inner);
        run_probe(PROBE_SCREEN_CAPTURE, self.inner.settings.probe_timeout(), move || {
            let bytes = inner.platform.screen.capture()?;
            Ok(Some(VisualSnapshot::new(bytes)))
        })
        .await
    }

    async fn probe_virtualization(&self) -> Timed<String> {
        let inner = Arc::clone(&self.inner);
        run_probe(PROBE_VIRTUALIZATION, self.inner.settings.probe_timeout(), move || {
            query_status(
                inner.platform.virtualization.as_ref(),
                inner.settings.virtualization_timeout(),
            )
        })
        .await
    }

    async fn probe_process_scan(&self) -> Timed<String> {
        let inner = Arc::clone(&self.inner);
        run_probe(PROBE_PROCESS_SCAN, self.inner.settings.probe_timeout(), move || {
            ProcessSignalScanner::new(
                inner.platform.processes.as_ref(),
                &inner.settings.interesting_processes,
            )
            .scan()
        })
        .await
    }

    /// System summary and filtered variables.
    async fn probe_environment(&self) -> Timed<(String, String)> {
        let inner = Arc::clone(&self.inner);
        run_probe(PROBE_ENVIRONMENT, self.inner.settings.probe_timeout(), move || {
            let host = inner.platform.host.as_ref();
            let entries = EnvironmentFilter::new(&inner.settings).collect(host)?;
            Ok((system_summary(host), render_entries(&entries)))
        })
        .await
    }
}

/// Aborts the pipeline task when dropped.
struct AbortOnDrop(JoinHandle<ContextReport>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Tier 3 runs when tier 1 was weak or an open folder looks like a
/// development workspace.
pub fn needs_heavy_probes(
    focus: &ConfidenceResult,
    folders: &[PathBuf],
    settings: &EngineSettings,
) -> bool {
    !focus.strong
        || folders
            .iter()
            .any(|folder| contains_workspace_marker(folder, &settings.workspace_markers))
}

/// Value of a finished probe, or the empty value after logging why it failed.
fn settle<T: Default>(timed: Timed<T>) -> T {
    if let Some(err) = timed.outcome.error() {
        log_warn!("{err}");
    }
    timed.outcome.unwrap_or_default()
}

/// Runs a blocking provider call on the blocking pool, bounded by `timeout`.
/// A probe that overruns is abandoned; its eventual result is discarded.
async fn run_probe<T, F>(probe: &'static str, timeout: Duration, work: F) -> Timed<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let started = Instant::now();
    let worker = tokio::task::spawn_blocking(work);

    let outcome = match tokio::time::timeout(timeout, worker).await {
        Ok(Ok(Ok(value))) => ProbeOutcome::Ok(value),
        Ok(Ok(Err(err))) => ProbeOutcome::Failed(ProbeError::failed(probe, &err)),
        Ok(Err(join_err)) => ProbeOutcome::Failed(ProbeError::Worker {
            probe,
            reason: describe_join_error(&join_err),
        }),
        Err(_) => ProbeOutcome::Failed(ProbeError::TimedOut { probe, timeout }),
    };

    Timed {
        outcome,
        elapsed: started.elapsed(),
    }
}

fn describe_join_error(err: &JoinError) -> String {
    if err.is_cancelled() {
        return "task was cancelled".to_string();
    }
    if err.is_panic() {
        return "task panicked".to_string();
    }
    err.to_string()
}
