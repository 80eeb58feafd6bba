use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

/// A process that hosts terminal sessions, with the label used in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalHost {
    pub process: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Upper bound for the whole active-context walk.
    pub tier1_timeout_ms: u64,
    /// Upper bound for each tier 2 and tier 3 probe.
    pub probe_timeout_ms: u64,
    /// How long the virtualization status command may run before it is killed.
    pub virtualization_timeout_ms: u64,
    /// Maximum number of windows inspected while walking the Z-order.
    pub max_window_hops: usize,

    pub terminal_hosts: Vec<TerminalHost>,
    pub ide_processes: Vec<String>,
    pub file_manager_process: String,
    pub desktop_shell_title: String,

    pub interesting_processes: Vec<String>,
    pub workspace_markers: Vec<String>,

    pub environment_allow_list: Vec<String>,
    pub path_noise_segments: Vec<String>,
    pub path_separator: char,
    pub path_display_limit: usize,

    /// Longest accessibility value that is still reported.
    pub value_display_limit: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tier1_timeout_ms: 2_000,
            probe_timeout_ms: 3_000,
            virtualization_timeout_ms: 1_000,
            max_window_hops: 100,
            terminal_hosts: vec![TerminalHost {
                process: "WindowsTerminal".into(),
                label: "Windows Terminal".into(),
            }],
            ide_processes: strings(&["Code", "devenv", "rider64"]),
            file_manager_process: "explorer".into(),
            desktop_shell_title: "Program Manager".into(),
            interesting_processes: strings(&[
                "docker",
                "dockerd",
                "wslservice",
                "python",
                "node",
                "java",
                "postgres",
                "mysqld",
                "sqlservr",
                "nginx",
                "httpd",
                "adb",
            ]),
            workspace_markers: strings(&["dev", "projects", "source", "repos"]),
            environment_allow_list: strings(&[
                "PATH",
                "PYTHONPATH",
                "NODE_ENV",
                "JAVA_HOME",
                "GOPATH",
                "CARGO_HOME",
                "DOTNET_ROOT",
                "DOTNET_CLI_HOME",
                "DOTNET_INSTALL_DIR",
                "MSBuildSDKsPath",
            ]),
            path_noise_segments: strings(&[
                r"\Windows\System32",
                r"\Windows\SysWOW64",
                r"\Windows\Wbem",
                r"\Windows\System32\Wbem",
                r"\Windows\System32\WindowsPowerShell",
                r"\Windows\System32\OpenSSH",
                r"C:\Windows",
                r"\Program Files\Common Files",
                r"\Common Files\Oracle\Java",
                r"\System32\Dism",
            ]),
            path_separator: if cfg!(windows) { ';' } else { ':' },
            path_display_limit: 300,
            value_display_limit: 100,
        }
    }
}

impl EngineSettings {
    pub fn tier1_timeout(&self) -> Duration {
        Duration::from_millis(self.tier1_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn virtualization_timeout(&self) -> Duration {
        Duration::from_millis(self.virtualization_timeout_ms)
    }

    pub fn terminal_host(&self, process: &str) -> Option<&TerminalHost> {
        self.terminal_hosts
            .iter()
            .find(|host| host.process.eq_ignore_ascii_case(process))
    }

    pub fn is_ide(&self, process: &str) -> bool {
        self.ide_processes
            .iter()
            .any(|ide| ide.eq_ignore_ascii_case(process))
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

/// File-backed settings. A missing or unreadable-as-JSON file yields defaults.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<EngineSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring invalid settings in {}: {err}; using defaults",
                    path.display()
                );
                EngineSettings::default()
            })
        } else {
            EngineSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> EngineSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, settings: EngineSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: EngineSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &EngineSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create settings directory {}", parent.display())
                })?;
            }
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
