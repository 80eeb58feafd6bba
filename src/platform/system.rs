use anyhow::{anyhow, bail, Context, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use super::{HostEnvironment, ProcessEntry, ProcessTable, Virtualization};

/// Process table backed by `sysinfo`. Every call takes a fresh snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoProcessTable;

impl SysinfoProcessTable {
    fn snapshot(target: ProcessesToUpdate<'_>) -> System {
        let mut system = System::new();
        // everything() so names and exe paths are populated
        system.refresh_processes_specifics(target, ProcessRefreshKind::everything());
        system
    }

    fn single(pid: u32) -> (System, Pid) {
        let pid = Pid::from_u32(pid);
        (Self::snapshot(ProcessesToUpdate::Some(&[pid])), pid)
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn current_pid(&self) -> u32 {
        std::process::id()
    }

    fn processes(&self) -> Result<Vec<ProcessEntry>> {
        let system = Self::snapshot(ProcessesToUpdate::All);
        Ok(system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
            })
            .collect())
    }

    fn process_name(&self, pid: u32) -> Result<String> {
        let (system, pid) = Self::single(pid);
        system
            .process(pid)
            .map(|process| process.name().to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("process {} is not running", pid.as_u32()))
    }

    fn executable_path(&self, pid: u32) -> Result<Option<PathBuf>> {
        let (system, pid) = Self::single(pid);
        let process = system
            .process(pid)
            .ok_or_else(|| anyhow!("process {} is not running", pid.as_u32()))?;
        Ok(process.exe().map(|path| path.to_path_buf()))
    }
}

/// Runs the WSL status listing (`wsl.exe --list --verbose`).
#[derive(Debug, Clone)]
pub struct WslCli {
    program: String,
    args: Vec<String>,
}

impl Default for WslCli {
    fn default() -> Self {
        Self::new("wsl.exe", ["--list", "--verbose"])
    }
}

impl WslCli {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Virtualization for WslCli {
    fn status_report(&self, timeout: Duration) -> Result<String> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        hide_console(&mut command);

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to start {}", self.program))?;
        let mut stdout = child
            .stdout
            .take()
            .context("status command stdout was not captured")?;

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("desk-context-wsl".into())
            .spawn(move || {
                let mut buffer = Vec::new();
                let result = stdout.read_to_end(&mut buffer).map(|_| buffer);
                let _ = tx.send(result);
            })
            .context("failed to spawn status output reader")?;

        let received = rx.recv_timeout(timeout);
        // Never wait on a child that is still running.
        if !matches!(child.try_wait(), Ok(Some(_))) {
            let _ = child.kill();
            let _ = child.wait();
        }

        match received {
            Ok(Ok(bytes)) => Ok(decode_output(&bytes)),
            Ok(Err(err)) => Err(err).context("failed to read status output"),
            Err(_) => bail!(
                "{} did not finish within {}ms",
                self.program,
                timeout.as_millis()
            ),
        }
    }
}

#[cfg(windows)]
fn hide_console(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console(_command: &mut Command) {}

/// `wsl.exe` writes UTF-16LE; other tools write UTF-8. NULs are dropped
/// either way.
pub fn decode_output(bytes: &[u8]) -> String {
    let text = if looks_like_utf16le(bytes) {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    };

    text.trim_start_matches('\u{feff}')
        .replace('\0', "")
        .trim()
        .to_string()
}

fn looks_like_utf16le(bytes: &[u8]) -> bool {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return false;
    }
    if bytes.starts_with(&[0xff, 0xfe]) {
        return true;
    }
    let high_zeros = bytes.iter().skip(1).step_by(2).filter(|b| **b == 0).count();
    high_zeros * 2 > bytes.len() / 2
}

/// Host queries served from the process environment and `sysinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostEnvironment for SystemHost {
    fn var(&self, name: &str) -> Result<Option<String>> {
        Ok(std::env::var_os(name).map(|value| value.to_string_lossy().into_owned()))
    }

    fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().context("failed to read current directory")
    }

    fn os_description(&self) -> String {
        System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string())
    }

    fn user_name(&self) -> Option<String> {
        ["USERNAME", "USER"]
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|value| !value.is_empty()))
    }
}
