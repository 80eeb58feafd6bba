use anyhow::{Context, Result};
use serde::Serialize;

use crate::platform::HostEnvironment;
use crate::settings::EngineSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentEntry {
    pub name: String,
    pub value: String,
}

/// Reads the allow-listed variables and tidies PATH for display.
pub struct EnvironmentFilter<'a> {
    settings: &'a EngineSettings,
}

impl<'a> EnvironmentFilter<'a> {
    pub fn new(settings: &'a EngineSettings) -> Self {
        Self { settings }
    }

    /// Present, non-empty variables in allow-list order.
    pub fn collect(&self, host: &dyn HostEnvironment) -> Result<Vec<EnvironmentEntry>> {
        let mut entries = Vec::new();
        for name in &self.settings.environment_allow_list {
            let value = host
                .var(name)
                .with_context(|| format!("failed to read environment variable {name}"))?;
            let Some(value) = value.filter(|value| !value.is_empty()) else {
                continue;
            };

            let value = if name.eq_ignore_ascii_case("PATH") {
                filter_path_value(
                    &value,
                    self.settings.path_separator,
                    &self.settings.path_noise_segments,
                    self.settings.path_display_limit,
                )
            } else {
                value
            };

            entries.push(EnvironmentEntry {
                name: name.clone(),
                value,
            });
        }
        Ok(entries)
    }
}

/// Drops system directories from a PATH value, then truncates it to `limit`
/// characters followed by `...`.
pub fn filter_path_value(value: &str, separator: char, noise: &[String], limit: usize) -> String {
    let noise: Vec<String> = noise.iter().map(|segment| segment.to_lowercase()).collect();
    let kept: Vec<&str> = value
        .split(separator)
        .filter(|part| !part.is_empty())
        .filter(|part| {
            let lowered = part.to_lowercase();
            !noise.iter().any(|segment| lowered.contains(segment.as_str()))
        })
        .collect();

    truncate_chars(&kept.join(&separator.to_string()), limit)
}

fn truncate_chars(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let head: String = value.chars().take(limit).collect();
    format!("{head}...")
}

pub fn render_entries(entries: &[EnvironmentEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{}={}", entry.name, entry.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Body of the System Environment section.
pub fn system_summary(host: &dyn HostEnvironment) -> String {
    let mut lines = vec![format!("OS: {}", host.os_description())];
    if let Some(user) = host.user_name() {
        lines.push(format!("User: {user}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::path::PathBuf;

    struct Vars(HashMap<&'static str, &'static str>);

    impl HostEnvironment for Vars {
        fn var(&self, name: &str) -> Result<Option<String>> {
            Ok(self.0.get(name).map(|value| value.to_string()))
        }

        fn current_dir(&self) -> Result<PathBuf> {
            Ok(PathBuf::from("/work"))
        }

        fn os_description(&self) -> String {
            "Windows 11 Pro".into()
        }

        fn user_name(&self) -> Option<String> {
            Some("alice".into())
        }
    }

    fn windows_settings() -> EngineSettings {
        EngineSettings {
            path_separator: ';',
            ..EngineSettings::default()
        }
    }

    #[test]
    fn path_drops_system_directories() {
        let settings = windows_settings();
        let filtered = filter_path_value(
            r"C:\Windows\System32;C:\MyTools",
            ';',
            &settings.path_noise_segments,
            300,
        );
        assert_eq!(filtered, r"C:\MyTools");
    }

    #[test]
    fn path_noise_match_ignores_case() {
        let settings = windows_settings();
        let filtered = filter_path_value(
            r"c:\windows\system32\wbem;;D:\tools\bin;C:\WINDOWS",
            ';',
            &settings.path_noise_segments,
            300,
        );
        assert_eq!(filtered, r"D:\tools\bin");
    }

    #[test]
    fn long_path_is_truncated_with_ellipsis() {
        let long_dir = format!(r"D:\{}", "x".repeat(400));
        let filtered = filter_path_value(&long_dir, ';', &[], 300);
        assert_eq!(filtered.chars().count(), 303);
        assert!(filtered.ends_with("..."));
    }

    #[test]
    fn only_present_allow_listed_variables_are_kept() {
        let host = Vars(HashMap::from([
            ("PATH", r"C:\Windows\System32;C:\MyTools"),
            ("NODE_ENV", "development"),
            ("JAVA_HOME", ""),
            ("SECRET_TOKEN", "hunter2"),
        ]));
        let settings = windows_settings();
        let entries = EnvironmentFilter::new(&settings).collect(&host).unwrap();

        assert_eq!(
            render_entries(&entries),
            "PATH=C:\\MyTools\nNODE_ENV=development"
        );
    }

    #[test]
    fn nothing_set_yields_no_entries() {
        let host = Vars(HashMap::new());
        let settings = windows_settings();
        let entries = EnvironmentFilter::new(&settings).collect(&host).unwrap();
        assert!(entries.is_empty());
        assert_eq!(render_entries(&entries), "");
    }

    #[test]
    fn system_summary_lists_os_and_user() {
        let host = Vars(HashMap::new());
        assert_eq!(system_summary(&host), "OS: Windows 11 Pro\nUser: alice");
    }
}
