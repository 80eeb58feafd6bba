use anyhow::Result;
use std::collections::BTreeSet;

use crate::platform::{process_stem, ProcessTable};

/// Scans the process table for infrastructure and runtime processes worth
/// mentioning (container engines, interpreters, databases, web servers).
pub struct ProcessSignalScanner<'a> {
    processes: &'a dyn ProcessTable,
    interesting: &'a [String],
}

impl<'a> ProcessSignalScanner<'a> {
    pub fn new(processes: &'a dyn ProcessTable, interesting: &'a [String]) -> Self {
        Self {
            processes,
            interesting,
        }
    }

    /// Sorted, deduplicated, comma-separated names; empty when nothing matched.
    pub fn scan(&self) -> Result<String> {
        let mut found = BTreeSet::new();

        for entry in self.processes.processes()? {
            let stem = process_stem(&entry.name);
            if let Some(name) = self
                .interesting
                .iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(stem))
            {
                found.insert(name.as_str());
            }
        }

        Ok(found.into_iter().collect::<Vec<_>>().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ProcessEntry;
    use crate::settings::EngineSettings;
    use anyhow::bail;
    use std::path::PathBuf;

    struct Table(Vec<&'static str>);

    impl ProcessTable for Table {
        fn current_pid(&self) -> u32 {
            1
        }

        fn processes(&self) -> Result<Vec<ProcessEntry>> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(index, name)| ProcessEntry {
                    pid: index as u32 + 10,
                    name: name.to_string(),
                })
                .collect())
        }

        fn process_name(&self, _pid: u32) -> Result<String> {
            bail!("unused")
        }

        fn executable_path(&self, _pid: u32) -> Result<Option<PathBuf>> {
            Ok(None)
        }
    }

    #[test]
    fn matches_are_sorted_and_deduplicated() {
        let settings = EngineSettings::default();
        let table = Table(vec![
            "node.exe",
            "explorer.exe",
            "Docker",
            "node",
            "postgres.exe",
            "chrome.exe",
        ]);
        let scanner = ProcessSignalScanner::new(&table, &settings.interesting_processes);
        assert_eq!(scanner.scan().unwrap(), "docker, node, postgres");
    }

    #[test]
    fn no_matches_is_empty() {
        let settings = EngineSettings::default();
        let table = Table(vec!["explorer.exe", "svchost.exe"]);
        let scanner = ProcessSignalScanner::new(&table, &settings.interesting_processes);
        assert_eq!(scanner.scan().unwrap(), "");
    }
}
