use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProbeStatus {
    Ok,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeMetric {
    pub probe: String,
    pub elapsed_ms: u64,
    pub status: ProbeStatus,
    pub detail: Option<String>,
}

/// Timings for one `resolve` call. Tier fields are `None` when the tier did
/// not run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolveMetrics {
    pub tier1_ms: u64,
    pub tier2_ms: Option<u64>,
    pub tier3_ms: Option<u64>,
    pub total_ms: u64,
    pub strong_context: bool,
    pub probes: Vec<ProbeMetric>,
}

impl ResolveMetrics {
    pub fn probe(&self, name: &str) -> Option<&ProbeMetric> {
        self.probes.iter().find(|metric| metric.probe == name)
    }

    pub fn ran(&self, name: &str) -> bool {
        self.probe(name).is_some()
    }
}
