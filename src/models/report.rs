use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::metrics::ResolveMetrics;

/// Report sections. The declaration order is the rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    ActiveFocus,
    OpenFolders,
    OpenApplications,
    WslDistros,
    BackgroundServices,
    SystemEnvironment,
    EnvironmentVariables,
}

impl SectionKind {
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::ActiveFocus => "Active Focus",
            SectionKind::OpenFolders => "Open Folders",
            SectionKind::OpenApplications => "Open Applications",
            SectionKind::WslDistros => "WSL Distros",
            SectionKind::BackgroundServices => "Background Services",
            SectionKind::SystemEnvironment => "System Environment",
            SectionKind::EnvironmentVariables => "Environment Variables",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub kind: SectionKind,
    pub body: String,
}

/// Opaque encoded screen image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisualSnapshot {
    #[serde(serialize_with = "serialize_base64")]
    data: Vec<u8>,
}

impl VisualSnapshot {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The payload as standard base64, the form chat requests attach.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

fn serialize_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(data))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextReport {
    pub request_id: Uuid,
    pub captured_at: DateTime<Utc>,
    sections: Vec<Section>,
    snapshot: Option<VisualSnapshot>,
    pub metrics: ResolveMetrics,
}

impl ContextReport {
    /// Report for a lookup that failed outright.
    pub fn failure(message: impl fmt::Display) -> Self {
        ContextReportBuilder::new()
            .text(
                SectionKind::ActiveFocus,
                format!("Error retrieving context: {message}"),
            )
            .build(ResolveMetrics::default())
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> Option<&str> {
        self.sections
            .iter()
            .find(|section| section.kind == kind)
            .map(|section| section.body.as_str())
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.section(kind).is_some()
    }

    pub fn snapshot(&self) -> Option<&VisualSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn into_parts(self) -> (String, Option<VisualSnapshot>) {
        let text = self.to_string();
        (text, self.snapshot)
    }
}

impl fmt::Display for ContextReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, section) in self.sections.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section.kind.title())?;
            writeln!(f, "{}", section.body)?;
        }
        Ok(())
    }
}

/// Accumulates sections during a resolve. Empty bodies are dropped and the
/// final order follows `SectionKind` whatever the insertion order was.
#[derive(Debug, Default)]
pub struct ContextReportBuilder {
    sections: BTreeMap<SectionKind, String>,
    snapshot: Option<VisualSnapshot>,
}

impl ContextReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, kind: SectionKind, body: impl Into<String>) -> Self {
        let body = body.into();
        let trimmed = body.trim_end();
        if !trimmed.trim_start().is_empty() {
            self.sections.insert(kind, trimmed.to_string());
        }
        self
    }

    /// One `- item` line per non-blank entry.
    pub fn list<I, S>(self, kind: SectionKind, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let body = items
            .into_iter()
            .filter(|item| !item.as_ref().trim().is_empty())
            .map(|item| format!("- {}", item.as_ref()))
            .collect::<Vec<_>>()
            .join("\n");
        self.text(kind, body)
    }

    pub fn snapshot(mut self, snapshot: Option<VisualSnapshot>) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn build(self, metrics: ResolveMetrics) -> ContextReport {
        ContextReport {
            request_id: Uuid::new_v4(),
            captured_at: Utc::now(),
            sections: self
                .sections
                .into_iter()
                .map(|(kind, body)| Section { kind, body })
                .collect(),
            snapshot: self.snapshot,
            metrics,
        }
    }
}
