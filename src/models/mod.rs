pub mod confidence;
pub mod report;

pub use confidence::ConfidenceResult;
pub use report::{ContextReport, ContextReportBuilder, Section, SectionKind, VisualSnapshot};
