//! Tiered desktop context inference.
//!
//! [`ContextEngine::resolve`] answers "what is the user doing right now?" for
//! a chat request. It always inspects the window stack, and escalates to
//! window/folder enumeration, a screenshot, the WSL status listing and a
//! process scan only when the cheaper signals are not conclusive.

mod error;
pub mod metrics;
pub mod models;
pub mod platform;
pub mod sensing;
pub mod settings;
mod utils;

pub use error::{ProbeError, ProbeOutcome};
pub use metrics::{ProbeMetric, ProbeStatus, ResolveMetrics};
pub use models::{ConfidenceResult, ContextReport, Section, SectionKind, VisualSnapshot};
pub use platform::Platform;
pub use sensing::ContextEngine;
pub use settings::{EngineSettings, SettingsStore};
pub use utils::logging::{debug_requested, init_logging};
