pub mod accessibility;
pub mod active_context;
pub mod controller;
pub mod environment;
pub mod explorer;
pub mod process_scan;
pub mod virtualization;

pub use accessibility::AccessibilityResolver;
pub use active_context::ActiveContextResolver;
pub use controller::{needs_heavy_probes, ContextEngine};
pub use environment::{EnvironmentEntry, EnvironmentFilter};
pub use explorer::{list_open_folders, list_open_windows};
pub use process_scan::ProcessSignalScanner;
pub use virtualization::parse_running_distros;
