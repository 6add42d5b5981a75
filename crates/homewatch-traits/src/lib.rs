//! Homewatch Traits - Collaborator interfaces and shared value types.
//!
//! This crate provides the seams between the scheduling core and the outside
//! world:
//! - ConfigStore for the flat `task:<name>:<field>` key-value configuration
//! - PluginRegistry, DiagnosticsProvider, BenchmarkProvider and HostControl
//!   for the device/plugin host
//! - HomeAssistantSource for entity states and calendars
//! - PackageRegistry for published plugin versions
//! - NotificationSink for delivering reports

pub mod error;
pub mod home_assistant;
pub mod host;
pub mod notify;
pub mod package;
pub mod store;

// ── Top-level re-exports ─────────────────────────────────────────────

pub use error::{CollaboratorError, Result};

pub use home_assistant::{CalendarEvent, EntityState, HomeAssistantSource};
pub use host::{
    BenchmarkProvider, ClusterStats, DeviceInfo, DiagnosticsProvider, HostControl, PluginInfo,
    PluginRegistry, PluginStats, StatEntry, StepOutcome, StepStatus,
};
pub use notify::{NotificationPriority, NotificationSink};
pub use package::{PackageRegistry, PackageVersion};
pub use store::ConfigStore;
