//! Device/plugin host abstractions.
//!
//! The host owns installed plugins and the devices they expose. The core only
//! queries it and asks for restarts, reboots and installs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Interface name advertised by devices that can be rebooted.
pub const REBOOT_INTERFACE: &str = "Reboot";

/// An installed plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub id: String,
    /// Package name, also used as the restart/install key.
    pub name: String,
    pub version: String,
}

/// A device known to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub interfaces: Vec<String>,
}

impl DeviceInfo {
    pub fn can_reboot(&self) -> bool {
        self.interfaces.iter().any(|i| i == REBOOT_INTERFACE)
    }
}

/// One named counter in a stats snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    pub name: String,
    pub count: u64,
}

impl StatEntry {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStats {
    #[serde(default)]
    pub workers: Vec<StatEntry>,
    #[serde(default)]
    pub devices: Vec<StatEntry>,
}

/// Runtime snapshot of the plugin host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginStats {
    #[serde(default)]
    pub rpc_objects: Vec<StatEntry>,
    #[serde(default)]
    pub pending_results: Vec<StatEntry>,
    #[serde(default)]
    pub connections: Vec<StatEntry>,
    /// Absent when the host runs without clustering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterStats>,
}

#[async_trait]
pub trait PluginRegistry: Send + Sync {
    async fn list_plugins(&self) -> Result<Vec<PluginInfo>>;
    async fn restart_plugin(&self, name: &str) -> Result<()>;
    async fn install_version(&self, name: &str, version: &str) -> Result<()>;
    /// `Ok(None)` when no device has this id.
    async fn get_device(&self, id: &str) -> Result<Option<DeviceInfo>>;
    async fn reboot_device(&self, id: &str) -> Result<()>;
    async fn plugin_stats(&self) -> Result<PluginStats>;
}

/// Classification of a single validation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Warn,
    Error,
}

/// Structured outcome of one validation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StepOutcome {
    pub fn new(step: impl Into<String>, status: StepStatus, message: Option<String>) -> Self {
        Self {
            step: step.into(),
            status,
            message,
        }
    }
}

#[async_trait]
pub trait DiagnosticsProvider: Send + Sync {
    async fn validate_device(&self, device_id: &str) -> Result<Vec<StepOutcome>>;
    async fn validate_system(&self) -> Result<Vec<StepOutcome>>;
}

#[async_trait]
pub trait BenchmarkProvider: Send + Sync {
    /// Runs the host benchmark and returns its rendered summary.
    async fn run_benchmark(&self) -> Result<String>;
}

/// Process-level restart control.
#[async_trait]
pub trait HostControl: Send + Sync {
    /// Restart the plugin that runs this scheduler.
    async fn restart_self(&self) -> Result<()>;
    /// Restart the whole host process.
    async fn restart_host_process(&self) -> Result<()>;
}
