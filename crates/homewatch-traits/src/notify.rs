//! Notification delivery.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Urgency attached to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        f.write_str(label)
    }
}

/// Sink that delivers one report to one notifier target.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(
        &self,
        target: &str,
        title: &str,
        body: &str,
        priority: Option<NotificationPriority>,
    ) -> Result<()>;
}
