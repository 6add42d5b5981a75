use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use homewatch_traits::{NotificationPriority, NotificationSink, Result};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{endpoint, http_client, parse_base_url, send, with_bearer};

pub const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh";

fn priority_header(priority: NotificationPriority) -> &'static str {
    match priority {
        NotificationPriority::Low => "low",
        NotificationPriority::Normal => "default",
        NotificationPriority::High => "high",
    }
}

/// Header-safe title: printable ASCII as-is, anything else as an RFC 2047
/// encoded word, which ntfy decodes.
fn title_header(title: &str) -> String {
    if title.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
        return title.to_string();
    }
    format!("=?UTF-8?B?{}?=", STANDARD.encode(title))
}

/// Publishes reports to ntfy topics; the notifier target is the topic name.
pub struct NtfyNotifier {
    client: Client,
    server: Url,
    token: Option<String>,
}

impl NtfyNotifier {
    pub fn new(server: &str, token: Option<String>) -> Result<Self> {
        Ok(Self {
            client: http_client(),
            server: parse_base_url(server)?,
            token,
        })
    }
}

#[async_trait]
impl NotificationSink for NtfyNotifier {
    async fn send(
        &self,
        target: &str,
        title: &str,
        body: &str,
        priority: Option<NotificationPriority>,
    ) -> Result<()> {
        let url = endpoint(&self.server, &[target])?;
        let mut request = self
            .client
            .post(url)
            .header("Title", title_header(title))
            .body(body.to_string());
        if let Some(priority) = priority {
            request = request.header("Priority", priority_header(priority));
        }

        send(with_bearer(request, self.token.as_deref())).await?;
        debug!(target = %target, "Notification published");
        Ok(())
    }
}
