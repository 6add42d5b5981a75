//! JSON bridge to the device/plugin host.

use async_trait::async_trait;
use homewatch_traits::{
    BenchmarkProvider, DeviceInfo, DiagnosticsProvider, HostControl, PluginInfo, PluginRegistry,
    PluginStats, Result, StepOutcome,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::{endpoint, http_client, parse_base_url, send, send_json, with_bearer};

#[derive(Debug, Serialize)]
struct InstallRequest<'a> {
    version: &'a str,
}

#[derive(Debug, Deserialize)]
struct BenchmarkResponse {
    summary: String,
}

/// Host bridge client. Implements every host-side collaborator.
pub struct BridgeClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl BridgeClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        Ok(Self {
            client: http_client(),
            base_url: parse_base_url(base_url)?,
            token,
        })
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = endpoint(&self.base_url, segments)?;
        Ok(with_bearer(
            self.client.request(method, url),
            self.token.as_deref(),
        ))
    }

    async fn post_empty(&self, segments: &[&str]) -> Result<()> {
        send(self.request(Method::POST, segments)?).await?;
        Ok(())
    }
}

#[async_trait]
impl PluginRegistry for BridgeClient {
    async fn list_plugins(&self) -> Result<Vec<PluginInfo>> {
        send_json(self.request(Method::GET, &["plugins"])?).await
    }

    async fn restart_plugin(&self, name: &str) -> Result<()> {
        self.post_empty(&["plugins", name, "restart"]).await
    }

    async fn install_version(&self, name: &str, version: &str) -> Result<()> {
        let request = self
            .request(Method::POST, &["plugins", name, "install"])?
            .json(&InstallRequest { version });
        send(request).await?;
        Ok(())
    }

    async fn get_device(&self, id: &str) -> Result<Option<DeviceInfo>> {
        match send_json(self.request(Method::GET, &["devices", id])?).await {
            Ok(device) => Ok(Some(device)),
            Err(err) if err.is_not_found() => {
                debug!(device = %id, "Device not found on host");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn reboot_device(&self, id: &str) -> Result<()> {
        self.post_empty(&["devices", id, "reboot"]).await
    }

    async fn plugin_stats(&self) -> Result<PluginStats> {
        send_json(self.request(Method::GET, &["stats"])?).await
    }
}

#[async_trait]
impl DiagnosticsProvider for BridgeClient {
    async fn validate_device(&self, device_id: &str) -> Result<Vec<StepOutcome>> {
        send_json(self.request(Method::POST, &["devices", device_id, "validate"])?).await
    }

    async fn validate_system(&self) -> Result<Vec<StepOutcome>> {
        send_json(self.request(Method::POST, &["system", "validate"])?).await
    }
}

#[async_trait]
impl BenchmarkProvider for BridgeClient {
    async fn run_benchmark(&self) -> Result<String> {
        let response: BenchmarkResponse =
            send_json(self.request(Method::POST, &["benchmark"])?).await?;
        Ok(response.summary)
    }
}

#[async_trait]
impl HostControl for BridgeClient {
    async fn restart_self(&self) -> Result<()> {
        info!("Requesting scheduler restart");
        self.post_empty(&["restart"]).await
    }

    async fn restart_host_process(&self) -> Result<()> {
        info!("Requesting host process restart");
        self.post_empty(&["restart-host"]).await
    }
}
