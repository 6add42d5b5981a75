use super::ipc_protocol::{IpcRequest, IpcResponse, read_frame, write_frame};
use crate::models::ExecutionOutcome;
use crate::services::TaskSummary;
use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use std::path::Path;

#[cfg(unix)]
use tokio::net::UnixStream;

/// Client side of the daemon socket.
#[cfg(unix)]
pub struct IpcClient {
    stream: UnixStream,
}

#[cfg(unix)]
impl IpcClient {
    pub async fn connect(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path)
            .await
            .context("Failed to connect to daemon. Is it running?")?;
        Ok(Self { stream })
    }

    pub async fn request(&mut self, req: IpcRequest) -> Result<IpcResponse> {
        write_frame(&mut self.stream, &req).await?;
        match read_frame(&mut self.stream).await? {
            Some(response) => Ok(response),
            None => bail!("Daemon closed the connection"),
        }
    }

    pub async fn ping(&mut self) -> bool {
        matches!(self.request(IpcRequest::Ping).await, Ok(IpcResponse::Pong))
    }

    async fn request_typed<T: DeserializeOwned>(&mut self, req: IpcRequest) -> Result<T> {
        match self.request(req).await? {
            IpcResponse::Success(value) => {
                serde_json::from_value(value).context("Failed to deserialize response")
            }
            IpcResponse::Pong => bail!("Unexpected Pong response"),
            IpcResponse::Error { message, .. } => bail!(message),
        }
    }

    pub async fn list_tasks(&mut self) -> Result<Vec<TaskSummary>> {
        self.request_typed(IpcRequest::ListTasks).await
    }

    pub async fn set_task_field(&mut self, name: &str, field: &str, value: &str) -> Result<()> {
        let _: serde_json::Value = self
            .request_typed(IpcRequest::SetTaskField {
                name: name.to_string(),
                field: field.to_string(),
                value: value.to_string(),
            })
            .await?;
        Ok(())
    }

    pub async fn remove_task(&mut self, name: &str) -> Result<()> {
        let _: serde_json::Value = self
            .request_typed(IpcRequest::RemoveTask {
                name: name.to_string(),
            })
            .await?;
        Ok(())
    }

    pub async fn run_task(&mut self, name: &str) -> Result<ExecutionOutcome> {
        self.request_typed(IpcRequest::RunTask {
            name: name.to_string(),
        })
        .await
    }
}

/// Whether a daemon answers on `socket_path`.
#[cfg(unix)]
pub async fn is_daemon_available(socket_path: &Path) -> bool {
    if !socket_path.exists() {
        return false;
    }
    match IpcClient::connect(socket_path).await {
        Ok(mut client) => client.ping().await,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub async fn is_daemon_available(_socket_path: &Path) -> bool {
    false
}
