use super::ipc_protocol::{IpcRequest, IpcResponse, read_frame, write_frame};
use crate::HomewatchCore;
use crate::services::TaskServiceError;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Serves task administration to CLI invocations while the daemon owns the database.
pub struct IpcServer {
    core: Arc<HomewatchCore>,
    socket_path: PathBuf,
}

impl IpcServer {
    pub fn new(core: Arc<HomewatchCore>, socket_path: PathBuf) -> Self {
        Self { core, socket_path }
    }

    /// Bind the socket. A stale socket file from a previous run is replaced.
    pub fn bind(&self) -> Result<UnixListener> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }
        let listener = UnixListener::bind(&self.socket_path)?;

        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o600))?;

        info!(path = %self.socket_path.display(), "IPC server started");
        Ok(listener)
    }

    /// Accept clients until `cancel` fires, then remove the socket file.
    pub async fn serve(&self, listener: UnixListener, cancel: CancellationToken) {
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let core = self.core.clone();
                            tokio::spawn(async move {
                                if let Err(err) = Self::handle_client(stream, core).await {
                                    debug!(error = %err, "Client disconnected");
                                }
                            });
                        }
                        Err(err) => error!(error = %err, "IPC accept error"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!("IPC server shutting down");
                    break;
                }
            }
        }

        let _ = std::fs::remove_file(&self.socket_path);
    }

    async fn handle_client(mut stream: UnixStream, core: Arc<HomewatchCore>) -> Result<()> {
        while let Some(request) = read_frame::<_, IpcRequest>(&mut stream).await? {
            let response = Self::process(&core, request).await;
            write_frame(&mut stream, &response).await?;
        }
        Ok(())
    }

    async fn process(core: &HomewatchCore, request: IpcRequest) -> IpcResponse {
        debug!(request = ?request, "IPC request");
        let result = match request {
            IpcRequest::Ping => return IpcResponse::Pong,
            IpcRequest::ListTasks => core.tasks.list_tasks().map(IpcResponse::success),
            IpcRequest::SetTaskField { name, field, value } => core
                .tasks
                .set_field(&name, &field, &value)
                .map(|()| IpcResponse::ok()),
            IpcRequest::RemoveTask { name } => {
                core.tasks.remove_task(&name).map(|()| IpcResponse::ok())
            }
            IpcRequest::RunTask { name } => core
                .tasks
                .run_task_now(&name)
                .await
                .map(IpcResponse::success),
        };
        result.unwrap_or_else(|err| {
            let code = match err.downcast_ref::<TaskServiceError>() {
                Some(TaskServiceError::NotFound(_)) => 404,
                Some(TaskServiceError::UnknownField(_)) => 400,
                None => 500,
            };
            IpcResponse::error(code, format!("{:#}", err))
        })
    }
}
