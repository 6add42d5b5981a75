//! Daemon IPC: CLI invocations talk to a running `homewatch start` over a
//! Unix socket instead of opening the locked database themselves.

mod ipc_client;
mod ipc_protocol;
#[cfg(unix)]
mod ipc_server;

#[cfg(unix)]
pub use ipc_client::IpcClient;
pub use ipc_client::is_daemon_available;
pub use ipc_protocol::{IpcRequest, IpcResponse, MAX_MESSAGE_SIZE, read_frame, write_frame};
#[cfg(unix)]
pub use ipc_server::IpcServer;
