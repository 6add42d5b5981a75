use anyhow::{Result, bail};
use homewatch_core::daemon::is_daemon_available;
use homewatch_core::engine::DEFAULT_POLL_INTERVAL;
use homewatch_core::paths;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::StartArgs;
use crate::config::CliConfig;
use crate::setup::prepare_core;

fn poll_interval(args: &StartArgs, config: &CliConfig) -> Duration {
    args.poll_interval
        .or(config.default.poll_interval_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}

/// Run the reconciler, cron timers and IPC server until Ctrl-C.
pub async fn run(db_path: Option<String>, args: StartArgs, config: &CliConfig) -> Result<()> {
    let socket_path = paths::socket_path()?;
    if is_daemon_available(&socket_path).await {
        bail!("Homewatch daemon is already running ({})", socket_path.display());
    }

    let core = prepare_core(db_path, config)?;
    let interval = poll_interval(&args, config);
    let handle = core.start_scheduler(interval).await?;
    let cancel = CancellationToken::new();

    #[cfg(unix)]
    let ipc = {
        let server = homewatch_core::daemon::IpcServer::new(core.clone(), socket_path);
        let listener = server.bind()?;
        let token = cancel.clone();
        tokio::spawn(async move { server.serve(listener, token).await })
    };

    println!("Homewatch scheduler running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    cancel.cancel();
    #[cfg(unix)]
    let _ = ipc.await;
    handle.stop().await?;
    println!("Homewatch scheduler stopped");
    Ok(())
}
