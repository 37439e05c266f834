//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use mlx_core::{
    BleConnector, COMMAND_CHANNEL_CAPACITY, Command, ConnectOptions, EVENT_CHANNEL_CAPACITY,
    MockConnector, SessionEvent, SessionWorker,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Where samples come from.
#[derive(Debug, Clone)]
pub enum SensorSource {
    /// A real sensor over Bluetooth.
    Ble { name: String, scan_timeout: Duration },
    /// The built-in simulated sensor.
    Simulated { name: String },
}

impl SensorSource {
    pub fn new(name: String, scan_timeout: Duration, simulate: bool) -> Self {
        if simulate {
            Self::Simulated { name }
        } else {
            Self::Ble { name, scan_timeout }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Ble { name, .. } | Self::Simulated { name } => name,
        }
    }
}

/// Channels and task handle of a spawned [`SessionWorker`].
pub struct WorkerHandle {
    pub commands: mpsc::Sender<Command>,
    pub events: mpsc::Receiver<SessionEvent>,
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Ask the worker to stop and wait for its teardown.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        // Keep draining so the worker never blocks on a full event channel.
        let WorkerHandle {
            mut events, task, ..
        } = self;
        let drain = tokio::spawn(async move { while events.recv().await.is_some() {} });
        let _ = task.await;
        let _ = drain.await;
    }
}

/// Spawn a session worker for `source` on the current runtime.
pub fn spawn_worker(source: &SensorSource, export_dir: PathBuf) -> WorkerHandle {
    let (commands, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let worker = match source {
        SensorSource::Ble { name, scan_timeout } => {
            info!(%name, ?scan_timeout, "Using Bluetooth sensor");
            let options = ConnectOptions::new()
                .name(name.clone())
                .scan_timeout(*scan_timeout);
            SessionWorker::new(BleConnector::new(options), command_rx, event_tx)
        }
        SensorSource::Simulated { name } => {
            info!(%name, "Using simulated sensor");
            SessionWorker::new(MockConnector::simulated(name), command_rx, event_tx)
        }
    }
    .with_export_dir(export_dir);

    let cancel = worker.cancel_token();
    let task = tokio::spawn(worker.run());

    WorkerHandle {
        commands,
        events,
        cancel,
        task,
    }
}

/// Write output to stdout and flush, so piped consumers see each line.
pub fn write_stdout(content: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    stdout.flush()?;
    Ok(())
}
