//! Record command implementation.
//!
//! Connects through a session worker, prints one line per 1 Hz tick and
//! exports the session log when recording ends.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use mlx_core::{Command, DisconnectReason, SessionEvent};
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::format::{
    FormatOptions, format_record_csv_header, format_record_csv_line, format_record_json,
    format_record_text,
};
use crate::style;
use mlx_cli::util::{SensorSource, WorkerHandle, spawn_worker, write_stdout};

/// Options for `mlx record`.
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub source: SensorSource,
    pub export_dir: PathBuf,
    /// Stop after this many records; 0 means unlimited.
    pub count: u32,
    pub duration: Option<Duration>,
    pub format: OutputFormat,
    /// Explicit export destination.
    pub export: Option<PathBuf>,
    pub no_export: bool,
    pub quiet: bool,
}

/// Why the recording loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StopCause {
    CountReached,
    DurationElapsed,
    Interrupted,
    LinkLost(String),
    WorkerGone,
}

pub async fn cmd_record(options: RecordOptions, opts: &FormatOptions) -> Result<()> {
    let mut handle = spawn_worker(&options.source, options.export_dir.clone());

    let result = record(&mut handle, &options, opts).await;

    let _ = handle.commands.send(Command::Disconnect).await;
    handle.shutdown().await;
    result
}

async fn record(
    handle: &mut WorkerHandle,
    options: &RecordOptions,
    opts: &FormatOptions,
) -> Result<()> {
    connect(handle, options).await?;
    start_measurement(handle).await?;

    if options.format == OutputFormat::Csv {
        write_stdout(&format_record_csv_header())?;
    }

    let (received, cause) = stream_records(handle, options, opts).await?;
    debug!(received, ?cause, "Recording ended");

    let _ = handle.commands.send(Command::StopMeasurement).await;

    match &cause {
        StopCause::LinkLost(reason) => {
            eprintln!("Device disconnected: {reason}");
            if !options.no_export {
                warn!("Session log was discarded with the link; nothing exported");
            }
            return Ok(());
        }
        StopCause::WorkerGone => bail!("Session worker stopped unexpectedly"),
        _ => {}
    }

    if options.no_export {
        return Ok(());
    }
    if received == 0 {
        if !options.quiet {
            eprintln!("No records captured; nothing exported.");
        }
        return Ok(());
    }

    export(handle, options).await
}

async fn connect(handle: &mut WorkerHandle, options: &RecordOptions) -> Result<()> {
    let spinner = if !options.quiet && io::stderr().is_terminal() {
        Some(style::connecting_spinner(options.source.name()))
    } else {
        None
    };

    handle.commands.send(Command::Connect).await?;

    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.cancel.cancel();
                break Err(anyhow::anyhow!("Interrupted while connecting"));
            }
            event = handle.events.recv() => match event {
                Some(SessionEvent::Connected { name, address }) => break Ok((name, address)),
                Some(SessionEvent::Notice(message)) => break Err(anyhow::anyhow!(message)),
                Some(_) => {}
                None => break Err(anyhow::anyhow!("Session worker stopped unexpectedly")),
            },
        }
    };

    if let Some(sp) = spinner {
        sp.finish_and_clear();
    }

    let (name, address) = outcome?;
    if !options.quiet {
        eprintln!(
            "Connected to {} ({})",
            name.as_deref().unwrap_or(options.source.name()),
            address
        );
    }
    Ok(())
}

async fn start_measurement(handle: &mut WorkerHandle) -> Result<()> {
    handle.commands.send(Command::StartMeasurement).await?;
    loop {
        match handle.events.recv().await {
            Some(SessionEvent::MeasurementStarted { start_ms }) => {
                debug!(start_ms, "Measurement started");
                return Ok(());
            }
            Some(SessionEvent::Notice(message)) => bail!(message),
            Some(_) => {}
            None => bail!("Session worker stopped unexpectedly"),
        }
    }
}

async fn stream_records(
    handle: &mut WorkerHandle,
    options: &RecordOptions,
    opts: &FormatOptions,
) -> Result<(u32, StopCause)> {
    let deadline = async {
        match options.duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let json_opts = opts.with_compact(true);
    let mut received = 0u32;

    let cause = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break StopCause::Interrupted,
            _ = &mut deadline => break StopCause::DurationElapsed,
            event = handle.events.recv() => match event {
                Some(SessionEvent::RecordAppended { record, readout }) => {
                    let line = match options.format {
                        OutputFormat::Text => format_record_text(&readout, opts),
                        OutputFormat::Json => format_record_json(&record, &json_opts)?,
                        OutputFormat::Csv => format_record_csv_line(&record),
                    };
                    write_stdout(&line)?;
                    received += 1;
                    if options.count > 0 && received >= options.count {
                        break StopCause::CountReached;
                    }
                }
                Some(SessionEvent::Disconnected { reason }) if reason != DisconnectReason::UserRequested => {
                    break StopCause::LinkLost(reason.to_string());
                }
                Some(SessionEvent::Notice(message)) => eprintln!("{message}"),
                Some(_) => {}
                None => break StopCause::WorkerGone,
            },
        }
    };

    Ok((received, cause))
}

async fn export(handle: &mut WorkerHandle, options: &RecordOptions) -> Result<()> {
    handle
        .commands
        .send(Command::Export {
            path: options.export.clone(),
        })
        .await?;

    loop {
        match handle.events.recv().await {
            Some(SessionEvent::Exported { path, record_count }) => {
                if !options.quiet {
                    eprintln!("Exported {} records to {}", record_count, path.display());
                }
                return Ok(());
            }
            Some(SessionEvent::Notice(message)) => bail!(message),
            Some(_) => {}
            None => bail!("Session worker stopped before the export finished"),
        }
    }
}
