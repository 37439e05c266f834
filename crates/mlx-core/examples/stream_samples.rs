//! Example: Streaming records from a sensor
//!
//! Connects to the first `MLX R` sensor (or a simulated one with `--simulate`),
//! measures for ten seconds and prints one record per tick.
//!
//! Run with: `cargo run --example stream_samples -- --simulate`

use std::time::Duration;

use mlx_core::{
    BleConnector, COMMAND_CHANNEL_CAPACITY, Command, ConnectOptions, EVENT_CHANNEL_CAPACITY,
    MockConnector, SessionEvent, SessionWorker,
};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let simulate = std::env::args().any(|arg| arg == "--simulate");

    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let worker = if simulate {
        SessionWorker::new(MockConnector::simulated("MLX R"), command_rx, event_tx)
    } else {
        SessionWorker::new(
            BleConnector::new(ConnectOptions::default()),
            command_rx,
            event_tx,
        )
    };
    let handle = tokio::spawn(worker.run());

    command_tx.send(Command::Connect).await?;
    command_tx.send(Command::StartMeasurement).await?;

    let deadline = tokio::time::sleep(Duration::from_secs(10));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(SessionEvent::RecordAppended { record, .. }) => {
                    println!(
                        "{:>8.2} s  ambient {:.4} °C  object {:.4} °C",
                        record.measure_elapsed_s, record.ambient_c, record.object_c
                    );
                }
                Some(SessionEvent::Notice(message)) => {
                    eprintln!("{}", message);
                    break;
                }
                Some(_) => {}
                None => break,
            },
            _ = &mut deadline => break,
        }
    }

    command_tx.send(Command::Shutdown).await?;
    handle.await?;
    Ok(())
}
