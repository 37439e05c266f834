//! Session worker: owns the link, the sample slot and the session log.
//!
//! The [`SessionWorker`] runs on its own Tokio task and processes one event
//! at a time with `tokio::select!`:
//!
//! - [`Command`]s from the UI
//! - the 1 Hz measurement tick while a session is running
//! - device-side disconnects reported by the link
//!
//! Only the [`SampleSlot`] is shared with another task (the transport's
//! notification task writes it). Everything else is touched exclusively from
//! the worker loop, so handlers never interleave.

use std::future::pending;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use mlx_types::{
    Controls, EXPORT_FILE_NAME, LinkState, SampleSlot, Session, epoch_millis_now,
};

use crate::error::Error;
use crate::events::{DeviceEvent, DisconnectReason, EventReceiver};
use crate::messages::{Command, SessionEvent, SessionSnapshot};
use crate::traits::{Connector, NotificationHandler, SensorDevice};

/// Cadence at which buffered samples are turned into records.
pub const TICK_PERIOD: Duration = Duration::from_millis(1000);

/// Capacity of the UI → worker command channel.
pub const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Capacity of the worker → UI event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 128;

/// An established link plus its event subscription.
struct Link {
    device: Arc<dyn SensorDevice>,
    events: EventReceiver,
}

/// Background worker driving one sensor session.
pub struct SessionWorker {
    connector: Box<dyn Connector>,
    command_rx: mpsc::Receiver<Command>,
    event_tx: mpsc::Sender<SessionEvent>,
    tick_period: Duration,
    export_dir: PathBuf,
    state: LinkState,
    link: Option<Link>,
    slot: SampleSlot,
    session: Session,
    /// Present exactly while measuring.
    ticker: Option<Interval>,
    /// Cancels an in-flight connect and stops the loop.
    cancel_token: CancellationToken,
}

impl SessionWorker {
    /// Create a worker using `connector` to obtain links.
    pub fn new(
        connector: impl Connector + 'static,
        command_rx: mpsc::Receiver<Command>,
        event_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            connector: Box::new(connector),
            command_rx,
            event_tx,
            tick_period: TICK_PERIOD,
            export_dir: PathBuf::from("."),
            state: LinkState::Disconnected,
            link: None,
            slot: SampleSlot::new(),
            session: Session::new(),
            ticker: None,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Override the tick period.
    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Directory used when an export command carries no path.
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Token that aborts a pending connect and stops the worker.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Current dashboard state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let device = self.link.as_ref().map(|link| &link.device);
        SessionSnapshot {
            state: self.state,
            controls: Controls::for_state(self.state, self.session.has_records()),
            device_name: device.and_then(|d| d.name().map(str::to_string)),
            device_address: device.map(|d| d.address().to_string()),
            readout: self.session.readout().clone(),
            chart: self.session.chart().clone(),
            record_count: self.session.records().len(),
            measure_start_ms: self.session.measure_start_ms(),
        }
    }

    /// Run the worker's main loop.
    ///
    /// Consumes the worker and runs until [`Command::Shutdown`], a closed
    /// command channel, or cancellation. The link is torn down on exit.
    pub async fn run(mut self) {
        info!("SessionWorker started");
        self.publish_snapshot().await;

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(Command::Shutdown) => {
                            info!("SessionWorker received shutdown command");
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            info!("Command channel closed, shutting down worker");
                            break;
                        }
                    }
                }
                _ = next_tick(&mut self.ticker) => self.handle_tick().await,
                reason = next_link_loss(&mut self.link) => self.handle_link_lost(reason).await,
                _ = self.cancel_token.cancelled() => {
                    info!("SessionWorker cancelled");
                    break;
                }
            }
        }

        self.teardown().await;
        info!("SessionWorker stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        info!(?cmd, "Handling command");

        match cmd {
            Command::Connect => self.handle_connect().await,
            Command::Disconnect => self.handle_disconnect().await,
            Command::ToggleMeasurement => {
                if self.state.is_measuring() {
                    self.handle_stop_measurement().await;
                } else {
                    self.handle_start_measurement().await;
                }
            }
            Command::StartMeasurement => self.handle_start_measurement().await,
            Command::StopMeasurement => self.handle_stop_measurement().await,
            Command::Export { path } => self.handle_export(path).await,
            // Consumed by the run loop.
            Command::Shutdown => {}
        }
    }

    async fn handle_connect(&mut self) {
        if self.link.is_some() {
            self.notice("Already connected").await;
            return;
        }

        self.set_state(LinkState::Connecting).await;

        let result = tokio::select! {
            result = self.connector.connect() => result,
            _ = self.cancel_token.cancelled() => Err(Error::Cancelled),
        };

        match result {
            Ok(device) => {
                let name = device.name().map(str::to_string);
                let address = device.address().to_string();
                info!(?name, %address, "Device connected");

                // Subscribe before checking: a drop after this point is
                // delivered as an event, one before it shows up here.
                let events = device.events();
                if !device.is_connected().await {
                    warn!(%address, "Link dropped during connection setup");
                    if let Err(e) = device.disconnect().await {
                        debug!(error = %e, "Disconnect after dropped setup failed (ignored)");
                    }
                    self.set_state(LinkState::Disconnected).await;
                    self.notice("Connection failed: link dropped during setup")
                        .await;
                    return;
                }
                self.link = Some(Link { device, events });
                self.send(SessionEvent::Connected { name, address }).await;
                self.set_state(LinkState::Connected).await;
            }
            Err(Error::Cancelled) => {
                info!("Connection cancelled");
                self.set_state(LinkState::Disconnected).await;
            }
            Err(e) => {
                warn!(error = %e, "Connection failed");
                self.set_state(LinkState::Disconnected).await;
                self.notice(format!("Connection failed: {e}")).await;
            }
        }
    }

    async fn handle_disconnect(&mut self) {
        let Some(link) = self.link.take() else {
            debug!("Already disconnected");
            return;
        };

        self.release_link(&link).await;
        self.finish_disconnect(DisconnectReason::UserRequested).await;
    }

    async fn handle_link_lost(&mut self, reason: DisconnectReason) {
        let Some(link) = self.link.take() else {
            return;
        };

        warn!(%reason, "Device disconnected");
        self.release_link(&link).await;
        self.finish_disconnect(reason.clone()).await;
        self.notice(format!("Device disconnected: {reason}")).await;
    }

    async fn handle_start_measurement(&mut self) {
        let Some(device) = self.link.as_ref().map(|link| link.device.clone()) else {
            self.notice("Connect to a device before starting a measurement")
                .await;
            return;
        };
        if self.state.is_measuring() {
            debug!("Measurement already running");
            return;
        }

        self.session.clear_log();
        self.slot.clear();

        let slot = self.slot.clone();
        let handler: NotificationHandler = Arc::new(move |payload: &[u8]| {
            if !slot.offer(payload, epoch_millis_now()) {
                trace!(len = payload.len(), "Discarded malformed payload");
            }
        });

        if let Err(e) = device.subscribe(handler).await {
            warn!(error = %e, "Failed to enable notifications");
            self.publish_snapshot().await;
            self.notice(format!("Failed to start measurement: {e}"))
                .await;
            return;
        }

        let start_ms = self.session.begin(epoch_millis_now());
        let mut ticker = interval_at(Instant::now() + self.tick_period, self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);

        info!(start_ms, "Measurement started");
        self.send(SessionEvent::MeasurementStarted { start_ms }).await;
        self.set_state(LinkState::Measuring).await;
    }

    async fn handle_stop_measurement(&mut self) {
        if !self.state.is_measuring() {
            debug!("Not measuring, stop ignored");
            return;
        }

        self.ticker = None;
        if let Some(link) = &self.link
            && let Err(e) = link.device.unsubscribe().await
        {
            debug!(error = %e, "Unsubscribe failed (ignored)");
        }
        self.session.end();

        let record_count = self.session.records().len();
        info!(record_count, "Measurement stopped");
        self.send(SessionEvent::MeasurementStopped { record_count })
            .await;
        self.set_state(LinkState::Connected).await;
    }

    async fn handle_tick(&mut self) {
        let Some(outcome) = self.session.process(self.slot.take()) else {
            trace!("Tick without sample");
            return;
        };

        debug!(
            ambient = outcome.record.ambient_c,
            object = outcome.record.object_c,
            measure_elapsed_s = outcome.record.measure_elapsed_s,
            "Record appended"
        );
        self.send(SessionEvent::RecordAppended {
            record: outcome.record,
            readout: outcome.readout,
        })
        .await;
        if outcome.first_record {
            self.send(SessionEvent::ExportAvailable).await;
        }
        self.publish_snapshot().await;
    }

    async fn handle_export(&mut self, path: Option<PathBuf>) {
        let csv = match self.session.to_csv() {
            Ok(csv) => csv,
            Err(e) => {
                self.notice(e.to_string()).await;
                return;
            }
        };

        let path = path.unwrap_or_else(|| self.export_dir.join(EXPORT_FILE_NAME));
        match write_export(&path, &csv).await {
            Ok(()) => {
                let record_count = self.session.records().len();
                info!(path = %path.display(), record_count, "Exported session log");
                self.send(SessionEvent::Exported { path, record_count })
                    .await;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Export failed");
                self.notice(format!("Failed to write {}: {e}", path.display()))
                    .await;
            }
        }
    }

    /// Stop the tick and release the device side of a link.
    ///
    /// Failures are expected when the link already dropped and are only logged.
    async fn release_link(&mut self, link: &Link) {
        self.ticker = None;
        if self.state.is_measuring()
            && let Err(e) = link.device.unsubscribe().await
        {
            debug!(error = %e, "Unsubscribe during teardown failed (ignored)");
        }
        if let Err(e) = link.device.disconnect().await {
            debug!(error = %e, "Disconnect during teardown failed (ignored)");
        }
    }

    async fn finish_disconnect(&mut self, reason: DisconnectReason) {
        self.ticker = None;
        self.link = None;
        self.session.reset();
        self.slot.clear();

        info!(%reason, "Disconnected");
        self.send(SessionEvent::Disconnected { reason }).await;
        self.set_state(LinkState::Disconnected).await;
    }

    async fn teardown(&mut self) {
        if let Some(link) = self.link.take() {
            self.release_link(&link).await;
        }
        self.ticker = None;
        self.session.reset();
        self.slot.clear();
        self.state = LinkState::Disconnected;
    }

    async fn set_state(&mut self, state: LinkState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "State transition");
        }
        self.state = state;
        self.send(SessionEvent::StateChanged(state)).await;
        self.publish_snapshot().await;
    }

    async fn publish_snapshot(&self) {
        self.send(SessionEvent::Snapshot(Box::new(self.snapshot())))
            .await;
    }

    async fn notice(&self, message: impl Into<String>) {
        self.send(SessionEvent::Notice(message.into())).await;
    }

    async fn send(&self, event: SessionEvent) {
        if let Err(e) = self.event_tx.send(event).await {
            debug!("Event receiver dropped: {}", e);
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => pending().await,
    }
}

async fn next_link_loss(link: &mut Option<Link>) -> DisconnectReason {
    let Some(link) = link else {
        return pending().await;
    };

    loop {
        match link.events.recv().await {
            Ok(DeviceEvent::Disconnected { reason, .. }) => return reason,
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Link event receiver lagged");
            }
            Err(RecvError::Closed) => return DisconnectReason::Unknown,
        }
    }
}

async fn write_export(path: &Path, csv: &str) -> std::io::Result<()> {
    tokio::fs::write(path, csv).await
}
