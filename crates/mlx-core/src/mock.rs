//! Mock device implementation for testing and simulation.
//!
//! [`MockDevice`] implements [`SensorDevice`] without any BLE hardware.
//! Tests push payloads with [`MockDevice::notify`]; a device built with
//! [`MockDeviceBuilder::simulate`] produces synthetic frames on its own once
//! subscribed.
//!
//! # Features
//!
//! - **Failure injection**: subscribe, unsubscribe, disconnect and connect
//! - **Link loss**: [`MockDevice::drop_link`] emits a device-side disconnect
//! - **Simulation**: periodic frames with optional malformed payloads

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::debug;

use mlx_types::encode_frame;

use crate::error::{ConnectionFailureReason, Error, Result};
use crate::events::{DeviceEvent, DeviceId, DisconnectReason, EventDispatcher, EventReceiver};
use crate::traits::{Connector, NotificationHandler, SensorDevice};

/// Settings for the synthetic frame generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulation {
    /// Time between frames.
    pub period: Duration,
    /// Every n-th payload is truncated; 0 disables.
    pub malformed_every: u32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(250),
            malformed_every: 0,
        }
    }
}

type HandlerSlot = Arc<Mutex<Option<NotificationHandler>>>;

/// A mock sensor for testing.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use mlx_core::{MockDevice, SensorDevice};
/// use mlx_types::{SampleSlot, encode_frame};
///
/// #[tokio::main]
/// async fn main() {
///     let device = MockDevice::new("MLX R");
///     let slot = SampleSlot::new();
///     let sink = slot.clone();
///     device
///         .subscribe(Arc::new(move |payload| {
///             sink.offer(payload, 0);
///         }))
///         .await
///         .unwrap();
///
///     device.notify(&encode_frame(24.0, 33.0, 1000));
///     assert_eq!(slot.take().unwrap().sensor_elapsed_ms, 1000);
/// }
/// ```
pub struct MockDevice {
    name: String,
    address: String,
    connected: AtomicBool,
    handler: HandlerSlot,
    events: EventDispatcher,
    simulation: Option<Simulation>,
    simulation_task: Mutex<Option<JoinHandle<()>>>,
    subscribe_count: AtomicU32,
    unsubscribe_count: AtomicU32,
    fail_subscribe: AtomicBool,
    fail_unsubscribe: AtomicBool,
    fail_disconnect: AtomicBool,
}

impl std::fmt::Debug for MockDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDevice")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .field("simulation", &self.simulation)
            .finish()
    }
}

impl MockDevice {
    /// Create a connected mock device with no simulation.
    pub fn new(name: &str) -> Self {
        MockDeviceBuilder::new().name(name).build()
    }

    /// Mark the mock as connected.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Deliver a payload to the registered handler, as the transport would.
    ///
    /// Returns `false` when nobody is subscribed.
    pub fn notify(&self, payload: &[u8]) -> bool {
        match current_handler(&self.handler) {
            Some(handler) => {
                handler(payload);
                true
            }
            None => false,
        }
    }

    /// Whether a notification handler is registered.
    pub fn has_subscriber(&self) -> bool {
        current_handler(&self.handler).is_some()
    }

    /// Simulate the device dropping the link on its own.
    pub fn drop_link(&self) {
        self.teardown();
        self.events.send(DeviceEvent::Disconnected {
            device: DeviceId::with_name(self.address.clone(), self.name.clone()),
            reason: DisconnectReason::LinkLost,
        });
    }

    /// Number of successful subscribe calls.
    pub fn subscribe_count(&self) -> u32 {
        self.subscribe_count.load(Ordering::Relaxed)
    }

    /// Number of unsubscribe calls, failed ones included.
    pub fn unsubscribe_count(&self) -> u32 {
        self.unsubscribe_count.load(Ordering::Relaxed)
    }

    /// Make subsequent subscribe calls fail.
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent unsubscribe calls fail (after detaching the handler).
    pub fn set_fail_unsubscribe(&self, fail: bool) {
        self.fail_unsubscribe.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent disconnect calls fail (after dropping the link).
    pub fn set_fail_disconnect(&self, fail: bool) {
        self.fail_disconnect.store(fail, Ordering::Relaxed);
    }

    fn mock_failure(&self, what: &str) -> Error {
        Error::connection_failed(
            Some(self.address.clone()),
            ConnectionFailureReason::BleError(format!("mock {what} failure")),
        )
    }

    fn detach_handler(&self) {
        if let Ok(mut handler) = self.handler.lock() {
            *handler = None;
        }
        if let Ok(mut task) = self.simulation_task.lock()
            && let Some(handle) = task.take()
        {
            handle.abort();
        }
    }

    fn teardown(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.detach_handler();
    }

    fn start_simulation(&self, simulation: Simulation) {
        let handler = self.handler.clone();
        let handle = tokio::spawn(run_simulation(handler, simulation));
        if let Ok(mut task) = self.simulation_task.lock()
            && let Some(previous) = task.replace(handle)
        {
            previous.abort();
        }
    }
}

fn current_handler(slot: &HandlerSlot) -> Option<NotificationHandler> {
    slot.lock().ok().and_then(|guard| guard.clone())
}

/// Emit synthetic frames until aborted.
async fn run_simulation(handler: HandlerSlot, simulation: Simulation) {
    let mut ticker = tokio::time::interval(simulation.period);
    let step_ms = u32::try_from(simulation.period.as_millis()).unwrap_or(u32::MAX);
    let mut sensor_ms: u32 = 0;
    let mut count: u32 = 0;

    loop {
        ticker.tick().await;
        count = count.wrapping_add(1);
        sensor_ms = sensor_ms.wrapping_add(step_ms);

        let payload = if simulation.malformed_every > 0 && count % simulation.malformed_every == 0
        {
            vec![0u8; 7]
        } else {
            let (ambient, object) = synthetic_temperatures(sensor_ms);
            encode_frame(ambient, object, sensor_ms).to_vec()
        };

        if let Some(handler) = current_handler(&handler) {
            handler(&payload);
        }
    }
}

/// Slowly drifting ambient, object temperature swinging around a warm target.
fn synthetic_temperatures(sensor_ms: u32) -> (f32, f32) {
    let t = sensor_ms as f32 / 1000.0;
    let noise = rand::random::<f32>() - 0.5;
    let ambient = 24.0 + 0.3 * (t / 60.0).sin() + 0.02 * noise;
    let object = 33.5 + 1.5 * (t / 12.0).sin() + 0.1 * noise;
    (ambient, object)
}

#[async_trait]
impl SensorDevice for MockDevice {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<()> {
        self.teardown();
        if self.fail_disconnect.load(Ordering::Relaxed) {
            return Err(self.mock_failure("disconnect"));
        }
        Ok(())
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn address(&self) -> &str {
        &self.address
    }

    async fn subscribe(&self, handler: NotificationHandler) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }
        if self.fail_subscribe.load(Ordering::Relaxed) {
            return Err(self.mock_failure("subscribe"));
        }

        if let Ok(mut slot) = self.handler.lock() {
            *slot = Some(handler);
        }
        self.subscribe_count.fetch_add(1, Ordering::Relaxed);

        if let Some(simulation) = self.simulation {
            debug!(?simulation, "Starting simulated notifications");
            self.start_simulation(simulation);
        }
        Ok(())
    }

    async fn unsubscribe(&self) -> Result<()> {
        self.unsubscribe_count.fetch_add(1, Ordering::Relaxed);
        self.detach_handler();
        if self.fail_unsubscribe.load(Ordering::Relaxed) {
            return Err(self.mock_failure("unsubscribe"));
        }
        Ok(())
    }

    fn events(&self) -> EventReceiver {
        self.events.subscribe()
    }
}

/// Builder for creating mock devices with custom settings.
#[derive(Debug, Clone)]
pub struct MockDeviceBuilder {
    name: String,
    address: Option<String>,
    simulation: Option<Simulation>,
    auto_connect: bool,
}

impl Default for MockDeviceBuilder {
    fn default() -> Self {
        Self {
            name: mlx_types::uuids::DEVICE_NAME_FILTER.to_string(),
            address: None,
            simulation: None,
            auto_connect: true,
        }
    }
}

impl MockDeviceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the advertised name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set a fixed address instead of a random one.
    #[must_use]
    pub fn address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    /// Emit synthetic frames while subscribed.
    #[must_use]
    pub fn simulate(mut self, simulation: Simulation) -> Self {
        self.simulation = Some(simulation);
        self
    }

    /// Start out connected (the default) or disconnected.
    #[must_use]
    pub fn auto_connect(mut self, auto: bool) -> Self {
        self.auto_connect = auto;
        self
    }

    pub fn build(self) -> MockDevice {
        MockDevice {
            address: self
                .address
                .unwrap_or_else(|| format!("MOCK-{:06X}", rand::random::<u32>() % 0xFFFFFF)),
            name: self.name,
            connected: AtomicBool::new(self.auto_connect),
            handler: Arc::new(Mutex::new(None)),
            events: EventDispatcher::default(),
            simulation: self.simulation,
            simulation_task: Mutex::new(None),
            subscribe_count: AtomicU32::new(0),
            unsubscribe_count: AtomicU32::new(0),
            fail_subscribe: AtomicBool::new(false),
            fail_unsubscribe: AtomicBool::new(false),
            fail_disconnect: AtomicBool::new(false),
        }
    }
}

/// [`Connector`] handing out a shared [`MockDevice`].
#[derive(Debug)]
pub struct MockConnector {
    device: Arc<MockDevice>,
    remaining_failures: AtomicU32,
    drop_next_link: AtomicBool,
    latency: Duration,
}

impl MockConnector {
    pub fn new(device: Arc<MockDevice>) -> Self {
        Self {
            device,
            remaining_failures: AtomicU32::new(0),
            drop_next_link: AtomicBool::new(false),
            latency: Duration::ZERO,
        }
    }

    /// A connector whose device emits frames faster than the tick cadence,
    /// with an occasional malformed payload.
    pub fn simulated(name: &str) -> Self {
        let device = MockDeviceBuilder::new()
            .name(name)
            .address("SIM-000001")
            .auto_connect(false)
            .simulate(Simulation {
                period: Duration::from_millis(250),
                malformed_every: 17,
            })
            .build();
        Self::new(Arc::new(device)).with_latency(Duration::from_millis(400))
    }

    /// Delay each connect attempt.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the next `count` connect attempts.
    pub fn fail_next(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Let the next link drop before `connect` returns it.
    pub fn drop_next_link(&self) {
        self.drop_next_link.store(true, Ordering::Relaxed);
    }

    /// The device handed out on success.
    pub fn device(&self) -> &Arc<MockDevice> {
        &self.device
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Arc<dyn SensorDevice>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let remaining = self.remaining_failures.load(Ordering::Relaxed);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::Relaxed);
            return Err(Error::device_not_found(self.device.name.clone()));
        }

        self.device.set_connected(true);
        if self.drop_next_link.swap(false, Ordering::Relaxed) {
            self.device.drop_link();
        }
        let device: Arc<dyn SensorDevice> = self.device.clone();
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlx_types::SampleSlot;

    fn slot_handler(slot: &SampleSlot) -> NotificationHandler {
        let slot = slot.clone();
        Arc::new(move |payload| {
            slot.offer(payload, 0);
        })
    }

    #[tokio::test]
    async fn test_notify_reaches_handler() {
        let device = MockDevice::new("MLX R");
        let slot = SampleSlot::new();
        assert!(!device.notify(&encode_frame(1.0, 2.0, 3)));

        device.subscribe(slot_handler(&slot)).await.unwrap();
        assert!(device.has_subscriber());
        assert!(device.notify(&encode_frame(1.0, 2.0, 3)));
        assert_eq!(slot.take().unwrap().sensor_elapsed_ms, 3);
        assert_eq!(device.subscribe_count(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_detaches_even_on_failure() {
        let device = MockDevice::new("MLX R");
        device.subscribe(slot_handler(&SampleSlot::new())).await.unwrap();
        device.set_fail_unsubscribe(true);

        assert!(device.unsubscribe().await.is_err());
        assert!(!device.has_subscriber());
        assert_eq!(device.unsubscribe_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_requires_connection() {
        let device = MockDeviceBuilder::new().auto_connect(false).build();
        let err = device.subscribe(slot_handler(&SampleSlot::new())).await;
        assert!(matches!(err, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_subscribe_failure_injection() {
        let device = MockDevice::new("MLX R");
        device.set_fail_subscribe(true);
        assert!(device.subscribe(slot_handler(&SampleSlot::new())).await.is_err());
        assert!(!device.has_subscriber());
    }

    #[tokio::test]
    async fn test_drop_link_emits_event() {
        let device = MockDevice::new("MLX R");
        let mut events = device.events();
        device.subscribe(slot_handler(&SampleSlot::new())).await.unwrap();

        device.drop_link();

        assert!(!device.is_connected().await);
        assert!(!device.has_subscriber());
        match events.recv().await {
            Ok(DeviceEvent::Disconnected { reason, .. }) => {
                assert_eq!(reason, DisconnectReason::LinkLost)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_emits_frames() {
        let device = MockDeviceBuilder::new()
            .simulate(Simulation {
                period: Duration::from_millis(100),
                malformed_every: 0,
            })
            .build();
        let slot = SampleSlot::new();
        device.subscribe(slot_handler(&slot)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(350)).await;
        let sample = slot.take().expect("simulated frame");
        assert!(sample.sensor_elapsed_ms >= 100);
        assert!(sample.ambient_c > 20.0 && sample.ambient_c < 30.0);

        device.unsubscribe().await.unwrap();
        slot.clear();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(slot.take().is_none());
    }

    #[tokio::test]
    async fn test_connector_failures_then_success() {
        let connector = MockConnector::new(Arc::new(
            MockDeviceBuilder::new().auto_connect(false).build(),
        ));
        connector.fail_next(1);

        assert!(connector.connect().await.is_err());
        assert!(!connector.device().is_connected().await);

        let device = connector.connect().await.unwrap();
        assert!(device.is_connected().await);
        assert_eq!(device.name(), Some("MLX R"));
    }

    #[test]
    fn test_builder_fixed_address() {
        let device = MockDeviceBuilder::new().address("AA:BB").build();
        assert_eq!(SensorDevice::address(&device), "AA:BB");
    }
}
