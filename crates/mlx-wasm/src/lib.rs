//! WebAssembly bindings for the MLX90632 measurement session.
//!
//! The page owns the Web Bluetooth link and a 1 s timer. It feeds every
//! characteristic notification to [`MeasurementSession::on_notification`]
//! and calls [`MeasurementSession::tick`] from the timer; the session turns
//! the latest sample into a record exactly like the native client does.
//!
//! ```js
//! const session = new MeasurementSession();
//! characteristic.addEventListener("characteristicvaluechanged", (e) =>
//!   session.onNotification(new Uint8Array(e.target.value.buffer), Date.now()));
//! session.start(Date.now());
//! setInterval(() => {
//!   const record = session.tick();
//!   if (record !== undefined) draw(JSON.parse(session.chartJson()));
//! }, 1000);
//! ```

use mlx_types::uuid::{DEVICE_NAME_FILTER, MLX_SERVICE, SAMPLE_CHARACTERISTIC};
use mlx_types::{EXPORT_FILE_NAME, ExportError, Sample, SampleSlot, Session};
use wasm_bindgen::prelude::*;

/// Initialize the WASM module (called automatically)
#[wasm_bindgen(start)]
pub fn init() {
    log("MLX90632 WASM module initialized");
}

/// Log a message to the browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

/// Primary GATT service to request in `navigator.bluetooth.requestDevice`.
#[wasm_bindgen(js_name = serviceUuid)]
pub fn service_uuid() -> String {
    MLX_SERVICE.to_string()
}

/// Characteristic that notifies sample frames.
#[wasm_bindgen(js_name = characteristicUuid)]
pub fn characteristic_uuid() -> String {
    SAMPLE_CHARACTERISTIC.to_string()
}

/// Advertised name of the sensor board.
#[wasm_bindgen(js_name = deviceName)]
pub fn device_name() -> String {
    DEVICE_NAME_FILTER.to_string()
}

/// Suggested download name for [`MeasurementSession::to_csv`].
#[wasm_bindgen(js_name = exportFileName)]
pub fn export_file_name() -> String {
    EXPORT_FILE_NAME.to_string()
}

/// Decode one notification into sample JSON; `undefined` when malformed.
#[wasm_bindgen(js_name = decodePayload)]
pub fn decode_payload(bytes: &[u8], now_ms: f64) -> Option<String> {
    let sample = Sample::from_bytes(bytes, now_ms as i64).ok()?;
    serde_json::to_string(&sample).ok()
}

/// A measurement session driven from JavaScript.
#[wasm_bindgen]
#[derive(Default)]
pub struct MeasurementSession {
    session: Session,
    slot: SampleSlot,
}

#[wasm_bindgen]
impl MeasurementSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a measurement; returns the start time in epoch milliseconds.
    ///
    /// Clears the log, the chart and any sample that arrived before.
    pub fn start(&mut self, now_ms: f64) -> f64 {
        self.slot.clear();
        self.session.begin(now_ms as i64) as f64
    }

    /// Stop the measurement, keeping the log for export.
    pub fn stop(&mut self) -> bool {
        self.session.end()
    }

    /// Forget everything, as after a disconnect.
    pub fn reset(&mut self) {
        self.slot.clear();
        self.session.reset();
    }

    /// Buffer a notification; malformed payloads are ignored.
    #[wasm_bindgen(js_name = onNotification)]
    pub fn on_notification(&self, bytes: &[u8], now_ms: f64) -> bool {
        self.slot.offer(bytes, now_ms as i64)
    }

    /// Consume the buffered sample; returns the new record as JSON.
    ///
    /// Returns `undefined` when not measuring or when nothing arrived since
    /// the previous tick.
    pub fn tick(&mut self) -> Option<String> {
        if !self.session.is_measuring() {
            return None;
        }
        let outcome = self.session.process(self.slot.take())?;
        serde_json::to_string(&outcome.record).ok()
    }

    /// Chart window as JSON (`points` oldest first).
    #[wasm_bindgen(js_name = chartJson)]
    pub fn chart_json(&self) -> Result<String, JsError> {
        serde_json::to_string(self.session.chart()).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Latest readout strings as JSON.
    #[wasm_bindgen(js_name = readoutJson)]
    pub fn readout_json(&self) -> Result<String, JsError> {
        serde_json::to_string(self.session.readout()).map_err(|e| JsError::new(&e.to_string()))
    }

    /// The session log as CSV; throws when the log is empty.
    #[wasm_bindgen(js_name = toCsv)]
    pub fn to_csv(&self) -> Result<String, JsError> {
        self.csv().map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen(getter, js_name = recordCount)]
    pub fn record_count(&self) -> usize {
        self.session.records().len()
    }

    #[wasm_bindgen(getter, js_name = isMeasuring)]
    pub fn is_measuring(&self) -> bool {
        self.session.is_measuring()
    }

    #[wasm_bindgen(getter, js_name = measureStartMs)]
    pub fn measure_start_ms(&self) -> Option<f64> {
        self.session.measure_start_ms().map(|ms| ms as f64)
    }
}

impl MeasurementSession {
    fn csv(&self) -> Result<String, ExportError> {
        self.session.to_csv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlx_types::encode_frame;

    #[test]
    fn test_identifiers() {
        assert_eq!(service_uuid(), "4a5197ff-07ce-499e-8d37-d3d457af549a");
        assert_eq!(characteristic_uuid(), "fedcba98-7654-3210-fedc-ba9876543210");
        assert_eq!(device_name(), "MLX R");
        assert_eq!(export_file_name(), "mlx90632_data.csv");
    }

    #[test]
    fn test_decode_payload() {
        let json = decode_payload(&encode_frame(24.5, 36.0, 2_500), 2_000.0).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["ambient_c"], 24.5);
        assert_eq!(value["sensor_elapsed_ms"], 2500);
        assert_eq!(value["received_at_ms"], 2000);

        assert!(decode_payload(&[0u8; 11], 0.0).is_none());
    }

    #[test]
    fn test_tick_without_measuring_is_ignored() {
        let mut session = MeasurementSession::new();
        assert!(session.on_notification(&encode_frame(24.0, 30.0, 1), 10.0));
        assert!(session.tick().is_none());
        assert_eq!(session.record_count(), 0);
    }

    #[test]
    fn test_last_sample_wins_per_tick() {
        let mut session = MeasurementSession::new();
        assert_eq!(session.start(1_000.0), 1_000.0);
        assert!(session.is_measuring());

        session.on_notification(&encode_frame(24.0, 30.0, 2_000), 1_500.0);
        session.on_notification(&encode_frame(24.5, 36.0, 2_500), 2_000.0);
        assert!(!session.on_notification(&[1, 2, 3], 2_100.0));

        let json = session.tick().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["object_c"], 36.0);
        assert_eq!(value["measure_elapsed_s"], 1.0);
        assert_eq!(value["sensor_elapsed_s"], 2.5);

        assert!(session.tick().is_none());
        assert_eq!(session.record_count(), 1);
    }

    #[test]
    fn test_start_clears_buffered_sample_and_log() {
        let mut session = MeasurementSession::new();
        session.start(1_000.0);
        session.on_notification(&encode_frame(24.0, 30.0, 1), 1_100.0);
        session.tick().unwrap();
        session.stop();

        session.on_notification(&encode_frame(24.0, 30.0, 2), 1_200.0);
        let restart = session.start(1_000.0);
        assert!(restart > 1_000.0);
        assert_eq!(session.record_count(), 0);
        assert!(session.tick().is_none());
    }

    #[test]
    fn test_csv_requires_records() {
        let mut session = MeasurementSession::new();
        assert!(matches!(session.csv(), Err(ExportError::Empty)));

        session.start(0.0);
        session.on_notification(&encode_frame(24.0, 30.0, 1_000), 500.0);
        session.tick();
        session.stop();

        let csv = session.csv().unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(!session.is_measuring());
        assert_eq!(session.record_count(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = MeasurementSession::new();
        session.start(0.0);
        session.on_notification(&encode_frame(24.0, 30.0, 1_000), 500.0);
        session.tick();
        session.reset();

        assert_eq!(session.record_count(), 0);
        assert!(session.measure_start_ms().is_none());
        assert!(session.session.readout().is_placeholder());
    }
}
