//! In-memory measurement session.
//!
//! A [`Session`] owns the record log, the chart window and the readout, and
//! turns consumed samples into records on each tick.

use chrono::{Local, TimeZone};

use crate::chart::ChartWindow;
use crate::error::ExportError;
use crate::export::render_csv;
use crate::record::{Readout, Record};
use crate::sample::Sample;

/// Result of a tick that consumed a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// The appended record.
    pub record: Record,
    /// The refreshed readout.
    pub readout: Readout,
    /// Set when this was the first record of the log, i.e. export just
    /// became possible.
    pub first_record: bool,
}

/// Session log plus measurement start time.
#[derive(Debug, Clone, Default)]
pub struct Session {
    measure_start_ms: Option<i64>,
    last_start_ms: Option<i64>,
    records: Vec<Record>,
    chart: ChartWindow,
    readout: Readout,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty the record log and the chart.
    pub fn clear_log(&mut self) {
        self.records.clear();
        self.chart.reset();
    }

    /// Start a measurement at `now_ms`, clearing the log and chart.
    ///
    /// The returned start time is strictly greater than any earlier start of
    /// this session object, even if the wall clock did not advance.
    pub fn begin(&mut self, now_ms: i64) -> i64 {
        self.clear_log();
        let start = match self.last_start_ms {
            Some(prev) if now_ms <= prev => prev + 1,
            _ => now_ms,
        };
        self.measure_start_ms = Some(start);
        self.last_start_ms = Some(start);
        start
    }

    /// Stop measuring. Log and chart are kept for export.
    ///
    /// Returns whether a measurement was running.
    pub fn end(&mut self) -> bool {
        self.measure_start_ms.take().is_some()
    }

    /// Forget everything tied to the current link.
    pub fn reset(&mut self) {
        self.measure_start_ms = None;
        self.clear_log();
        self.readout = Readout::default();
    }

    /// Turn a consumed sample into a record using the local time zone.
    ///
    /// With no sample this is a no-op and returns `None`.
    pub fn process(&mut self, sample: Option<Sample>) -> Option<TickOutcome> {
        self.process_in(sample, &Local)
    }

    /// Turn a consumed sample into a record, rendering times in `tz`.
    pub fn process_in<Tz: TimeZone>(&mut self, sample: Option<Sample>, tz: &Tz) -> Option<TickOutcome>
    where
        Tz::Offset: std::fmt::Display,
    {
        let sample = sample?;
        let record = Record::from_sample_in(&sample, self.measure_start_ms, tz);
        let readout = Readout::from_record_in(&record, tz);

        self.readout = readout.clone();
        self.records.push(record.clone());
        self.chart
            .append_point(record.ambient_c, record.object_c, record.measure_elapsed_s);

        Some(TickOutcome {
            record,
            readout,
            first_record: self.records.len() == 1,
        })
    }

    /// Render the log as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Empty`] when no records exist.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        render_csv(&self.records)
    }

    pub fn measure_start_ms(&self) -> Option<i64> {
        self.measure_start_ms
    }

    pub fn is_measuring(&self) -> bool {
        self.measure_start_ms.is_some()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn chart(&self) -> &ChartWindow {
        &self.chart
    }

    pub fn readout(&self) -> &Readout {
        &self.readout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::CHART_CAPACITY;
    use crate::sample::{SampleSlot, encode_frame};
    use chrono::Utc;

    fn sample(received_at_ms: i64, sensor_elapsed_ms: u32) -> Sample {
        Sample {
            ambient_c: 25.0,
            object_c: 34.0,
            sensor_elapsed_ms,
            received_at_ms,
        }
    }

    #[test]
    fn test_ticks_without_samples_produce_nothing() {
        let mut session = Session::new();
        let slot = SampleSlot::new();
        session.begin(1000);
        for _ in 0..5 {
            assert!(session.process_in(slot.take(), &Utc).is_none());
        }
        assert!(session.records().is_empty());
        assert!(session.readout().is_placeholder());
    }

    #[test]
    fn test_two_samples_between_ticks_yield_one_record() {
        let mut session = Session::new();
        let slot = SampleSlot::new();
        session.begin(1000);

        slot.offer(&encode_frame(20.0, 30.0, 100), 1200);
        slot.offer(&encode_frame(21.0, 31.0, 200), 1400);
        let outcome = session.process_in(slot.take(), &Utc).unwrap();
        assert!(session.process_in(slot.take(), &Utc).is_none());

        assert_eq!(session.records().len(), 1);
        assert_eq!(outcome.record.ambient_c, 21.0);
        assert_eq!(outcome.record.sensor_elapsed_ms, 200);
        assert!(outcome.first_record);
    }

    #[test]
    fn test_measure_elapsed_example() {
        let mut session = Session::new();
        session.begin(1000);
        let outcome = session.process_in(Some(sample(2000, 2500)), &Utc).unwrap();
        assert_eq!(outcome.record.measure_elapsed_s, 1.0);
        assert_eq!(outcome.record.sensor_elapsed_s, 2.5);
        assert_eq!(outcome.readout.elapsed, "1.00");
    }

    #[test]
    fn test_first_record_flag_only_once() {
        let mut session = Session::new();
        session.begin(0);
        assert!(session.process_in(Some(sample(1000, 0)), &Utc).unwrap().first_record);
        assert!(!session.process_in(Some(sample(2000, 0)), &Utc).unwrap().first_record);
    }

    #[test]
    fn test_new_session_clears_log_and_chart() {
        let mut session = Session::new();
        session.begin(0);
        session.process_in(Some(sample(1000, 0)), &Utc);
        session.process_in(Some(sample(2000, 0)), &Utc);
        assert_eq!(session.chart().len(), 2);

        session.end();
        assert_eq!(session.records().len(), 2);

        session.begin(5000);
        assert!(session.records().is_empty());
        assert!(session.chart().is_empty());
    }

    #[test]
    fn test_restart_start_is_strictly_greater() {
        let mut session = Session::new();
        let first = session.begin(5000);
        session.end();
        let second = session.begin(5000);
        assert!(second > first);
        session.end();
        let third = session.begin(4000);
        assert!(third > second);
        session.end();
        assert_eq!(session.begin(9000), 9000);
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut session = Session::new();
        assert!(!session.end());
        session.begin(1);
        assert!(session.end());
        assert!(!session.end());
        assert!(!session.is_measuring());
    }

    #[test]
    fn test_record_without_session_has_zero_measure_elapsed() {
        let mut session = Session::new();
        let outcome = session.process_in(Some(sample(2000, 0)), &Utc).unwrap();
        assert_eq!(outcome.record.measure_elapsed_s, 0.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = Session::new();
        session.begin(0);
        session.process_in(Some(sample(1000, 0)), &Utc);
        session.reset();
        assert!(!session.is_measuring());
        assert!(!session.has_records());
        assert!(session.chart().is_empty());
        assert!(session.readout().is_placeholder());
        assert_eq!(session.to_csv(), Err(ExportError::Empty));
    }

    #[test]
    fn test_chart_tracks_records_up_to_capacity() {
        let mut session = Session::new();
        session.begin(0);
        for i in 1..=60 {
            session.process_in(Some(sample(i * 1000, 0)), &Utc);
        }
        assert_eq!(session.records().len(), 60);
        assert_eq!(session.chart().len(), CHART_CAPACITY);
        assert_eq!(session.chart().points().next().unwrap().elapsed_s, 11.0);
    }

    #[test]
    fn test_csv_contains_every_record_in_order() {
        let mut session = Session::new();
        session.begin(0);
        session.process_in(Some(sample(1000, 10)), &Utc);
        session.process_in(Some(sample(2000, 5)), &Utc);
        let csv = session.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(",10,0.01,1,1000,"));
        assert!(lines[2].contains(",5,0.005,2,2000,"));
    }
}
