//! Sliding window of chart points.

use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of points kept in the chart window.
pub const CHART_CAPACITY: usize = 50;

/// A single plotted point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChartPoint {
    /// Ambient temperature in °C.
    pub ambient_c: f64,
    /// Object temperature in °C.
    pub object_c: f64,
    /// Measurement-elapsed seconds.
    pub elapsed_s: f64,
    /// X-axis label, elapsed seconds with one decimal.
    pub label: String,
}

/// Fixed-capacity FIFO of chart points; the oldest point is evicted first.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChartWindow {
    points: VecDeque<ChartPoint>,
    capacity: usize,
}

impl Default for ChartWindow {
    fn default() -> Self {
        Self::with_capacity(CHART_CAPACITY)
    }
}

impl ChartWindow {
    /// Create an empty window holding [`CHART_CAPACITY`] points.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty window with a custom capacity (at least one point).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, evicting the oldest once the window is full.
    pub fn append_point(&mut self, ambient_c: f64, object_c: f64, elapsed_s: f64) {
        while self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(ChartPoint {
            ambient_c,
            object_c,
            elapsed_s,
            label: format!("{:.1}", elapsed_s),
        });
    }

    /// Remove every point.
    pub fn reset(&mut self) {
        self.points.clear();
    }

    /// Number of points currently held.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum number of points.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over points, oldest first.
    pub fn points(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    /// `(elapsed_s, ambient_c)` pairs for plotting.
    pub fn ambient_series(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.elapsed_s, p.ambient_c)).collect()
    }

    /// `(elapsed_s, object_c)` pairs for plotting.
    pub fn object_series(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.elapsed_s, p.object_c)).collect()
    }

    /// Range of the x axis, or `None` when empty.
    pub fn x_bounds(&self) -> Option<(f64, f64)> {
        let first = self.points.front()?;
        let last = self.points.back()?;
        Some((first.elapsed_s, last.elapsed_s))
    }

    /// Min/max over both temperature series, or `None` when empty.
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .flat_map(|p| [p.ambient_c, p.object_c])
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
