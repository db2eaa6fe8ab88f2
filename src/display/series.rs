//! Display buffers.
//!
//! The chart surface only needs a sink it can clear and refill. Every
//! writer in this crate replaces the whole buffer (clear, then one
//! `append_range`), so there is no incremental append across ticks.

/// The data-sink capability of a chart series.
pub trait DataSink {
    /// Remove every point.
    fn clear(&mut self);

    /// Append a single point.
    fn append(&mut self, t: f64, y: f64);

    /// Append parallel `ts`/`ys` arrays.
    fn append_range(&mut self, ts: &[f64], ys: &[f64]);
}

/// An x/y point buffer backing one line series.
#[derive(Clone, Debug, Default)]
pub struct XyDataSeries {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Incremented on every `clear`, so readers can tell a refreshed
    /// buffer from a stale one without comparing contents.
    revision: u64,
}

impl XyDataSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x_values(&self) -> &[f64] {
        &self.x
    }

    pub fn y_values(&self) -> &[f64] {
        &self.y
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Iterate the stored points in insertion order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

impl DataSink for XyDataSeries {
    fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.revision = self.revision.wrapping_add(1);
    }

    fn append(&mut self, t: f64, y: f64) {
        self.x.push(t);
        self.y.push(y);
    }

    fn append_range(&mut self, ts: &[f64], ys: &[f64]) {
        if ts.len() != ys.len() {
            tracing::warn!(
                t_len = ts.len(),
                y_len = ys.len(),
                "append_range with mismatched arrays, keeping the common prefix"
            );
        }
        let len = ts.len().min(ys.len());
        self.x.extend_from_slice(&ts[..len]);
        self.y.extend_from_slice(&ys[..len]);
    }
}
