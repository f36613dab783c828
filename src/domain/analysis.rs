// ============================================================
// TABULAR ANALYSIS TYPES
// ============================================================
// Value objects produced by the stats extractor
// No I/O, no async

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const TEMPERATURE_COLUMN: &str = "Temperature";
pub const PRESSURE_COLUMN: &str = "Pressure";
pub const FLOWRATE_COLUMN: &str = "Flowrate";
pub const TYPE_COLUMN: &str = "Type";

/// Number of data rows echoed back for display
pub const PREVIEW_ROW_LIMIT: usize = 5;

/// Category label → number of rows carrying it
pub type CategoryCounts = BTreeMap<String, u64>;

/// One data row keyed by column name, in header order
pub type PreviewRow = Map<String, Value>;

/// Means of the expected numeric columns; 0 when a column is absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnAverages {
    pub temperature: f64,
    pub pressure: f64,
    pub flowrate: f64,
}

/// Everything the extractor derives from one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularStats {
    /// Data rows, header excluded
    pub row_count: usize,

    pub averages: ColumnAverages,

    /// Empty when there is no `Type` column
    pub category_counts: CategoryCounts,

    /// At most `PREVIEW_ROW_LIMIT` rows
    pub preview_rows: Vec<PreviewRow>,
}

/// Running mean over the parseable cells of a column
///
/// The plain sum is exact for ordinary data; the incremental mean takes over
/// once the sum overflows
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAccumulator {
    sum: f64,
    running: f64,
    count: usize,
}

impl MeanAccumulator {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let n = self.count as f64;
        self.sum += value;
        self.running += value / n - self.running / n;
    }

    /// Mean of the pushed values, 0 when nothing was pushed
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.sum / self.count as f64;
        if mean.is_finite() {
            mean
        } else if self.running.is_finite() {
            self.running
        } else {
            0.0
        }
    }
}
