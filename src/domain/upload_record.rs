use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::analysis::{CategoryCounts, PreviewRow, TabularStats};

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Persisted result of one analyzed upload.
///
/// Rows are written once, with their stats, and never updated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: i64,
    pub source_file: String,
    pub original_name: Option<String>,
    pub uploaded_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub total_count: i64,
    pub average_temperature: f64,
    pub average_pressure: f64,
    pub average_flowrate: f64,
}

impl UploadRecord {
    pub fn formatted_date(&self) -> String {
        self.created_at.format(DATE_FORMAT).to_string()
    }

    pub fn summary(&self) -> UploadSummary {
        UploadSummary {
            id: self.id,
            date: self.formatted_date(),
            total_count: self.total_count,
            average_temperature: self.average_temperature,
            average_pressure: self.average_pressure,
        }
    }
}

/// Insert payload; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewUploadRecord {
    pub source_file: String,
    pub original_name: Option<String>,
    pub uploaded_by: Option<String>,
    pub total_count: i64,
    pub average_temperature: f64,
    pub average_pressure: f64,
    pub average_flowrate: f64,
}

impl NewUploadRecord {
    pub fn from_stats(
        source_file: String,
        original_name: Option<String>,
        uploaded_by: Option<String>,
        stats: &TabularStats,
    ) -> Self {
        Self {
            source_file,
            original_name,
            uploaded_by,
            total_count: stats.row_count as i64,
            average_temperature: stats.averages.temperature,
            average_pressure: stats.averages.pressure,
            average_flowrate: stats.averages.flowrate,
        }
    }
}

/// One history entry as returned by `GET /analyze`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub id: i64,
    pub date: String,
    pub total_count: i64,
    pub average_temperature: f64,
    pub average_pressure: f64,
}

/// Body of a successful `POST /analyze`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub id: i64,
    pub total_equipment_count: i64,
    pub average_temperature: f64,
    pub average_pressure: f64,
    pub average_flowrate: f64,
    pub type_counts: CategoryCounts,
    pub preview: Vec<PreviewRow>,
}

impl AnalyzeResponse {
    pub fn new(record: &UploadRecord, stats: TabularStats) -> Self {
        Self {
            id: record.id,
            total_equipment_count: record.total_count,
            average_temperature: record.average_temperature,
            average_pressure: record.average_pressure,
            average_flowrate: record.average_flowrate,
            type_counts: stats.category_counts,
            preview: stats.preview_rows,
        }
    }
}
