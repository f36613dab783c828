use serde::{Deserialize, Serialize};

use crate::domain::analysis::{CategoryCounts, PreviewRow};
use crate::domain::upload_record::{AnalyzeResponse, UploadSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    LoggedOut,
    Authenticating,
    LoggedIn { username: String, token: String },
}

impl SessionStatus {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionStatus::LoggedIn { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoginMode {
    #[default]
    Login,
    Register,
}

impl LoginMode {
    pub fn toggled(self) -> Self {
        match self {
            LoginMode::Login => LoginMode::Register,
            LoginMode::Register => LoginMode::Login,
        }
    }

    pub fn action_label(self) -> &'static str {
        match self {
            LoginMode::Login => "Log In",
            LoginMode::Register => "Sign Up",
        }
    }
}

/// Headline numbers shown above the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatCards {
    pub total_count: i64,
    pub average_temperature: f64,
    pub average_pressure: f64,
    pub average_flowrate: f64,
}

/// Preview rows flattened to display strings, columns taken from the first row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreviewTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl PreviewTable {
    pub fn from_rows(rows: &[PreviewRow]) -> Self {
        let Some(first) = rows.first() else {
            return Self::default();
        };
        let columns: Vec<String> = first.keys().cloned().collect();
        let rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| match row.get(column) {
                        Some(serde_json::Value::String(s)) => s.clone(),
                        Some(serde_json::Value::Null) | None => String::new(),
                        Some(other) => other.to_string(),
                    })
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBar {
    pub label: String,
    pub value: u64,
}

/// Bars sorted by descending count, ties by label.
pub fn chart_bars(counts: &CategoryCounts) -> Vec<ChartBar> {
    let mut bars: Vec<ChartBar> = counts
        .iter()
        .map(|(label, value)| ChartBar {
            label: label.clone(),
            value: *value,
        })
        .collect();
    bars.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    bars
}

/// Immutable snapshot of everything the client draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub status: SessionStatus,
    pub mode: LoginMode,
    pub submit_enabled: bool,
    pub upload_enabled: bool,
    pub upload_in_flight: bool,
    pub report_enabled: bool,
    pub status_message: String,
    pub error: Option<String>,
    pub selected_file: Option<String>,
    pub current_record_id: Option<i64>,
    pub stats: Option<StatCards>,
    pub table: PreviewTable,
    pub chart: Vec<ChartBar>,
    pub history: Vec<UploadSummary>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            status: SessionStatus::LoggedOut,
            mode: LoginMode::Login,
            submit_enabled: true,
            upload_enabled: false,
            upload_in_flight: false,
            report_enabled: false,
            status_message: "Welcome Back".to_string(),
            error: None,
            selected_file: None,
            current_record_id: None,
            stats: None,
            table: PreviewTable::default(),
            chart: Vec::new(),
            history: Vec::new(),
        }
    }
}

impl ViewState {
    /// Copy with the dashboard replaced by an analyze response.
    pub fn with_analysis(&self, response: &AnalyzeResponse) -> Self {
        let mut next = self.clone();
        next.stats = Some(StatCards {
            total_count: response.total_equipment_count,
            average_temperature: response.average_temperature,
            average_pressure: response.average_pressure,
            average_flowrate: response.average_flowrate,
        });
        next.table = PreviewTable::from_rows(&response.preview);
        next.chart = chart_bars(&response.type_counts);
        next.current_record_id = Some(response.id);
        next.report_enabled = true;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chart_bars_sorted_by_count() {
        let mut counts = CategoryCounts::new();
        counts.insert("Pump".to_string(), 2);
        counts.insert("Valve".to_string(), 5);
        counts.insert("Compressor".to_string(), 2);
        let labels: Vec<_> = chart_bars(&counts).into_iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["Valve", "Compressor", "Pump"]);
    }

    #[test]
    fn test_preview_table_keeps_column_order() {
        let rows: Vec<PreviewRow> = vec![
            json!({"Name": "P-1", "Type": "Pump", "Temperature": 10})
                .as_object()
                .unwrap()
                .clone(),
            json!({"Name": "V-1", "Type": null, "Temperature": 20.5})
                .as_object()
                .unwrap()
                .clone(),
        ];
        let table = PreviewTable::from_rows(&rows);
        assert_eq!(table.columns, vec!["Name", "Type", "Temperature"]);
        assert_eq!(table.rows[0], vec!["P-1", "Pump", "10"]);
        assert_eq!(table.rows[1], vec!["V-1", "", "20.5"]);
    }

    #[test]
    fn test_login_mode_toggle() {
        assert_eq!(LoginMode::Login.toggled(), LoginMode::Register);
        assert_eq!(LoginMode::Register.action_label(), "Sign Up");
    }
}
