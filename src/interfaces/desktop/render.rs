use std::fmt::Write;

use crate::domain::session::{ChartBar, PreviewTable, SessionStatus, StatCards, ViewState};
use crate::domain::upload_record::UploadSummary;

const BAR_WIDTH: usize = 40;
const MAX_CELL_WIDTH: usize = 24;

/// Full text frame for one snapshot.
pub fn render_view(view: &ViewState) -> String {
    let mut out = String::new();
    match &view.status {
        SessionStatus::LoggedOut | SessionStatus::Authenticating => {
            let _ = writeln!(out, "=== {} ===", view.status_message);
            let _ = writeln!(
                out,
                "Mode: {}{}",
                view.mode.action_label(),
                if view.submit_enabled { "" } else { " (waiting...)" }
            );
        }
        SessionStatus::LoggedIn { username, .. } => {
            let _ = writeln!(out, "{}", "=".repeat(60));
            let _ = writeln!(out, "Chemical Equipment Visualizer | {}", username);
            let _ = writeln!(out, "{}", "=".repeat(60));
            let _ = writeln!(out, "{}", view.status_message);
            if let Some(file) = &view.selected_file {
                let _ = writeln!(out, "File: {}", file);
            }
            if let Some(stats) = &view.stats {
                out.push_str(&render_stat_cards(stats));
            }
            if !view.table.columns.is_empty() {
                let _ = writeln!(out, "\nDATA PREVIEW");
                out.push_str(&render_table(&view.table));
            }
            if !view.chart.is_empty() {
                let _ = writeln!(out, "\nEQUIPMENT TYPES");
                out.push_str(&render_chart(&view.chart));
            }
            if !view.history.is_empty() {
                let _ = writeln!(out, "\nRECENT UPLOADS");
                out.push_str(&render_history(&view.history));
            }
            if view.report_enabled {
                let _ = writeln!(out, "\nReport available: type `report` to open it.");
            }
        }
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "Error: {}", error);
    }
    out
}

pub fn render_stat_cards(stats: &StatCards) -> String {
    let cards = [
        ("Total Equipment", stats.total_count.to_string()),
        ("Avg Temperature", format!("{:.1}", stats.average_temperature)),
        ("Avg Pressure", format!("{:.1}", stats.average_pressure)),
        ("Avg Flowrate", format!("{:.1}", stats.average_flowrate)),
    ];
    let mut out = String::new();
    let _ = writeln!(out, "{}", "-".repeat(72));
    let labels: Vec<String> = cards.iter().map(|(label, _)| format!("{:<17}", label)).collect();
    let values: Vec<String> = cards.iter().map(|(_, value)| format!("{:<17}", value)).collect();
    let _ = writeln!(out, "{}", labels.join(" ").trim_end());
    let _ = writeln!(out, "{}", values.join(" ").trim_end());
    let _ = writeln!(out, "{}", "-".repeat(72));
    out
}

fn clip(cell: &str) -> String {
    if cell.chars().count() > MAX_CELL_WIDTH {
        let head: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", head)
    } else {
        cell.to_string()
    }
}

pub fn render_table(table: &PreviewTable) -> String {
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            table
                .rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| clip(cell).chars().count())
                .chain(std::iter::once(clip(column).chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", clip(cell), width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let header = format_row(&table.columns);
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "{}", "-".repeat(header.chars().count()));
    for row in &table.rows {
        let _ = writeln!(out, "{}", format_row(row));
    }
    out
}

/// Horizontal bars scaled so the largest count spans the full width.
pub fn render_chart(bars: &[ChartBar]) -> String {
    let max = bars.iter().map(|bar| bar.value).max().unwrap_or(0);
    let label_width = bars
        .iter()
        .map(|bar| bar.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for bar in bars {
        let length = if max == 0 {
            0
        } else {
            ((bar.value as f64 / max as f64) * BAR_WIDTH as f64).round() as usize
        };
        let _ = writeln!(
            out,
            "{:<label_width$} | {} {}",
            bar.label,
            "#".repeat(length.max(usize::from(bar.value > 0))),
            bar.value,
            label_width = label_width
        );
    }
    out
}

pub fn render_history(history: &[UploadSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<18} {:<8} {:<10} {:<10}",
        "ID", "Date", "Count", "Avg Temp", "Avg Press"
    );
    for entry in history {
        let _ = writeln!(
            out,
            "{:<6} {:<18} {:<8} {:<10.1} {:<10.1}",
            entry.id, entry.date, entry.total_count, entry.average_temperature, entry.average_pressure
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(label: &str, value: u64) -> ChartBar {
        ChartBar {
            label: label.to_string(),
            value,
        }
    }

    #[test]
    fn test_stat_cards_one_decimal() {
        let cards = render_stat_cards(&StatCards {
            total_count: 3,
            average_temperature: 20.0,
            average_pressure: 1.0 / 3.0,
            average_flowrate: 12.345,
        });
        assert!(cards.contains("20.0"));
        assert!(cards.contains("0.3"));
        assert!(cards.contains("12.3"));
        assert!(!cards.contains("12.34"));
    }

    #[test]
    fn test_chart_scales_to_largest() {
        let chart = render_chart(&[bar("Pump", 4), bar("Valve", 2)]);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], format!("Pump  | {} 4", "#".repeat(BAR_WIDTH)));
        assert_eq!(lines[1], format!("Valve | {} 2", "#".repeat(BAR_WIDTH / 2)));
    }

    #[test]
    fn test_table_aligns_columns() {
        let table = PreviewTable {
            columns: vec!["Name".to_string(), "T".to_string()],
            rows: vec![vec!["Pump-1".to_string(), "10".to_string()]],
        };
        let rendered = render_table(&table);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Name   | T");
        assert_eq!(lines[2], "Pump-1 | 10");
    }

    #[test]
    fn test_logged_out_view_shows_error() {
        let view = ViewState {
            error: Some("Please fill in all fields".to_string()),
            ..ViewState::default()
        };
        let frame = render_view(&view);
        assert!(frame.contains("Welcome Back"));
        assert!(frame.contains("Error: Please fill in all fields"));
    }
}
