// ============================================================
// STATS EXTRACTOR
// ============================================================
// Parse uploaded CSV bytes and derive row count, column means,
// category counts and preview rows

use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::{Number, Value};
use std::collections::HashMap;

use crate::domain::analysis::{
    CategoryCounts, ColumnAverages, MeanAccumulator, PreviewRow, TabularStats, FLOWRATE_COLUMN,
    PREVIEW_ROW_LIMIT, PRESSURE_COLUMN, TEMPERATURE_COLUMN, TYPE_COLUMN,
};
use crate::domain::error::AppError;

/// Column typing used for preview values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

/// CSV stats extractor
pub struct StatsExtractor {
    /// Number of rows echoed back as preview
    preview_limit: usize,
}

impl Default for StatsExtractor {
    fn default() -> Self {
        Self {
            preview_limit: PREVIEW_ROW_LIMIT,
        }
    }
}

impl StatsExtractor {
    /// Create a new extractor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract stats from raw file bytes
    pub fn extract(&self, bytes: &[u8]) -> Result<TabularStats, AppError> {
        let content = decode_utf8(bytes)?;
        self.extract_content(&content)
    }

    /// Extract stats from already decoded content
    pub fn extract_content(&self, content: &str) -> Result<TabularStats, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::ParseError(
                "No columns to parse from file".to_string(),
            ));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(b',')
            .trim(Trim::All)
            .flexible(true) // Short rows are padded; long rows are rejected below
            .from_reader(content.as_bytes());

        let raw_headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();
        let headers = dedupe_headers(&raw_headers);

        let mut records: Vec<StringRecord> = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", records.len() + 1, e))
            })?;

            if record.len() > headers.len() {
                let line = record
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(records.len() as u64 + 2);
                return Err(AppError::ParseError(format!(
                    "Error tokenizing data. Expected {} fields in line {}, saw {}",
                    headers.len(),
                    line,
                    record.len()
                )));
            }

            // A lone empty field is a blank line
            if record.len() == 1 && record.get(0).map_or(true, str::is_empty) && headers.len() > 1 {
                continue;
            }

            records.push(record);
        }

        let index_of = |name: &str| headers.iter().position(|h| h == name);

        let averages = ColumnAverages {
            temperature: index_of(TEMPERATURE_COLUMN)
                .map(|idx| column_mean(&records, idx))
                .unwrap_or(0.0),
            pressure: index_of(PRESSURE_COLUMN)
                .map(|idx| column_mean(&records, idx))
                .unwrap_or(0.0),
            flowrate: index_of(FLOWRATE_COLUMN)
                .map(|idx| column_mean(&records, idx))
                .unwrap_or(0.0),
        };

        let category_counts = index_of(TYPE_COLUMN)
            .map(|idx| count_categories(&records, idx))
            .unwrap_or_default();

        let kinds: Vec<ColumnKind> = (0..headers.len())
            .map(|idx| column_kind(&records, idx))
            .collect();
        let preview_rows = records
            .iter()
            .take(self.preview_limit)
            .map(|record| preview_row(&headers, &kinds, record))
            .collect();

        Ok(TabularStats {
            row_count: records.len(),
            averages,
            category_counts,
            preview_rows,
        })
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, AppError> {
    let (content, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(AppError::ParseError(
            "File is not valid UTF-8 text".to_string(),
        ));
    }
    Ok(content.into_owned())
}

/// Rename repeated headers to `name.1`, `name.2`, ...
///
/// A generated name that is already taken gets suffixed again (`A.1.1`)
fn dedupe_headers(headers: &StringRecord) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .iter()
        .map(|header| {
            let mut name = header.to_string();
            let mut count = seen.get(&name).copied().unwrap_or(0);
            while count > 0 {
                seen.insert(name.clone(), count + 1);
                name = format!("{}.{}", name, count);
                count = seen.get(&name).copied().unwrap_or(0);
            }
            seen.insert(name.clone(), 1);
            name
        })
        .collect()
}

fn cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).filter(|value| !value.is_empty())
}

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn column_mean(records: &[StringRecord], idx: usize) -> f64 {
    let mut acc = MeanAccumulator::default();
    for value in records.iter().filter_map(|r| cell(r, idx)).filter_map(parse_number) {
        acc.push(value);
    }
    acc.mean()
}

fn count_categories(records: &[StringRecord], idx: usize) -> CategoryCounts {
    let mut counts = CategoryCounts::new();
    for label in records.iter().filter_map(|r| cell(r, idx)) {
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    counts
}

fn column_kind(records: &[StringRecord], idx: usize) -> ColumnKind {
    let mut kind = ColumnKind::Integer;
    let mut any = false;
    for value in records.iter().filter_map(|r| cell(r, idx)) {
        any = true;
        if kind == ColumnKind::Integer && value.parse::<i64>().is_ok() {
            continue;
        }
        if parse_number(value).is_some() {
            kind = ColumnKind::Float;
        } else {
            return ColumnKind::Text;
        }
    }
    if any {
        kind
    } else {
        ColumnKind::Text
    }
}

fn preview_row(headers: &[String], kinds: &[ColumnKind], record: &StringRecord) -> PreviewRow {
    let mut row = PreviewRow::new();
    for (idx, header) in headers.iter().enumerate() {
        let value = match cell(record, idx) {
            None => Value::Null,
            Some(raw) => match kinds[idx] {
                ColumnKind::Integer => raw
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(raw.to_string())),
                ColumnKind::Float => parse_number(raw)
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(raw.to_string())),
                ColumnKind::Text => Value::String(raw.to_string()),
            },
        };
        row.insert(header.clone(), value);
    }
    row
}
