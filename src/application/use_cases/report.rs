use std::sync::Arc;
use tracing::info;

use crate::domain::error::Result;
use crate::domain::report::{
    ReportFont, ReportLayout, ReportLine, Separator, PAGE_HEIGHT, PAGE_WIDTH,
};
use crate::domain::upload_record::UploadRecord;
use crate::infrastructure::db::upload_records::UploadRecordRepository;
use crate::infrastructure::pdf;

pub const REPORT_TITLE: &str = "Chemical Equipment Analysis Report";
pub const REPORT_FOOTER: &str = "Generated by Hybrid Visualizer App";

pub fn report_layout(record: &UploadRecord) -> ReportLayout {
    use ReportFont::*;

    let lines = vec![
        ReportLine::new(REPORT_TITLE, 750.0, Bold, 16.0),
        ReportLine::new(
            format!("Generated for Upload ID: {}", record.id),
            730.0,
            Regular,
            12.0,
        ),
        ReportLine::new(format!("Date: {}", record.formatted_date()), 715.0, Regular, 12.0),
        ReportLine::new(
            format!("Total Equipment Count: {}", record.total_count),
            670.0,
            Regular,
            12.0,
        ),
        ReportLine::new(
            format!("Average Temperature: {:.2} C", record.average_temperature),
            650.0,
            Regular,
            12.0,
        ),
        ReportLine::new(
            format!("Average Pressure: {:.2} atm", record.average_pressure),
            630.0,
            Regular,
            12.0,
        ),
        ReportLine::new(
            format!("Average Flowrate: {:.2} L/min", record.average_flowrate),
            610.0,
            Regular,
            12.0,
        ),
        ReportLine::new(REPORT_FOOTER, 50.0, Oblique, 10.0),
    ];

    ReportLayout {
        width: PAGE_WIDTH,
        height: PAGE_HEIGHT,
        lines,
        separators: vec![Separator {
            from: (100.0, 700.0),
            to: (500.0, 700.0),
        }],
    }
}

pub fn report_file_name(id: i64) -> String {
    format!("report_{}.pdf", id)
}

pub struct ReportUseCase {
    records: Arc<dyn UploadRecordRepository>,
}

impl ReportUseCase {
    pub fn new(records: Arc<dyn UploadRecordRepository>) -> Self {
        Self { records }
    }

    /// PDF bytes for one record; `NotFound` leaves nothing rendered.
    pub async fn render_for(&self, id: i64) -> Result<Vec<u8>> {
        let record = self.records.get_by_id(id).await?;
        let bytes = pdf::render(&report_layout(&record))?;
        info!(id, size = bytes.len(), "Rendered report");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::domain::upload_record::NewUploadRecord;
    use crate::infrastructure::db::connection::init_memory_db;
    use crate::infrastructure::db::upload_records::SqliteUploadRecordRepository;
    use chrono::{TimeZone, Utc};

    fn record() -> UploadRecord {
        UploadRecord {
            id: 12,
            source_file: "uploads/x.csv".to_string(),
            original_name: None,
            uploaded_by: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            total_count: 3,
            average_temperature: 20.0,
            average_pressure: 1.0 / 3.0,
            average_flowrate: 0.0,
        }
    }

    #[test]
    fn test_layout_text_and_positions() {
        let layout = report_layout(&record());
        let texts: Vec<&str> = layout.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Chemical Equipment Analysis Report",
                "Generated for Upload ID: 12",
                "Date: 2024-01-02 03:04",
                "Total Equipment Count: 3",
                "Average Temperature: 20.00 C",
                "Average Pressure: 0.33 atm",
                "Average Flowrate: 0.00 L/min",
                "Generated by Hybrid Visualizer App",
            ]
        );

        assert_eq!(layout.lines[0].font, ReportFont::Bold);
        assert_eq!(layout.lines[0].size, 16.0);
        assert_eq!(layout.lines[0].y, 750.0);
        let footer = layout.lines.last().unwrap();
        assert_eq!((footer.x, footer.y), (100.0, 50.0));
        assert_eq!(footer.font, ReportFont::Oblique);
        assert_eq!(layout.separators[0].to, (500.0, 700.0));
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name(4), "report_4.pdf");
    }

    #[tokio::test]
    async fn test_render_for_existing_and_missing() {
        let records = Arc::new(SqliteUploadRecordRepository::new(
            init_memory_db().await.unwrap(),
        ));
        let created = records
            .create(NewUploadRecord {
                source_file: "uploads/a.csv".to_string(),
                original_name: None,
                uploaded_by: None,
                total_count: 5,
                average_temperature: 1.0,
                average_pressure: 2.0,
                average_flowrate: 3.0,
            })
            .await
            .unwrap();
        let reports = ReportUseCase::new(records);

        let bytes = reports.render_for(created.id).await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        assert!(matches!(
            reports.render_for(created.id + 100).await,
            Err(AppError::NotFound(_))
        ));
    }
}
