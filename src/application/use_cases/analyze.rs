use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::upload_record::{AnalyzeResponse, NewUploadRecord, UploadRecord, UploadSummary};
use crate::infrastructure::csv::StatsExtractor;
use crate::infrastructure::db::upload_records::UploadRecordRepository;
use crate::infrastructure::storage::FileStore;

pub const DEFAULT_HISTORY_LIMIT: i64 = 5;

/// One received file, as handed over by the HTTP boundary.
#[derive(Debug, Clone)]
pub struct UploadInput {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
    pub uploaded_by: Option<String>,
}

/// What a successful upload produced.
#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub record: UploadRecord,
    pub response: AnalyzeResponse,
}

/// Upload → store → extract → persist pipeline, plus the history query.
pub struct AnalyzeUseCase {
    files: Arc<dyn FileStore>,
    records: Arc<dyn UploadRecordRepository>,
    extractor: StatsExtractor,
    history_limit: i64,
}

impl AnalyzeUseCase {
    pub fn new(files: Arc<dyn FileStore>, records: Arc<dyn UploadRecordRepository>) -> Self {
        Self {
            files,
            records,
            extractor: StatsExtractor::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: i64) -> Self {
        if limit > 0 {
            self.history_limit = limit;
        }
        self
    }

    pub async fn handle_upload(&self, input: UploadInput) -> Result<AnalyzeOutcome> {
        if input.bytes.is_empty() {
            return Err(AppError::field("file", "The submitted file is empty."));
        }
        let file_name = input
            .file_name
            .clone()
            .unwrap_or_else(|| "upload.csv".to_string());

        let reference = self
            .files
            .store(&file_name, &input.bytes)
            .await
            .map_err(into_storage_error)?;
        info!(reference = %reference, size = input.bytes.len(), "Stored upload");

        let stats = match self.read_and_extract(&reference).await {
            Ok(stats) => stats,
            Err(err) => {
                self.discard(&reference).await;
                return Err(err);
            }
        };

        let new_record = NewUploadRecord::from_stats(
            reference.clone(),
            input.file_name,
            input.uploaded_by,
            &stats,
        );
        let record = match self.records.create(new_record).await {
            Ok(record) => record,
            Err(err) => {
                self.discard(&reference).await;
                return Err(into_storage_error(err));
            }
        };
        info!(
            id = record.id,
            total_count = record.total_count,
            "Analyzed upload"
        );

        let response = AnalyzeResponse::new(&record, stats);
        Ok(AnalyzeOutcome { record, response })
    }

    /// Most recent uploads first, capped at the configured limit.
    /// `limit <= 0` asks for the full page.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<UploadSummary>> {
        let limit = if limit <= 0 {
            self.history_limit
        } else {
            limit.min(self.history_limit)
        };
        let records = self.records.list_recent(limit).await?;
        Ok(records.iter().map(UploadRecord::summary).collect())
    }

    pub async fn get_record(&self, id: i64) -> Result<UploadRecord> {
        self.records.get_by_id(id).await
    }

    async fn read_and_extract(
        &self,
        reference: &str,
    ) -> Result<crate::domain::analysis::TabularStats> {
        let content = self
            .files
            .read(reference)
            .await
            .map_err(into_storage_error)?;
        self.extractor.extract(&content)
    }

    async fn discard(&self, reference: &str) {
        if let Err(err) = self.files.remove(reference).await {
            warn!(reference = %reference, error = %err, "Failed to discard stored upload");
        }
    }
}

fn into_storage_error(err: AppError) -> AppError {
    match err {
        AppError::StorageError(_) => err,
        other => AppError::StorageError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::connection::init_memory_db;
    use crate::infrastructure::db::upload_records::SqliteUploadRecordRepository;
    use crate::infrastructure::storage::LocalFileStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct FailingStore;

    #[async_trait]
    impl FileStore for FailingStore {
        async fn store(&self, _file_name: &str, _bytes: &[u8]) -> Result<String> {
            Err(AppError::StorageError("disk full".to_string()))
        }

        async fn read(&self, _reference: &str) -> Result<Vec<u8>> {
            Err(AppError::StorageError("unreachable".to_string()))
        }

        async fn remove(&self, _reference: &str) -> Result<()> {
            Ok(())
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        files: Arc<LocalFileStore>,
        records: Arc<SqliteUploadRecordRepository>,
        use_case: AnalyzeUseCase,
    }

    async fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(LocalFileStore::new(dir.path(), "uploads").unwrap());
        let records = Arc::new(SqliteUploadRecordRepository::new(
            init_memory_db().await.unwrap(),
        ));
        let use_case = AnalyzeUseCase::new(files.clone(), records.clone());
        Harness {
            _dir: dir,
            files,
            records,
            use_case,
        }
    }

    fn upload(content: &str) -> UploadInput {
        UploadInput {
            file_name: Some("equipment.csv".to_string()),
            bytes: content.as_bytes().to_vec(),
            uploaded_by: Some("alice".to_string()),
        }
    }

    fn stored_files(harness: &Harness) -> usize {
        std::fs::read_dir(harness.files.root()).unwrap().count()
    }

    #[tokio::test]
    async fn test_upload_scenario_persists_record() {
        let h = harness().await;
        let outcome = h
            .use_case
            .handle_upload(upload("Temperature,Type\n10,A\n20,A\n30,B\n"))
            .await
            .unwrap();

        let response = &outcome.response;
        assert_eq!(response.total_equipment_count, 3);
        assert_eq!(response.average_temperature, 20.0);
        assert_eq!(response.average_pressure, 0.0);
        assert_eq!(response.type_counts.get("A"), Some(&2));
        assert_eq!(response.type_counts.get("B"), Some(&1));
        assert_eq!(response.preview.len(), 3);
        assert_eq!(response.preview[0]["Temperature"], json!(10));

        let stored = h.records.get_by_id(response.id).await.unwrap();
        assert_eq!(stored, outcome.record);
        assert_eq!(
            h.files.read(&stored.source_file).await.unwrap(),
            b"Temperature,Type\n10,A\n20,A\n30,B\n".to_vec()
        );
        assert_eq!(stored.uploaded_by.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_parse_failure_leaves_no_record_or_file() {
        let h = harness().await;
        let err = h
            .use_case
            .handle_upload(upload("A,B\n1,2\n1,2,3,4\n"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ParseError(_)));
        assert!(h.records.list_recent(10).await.unwrap().is_empty());
        assert_eq!(stored_files(&h), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_storage_error() {
        let records = Arc::new(SqliteUploadRecordRepository::new(
            init_memory_db().await.unwrap(),
        ));
        let use_case = AnalyzeUseCase::new(Arc::new(FailingStore), records.clone());

        let err = use_case
            .handle_upload(upload("Temperature\n1\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StorageError(_)));
        assert!(records.list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_upload_is_validation_error() {
        let h = harness().await;
        let err = h.use_case.handle_upload(upload("")).await.unwrap_err();
        match err {
            AppError::ValidationError(errors) => assert!(errors.contains_key("file")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_recent_defaults_and_limits() {
        let h = harness().await;
        for i in 0..7 {
            h.use_case
                .handle_upload(upload(&format!("Temperature\n{i}\n")))
                .await
                .unwrap();
        }

        let default_page = h.use_case.list_recent(0).await.unwrap();
        assert_eq!(default_page.len(), DEFAULT_HISTORY_LIMIT as usize);
        assert_eq!(default_page[0].average_temperature, 6.0);

        let two = h.use_case.list_recent(2).await.unwrap();
        assert_eq!(two.len(), 2);
        assert!(two[0].id > two[1].id);

        let capped = h.use_case.list_recent(50).await.unwrap();
        assert_eq!(capped.len(), DEFAULT_HISTORY_LIMIT as usize);
    }
}
