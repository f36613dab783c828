use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use crate::domain::error::{AppError, Result};
use crate::domain::upload_record::{NewUploadRecord, UploadRecord};

/// Durable store of analyzed uploads.
#[async_trait]
pub trait UploadRecordRepository: Send + Sync {
    async fn create(&self, record: NewUploadRecord) -> Result<UploadRecord>;
    async fn get_by_id(&self, id: i64) -> Result<UploadRecord>;
    /// Most recent first; never more than `limit` entries.
    async fn list_recent(&self, limit: i64) -> Result<Vec<UploadRecord>>;
}

pub struct SqliteUploadRecordRepository {
    pool: SqlitePool,
}

impl SqliteUploadRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadRecordRepository for SqliteUploadRecordRepository {
    async fn create(&self, record: NewUploadRecord) -> Result<UploadRecord> {
        let created_at = Utc::now().timestamp_millis();

        let id = sqlx::query(
            "INSERT INTO upload_records (source_file, original_name, uploaded_by, created_at, total_count, avg_temperature, avg_pressure, avg_flowrate)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.source_file)
        .bind(&record.original_name)
        .bind(&record.uploaded_by)
        .bind(created_at)
        .bind(record.total_count.max(0))
        .bind(record.average_temperature)
        .bind(record.average_pressure)
        .bind(record.average_flowrate)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert upload record: {e}")))?
        .last_insert_rowid();

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: i64) -> Result<UploadRecord> {
        let record = sqlx::query_as::<_, UploadRecordEntity>(
            "SELECT id, source_file, original_name, uploaded_by, created_at, total_count, avg_temperature, avg_pressure, avg_flowrate
             FROM upload_records WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch upload record: {e}")))?;

        match record {
            Some(record) => Ok(record.into()),
            None => Err(AppError::NotFound(format!("Upload record not found: {}", id))),
        }
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<UploadRecord>> {
        let records = sqlx::query_as::<_, UploadRecordEntity>(
            "SELECT id, source_file, original_name, uploaded_by, created_at, total_count, avg_temperature, avg_pressure, avg_flowrate
             FROM upload_records ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list upload records: {e}")))?;

        Ok(records.into_iter().map(|record| record.into()).collect())
    }
}

#[derive(sqlx::FromRow)]
struct UploadRecordEntity {
    id: i64,
    source_file: String,
    original_name: Option<String>,
    uploaded_by: Option<String>,
    created_at: i64,
    total_count: i64,
    avg_temperature: f64,
    avg_pressure: f64,
    avg_flowrate: f64,
}

impl From<UploadRecordEntity> for UploadRecord {
    fn from(entity: UploadRecordEntity) -> Self {
        Self {
            id: entity.id,
            source_file: entity.source_file,
            original_name: entity.original_name,
            uploaded_by: entity.uploaded_by,
            created_at: DateTime::<Utc>::from_timestamp_millis(entity.created_at)
                .unwrap_or_default(),
            total_count: entity.total_count,
            average_temperature: entity.avg_temperature,
            average_pressure: entity.avg_pressure,
            average_flowrate: entity.avg_flowrate,
        }
    }
}
