use std::sync::{Arc, Mutex};

use sqlx::sqlite::SqlitePool;
use tracing::{error, info};

use crate::application::use_cases::analyze::AnalyzeUseCase;
use crate::application::use_cases::auth::AuthUseCase;
use crate::application::use_cases::report::ReportUseCase;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::ServerConfig;
use crate::infrastructure::db::connection::init_db;
use crate::infrastructure::db::upload_records::{SqliteUploadRecordRepository, UploadRecordRepository};
use crate::infrastructure::db::users::UserRepository;
use crate::infrastructure::storage::{ensure_data_dir, FileStore, LocalFileStore};
use crate::interfaces::http::{add_log, HttpState, LogEntry};

/// Opens storage for `config` and wires the use cases.
pub async fn bootstrap(config: &ServerConfig) -> Result<HttpState> {
    let data_dir = ensure_data_dir(&config.data_dir).map_err(|err| {
        error!(
            error = %err,
            data_dir = %config.data_dir.display(),
            "Failed to create data dir"
        );
        AppError::StorageError(format!("Failed to create data dir: {}", err))
    })?;

    let files = LocalFileStore::new(&data_dir, &config.upload_dir)
        .map_err(|err| AppError::StorageError(format!("Failed to create upload dir: {}", err)))?;
    let pool = init_db(&config.database_path()).await?;
    info!(
        database = %config.database_path().display(),
        uploads = %files.root().display(),
        "Storage ready"
    );

    let state = assemble(pool, Arc::new(files), config);
    add_log(&state.logs, "INFO", "System", "Visualizer backend initialized");
    Ok(state)
}

pub fn assemble(pool: SqlitePool, files: Arc<dyn FileStore>, config: &ServerConfig) -> HttpState {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let records: Arc<dyn UploadRecordRepository> =
        Arc::new(SqliteUploadRecordRepository::new(pool.clone()));
    let users = Arc::new(UserRepository::new(pool));

    HttpState {
        analyze: Arc::new(
            AnalyzeUseCase::new(files, records.clone()).with_history_limit(config.history_limit),
        ),
        auth: Arc::new(AuthUseCase::new(users)),
        reports: Arc::new(ReportUseCase::new(records)),
        logs,
        max_upload_bytes: config.max_upload_bytes,
    }
}
