mod auth;
mod errors;

pub use auth::{token_from_header, AuthenticatedUser};

use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::middleware::NormalizePath;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::application::use_cases::analyze::{AnalyzeUseCase, UploadInput};
use crate::application::use_cases::auth::AuthUseCase;
use crate::application::use_cases::report::{report_file_name, ReportUseCase};
use crate::domain::error::AppError;
use crate::domain::user::Credentials;

const LOG_CAPACITY: usize = 100;
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub analyze: Arc<AnalyzeUseCase>,
    pub auth: Arc<AuthUseCase>,
    pub reports: Arc<ReportUseCase>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
    pub max_upload_bytes: usize,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[post("/register")]
async fn register(
    data: web::Data<HttpState>,
    req: web::Json<Credentials>,
) -> Result<HttpResponse, AppError> {
    let username = req.username.trim().to_string();
    match data.auth.register(req.into_inner()).await {
        Ok(token) => {
            add_log(&data.logs, "INFO", "Auth", &format!("Registered {}", token.username));
            Ok(HttpResponse::Ok().json(token))
        }
        Err(e) => {
            add_log(
                &data.logs,
                "WARN",
                "Auth",
                &format!("Registration for {} rejected: {}", username, e),
            );
            Err(e)
        }
    }
}

#[post("/login")]
async fn login(
    data: web::Data<HttpState>,
    req: web::Json<Credentials>,
) -> Result<HttpResponse, AppError> {
    let username = req.username.trim().to_string();
    match data.auth.login(req.into_inner()).await {
        Ok(token) => {
            add_log(&data.logs, "INFO", "Auth", &format!("{} logged in", token.username));
            Ok(HttpResponse::Ok().json(token))
        }
        Err(e) => {
            add_log(
                &data.logs,
                "WARN",
                "Auth",
                &format!("Login failed for {}", username),
            );
            Err(e)
        }
    }
}

#[get("/analyze")]
async fn history(
    data: web::Data<HttpState>,
    _user: AuthenticatedUser,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let summaries = data.analyze.list_recent(query.limit.unwrap_or(0)).await?;
    Ok(HttpResponse::Ok().json(summaries))
}

#[post("/analyze")]
async fn analyze(
    data: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let (file_name, bytes) = read_upload(payload, data.max_upload_bytes).await?;
    add_log(
        &data.logs,
        "INFO",
        "Analyze",
        &format!(
            "Received {} ({} bytes) from {}",
            file_name.as_deref().unwrap_or("unnamed upload"),
            bytes.len(),
            user.0.username
        ),
    );

    let input = UploadInput {
        file_name,
        bytes,
        uploaded_by: Some(user.0.username),
    };
    match data.analyze.handle_upload(input).await {
        Ok(outcome) => {
            add_log(
                &data.logs,
                "INFO",
                "Analyze",
                &format!(
                    "Record {} created with {} rows",
                    outcome.record.id, outcome.record.total_count
                ),
            );
            Ok(HttpResponse::Ok().json(outcome.response))
        }
        Err(e) => {
            add_log(&data.logs, "ERROR", "Analyze", &format!("Analysis failed: {}", e));
            Err(e)
        }
    }
}

/// Collects the `file` field, enforcing the size limit while streaming.
async fn read_upload(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<(Option<String>, Vec<u8>), AppError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::field(UPLOAD_FIELD, format!("Malformed upload: {}", e)))?
    {
        let disposition = field.content_disposition();
        if disposition.get_name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = disposition.get_filename().map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::field(UPLOAD_FIELD, format!("Malformed upload: {}", e)))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::field(
                    UPLOAD_FIELD,
                    format!("Upload exceeds the maximum size of {} bytes.", max_bytes),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok((file_name, bytes));
    }
    Err(AppError::field(UPLOAD_FIELD, "No file was submitted."))
}

#[get("/report/{id}")]
async fn report(data: web::Data<HttpState>, path: web::Path<i64>) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let bytes = match data.reports.render_for(id).await {
        Ok(bytes) => bytes,
        Err(AppError::NotFound(_)) => {
            add_log(&data.logs, "WARN", "Report", &format!("No record {}", id));
            return Err(AppError::NotFound("File not found".to_string()));
        }
        Err(e) => return Err(e),
    };

    let disposition = ContentDisposition {
        disposition: DispositionType::Inline,
        parameters: vec![DispositionParam::Filename(report_file_name(id))],
    };
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(disposition)
        .body(bytes))
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data
        .logs
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    HttpResponse::Ok().json(&*logs)
}

/// Records an entry in the `/logs` ring and forwards it to tracing.
pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    match level {
        "ERROR" => tracing::error!(source, "{}", message),
        "WARN" => tracing::warn!(source, "{}", message),
        _ => tracing::info!(source, "{}", message),
    }
    let mut logs = logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    logs.push(entry);
    if logs.len() > LOG_CAPACITY {
        logs.remove(0);
    }
}

/// Mounts every route under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(register)
            .service(login)
            .service(history)
            .service(analyze)
            .service(report)
            .service(get_logs),
    );
}

pub fn start_server(state: web::Data<HttpState>, host: &str, port: u16) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Desktop client and browser both call in

        App::new()
            .wrap(cors)
            .wrap(NormalizePath::trim())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bootstrap::assemble;
    use crate::infrastructure::config::ServerConfig;
    use crate::infrastructure::db::connection::init_memory_db;
    use crate::infrastructure::storage::LocalFileStore;
    use actix_web::http::header;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{json, Value};

    const BOUNDARY: &str = "visualizer-test-boundary";

    async fn state() -> (tempfile::TempDir, web::Data<HttpState>) {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            data_dir: dir.path().to_path_buf(),
            max_upload_bytes: 1024,
            ..ServerConfig::default()
        };
        let files = Arc::new(LocalFileStore::new(dir.path(), &config.upload_dir).unwrap());
        let pool = init_memory_db().await.unwrap();
        (dir, web::Data::new(assemble(pool, files, &config)))
    }

    macro_rules! service {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .wrap(NormalizePath::trim())
                    .app_data($state.clone())
                    .configure(configure),
            )
            .await
        };
    }

    fn multipart(field: &str, file_name: &str, content: &str) -> Vec<u8> {
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: text/csv\r\n\r\n{content}\r\n--{b}--\r\n",
            b = BOUNDARY
        )
        .into_bytes()
    }

    fn upload_request(token: &str, body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/analyze/")
            .insert_header((header::AUTHORIZATION, format!("Token {}", token)))
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    macro_rules! register_token {
        ($app:expr, $username:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/register/")
                .set_json(json!({ "username": $username, "password": "s3cret" }))
                .to_request();
            let body: Value = test::call_and_read_body_json(&$app, req).await;
            body["token"].as_str().unwrap().to_string()
        }};
    }

    #[actix_web::test]
    async fn test_register_and_login() {
        let (_dir, state) = state().await;
        let app = service!(state);

        let token = register_token!(app, "alice");

        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "username": "alice", "password": "s3cret" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["token"], token.as_str());
        assert_eq!(body["username"], "alice");
    }

    #[actix_web::test]
    async fn test_duplicate_username_is_field_error() {
        let (_dir, state) = state().await;
        let app = service!(state);
        register_token!(app, "alice");

        let req = test::TestRequest::post()
            .uri("/api/register/")
            .set_json(json!({ "username": "alice", "password": "other" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["username"][0],
            "A user with that username already exists."
        );
    }

    #[actix_web::test]
    async fn test_bad_login_is_generic_error() {
        let (_dir, state) = state().await;
        let app = service!(state);
        register_token!(app, "alice");

        let req = test::TestRequest::post()
            .uri("/api/login/")
            .set_json(json!({ "username": "alice", "password": "nope" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Invalid Credentials" }));
    }

    #[actix_web::test]
    async fn test_protected_routes_require_token() {
        let (_dir, state) = state().await;
        let app = service!(state);

        let req = test::TestRequest::get().uri("/api/analyze/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["detail"].is_string());

        let resp = test::call_service(
            &app,
            upload_request("not-a-token", multipart("file", "a.csv", "A\n1")).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_upload_history_and_report() {
        let (_dir, state) = state().await;
        let app = service!(state);
        let token = register_token!(app, "alice");

        let body = multipart("file", "sample.csv", "Temperature,Type\n10,A\n20,A\n30,B");
        let resp = test::call_service(&app, upload_request(&token, body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let analyzed: Value = test::read_body_json(resp).await;
        assert_eq!(analyzed["totalEquipmentCount"], 3);
        assert_eq!(analyzed["averageTemperature"], 20.0);
        assert_eq!(analyzed["typeCounts"], json!({ "A": 2, "B": 1 }));
        assert_eq!(analyzed["preview"][2], json!({ "Temperature": 30, "Type": "B" }));
        let id = analyzed["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri("/api/analyze")
            .insert_header((header::AUTHORIZATION, format!("Token {}", token)))
            .to_request();
        let listing: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listing[0]["id"], id);
        assert_eq!(listing[0]["totalCount"], 3);

        let req = test::TestRequest::get()
            .uri(&format!("/api/report/{}/", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(disposition, format!("inline; filename=\"report_{}.pdf\"", id));
        let pdf = test::read_body(resp).await;
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[actix_web::test]
    async fn test_history_limit_is_capped() {
        let (_dir, state) = state().await;
        let app = service!(state);
        let token = register_token!(app, "alice");

        for i in 0..7 {
            let body = multipart("file", "a.csv", &format!("Temperature\n{}", i));
            let resp = test::call_service(&app, upload_request(&token, body).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/api/analyze/?limit=50")
            .insert_header((header::AUTHORIZATION, format!("Token {}", token)))
            .to_request();
        let listing: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listing.len(), 5);
        assert_eq!(listing[0]["averageTemperature"], 6.0);
    }

    #[actix_web::test]
    async fn test_report_missing_record() {
        let (_dir, state) = state().await;
        let app = service!(state);

        let req = test::TestRequest::get().uri("/api/report/999").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "File not found" }));
    }

    #[actix_web::test]
    async fn test_upload_errors() {
        let (_dir, state) = state().await;
        let app = service!(state);
        let token = register_token!(app, "alice");

        let wrong_field = multipart("attachment", "a.csv", "A\n1");
        let resp = test::call_service(&app, upload_request(&token, wrong_field).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["file"][0], "No file was submitted.");

        let malformed = multipart("file", "a.csv", "A,B\n1,2\n1,2,3");
        let resp = test::call_service(&app, upload_request(&token, malformed).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("Expected 2 fields"));

        let oversized = multipart("file", "a.csv", &"x".repeat(2048));
        let resp = test::call_service(&app, upload_request(&token, oversized).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["file"][0].as_str().unwrap().contains("maximum size"));
    }

    #[actix_web::test]
    async fn test_logs_ring_is_bounded() {
        let (_dir, state) = state().await;
        for i in 0..(LOG_CAPACITY + 5) {
            add_log(&state.logs, "INFO", "Test", &format!("entry {}", i));
        }
        let app = service!(state);

        let req = test::TestRequest::get().uri("/api/logs").to_request();
        let logs: Vec<LogEntry> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(logs.len(), LOG_CAPACITY);
        assert_eq!(logs[0].message, "entry 5");
    }
}
