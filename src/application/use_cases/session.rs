use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

use crate::domain::error::ClientError;
use crate::domain::session::{LoginMode, SessionStatus, ViewState};
use crate::domain::upload_record::{AnalyzeResponse, UploadSummary};
use crate::domain::user::{AuthToken, Credentials};

/// User intent coming from the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ToggleMode,
    Submit {
        username: String,
        password: String,
        confirm: Option<String>,
    },
    Upload {
        path: PathBuf,
    },
    RefreshHistory,
    DownloadReport,
    Logout,
}

/// Issued with each request effect and echoed back by its completion.
pub type RequestId = u64;

/// Work the runtime must perform on the controller's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Authenticate {
        request: RequestId,
        mode: LoginMode,
        credentials: Credentials,
    },
    Upload {
        request: RequestId,
        token: String,
        path: PathBuf,
    },
    FetchHistory {
        request: RequestId,
        token: String,
    },
    OpenReport {
        url: String,
    },
}

/// Outcome of an effect, fed back into the controller.
///
/// A completion whose request id is no longer pending is dropped.
#[derive(Debug, Clone)]
pub enum Completion {
    Authenticated(RequestId, Result<AuthToken, String>),
    Uploaded(RequestId, Result<AnalyzeResponse, String>),
    HistoryLoaded(RequestId, Result<Vec<UploadSummary>, String>),
    ReportOpened(Result<(), String>),
}

/// Remote operations the client runtime performs for the controller.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ClientError>;
    async fn register(&self, credentials: &Credentials) -> Result<AuthToken, ClientError>;
    async fn upload(&self, token: &str, path: &Path) -> Result<AnalyzeResponse, ClientError>;
    async fn history(&self, token: &str) -> Result<Vec<UploadSummary>, ClientError>;
}

fn greeting(mode: LoginMode) -> &'static str {
    match mode {
        LoginMode::Login => "Welcome Back",
        LoginMode::Register => "Create Account",
    }
}

/// Public URL of the PDF report for a record.
pub fn report_url(api_base: &Url, id: i64) -> Result<Url, url::ParseError> {
    api_base.join(&format!("report/{}/", id))
}

/// Client session state machine.
///
/// Holds no I/O: `handle` and `complete` swap in a new snapshot and return
/// the effect, if any, the runtime should run next.
pub struct SessionController {
    api_base: Url,
    view: Arc<ViewState>,
    last_request: RequestId,
    pending_auth: Option<RequestId>,
    pending_upload: Option<RequestId>,
    pending_history: Option<RequestId>,
}

impl SessionController {
    pub fn new(api_base: Url) -> Self {
        Self {
            api_base,
            view: Arc::new(ViewState::default()),
            last_request: 0,
            pending_auth: None,
            pending_upload: None,
            pending_history: None,
        }
    }

    pub fn snapshot(&self) -> Arc<ViewState> {
        Arc::clone(&self.view)
    }

    fn publish(&mut self, next: ViewState) {
        self.view = Arc::new(next);
    }

    fn issue(&mut self) -> RequestId {
        self.last_request += 1;
        self.last_request
    }

    fn fetch_history(&mut self, token: String) -> Effect {
        let request = self.issue();
        self.pending_history = Some(request);
        Effect::FetchHistory { request, token }
    }

    fn token(&self) -> Option<String> {
        match &self.view.status {
            SessionStatus::LoggedIn { token, .. } => Some(token.clone()),
            _ => None,
        }
    }

    pub fn handle(&mut self, command: Command) -> Option<Effect> {
        match command {
            Command::ToggleMode => {
                if self.view.status != SessionStatus::LoggedOut {
                    return None;
                }
                let mut next = (*self.view).clone();
                next.mode = next.mode.toggled();
                next.status_message = greeting(next.mode).to_string();
                next.error = None;
                self.publish(next);
                None
            }
            Command::Submit {
                username,
                password,
                confirm,
            } => self.submit(username, password, confirm),
            Command::Upload { path } => {
                let token = self.token()?;
                if self.view.upload_in_flight {
                    return None;
                }
                let mut next = (*self.view).clone();
                let file_label = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                next.upload_in_flight = true;
                next.upload_enabled = false;
                next.selected_file = Some(file_label.clone());
                next.status_message = format!("Uploading {}...", file_label);
                next.error = None;
                self.publish(next);
                let request = self.issue();
                self.pending_upload = Some(request);
                Some(Effect::Upload {
                    request,
                    token,
                    path,
                })
            }
            Command::RefreshHistory => {
                let token = self.token()?;
                Some(self.fetch_history(token))
            }
            Command::DownloadReport => {
                self.token()?;
                let id = self.view.current_record_id?;
                match report_url(&self.api_base, id) {
                    Ok(url) => Some(Effect::OpenReport {
                        url: url.to_string(),
                    }),
                    Err(e) => {
                        let mut next = (*self.view).clone();
                        next.error = Some(format!("Invalid report URL: {}", e));
                        self.publish(next);
                        None
                    }
                }
            }
            Command::Logout => {
                self.pending_auth = None;
                self.pending_upload = None;
                self.pending_history = None;
                self.publish(ViewState::default());
                None
            }
        }
    }

    fn submit(
        &mut self,
        username: String,
        password: String,
        confirm: Option<String>,
    ) -> Option<Effect> {
        if self.view.status != SessionStatus::LoggedOut {
            return None;
        }
        let username = username.trim().to_string();
        let mode = self.view.mode;

        let local_error = if username.is_empty() || password.is_empty() {
            Some("Please fill in all fields")
        } else if mode == LoginMode::Register && confirm.as_deref() != Some(password.as_str()) {
            Some("Passwords do not match")
        } else {
            None
        };

        let mut next = (*self.view).clone();
        if let Some(message) = local_error {
            next.error = Some(message.to_string());
            self.publish(next);
            return None;
        }

        next.status = SessionStatus::Authenticating;
        next.submit_enabled = false;
        next.error = None;
        next.status_message = match mode {
            LoginMode::Login => "Logging in...".to_string(),
            LoginMode::Register => "Creating account...".to_string(),
        };
        self.publish(next);

        let request = self.issue();
        self.pending_auth = Some(request);
        Some(Effect::Authenticate {
            request,
            mode,
            credentials: Credentials { username, password },
        })
    }

    pub fn complete(&mut self, completion: Completion) -> Option<Effect> {
        let mut next = (*self.view).clone();
        match completion {
            Completion::Authenticated(request, result) => {
                if self.pending_auth != Some(request) {
                    return None;
                }
                self.pending_auth = None;
                match result {
                    Ok(auth) => {
                        let token = auth.token.clone();
                        next.status = SessionStatus::LoggedIn {
                            username: auth.username.clone(),
                            token: auth.token,
                        };
                        next.upload_enabled = true;
                        next.submit_enabled = false;
                        next.error = None;
                        next.status_message = format!("Logged in as {}", auth.username);
                        self.publish(next);
                        Some(self.fetch_history(token))
                    }
                    Err(message) => {
                        next.status = SessionStatus::LoggedOut;
                        next.submit_enabled = true;
                        next.error = Some(message);
                        next.status_message = greeting(next.mode).to_string();
                        self.publish(next);
                        None
                    }
                }
            }
            Completion::Uploaded(request, result) => {
                if self.pending_upload != Some(request) {
                    return None;
                }
                self.pending_upload = None;
                next.upload_in_flight = false;
                next.upload_enabled = next.status.is_logged_in();
                match result {
                    Ok(response) => {
                        let mut next = next.with_analysis(&response);
                        next.error = None;
                        next.status_message = "Analysis complete".to_string();
                        self.publish(next);
                        self.token().map(|token| self.fetch_history(token))
                    }
                    Err(message) => {
                        next.error = Some(message);
                        next.status_message = "Upload failed".to_string();
                        self.publish(next);
                        None
                    }
                }
            }
            Completion::HistoryLoaded(request, result) => {
                if self.pending_history != Some(request) {
                    return None;
                }
                self.pending_history = None;
                match result {
                    Ok(history) => next.history = history,
                    Err(message) => next.error = Some(message),
                }
                self.publish(next);
                None
            }
            Completion::ReportOpened(result) => {
                if let Err(message) = result {
                    next.error = Some(message);
                    self.publish(next);
                }
                None
            }
        }
    }
}
