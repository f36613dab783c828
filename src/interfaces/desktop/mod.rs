//! Desktop client runtime: drives the session controller from a terminal.

mod chart;
mod input;
mod opener;
mod render;

pub use chart::render_chart_svg;
pub use input::{parse_input, Input, HELP};
pub use opener::{opener_command, PlatformOpener, ReportOpener};
pub use render::{render_chart, render_stat_cards, render_table, render_view};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::application::use_cases::session::{
    Command, Completion, Effect, SessionBackend, SessionController,
};
use crate::domain::error::ClientError;
use crate::domain::session::{LoginMode, ViewState};

/// Owns the controller task; commands go in, snapshots come out.
pub struct SessionRuntime {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Arc<ViewState>>,
    task: JoinHandle<()>,
}

impl SessionRuntime {
    pub fn spawn(
        mut controller: SessionController,
        backend: Arc<dyn SessionBackend>,
        opener: Arc<dyn ReportOpener>,
        upload_timeout: Duration,
    ) -> Self {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Command>();
        let (completion_tx, mut completion_rx) = mpsc::unbounded_channel::<Completion>();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let executor = EffectExecutor {
            backend,
            opener,
            upload_timeout,
            completions: completion_tx,
        };

        let task = tokio::spawn(async move {
            loop {
                let effect = tokio::select! {
                    command = command_rx.recv() => match command {
                        Some(command) => {
                            debug!(?command, "Session command");
                            controller.handle(command)
                        }
                        None => break,
                    },
                    Some(completion) = completion_rx.recv() => controller.complete(completion),
                };

                let snapshot = controller.snapshot();
                snapshot_tx.send_if_modified(|current| {
                    if Arc::ptr_eq(current, &snapshot) {
                        false
                    } else {
                        *current = snapshot;
                        true
                    }
                });

                if let Some(effect) = effect {
                    executor.spawn(effect);
                }
            }
        });

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        }
    }

    /// Queues a command; false once the runtime has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn snapshot(&self) -> Arc<ViewState> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewState>> {
        self.snapshots.clone()
    }

    pub async fn shutdown(self) {
        drop(self.commands);
        if let Err(err) = self.task.await {
            warn!(error = %err, "Session task ended abnormally");
        }
    }
}

#[derive(Clone)]
struct EffectExecutor {
    backend: Arc<dyn SessionBackend>,
    opener: Arc<dyn ReportOpener>,
    upload_timeout: Duration,
    completions: mpsc::UnboundedSender<Completion>,
}

impl EffectExecutor {
    fn spawn(&self, effect: Effect) {
        let executor = self.clone();
        tokio::spawn(async move {
            let completion = executor.run(effect).await;
            // Receiver gone means the runtime shut down
            let _ = executor.completions.send(completion);
        });
    }

    async fn run(&self, effect: Effect) -> Completion {
        match effect {
            Effect::Authenticate {
                request,
                mode,
                credentials,
            } => {
                let result = match mode {
                    LoginMode::Login => self.backend.login(&credentials).await,
                    LoginMode::Register => self.backend.register(&credentials).await,
                };
                Completion::Authenticated(request, result.map_err(|e| e.to_string()))
            }
            Effect::Upload {
                request,
                token,
                path,
            } => {
                let result =
                    match tokio::time::timeout(self.upload_timeout, self.backend.upload(&token, &path))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(ClientError::Timeout(self.upload_timeout.as_secs())),
                    };
                Completion::Uploaded(request, result.map_err(|e| e.to_string()))
            }
            Effect::FetchHistory { request, token } => Completion::HistoryLoaded(
                request,
                self.backend.history(&token).await.map_err(|e| e.to_string()),
            ),
            Effect::OpenReport { url } => Completion::ReportOpened(self.opener.open(&url).await),
        }
    }
}
