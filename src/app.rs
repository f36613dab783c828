use std::sync::Arc;

use actix_web::web;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::application::use_cases::session::SessionController;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::api_client::ApiClient;
use crate::infrastructure::bootstrap::bootstrap;
use crate::infrastructure::config::ConfigService;
use crate::interfaces::desktop::{
    parse_input, render_chart_svg, render_view, Input, PlatformOpener, SessionRuntime, HELP,
};
use crate::interfaces::http::start_server;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Runs the HTTP backend until it is stopped.
pub async fn run() -> Result<()> {
    init_tracing();

    let config = ConfigService::new().server()?;
    let state = bootstrap(&config).await.map_err(|err| {
        error!(error = %err, "Failed to initialize backend");
        err
    })?;

    info!(host = %config.host, port = config.port, "Starting HTTP server");
    let server = start_server(web::Data::new(state), &config.host, config.port)?;
    server.await?;
    Ok(())
}

/// Terminal client: reads commands from stdin and redraws on every snapshot.
pub async fn run_desktop() -> Result<()> {
    init_tracing();

    let config = ConfigService::new().client()?;
    let client = ApiClient::new(&config).map_err(|e| AppError::Internal(e.to_string()))?;
    let api_base: Url = client.base_url().clone();
    let runtime = SessionRuntime::spawn(
        SessionController::new(api_base),
        Arc::new(client),
        Arc::new(PlatformOpener),
        config.upload_timeout(),
    );

    let mut snapshots = runtime.subscribe();
    let redraw = tokio::spawn(async move {
        loop {
            let frame = render_view(&snapshots.borrow_and_update());
            println!("\n{}", frame);
            if snapshots.changed().await.is_err() {
                break;
            }
        }
    });

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line, &runtime.snapshot()) {
            Input::Commands(commands) => {
                for command in commands {
                    if !runtime.send(command) {
                        break;
                    }
                }
            }
            Input::ExportChart(path) => {
                let result = match render_chart_svg(&runtime.snapshot().chart) {
                    Ok(svg) => tokio::fs::write(&path, svg).await.map_err(|e| e.to_string()),
                    Err(message) => Err(message),
                };
                match result {
                    Ok(()) => println!("Chart saved to {}", path.display()),
                    Err(message) => println!("Chart not saved: {}", message),
                }
            }
            Input::Help => println!("{}", HELP),
            Input::Invalid(message) => println!("{}", message),
            Input::Quit => break,
        }
    }

    runtime.shutdown().await;
    redraw.abort();
    Ok(())
}
