use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

/// Hands a report URL to something that can display it.
#[async_trait]
pub trait ReportOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), String>;
}

/// Opens URLs with the OS default handler.
pub struct PlatformOpener;

/// Program and leading arguments for the current OS.
pub fn opener_command() -> (&'static str, Vec<&'static str>) {
    match std::env::consts::OS {
        "windows" => ("cmd", vec!["/C", "start", ""]),
        "macos" => ("open", vec![]),
        _ => ("xdg-open", vec![]),
    }
}

#[async_trait]
impl ReportOpener for PlatformOpener {
    async fn open(&self, url: &str) -> Result<(), String> {
        let (program, args) = opener_command();
        info!(program, url, "Opening report");
        let status = Command::new(program)
            .args(args)
            .arg(url)
            .status()
            .await
            .map_err(|e| format!("Failed to launch {}: {}", program, e))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("{} exited with {}", program, status))
        }
    }
}
