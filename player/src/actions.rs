use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use watchlink_core::error::ActionError;
use watchlink_core::{Clipboard, DownloadRequest, OpenOutcome, Opener};

#[cfg(target_os = "macos")]
const OPEN_COMMAND: &str = "open";
#[cfg(not(target_os = "macos"))]
const OPEN_COMMAND: &str = "xdg-open";

const OPEN_SETTLE_CHECKS: u32 = 5;
const OPEN_SETTLE_STEP: Duration = Duration::from_millis(20);

/// Hands URIs to the desktop's scheme handlers.
#[derive(Debug)]
pub struct SystemOpener {
    command: String,
}

impl Default for SystemOpener {
    fn default() -> Self {
        Self::new(OPEN_COMMAND)
    }
}

impl SystemOpener {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

impl Opener for SystemOpener {
    fn open_new(&mut self, target: &str) -> Result<OpenOutcome, ActionError> {
        let mut child = Command::new(&self.command)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                warn!("{} could not start: {}", self.command, e);
                ActionError::LaunchFailed(target.to_string())
            })?;

        // The launcher usually hands off and exits at once; give it a moment.
        for _ in 0..OPEN_SETTLE_CHECKS {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(OpenOutcome::Opened),
                Ok(Some(status)) => {
                    debug!("{} exited with {}", self.command, status);
                    return Ok(OpenOutcome::Blocked);
                }
                Ok(None) => thread::sleep(OPEN_SETTLE_STEP),
                Err(e) => {
                    warn!("Could not check {}: {}", self.command, e);
                    break;
                }
            }
        }

        // Still undecided. Reap it in the background so it never lingers as a zombie.
        let command = self.command.clone();
        thread::spawn(move || match child.wait() {
            Ok(status) => debug!("{} finished late with {}", command, status),
            Err(e) => debug!("Could not wait for {}: {}", command, e),
        });
        Ok(OpenOutcome::Indeterminate)
    }

    fn navigate(&mut self, target: &str) -> Result<(), ActionError> {
        let status = Command::new(&self.command)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|_| ActionError::LaunchFailed(target.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(ActionError::LaunchFailed(target.to_string()))
        }
    }
}

/// Copies by piping into whichever clipboard tool is installed.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    fn try_tool(bin: &str, args: &[&str], text: &str) -> bool {
        let mut child = match Command::new(bin)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(c) => c,
            Err(_) => return false,
        };
        if let Some(mut stdin) = child.stdin.take() {
            if stdin.write_all(text.as_bytes()).is_err() {
                return false;
            }
        }
        child.wait().map(|s| s.success()).unwrap_or(false)
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ActionError> {
        let tools: [(&str, &[&str]); 3] = [("wl-copy", &[]), ("xclip", &["-selection", "clipboard"]), ("pbcopy", &[])];
        for (bin, args) in tools {
            if Self::try_tool(bin, args, text) {
                debug!("Copied with {}", bin);
                return Ok(());
            }
        }
        Err(ActionError::CopyFailed)
    }
}

/// Result of a background download: the saved file name, or why it failed.
pub type DownloadResult = Result<String, ActionError>;

/// Start streaming `request` to disk. The outcome arrives on `done`.
pub fn spawn_download(handle: &Handle, request: DownloadRequest, done: mpsc::UnboundedSender<DownloadResult>) {
    handle.spawn(async move {
        let result = download(&request).await;
        if let Err(e) = &result {
            warn!("Download of {} failed: {}", request.url, e);
        }
        let _ = done.send(result.map(|_| request.filename.clone()));
    });
}

fn failed(e: impl std::fmt::Display) -> ActionError {
    ActionError::DownloadFailed(e.to_string())
}

async fn download(request: &DownloadRequest) -> Result<PathBuf, ActionError> {
    tokio::fs::create_dir_all(&request.dir).await.map_err(failed)?;
    let destination = request.destination();
    let partial = request.partial_path();

    match fetch(request, &partial, &destination).await {
        Ok(written) => {
            info!("Saved {} bytes to {}", written, destination.display());
            Ok(destination)
        }
        Err(e) => {
            match tokio::fs::remove_file(&partial).await {
                Ok(()) => debug!("Removed {}", partial.display()),
                Err(rm) if rm.kind() == ErrorKind::NotFound => {}
                Err(rm) => warn!("Could not remove {}: {}", partial.display(), rm),
            }
            Err(e)
        }
    }
}

/// Stream into `partial`, then move it over `destination`.
async fn fetch(request: &DownloadRequest, partial: &Path, destination: &Path) -> Result<u64, ActionError> {
    let mut response = reqwest::get(request.url.clone())
        .await
        .and_then(|r| r.error_for_status())
        .map_err(failed)?;

    let mut file = tokio::fs::File::create(partial).await.map_err(failed)?;
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await.map_err(failed)? {
        file.write_all(&chunk).await.map_err(failed)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(failed)?;
    drop(file);

    tokio::fs::rename(partial, destination).await.map_err(failed)?;
    Ok(written)
}
