//! Clipboard access

use std::{process::Stdio, sync::Arc};
use tokio::{io::AsyncWriteExt, process::Command, sync::Mutex};
use trait_variant::make;
use tracing::debug;

use crate::core::{
    error::{ClipboardError, ClipboardResult},
    types::WifiCredentials,
};

/// Commands tried in order by [`SystemClipboard`]
const CLIPBOARD_COMMANDS: [(&str, &[&str]); 4] = [
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
];

/// Write access to the system clipboard
#[make(Send)]
pub trait Clipboard: Sync + 'static {
    async fn write_text(&self, text: &str) -> ClipboardResult<()>;
}

/// Result of a copy request that may have nothing to copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    NoPassword,
}

/// Copy the password of scanned credentials
///
/// Open networks have nothing to copy; the clipboard is left untouched.
pub async fn copy_password<C: Clipboard>(
    clipboard: &C,
    credentials: &WifiCredentials,
) -> ClipboardResult<CopyOutcome> {
    if credentials.password.is_empty() {
        return Ok(CopyOutcome::NoPassword);
    }
    clipboard.write_text(&credentials.password).await?;
    Ok(CopyOutcome::Copied)
}

/// Clipboard backed by the platform's clipboard command line tools
#[derive(Debug, Default, Clone)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    async fn pipe_to(program: &str, args: &[&str], text: &str) -> std::io::Result<bool> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        Ok(child.wait().await?.success())
    }
}

impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> ClipboardResult<()> {
        let mut last_error = String::from("no clipboard command available");

        for (program, args) in CLIPBOARD_COMMANDS {
            match Self::pipe_to(program, args, text).await {
                Ok(true) => {
                    debug!("Copied {} bytes via {}", text.len(), program);
                    return Ok(());
                }
                Ok(false) => last_error = format!("{} exited with an error", program),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => last_error = format!("{}: {}", program, e),
            }
        }

        Err(ClipboardError::WriteFailed(last_error))
    }
}

/// In-memory clipboard for testing
#[derive(Debug, Clone, Default)]
pub struct MockClipboard {
    contents: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MockClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clipboard whose writes always fail
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every text written so far, oldest first
    pub async fn writes(&self) -> Vec<String> {
        self.contents.lock().await.clone()
    }
}

impl Clipboard for MockClipboard {
    async fn write_text(&self, text: &str) -> ClipboardResult<()> {
        if self.fail {
            return Err(ClipboardError::WriteFailed("mock clipboard failure".into()));
        }
        self.contents.lock().await.push(text.to_string());
        Ok(())
    }
}
