//! Terminal implementations of the share and clipboard capabilities.

use std::io::{ErrorKind, IsTerminal};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use larder_core::share::{PlatformError, SharePlatform};

/// Clipboard helpers tried in order.
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("pbcopy", &[]),
    ("clip", &[]),
];

/// "Native" sharing on a terminal: show the link as a QR code and wait for
/// the user to finish scanning it.
pub struct TerminalShare {
    qr: bool,
}

impl TerminalShare {
    pub fn new(qr: bool) -> Self {
        Self { qr }
    }
}

#[async_trait]
impl SharePlatform for TerminalShare {
    async fn native_share(&self, title: &str, text: &str, url: &str) -> Result<(), PlatformError> {
        if !self.qr || !std::io::stderr().is_terminal() || !std::io::stdin().is_terminal() {
            return Err(PlatformError::Unavailable);
        }
        let qr = render_qr(url).map_err(PlatformError::Failed)?;

        eprintln!("\n{title}");
        eprintln!("{text}");
        eprintln!("{url}\n");
        eprint!("{qr}");
        eprint!("\nPress Enter when done, or q to cancel: ");

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| PlatformError::Failed(e.to_string()))?;
        if read == 0 || line.trim().eq_ignore_ascii_case("q") {
            return Err(PlatformError::Cancelled);
        }
        Ok(())
    }

    async fn clipboard_write(&self, text: &str) -> Result<(), PlatformError> {
        let mut last_error = None;
        for (program, args) in CLIPBOARD_COMMANDS {
            match pipe_to(program, args, text).await {
                Ok(()) => {
                    debug!(program, "copied to clipboard");
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    debug!(program, error = %e, "clipboard command failed");
                    last_error = Some(format!("{program}: {e}"));
                }
            }
        }
        Err(PlatformError::Failed(last_error.unwrap_or_else(|| {
            "no clipboard command found (tried wl-copy, xclip, pbcopy, clip)".to_string()
        })))
    }
}

async fn pipe_to(program: &str, args: &[&str], text: &str) -> std::io::Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
    }
    let status = child.wait().await?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("exited with {status}")))
    }
}

/// Renders a compact QR code using Unicode half-block characters.
///
/// Each character encodes two vertical modules, halving the output height.
pub fn render_qr(data: &str) -> Result<String, String> {
    use qrcode::QrCode;

    let code = QrCode::new(data.as_bytes())
        .map_err(|e| format!("Failed to generate QR code: {e}"))?;

    let width = code.width();
    let colors: Vec<bool> = code
        .into_colors()
        .into_iter()
        .map(|c| c == qrcode::Color::Dark)
        .collect();

    // 1-module quiet zone on each side
    let quiet = 1;
    let total = width + 2 * quiet;

    let is_dark = |row: usize, col: usize| -> bool {
        if row < quiet || row >= quiet + width || col < quiet || col >= quiet + width {
            return false;
        }
        colors[(row - quiet) * width + (col - quiet)]
    };

    let mut out = String::with_capacity(total * total);
    let mut row = 0;
    while row < total {
        for col in 0..total {
            let top = is_dark(row, col);
            let bot = row + 1 < total && is_dark(row + 1, col);
            out.push(match (top, bot) {
                (true, true) => '\u{2588}',  // █
                (true, false) => '\u{2580}', // ▀
                (false, true) => '\u{2584}', // ▄
                (false, false) => ' ',
            });
        }
        out.push('\n');
        row += 2;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_qr_shape() {
        let qr = render_qr("https://larder.example/recipe/r1").unwrap();
        let lines: Vec<&str> = qr.lines().collect();
        let width = lines[0].chars().count();
        assert!(width >= 23);
        assert!(lines.iter().all(|l| l.chars().count() == width));
        // Two modules per character row, rounded up.
        assert_eq!(lines.len(), width.div_ceil(2));
        assert!(qr.contains('\u{2588}'));
    }

    #[tokio::test]
    async fn test_native_share_disabled_is_unavailable() {
        let platform = TerminalShare::new(false);
        assert_eq!(
            platform.native_share("Soup", "Check out", "https://x").await,
            Err(PlatformError::Unavailable)
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let err = pipe_to("larder-definitely-not-installed", &[], "x")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
