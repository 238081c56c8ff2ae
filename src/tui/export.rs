use crate::export::Exporter;
use crate::model::RECORD_COUNT;
use crate::session::SessionController;
use anyhow::Result;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::{StatusLevel, UiState};

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Write the workbook to the export directory and report the outcome on the
/// status line. Failures leave the session untouched.
pub fn export_workbook(session: &SessionController, state: &mut UiState) {
    let written = session
        .export()
        .map_err(anyhow::Error::from)
        .and_then(|bytes| Exporter::write_to_dir(&state.export_dir, &bytes));
    match written {
        Ok(path) => {
            state.last_exported_path = Some(path.to_string_lossy().to_string());
            state.success(format!(
                "Exported {} of {} located records: {} (press 'y' to copy path)",
                session.store().confirmed_count(),
                RECORD_COUNT,
                path.display()
            ));
        }
        Err(e) => {
            tracing::warn!("export failed: {e:#}");
            state.set_status(
                StatusLevel::Warning,
                format!("Export failed: {e:#}"),
            );
        }
    }
}

/// Copy the last exported path to the clipboard.
pub fn copy_exported_path(state: &mut UiState) {
    let Some(path) = state.last_exported_path.clone() else {
        state.info("No exported file yet. Press 's' to export first");
        return;
    };
    match copy_to_clipboard(&path) {
        Ok(()) => {
            let shown = if path.chars().count() > 60 {
                let tail: String = path
                    .chars()
                    .rev()
                    .take(57)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                format!("...{tail}")
            } else {
                path
            };
            state.success(format!("✓ Copied to clipboard: {shown}"));
        }
        Err(e) => state.set_status(
            StatusLevel::Warning,
            format!("Clipboard copy failed: {e:#}"),
        ),
    }
}

/// Start the clipboard thread on first use. Each copy gets its own
/// `Clipboard` kept alive for a moment so Linux clipboard managers can read it.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();
        std::thread::spawn(move || {
            for text in rx {
                if let Ok(mut clipboard) = arboard::Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });
        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    init_clipboard_manager()?
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))
}
