use super::map::MapSurface;
use crate::error::{Error, ErrorKind};
use ratatui::style::Color;
use std::path::PathBuf;

/// Which text field, if any, is receiving keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditName,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusLevel {
    pub fn color(self) -> Color {
        match self {
            StatusLevel::Info => Color::Gray,
            StatusLevel::Success => Color::Green,
            StatusLevel::Warning => Color::Yellow,
            StatusLevel::Error => Color::Red,
        }
    }
}

impl From<ErrorKind> for StatusLevel {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::User | ErrorKind::Fatal => StatusLevel::Error,
            ErrorKind::Recoverable => StatusLevel::Warning,
        }
    }
}

pub struct UiState {
    pub tab: usize,
    pub mode: InputMode,
    pub search_input: String,
    /// Ticket of the lookup we are waiting on; results for any other ticket are stale.
    pub searching: Option<u64>,
    pub next_ticket: u64,
    pub status: String,
    pub status_level: StatusLevel,
    pub status_at: Option<String>,
    pub map: MapSurface,
    pub export_dir: PathBuf,
    pub last_exported_path: Option<String>,
    /// Set by every accepted event; the loop redraws and clears it.
    pub dirty: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            mode: InputMode::Normal,
            search_input: String::new(),
            searching: None,
            next_ticket: 1,
            status: "Type n to name the record, / to search, click the map, Enter to confirm"
                .into(),
            status_level: StatusLevel::Info,
            status_at: None,
            map: MapSurface::default(),
            export_dir: PathBuf::from("."),
            last_exported_path: None,
            dirty: true,
        }
    }
}

impl UiState {
    pub fn set_status(&mut self, level: StatusLevel, msg: impl Into<String>) {
        self.status = msg.into();
        self.status_level = level;
        self.status_at = Some(clock());
        self.dirty = true;
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.set_status(StatusLevel::Info, msg);
    }

    pub fn success(&mut self, msg: impl Into<String>) {
        self.set_status(StatusLevel::Success, msg);
    }

    /// Surface a session error. Fatal ones are also logged since they mean a bug.
    pub fn report(&mut self, err: &Error) {
        if err.kind() == ErrorKind::Fatal {
            tracing::error!(error = %err, "internal error");
            self.set_status(StatusLevel::Error, format!("Internal error: {err}"));
        } else {
            self.set_status(err.kind().into(), capitalize(&err.to_string()));
        }
    }

    /// Hand out a ticket for a new lookup and mark it as the one we wait on.
    pub fn begin_search(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.searching = Some(ticket);
        ticket
    }

    /// True (and clears the in-flight marker) when `ticket` is the current lookup.
    pub fn finish_search(&mut self, ticket: u64) -> bool {
        if self.searching == Some(ticket) {
            self.searching = None;
            true
        } else {
            false
        }
    }
}

fn clock() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(time::macros::format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
