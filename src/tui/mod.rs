mod export;
mod help;
mod map;
mod state;

use crate::cli::{build_geocoder_config, build_session_config, Cli};
use crate::geocode::{Geocoder, NominatimClient};
use crate::model::{AppEvent, SessionConfig, RECORD_COUNT};
use crate::orchestrator::{self, UiCommand};
use crate::session::SessionController;
use crate::view::{render, SessionView};
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs},
    Terminal,
};
use state::{InputMode, StatusLevel, UiState};
use std::{io, sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Screen regions, recomputed from the terminal size so mouse hits can be
/// resolved without access to the last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Areas {
    tabs: Rect,
    body: Rect,
    editor: Rect,
    records: Rect,
    map: Rect,
    status: Rect,
}

impl Areas {
    fn map_inner(&self) -> Rect {
        Block::default().borders(Borders::ALL).inner(self.map)
    }
}

fn layout(area: Rect) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(rows[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)].as_ref())
        .split(cols[0]);

    Areas {
        tabs: rows[0],
        body: rows[1],
        editor: left[0],
        records: left[1],
        map: cols[1],
        status: rows[2],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn run(args: Cli) -> Result<()> {
    let session_cfg = build_session_config(&args)?;
    let geocoder: Arc<dyn Geocoder> =
        Arc::new(NominatimClient::new(&build_geocoder_config(&args))?);

    // Unbounded channels keep the UI thread from ever blocking on a send.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(session_cfg, event_rx, cmd_tx));

    let res = orchestrator::run_controller(geocoder, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread. The session lives here and nowhere else.
fn run_threaded(
    cfg: SessionConfig,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    let _restore = enter_terminal()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut session = SessionController::new(&cfg);
    let mut state = UiState {
        map: map::MapSurface::new(cfg.zoom),
        export_dir: cfg.export_dir.clone(),
        ..Default::default()
    };
    tracing::info!(center = %cfg.default_center, zoom = cfg.zoom, "session started");

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut session, &mut state, ev);
        }

        let areas = match terminal.size() {
            Ok(size) => layout(Rect::new(0, 0, size.width, size.height)),
            Err(e) => break Err(anyhow::Error::from(e).context("read terminal size")),
        };

        if state.dirty {
            let view = render(&session);
            terminal.draw(|f| draw(f, &areas, &state, &view)).ok();
            state.dirty = false;
        }

        // Poll input with a short timeout so search results are picked up promptly.
        if !event::poll(Duration::from_millis(50)).unwrap_or(false) {
            continue;
        }
        let flow = match event::read() {
            Ok(Event::Key(k)) if k.kind == KeyEventKind::Press => {
                handle_key(k, &mut session, &mut state, &areas, &cmd_tx)
            }
            Ok(Event::Mouse(m)) => {
                handle_mouse(m, &mut session, &mut state, &areas);
                Flow::Continue
            }
            Ok(Event::Resize(_, _)) => {
                state.dirty = true;
                Flow::Continue
            }
            _ => Flow::Continue,
        };
        if flow == Flow::Quit {
            let _ = cmd_tx.send(UiCommand::Quit);
            break Ok(());
        }
    };

    tracing::info!("session ended");
    res
}

/// Runs `restore` when dropped, so every exit from the UI thread (including
/// `?` during setup) leaves the terminal usable.
struct TerminalGuard<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> Drop for TerminalGuard<F> {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    disable_raw_mode().ok();
    execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen).ok();
}

fn enter_terminal() -> Result<TerminalGuard<fn()>> {
    enable_raw_mode().context("enable raw mode")?;
    let guard = TerminalGuard {
        restore: restore_terminal as fn(),
    };
    execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture).ok();
    Ok(guard)
}

fn apply_event(session: &mut SessionController, state: &mut UiState, ev: AppEvent) {
    match ev {
        AppEvent::SearchCompleted {
            ticket,
            query,
            outcome,
        } => {
            if !state.finish_search(ticket) {
                tracing::debug!(ticket, "dropping stale search result");
                return;
            }
            match session.apply_search(&query, outcome) {
                Ok(c) => state.success(format!("Found \"{query}\" at {c}. Press Enter to confirm")),
                Err(e) => state.report(&e),
            }
        }
        AppEvent::Info(info) => state.info(info.to_message()),
    }
}

fn handle_key(
    k: KeyEvent,
    session: &mut SessionController,
    state: &mut UiState,
    areas: &Areas,
    cmd_tx: &UnboundedSender<UiCommand>,
) -> Flow {
    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
        return Flow::Quit;
    }
    match state.mode {
        InputMode::EditName => edit_name_key(k, session, state),
        InputMode::Search => search_key(k, state, cmd_tx),
        InputMode::Normal => return normal_key(k, session, state, areas),
    }
    state.dirty = true;
    Flow::Continue
}

/// One-cell marker moves: Shift+arrows, or H/J/K/L.
fn nudge_direction(k: &KeyEvent) -> Option<(i32, i32)> {
    match (k.modifiers, k.code) {
        (KeyModifiers::SHIFT, KeyCode::Left) | (_, KeyCode::Char('H')) => Some((-1, 0)),
        (KeyModifiers::SHIFT, KeyCode::Right) | (_, KeyCode::Char('L')) => Some((1, 0)),
        (KeyModifiers::SHIFT, KeyCode::Up) | (_, KeyCode::Char('K')) => Some((0, -1)),
        (KeyModifiers::SHIFT, KeyCode::Down) | (_, KeyCode::Char('J')) => Some((0, 1)),
        _ => None,
    }
}

fn normal_key(
    k: KeyEvent,
    session: &mut SessionController,
    state: &mut UiState,
    areas: &Areas,
) -> Flow {
    if let Some((dx, dy)) = nudge_direction(&k) {
        // Redraws only if the marker actually moved.
        nudge(session, state, areas, dx, dy);
        return Flow::Continue;
    }
    state.dirty = true;
    let result = match (k.modifiers, k.code) {
        (_, KeyCode::Char('q')) => return Flow::Quit,
        (_, KeyCode::Tab) => {
            state.tab = (state.tab + 1) % 2;
            Ok(())
        }
        (_, KeyCode::Char('?')) => {
            state.tab = 1;
            Ok(())
        }
        (_, KeyCode::Char('n')) | (_, KeyCode::Char('e')) => {
            state.mode = InputMode::EditName;
            state.info("Editing name. Enter or Esc to finish");
            Ok(())
        }
        (_, KeyCode::Char('/')) => {
            state.mode = InputMode::Search;
            state.search_input.clear();
            state.info("Type a place to search for. Enter to search, Esc to cancel");
            Ok(())
        }
        (_, KeyCode::Enter) => session.confirm().map(|c| {
            let next = if c.advanced {
                format!(", now editing record {}", c.index + 2)
            } else {
                String::new()
            };
            state.success(format!(
                "Saved record {} at {}{next}",
                c.index + 1,
                c.coordinate
            ));
        }),
        (_, KeyCode::Char('x')) | (_, KeyCode::Delete) => {
            let index = session.current_index();
            session
                .clear()
                .map(|()| state.info(format!("Cleared record {}", index + 1)))
        }
        (_, KeyCode::Char('R')) => {
            session.reset();
            state.info(format!("Form reset: {RECORD_COUNT} empty records"));
            Ok(())
        }
        (_, KeyCode::Char('s')) => {
            export::export_workbook(session, state);
            Ok(())
        }
        (_, KeyCode::Char('y')) => {
            export::copy_exported_path(state);
            Ok(())
        }
        (_, KeyCode::Char('+')) | (_, KeyCode::Char('=')) => {
            if !state.map.zoom_in() {
                state.info("Already at maximum zoom");
            }
            Ok(())
        }
        (_, KeyCode::Char('-')) => {
            if !state.map.zoom_out() {
                state.info("Already at minimum zoom");
            }
            Ok(())
        }
        (_, KeyCode::Up) | (_, KeyCode::Char('k')) => session.select_previous(),
        (_, KeyCode::Down) | (_, KeyCode::Char('j')) => session.select_next(),
        _ => Ok(()),
    };
    if let Err(e) = result {
        state.report(&e);
    }
    Flow::Continue
}

fn edit_name_key(k: KeyEvent, session: &mut SessionController, state: &mut UiState) {
    let (mut name, named) = match session.current_record() {
        Ok(r) => (r.name.clone(), r.has_name()),
        Err(e) => return state.report(&e),
    };
    match k.code {
        KeyCode::Enter | KeyCode::Esc => {
            state.mode = InputMode::Normal;
            if !named {
                state.info("Name is empty. Press n to name this record");
            } else {
                state.info("Name set. Search or click the map, then Enter to confirm");
            }
            return;
        }
        KeyCode::Backspace => {
            name.pop();
        }
        KeyCode::Char(c) if !k.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            name.push(c);
        }
        _ => return,
    }
    if let Err(e) = session.set_name(&name) {
        state.report(&e);
    }
}

fn search_key(k: KeyEvent, state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>) {
    match k.code {
        KeyCode::Esc => {
            state.mode = InputMode::Normal;
            state.search_input.clear();
            state.info("Search cancelled");
        }
        KeyCode::Enter => {
            state.mode = InputMode::Normal;
            let query = state.search_input.trim().to_string();
            if query.is_empty() {
                return;
            }
            let ticket = state.begin_search();
            let sent = cmd_tx.send(UiCommand::Search {
                ticket,
                query: query.clone(),
            });
            if sent.is_err() {
                state.searching = None;
                state.set_status(StatusLevel::Error, "Search service stopped");
                return;
            }
            state.info(format!("Searching for \"{query}\"…"));
        }
        KeyCode::Backspace => {
            state.search_input.pop();
        }
        KeyCode::Char(c) if !k.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            state.search_input.push(c);
        }
        _ => {}
    }
}

fn nudge(session: &mut SessionController, state: &mut UiState, areas: &Areas, dx: i32, dy: i32) {
    let next = state.map.step(session.pending(), areas.map_inner(), dx, dy);
    if session.map_click(next) {
        state.info(format!("Selected {next}"));
    }
}

fn handle_mouse(
    m: MouseEvent,
    session: &mut SessionController,
    state: &mut UiState,
    areas: &Areas,
) {
    if state.tab != 0 || m.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let Some(c) = state
        .map
        .coordinate_at(session.pending(), areas.map_inner(), m.column, m.row)
    else {
        return;
    };
    if session.map_click(c) {
        state.info(format!("Selected {c}. Press Enter to confirm"));
    }
}

fn draw(f: &mut ratatui::Frame, areas: &Areas, state: &UiState, view: &SessionView) {
    let tabs = Tabs::new(vec![Line::from("Map"), Line::from("Help")])
        .select(state.tab)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("stakeout-mapper"),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, areas.tabs);

    match state.tab {
        0 => {
            draw_editor(f, areas.editor, state, view);
            draw_records(f, areas.records, view);
            map::draw_map(f, areas.map, view, &state.map);
        }
        _ => help::draw_help(areas.body, f),
    }

    draw_status(f, areas.status, state);
}

fn field_style(active: bool) -> Style {
    if active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn draw_editor(f: &mut ratatui::Frame, area: Rect, state: &UiState, view: &SessionView) {
    let editing_name = state.mode == InputMode::EditName;
    let typing_query = state.mode == InputMode::Search;
    let cursor = |on: bool| if on { "▏" } else { "" };

    let mut search_spans = vec![
        Span::styled("Search: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{}{}", state.search_input, cursor(typing_query)),
            field_style(typing_query),
        ),
    ];
    if state.searching.is_some() {
        search_spans.push(Span::styled(
            "  searching…",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let lines = vec![
        Line::from(vec![
            Span::styled("Name: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}{}", view.editing.name, cursor(editing_name)),
                field_style(editing_name),
            ),
        ]),
        Line::from(search_spans),
        Line::from(vec![
            Span::styled("Selected: ", Style::default().fg(Color::Gray)),
            Span::styled(view.pending.to_string(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled("Stored: ", Style::default().fg(Color::Gray)),
            Span::raw(
                view.editing
                    .coordinate
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
        ]),
    ];

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(view.title()),
    );
    f.render_widget(p, area);
}

fn draw_records(f: &mut ratatui::Frame, area: Rect, view: &SessionView) {
    let header = Row::new(vec!["No.", "Location", "Latitude", "Longitude"])
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let fmt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
    let rows = view.rows.iter().map(|r| {
        let style = if r.latitude.is_some() {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(r.sequence.to_string()),
            Cell::from(r.name.clone()),
            Cell::from(fmt(r.latitude)),
            Cell::from(fmt(r.longitude)),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(11),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(format!(
        "Records ({}/{} located)",
        view.confirmed, RECORD_COUNT
    )))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol("▶");

    let mut ts = TableState::default().with_selected(Some(view.current_index));
    f.render_stateful_widget(table, area, &mut ts);
}

fn draw_status(f: &mut ratatui::Frame, area: Rect, state: &UiState) {
    let mut spans = Vec::new();
    if let Some(at) = &state.status_at {
        spans.push(Span::styled(
            format!("[{at}] "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(
        state.status.clone(),
        Style::default().fg(state.status_level.color()),
    ));
    let p = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Status (? for keys)"),
    );
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::GeocodeError;
    use crate::model::{Coordinate, InfoEvent, DEFAULT_CENTER};

    struct Harness {
        session: SessionController,
        state: UiState,
        areas: Areas,
        tx: UnboundedSender<UiCommand>,
        rx: UnboundedReceiver<UiCommand>,
    }

    impl Harness {
        fn new() -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            Self {
                session: SessionController::new(&SessionConfig::default()),
                state: UiState::default(),
                areas: layout(Rect::new(0, 0, 160, 50)),
                tx,
                rx,
            }
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Flow {
            handle_key(
                KeyEvent::new(code, modifiers),
                &mut self.session,
                &mut self.state,
                &self.areas,
                &self.tx,
            )
        }

        fn press(&mut self, code: KeyCode) -> Flow {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn type_text(&mut self, text: &str) {
            for c in text.chars() {
                self.press(KeyCode::Char(c));
            }
        }

        fn click(&mut self, column: u16, row: u16) {
            let m = MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                modifiers: KeyModifiers::NONE,
            };
            handle_mouse(m, &mut self.session, &mut self.state, &self.areas);
        }

        fn event(&mut self, ev: AppEvent) {
            apply_event(&mut self.session, &mut self.state, ev);
        }
    }

    #[test]
    fn test_layout_splits_terminal() {
        let areas = layout(Rect::new(0, 0, 160, 50));
        assert_eq!(areas.tabs.height, 3);
        assert_eq!(areas.status.height, 3);
        assert_eq!(areas.status.y, 47);
        assert_eq!(areas.editor.height, 6);
        assert!(areas.map.x >= areas.editor.x + areas.editor.width);
        let inner = areas.map_inner();
        assert_eq!(inner.width, areas.map.width - 2);
        assert_eq!(inner.height, areas.map.height - 2);
    }

    #[test]
    fn test_name_then_confirm() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('n'));
        assert_eq!(h.state.mode, InputMode::EditName);
        h.type_text("Main Stx");
        h.press(KeyCode::Backspace);
        h.press(KeyCode::Enter);
        assert_eq!(h.state.mode, InputMode::Normal);
        assert_eq!(h.session.store().get(0).unwrap().name, "Main St");

        h.press(KeyCode::Enter);
        assert_eq!(h.session.current_index(), 1);
        assert_eq!(
            h.session.store().get(0).unwrap().coordinate,
            Some(DEFAULT_CENTER)
        );
        assert_eq!(h.state.status_level, StatusLevel::Success);
    }

    #[test]
    fn test_confirm_without_name_reports_error() {
        let mut h = Harness::new();
        h.press(KeyCode::Enter);
        assert_eq!(h.session.current_index(), 0);
        assert_eq!(h.state.status_level, StatusLevel::Error);
        assert!(h.state.status.starts_with("Name required"));
    }

    #[test]
    fn test_quit_keys() {
        let mut h = Harness::new();
        assert_eq!(h.press(KeyCode::Char('q')), Flow::Quit);
        // 'q' is plain text while a field is being edited.
        h.state.mode = InputMode::Search;
        assert_eq!(h.press(KeyCode::Char('q')), Flow::Continue);
        assert_eq!(
            h.press_with(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Flow::Quit
        );
    }

    #[test]
    fn test_search_sends_command_with_ticket() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('/'));
        h.type_text("  Anping Fort ");
        h.press(KeyCode::Enter);

        match h.rx.try_recv().unwrap() {
            UiCommand::Search { ticket, query } => {
                assert_eq!(query, "Anping Fort");
                assert_eq!(h.state.searching, Some(ticket));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(h.state.mode, InputMode::Normal);
    }

    #[test]
    fn test_empty_search_is_ignored() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('/'));
        h.type_text("   ");
        h.press(KeyCode::Enter);
        assert!(h.rx.try_recv().is_err());
        assert_eq!(h.state.searching, None);
    }

    #[test]
    fn test_search_result_moves_pending() {
        let mut h = Harness::new();
        let ticket = h.state.begin_search();
        let found = Coordinate::new(23.001, 120.16);
        h.event(AppEvent::SearchCompleted {
            ticket,
            query: "Anping".into(),
            outcome: Ok(found),
        });
        assert_eq!(h.session.pending(), found);
        assert_eq!(h.state.status_level, StatusLevel::Success);
        assert_eq!(h.state.searching, None);
    }

    #[test]
    fn test_stale_search_result_dropped() {
        let mut h = Harness::new();
        let old = h.state.begin_search();
        let _current = h.state.begin_search();
        h.event(AppEvent::SearchCompleted {
            ticket: old,
            query: "old".into(),
            outcome: Ok(Coordinate::new(1.0, 1.0)),
        });
        assert_eq!(h.session.pending(), DEFAULT_CENTER);
        assert!(h.state.searching.is_some());
    }

    #[test]
    fn test_search_not_found_keeps_pending() {
        let mut h = Harness::new();
        let ticket = h.state.begin_search();
        h.event(AppEvent::SearchCompleted {
            ticket,
            query: "nowhere".into(),
            outcome: Err(GeocodeError::NotFound),
        });
        assert_eq!(h.session.pending(), DEFAULT_CENTER);
        assert_eq!(h.state.status_level, StatusLevel::Error);
        assert!(h.state.status.contains("nowhere"));
    }

    #[test]
    fn test_info_event_sets_status() {
        let mut h = Harness::new();
        let info = InfoEvent::SearchSuperseded {
            query: "old".into(),
        };
        h.event(AppEvent::Info(info.clone()));
        assert_eq!(h.state.status, info.to_message());
    }

    #[test]
    fn test_map_click_moves_pending_only() {
        let mut h = Harness::new();
        let inner = h.areas.map_inner();
        h.click(inner.x + 1, inner.y + 1);
        let moved = h.session.pending();
        assert!(moved.lat > DEFAULT_CENTER.lat);
        assert!(moved.lon < DEFAULT_CENTER.lon);
        assert!(h.session.store().get(0).unwrap().coordinate.is_none());
    }

    #[test]
    fn test_click_outside_map_ignored() {
        let mut h = Harness::new();
        let editor = h.areas.editor;
        h.click(editor.x + 1, editor.y + 1);
        assert_eq!(h.session.pending(), DEFAULT_CENTER);
    }

    #[test]
    fn test_click_on_help_tab_ignored() {
        let mut h = Harness::new();
        h.press(KeyCode::Tab);
        let inner = h.areas.map_inner();
        h.click(inner.x + 1, inner.y + 1);
        assert_eq!(h.session.pending(), DEFAULT_CENTER);
    }

    #[test]
    fn test_nudge_and_select_keys() {
        let mut h = Harness::new();
        h.press_with(KeyCode::Right, KeyModifiers::SHIFT);
        assert!(h.session.pending().lon > DEFAULT_CENTER.lon);
        assert_eq!(h.session.current_index(), 0);

        h.press(KeyCode::Down);
        h.press(KeyCode::Char('j'));
        assert_eq!(h.session.current_index(), 2);
        h.press(KeyCode::Up);
        assert_eq!(h.session.current_index(), 1);
    }

    #[test]
    fn test_whitespace_name_counts_as_set() {
        let mut h = Harness::new();
        h.press(KeyCode::Char('n'));
        h.type_text("  ");
        h.press(KeyCode::Enter);
        assert!(h.state.status.starts_with("Name set"));
        h.press(KeyCode::Enter);
        assert_eq!(h.session.current_index(), 1);
        assert_eq!(h.state.status_level, StatusLevel::Success);
    }

    #[test]
    fn test_rejected_nudge_does_not_redraw() {
        let mut h = Harness::new();
        let top = Coordinate::new(90.0, 120.0);
        assert!(h.session.map_click(top));
        h.state.dirty = false;

        h.press_with(KeyCode::Up, KeyModifiers::SHIFT);
        assert_eq!(h.session.pending(), top);
        assert!(!h.state.dirty);

        h.press_with(KeyCode::Right, KeyModifiers::SHIFT);
        assert!(h.session.pending().lon > 120.0);
        assert!(h.state.dirty);
    }

    #[test]
    fn test_terminal_guard_restores_on_setup_error() {
        let restored = std::cell::Cell::new(0);
        let setup = || -> Result<()> {
            let _restore = TerminalGuard {
                restore: || restored.set(restored.get() + 1),
            };
            let terminal: Result<()> = Err(anyhow::anyhow!("create terminal"));
            terminal?;
            Ok(())
        };
        assert!(setup().is_err());
        assert_eq!(restored.get(), 1);
    }

    #[test]
    fn test_zoom_keys() {
        let mut h = Harness::new();
        let start = h.state.map.zoom();
        h.press(KeyCode::Char('+'));
        assert_eq!(h.state.map.zoom(), start + 1);
        h.press(KeyCode::Char('-'));
        h.press(KeyCode::Char('-'));
        assert_eq!(h.state.map.zoom(), start - 1);
    }

    #[test]
    fn test_clear_and_reset_keys() {
        let mut h = Harness::new();
        h.session.set_name("Main St").unwrap();
        h.session.confirm().unwrap();
        h.press(KeyCode::Up);
        h.press(KeyCode::Char('x'));
        assert_eq!(h.session.store().get(0).unwrap().name, "");

        h.session.set_name("Again").unwrap();
        h.session.confirm().unwrap();
        h.press(KeyCode::Char('R'));
        assert_eq!(h.session.current_index(), 0);
        assert_eq!(h.session.store().confirmed_count(), 0);
    }
}
