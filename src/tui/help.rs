use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad.saturating_sub(key.chars().count()))),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    const PAD: usize = 14;
    let p = Paragraph::new(vec![
        Line::from("Editing:"),
        key_line("n", PAD, "Edit the location name (Enter/Esc to finish)"),
        key_line("/", PAD, "Search for a place (Enter to search, Esc to cancel)"),
        key_line("Enter", PAD, "Confirm: store the selected point in this record"),
        key_line("x / Del", PAD, "Clear this record"),
        key_line("↑/↓ or k/j", PAD, "Select record"),
        key_line("R", PAD, "Reset the whole form (all 20 records)"),
        Line::from(""),
        Line::from("Map:"),
        key_line("click", PAD, "Move the selected point"),
        key_line("Shift+arrows", PAD, "Nudge the selected point one cell (also H/J/K/L)"),
        key_line("+ / -", PAD, "Zoom in / out"),
        Line::from(""),
        Line::from("Export:"),
        key_line("s", PAD, "Write stakeout-locations.xlsx"),
        key_line("y", PAD, "Copy exported path to clipboard"),
        Line::from(""),
        Line::from("General:"),
        key_line("tab / ?", PAD, "Switch between map and help"),
        key_line("q / Ctrl-C", PAD, "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Steps: ", Style::default().fg(Color::Gray)),
            Span::raw("1. name the spot  2. search or click the map  3. press Enter to confirm"),
        ]),
        Line::from(""),
        Line::from("Search data:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                "© OpenStreetMap contributors, via Nominatim",
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
