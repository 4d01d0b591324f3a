/// Ratatui draw entry-point for menuadvisor.
/// Form and status live here; the results pane is built in results.rs.
use std::time::Instant;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use super::results::build_lines;
use super::{AppState, Field};
use crate::form::UiState;
use crate::render::{Node, render_plan};

pub const SPINNER_GLYPHS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const ACCENT: Color = Color::Rgb(0, 200, 170);
const BG: Color = Color::Rgb(8, 8, 14);

// ── Main draw entry point ─────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let area = f.area();
    f.render_widget(Block::default().style(Style::default().bg(BG)), area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title bar
            Constraint::Length(3), // ingredients
            Constraint::Length(3), // budget
            Constraint::Length(3), // preference
            Constraint::Length(1), // status line
            Constraint::Min(0),    // results
            Constraint::Length(1), // key hints
        ])
        .split(area);

    draw_title(f, state, rows[0]);
    for (i, field) in Field::ALL.into_iter().enumerate() {
        draw_field(f, state, field, rows[1 + i]);
    }
    draw_status(f, state, rows[4]);
    draw_results(f, state, rows[5]);
    draw_hints(f, rows[6]);
}

fn draw_title(f: &mut Frame, state: &AppState, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" ◆ menuadvisor", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  ·  {}", state.profile), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("  ·  {}", state.endpoint), Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_field(f: &mut Frame, state: &AppState, field: Field, area: Rect) {
    let focused = state.focus == field;
    let border = if focused { ACCENT } else { Color::Rgb(60, 60, 80) };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {} ", field.label()),
            Style::default().fg(if focused { ACCENT } else { Color::Gray }),
        ));

    let text = state.field_text(field);
    let inner_w = area.width.saturating_sub(2) as usize;
    let cursor_col = text[..state.cursor(field).min(text.len())].width();
    // Scroll horizontally so the cursor stays inside the box
    let offset = cursor_col.saturating_sub(inner_w.saturating_sub(1));

    f.render_widget(
        Paragraph::new(text.to_string())
            .style(Style::default().fg(Color::White))
            .scroll((0, offset as u16))
            .block(block),
        area,
    );

    if focused {
        f.set_cursor_position(Position::new(
            area.x + 1 + (cursor_col - offset) as u16,
            area.y + 1,
        ));
    }
}

fn draw_status(f: &mut Frame, state: &AppState, area: Rect) {
    let line = match state.form.state() {
        UiState::Loading => {
            let glyph = SPINNER_GLYPHS[(state.spinner_tick as usize) % SPINNER_GLYPHS.len()];
            Line::from(vec![
                Span::styled(format!(" {glyph} "), Style::default().fg(ACCENT)),
                Span::styled("generating menu…", Style::default().fg(Color::Cyan)),
            ])
        }
        UiState::Error(msg) => Line::from(Span::styled(
            format!(" ✗ {msg}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        UiState::Success(_) | UiState::Idle => match &state.notice {
            Some(n) => Line::from(Span::styled(format!(" {n}"), Style::default().fg(Color::Yellow))),
            None if matches!(state.form.state(), UiState::Success(_)) => {
                Line::from(Span::styled(" ✓ menu ready", Style::default().fg(Color::Green)))
            }
            None => Line::from(Span::styled(
                " enter ingredients and press enter",
                Style::default().fg(Color::DarkGray),
            )),
        },
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_results(f: &mut Frame, state: &mut AppState, area: Rect) {
    let Some(menu) = state.form.menu() else {
        state.results_max_scroll = 0;
        return;
    };
    let now = Instant::now();
    let copyable = state.copyable_slots();

    let mut lines: Vec<Line<'static>> = vec![Line::raw("")];
    if let Some(title) = &menu.title {
        lines.extend(build_lines(&[Node::Heading(title.clone())], area.width, false));
    }
    for (i, slot) in menu.slots.iter().enumerate() {
        let Some(node) = render_plan(&slot.title, slot.plan.as_ref(), state.is_copied(i, now)) else {
            continue;
        };
        let focused = i == state.copy_focus && copyable.contains(&i);
        lines.extend(build_lines(&[node], area.width, focused));
    }

    // Remembered so PgDn stops at the last line; a resize can shrink it
    state.results_max_scroll = lines.len().saturating_sub(area.height as usize);
    state.scroll = state.scroll.min(state.results_max_scroll);
    f.render_widget(Paragraph::new(lines).scroll((state.scroll as u16, 0)), area);
}

fn draw_hints(f: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Gray);
    let desc = Style::default().fg(Color::DarkGray);
    let line = Line::from(vec![
        Span::styled(" enter", key),
        Span::styled(" submit  ", desc),
        Span::styled("tab", key),
        Span::styled(" next field  ", desc),
        Span::styled("pgup/pgdn", key),
        Span::styled(" scroll  ", desc),
        Span::styled("ctrl+n", key),
        Span::styled(" next list  ", desc),
        Span::styled("ctrl+y", key),
        Span::styled(" copy list  ", desc),
        Span::styled("esc", key),
        Span::styled(" quit", desc),
    ]);
    f.render_widget(Paragraph::new(line), area);
}
