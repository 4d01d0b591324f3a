/// Results pane: converts the renderer's UI tree into styled ratatui lines.
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

use crate::render::{CardKind, Node};
use crate::ui::{BULLET_GLYPH, SECTION_GLYPH, card_glyph};

const ACCENT: Color = Color::Rgb(0, 200, 170);
const DIM: Color = Color::Rgb(110, 110, 130);
const CARD_EDGE: Color = Color::Rgb(70, 90, 120);

/// Build lines for a list of nodes. `copy_focused` highlights the copy button
/// inside these nodes (the caller passes it per plan slot).
pub fn build_lines(nodes: &[Node], width: u16, copy_focused: bool) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let width = (width as usize).max(20);
    for node in nodes {
        push_node(&mut out, node, 1, width, copy_focused);
    }
    out
}

fn push_node(out: &mut Vec<Line<'static>>, node: &Node, indent: usize, width: usize, copy_focused: bool) {
    let pad = " ".repeat(indent);
    let avail = width.saturating_sub(indent + 2).max(10);

    match node {
        Node::Heading(title) => {
            out.push(Line::from(vec![
                Span::raw(pad.clone()),
                Span::styled(title.clone(), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            ]));
            out.push(Line::from(vec![
                Span::raw(pad),
                Span::styled("═".repeat(title.width()), Style::default().fg(ACCENT)),
            ]));
            out.push(Line::raw(""));
        }
        Node::Section { title, children } => {
            out.push(Line::from(vec![
                Span::raw(pad),
                Span::styled(format!("{SECTION_GLYPH} "), Style::default().fg(ACCENT)),
                Span::styled(title.clone(), Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
            ]));
            for child in children {
                push_node(out, child, indent + 2, width, copy_focused);
            }
            out.push(Line::raw(""));
        }
        Node::Card { kind, title, children } => {
            let fg = match kind {
                CardKind::Dish => Color::Rgb(255, 210, 120),
                CardKind::ShoppingList => Color::Rgb(150, 200, 255),
            };
            let glyph = card_glyph(*kind);
            out.push(Line::from(vec![
                Span::raw(pad.clone()),
                Span::styled("╭ ", Style::default().fg(CARD_EDGE)),
                Span::styled(format!("{glyph} {title}"), Style::default().fg(fg).add_modifier(Modifier::BOLD)),
            ]));
            for child in children {
                push_node(out, child, indent + 2, width, copy_focused);
            }
            out.push(Line::from(vec![
                Span::raw(pad),
                Span::styled("╰", Style::default().fg(CARD_EDGE)),
            ]));
        }
        Node::Field { label, value } => {
            let label_span = Span::styled(format!("{label}:"), Style::default().fg(DIM));
            if value.is_empty() {
                out.push(Line::from(vec![Span::raw(pad), label_span]));
            } else {
                let first_w = avail.saturating_sub(label.width() + 2).max(10);
                let wrapped = wrap_text(value, first_w);
                let mut lines = wrapped.into_iter();
                if let Some(first) = lines.next() {
                    out.push(Line::from(vec![
                        Span::raw(pad.clone()),
                        label_span,
                        Span::raw(" "),
                        Span::styled(first, Style::default().fg(Color::White)),
                    ]));
                }
                let cont = " ".repeat(indent + label.width() + 2);
                for rest in lines {
                    out.push(Line::from(vec![
                        Span::raw(cont.clone()),
                        Span::styled(rest, Style::default().fg(Color::White)),
                    ]));
                }
            }
        }
        Node::Note(text) => {
            for l in wrap_text(text, avail) {
                out.push(Line::from(vec![
                    Span::raw(pad.clone()),
                    Span::styled(l, Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC)),
                ]));
            }
        }
        Node::OrderedList(items) => {
            for (i, item) in items.iter().enumerate() {
                let marker = format!("{:>2}. ", i + 1);
                let cont = " ".repeat(indent + marker.width());
                for (j, l) in wrap_text(item, avail.saturating_sub(marker.width())).into_iter().enumerate() {
                    let lead = if j == 0 {
                        Span::styled(format!("{pad}{marker}"), Style::default().fg(DIM))
                    } else {
                        Span::raw(cont.clone())
                    };
                    out.push(Line::from(vec![lead, Span::raw(l)]));
                }
            }
        }
        Node::BulletList(items) => {
            for item in items {
                for (j, l) in wrap_text(item, avail.saturating_sub(2)).into_iter().enumerate() {
                    let lead = if j == 0 { format!("{pad}{BULLET_GLYPH} ") } else { format!("{pad}  ") };
                    out.push(Line::from(vec![
                        Span::styled(lead, Style::default().fg(DIM)),
                        Span::raw(l),
                    ]));
                }
            }
        }
        Node::Button { label, enabled } => {
            let style = match (*enabled, copy_focused) {
                (false, _) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                (true, true) => Style::default().fg(Color::Black).bg(ACCENT),
                (true, false) => Style::default().fg(ACCENT),
            };
            let mut spans = vec![Span::raw(pad), Span::styled(format!("[ {label} ]"), style)];
            if *enabled && copy_focused {
                spans.push(Span::styled("  ctrl+y", Style::default().fg(DIM)));
            }
            out.push(Line::from(spans));
        }
    }
}

/// Word-wrap a single line of text to `max_width` columns.
/// Splits on whitespace; a word wider than `max_width` gets a line of its own.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = word.width();
        if current_width == 0 {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + 1 + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_wrap_text_breaks_on_width() {
        assert_eq!(wrap_text("one two three", 7), ["one two", "three"]);
        assert_eq!(wrap_text("", 10), [""]);
        assert_eq!(wrap_text("supercalifragilistic x", 5), ["supercalifragilistic", "x"]);
    }

    #[test]
    fn test_wrap_text_counts_wide_chars() {
        // Each CJK char is two columns wide
        assert_eq!(wrap_text("卵焼き ご飯", 7), ["卵焼き", "ご飯"]);
    }

    #[test]
    fn test_ordered_list_numbers_steps() {
        let lines = build_lines(&[Node::OrderedList(vec!["chop".to_string(), "fry".to_string()])], 80, false);
        let texts: Vec<String> = lines.iter().map(text_of).collect();
        assert_eq!(texts, ["  1. chop", "  2. fry"]);
    }

    #[test]
    fn test_button_shows_hint_only_when_focused() {
        let node = Node::Button { label: "Copy list", enabled: true };
        let focused = build_lines(std::slice::from_ref(&node), 80, true);
        let unfocused = build_lines(&[node], 80, false);
        assert!(text_of(&focused[0]).contains("ctrl+y"));
        assert!(!text_of(&unfocused[0]).contains("ctrl+y"));
    }
}
