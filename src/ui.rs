/// UI helpers shared between the TUI and plain-stdout modes.
use unicode_width::UnicodeWidthStr;

use crate::render::{CardKind, Node};

// ── Glyphs ────────────────────────────────────────────────────────────────────

pub fn card_glyph(kind: CardKind) -> &'static str {
    match kind {
        CardKind::Dish => "◆",
        CardKind::ShoppingList => "≡",
    }
}

pub const SECTION_GLYPH: &str = "▌";
pub const BULLET_GLYPH: &str = "•";

// ── Plain text ────────────────────────────────────────────────────────────────

/// Flatten a UI tree into indented text lines. Buttons are dropped: plain
/// output is not interactive.
pub fn plain_lines(nodes: &[Node]) -> Vec<String> {
    let mut out = Vec::new();
    for node in nodes {
        push_plain(&mut out, node, 2);
    }
    out
}

fn push_plain(out: &mut Vec<String>, node: &Node, indent: usize) {
    let pad = " ".repeat(indent);
    match node {
        Node::Heading(title) => {
            out.push(format!("{pad}{title}"));
            out.push(format!("{pad}{}", "═".repeat(title.width())));
            out.push(String::new());
        }
        Node::Section { title, children } => {
            out.push(format!("{pad}{SECTION_GLYPH} {title}"));
            for child in children {
                push_plain(out, child, indent + 2);
            }
            out.push(String::new());
        }
        Node::Card { kind, title, children } => {
            out.push(format!("{pad}{} {title}", card_glyph(*kind)));
            for child in children {
                push_plain(out, child, indent + 2);
            }
        }
        Node::Field { label, value } if value.is_empty() => out.push(format!("{pad}{label}:")),
        Node::Field { label, value } => out.push(format!("{pad}{label}: {value}")),
        Node::Note(text) => out.push(format!("{pad}{text}")),
        Node::OrderedList(items) => {
            for (i, item) in items.iter().enumerate() {
                out.push(format!("{pad}  {}. {item}", i + 1));
            }
        }
        Node::BulletList(items) => {
            for item in items {
                out.push(format!("{pad}{BULLET_GLYPH} {item}"));
            }
        }
        Node::Button { .. } => {}
    }
}
