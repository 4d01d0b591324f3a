/// Ratatui-based TUI for menuadvisor.
///
/// Architecture:
///   main thread:   event loop, crossterm keyboard events + mpsc UiEvent drain
///   request task:  tokio::spawn, one POST, result sent back as a UiEvent
///
/// Layout:
///   ┌────────────────────────────────────────────────┐
///   │  title bar (1 line)                            │
///   ├────────────────────────────────────────────────┤
///   │  ingredients / budget / preference (3 × 3)     │
///   ├────────────────────────────────────────────────┤
///   │  status line (1 line)                          │
///   ├────────────────────────────────────────────────┤
///   │  results (scrollable, Min(0))                  │
///   ├────────────────────────────────────────────────┤
///   │  key hints (1 line)                            │
///   └────────────────────────────────────────────────┘
pub mod render;
pub mod results;

use std::io;
use std::time::Instant;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::client::{MenuBackend, MenuClient, Reply, TransportError};
use crate::clipboard::{Clipboard, CopyFeedback, SystemClipboard};
use crate::config::ResolvedConfig;
use crate::form::{FormController, FormInput};

// ── UiEvent: typed events from the request task → TUI ────────────────────────

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// The in-flight request settled (either way)
    Reply(Result<Reply, TransportError>),
}

// ── Field: which input has focus ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Ingredients,
    Budget,
    Preference,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Ingredients, Field::Budget, Field::Preference];

    pub fn label(self) -> &'static str {
        match self {
            Field::Ingredients => "Ingredients (comma separated)",
            Field::Budget => "Extra budget (optional)",
            Field::Preference => "Preference (optional)",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Field::Ingredients => Field::Budget,
            Field::Budget => Field::Preference,
            Field::Preference => Field::Ingredients,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Field::Ingredients => Field::Preference,
            Field::Budget => Field::Ingredients,
            Field::Preference => Field::Budget,
        }
    }

    fn index(self) -> usize {
        match self {
            Field::Ingredients => 0,
            Field::Budget => 1,
            Field::Preference => 2,
        }
    }
}

// ── AppState ──────────────────────────────────────────────────────────────────

pub struct AppState {
    pub form: FormController,
    pub focus: Field,
    /// Byte offset of the cursor in each field, indexed by `Field::index`
    pub cursors: [usize; 3],
    /// Lines scrolled down in the results pane
    pub scroll: usize,
    /// Largest useful `scroll`, set by the last draw of the results pane
    pub results_max_scroll: usize,
    /// Incremented every 120ms while loading for spinner animation
    pub spinner_tick: u32,
    /// One copy indicator per menu slot, reset on every new result
    pub copy: Vec<CopyFeedback>,
    /// Slot whose shopping list Ctrl+Y copies
    pub copy_focus: usize,
    /// Transient one-line message (copy results); cleared on the next submit
    pub notice: Option<String>,
    pub endpoint: String,
    pub profile: String,
}

impl AppState {
    pub fn new(resolved: &ResolvedConfig) -> Self {
        Self {
            form: FormController::new(FormInput::default()),
            focus: Field::default(),
            cursors: [0; 3],
            scroll: 0,
            results_max_scroll: 0,
            spinner_tick: 0,
            copy: Vec::new(),
            copy_focus: 0,
            notice: None,
            endpoint: resolved.endpoint.clone(),
            profile: resolved.profile_name.clone(),
        }
    }

    pub fn field_text(&self, field: Field) -> &str {
        match field {
            Field::Ingredients => &self.form.input.ingredients,
            Field::Budget => &self.form.input.budget,
            Field::Preference => &self.form.input.preference,
        }
    }

    /// Focused field text and its cursor, borrowed together for editing.
    fn focused_mut(&mut self) -> (&mut String, &mut usize) {
        let cursor = &mut self.cursors[self.focus.index()];
        let text = match self.focus {
            Field::Ingredients => &mut self.form.input.ingredients,
            Field::Budget => &mut self.form.input.budget,
            Field::Preference => &mut self.form.input.preference,
        };
        (text, cursor)
    }

    pub fn cursor(&self, field: Field) -> usize {
        self.cursors[field.index()]
    }

    fn apply_event(&mut self, ev: UiEvent) {
        match ev {
            UiEvent::Reply(outcome) => {
                self.form.finish(outcome);
                self.reset_results();
            }
        }
    }

    /// Fresh copy indicators and scroll for whatever the form now holds.
    fn reset_results(&mut self) {
        self.scroll = 0;
        self.copy = self
            .form
            .menu()
            .map(|m| vec![CopyFeedback::default(); m.slots.len()])
            .unwrap_or_default();
        self.copy_focus = self.copyable_slots().first().copied().unwrap_or(0);
    }

    /// Indices of slots that have a shopping list to copy.
    pub fn copyable_slots(&self) -> Vec<usize> {
        let Some(menu) = self.form.menu() else { return Vec::new() };
        menu.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.plan.as_ref().and_then(|p| p.shopping_items()).is_some())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_copied(&self, slot: usize, now: Instant) -> bool {
        self.copy.get(slot).is_some_and(|c| c.is_copied(now))
    }

    /// Move copy focus to the next slot that has a shopping list.
    fn cycle_copy_focus(&mut self) {
        let slots = self.copyable_slots();
        if slots.is_empty() {
            return;
        }
        self.copy_focus = slots
            .iter()
            .copied()
            .find(|&i| i > self.copy_focus)
            .unwrap_or(slots[0]);
    }

    /// Copy the focused plan's shopping list.
    fn copy_focused<C: Clipboard + ?Sized>(&mut self, clipboard: &mut C, now: Instant) {
        let slot = self.copy_focus;
        let Some((key, items)) = self
            .form
            .menu()
            .and_then(|m| m.slots.get(slot))
            .and_then(|s| Some((s.key.clone(), s.plan.as_ref()?.shopping_items()?.to_vec())))
        else {
            return;
        };
        let Some(feedback) = self.copy.get_mut(slot) else { return };

        match feedback.trigger(&items, clipboard, now) {
            Ok(true) => {
                info!(plan = %key, items = items.len(), "shopping list copied");
                self.notice = Some(format!("✓ copied {} item{}", items.len(), if items.len() == 1 { "" } else { "s" }));
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "clipboard write failed");
                self.notice = Some(format!("⚠ could not copy: {e}"));
            }
        }
    }

    /// Flip expired copy indicators back. Returns true when anything changed.
    fn expire_copies(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for c in &mut self.copy {
            changed |= c.expire(now);
        }
        changed
    }
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) {
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
}

// ── Main TUI run loop ─────────────────────────────────────────────────────────

pub async fn run(resolved: ResolvedConfig, client: MenuClient) -> Result<()> {
    let mut terminal = setup_terminal()?;

    // Panic hook: restore terminal before printing panic
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        orig_hook(info);
    }));

    let result = event_loop(&mut terminal, &resolved, client).await;

    restore_terminal(&mut terminal);
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    resolved: &ResolvedConfig,
    client: MenuClient,
) -> Result<()> {
    let mut state = AppState::new(resolved);
    let mut clipboard = SystemClipboard;

    // Channel: request task → TUI
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel::<UiEvent>();

    let mut crossterm_events = EventStream::new();
    let mut ticker = tokio::time::interval(tokio::time::Duration::from_millis(120));

    terminal.draw(|f| render::draw(f, &mut state))?;

    loop {
        tokio::select! {
            // ── Animation tick / copy indicator expiry ────────────────────────
            _ = ticker.tick() => {
                let expired = state.expire_copies(Instant::now());
                if state.form.is_loading() {
                    state.spinner_tick = state.spinner_tick.wrapping_add(1);
                }
                if expired || state.form.is_loading() {
                    terminal.draw(|f| render::draw(f, &mut state))?;
                }
            }

            // ── Request results ───────────────────────────────────────────────
            Some(ev) = ui_rx.recv() => {
                state.apply_event(ev);
                terminal.draw(|f| render::draw(f, &mut state))?;
            }

            // ── Keyboard/resize events ────────────────────────────────────────
            Some(Ok(ev)) = crossterm_events.next() => {
                if let Event::Key(key) = ev {
                    let keep = handle_key(key, &mut state, &client, &mut clipboard, &ui_tx);
                    if !keep { break; }
                }
                terminal.draw(|f| render::draw(f, &mut state))?;
            }
        }
    }

    Ok(())
}

// ── Key handler ───────────────────────────────────────────────────────────────

/// Returns false when the app should exit.
fn handle_key<B, C>(
    key: KeyEvent,
    state: &mut AppState,
    backend: &B,
    clipboard: &mut C,
    ui_tx: &mpsc::UnboundedSender<UiEvent>,
) -> bool
where
    B: MenuBackend + Clone + Send + Sync + 'static,
    C: Clipboard + ?Sized,
{
    if key.kind == KeyEventKind::Release {
        return true;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => return false,
        KeyCode::Char('c') if ctrl => return false,
        KeyCode::Char('y') if ctrl => state.copy_focused(clipboard, Instant::now()),
        KeyCode::Char('n') if ctrl => state.cycle_copy_focus(),
        KeyCode::Char('w') if ctrl => {
            let (text, cursor) = state.focused_mut();
            input_delete_word(text, cursor);
        }
        KeyCode::Enter => launch_request(state, backend, ui_tx),
        KeyCode::Tab => state.focus = state.focus.next(),
        KeyCode::BackTab => state.focus = state.focus.prev(),
        KeyCode::PageDown => state.scroll = state.scroll.saturating_add(10).min(state.results_max_scroll),
        KeyCode::PageUp => state.scroll = state.scroll.saturating_sub(10),
        KeyCode::Backspace => {
            let (text, cursor) = state.focused_mut();
            input_backspace(text, cursor);
        }
        KeyCode::Delete => {
            let (text, cursor) = state.focused_mut();
            input_delete_forward(text, cursor);
        }
        KeyCode::Left => {
            let (text, cursor) = state.focused_mut();
            *cursor = if ctrl { word_left(text, *cursor) } else { prev_char_boundary(text, *cursor) };
        }
        KeyCode::Right => {
            let (text, cursor) = state.focused_mut();
            *cursor = if ctrl { word_right(text, *cursor) } else { next_char_boundary(text, *cursor) };
        }
        KeyCode::Home => *state.focused_mut().1 = 0,
        KeyCode::End => {
            let (text, cursor) = state.focused_mut();
            *cursor = text.len();
        }
        KeyCode::Char(ch) if !ctrl => {
            let (text, cursor) = state.focused_mut();
            text.insert(*cursor, ch);
            *cursor += ch.len_utf8();
        }
        _ => {}
    }
    true
}

// ── Request launcher ──────────────────────────────────────────────────────────

/// Submit the form. The network step runs on its own task; a submit while one
/// is already in flight changes nothing.
fn launch_request<B>(state: &mut AppState, backend: &B, ui_tx: &mpsc::UnboundedSender<UiEvent>)
where
    B: MenuBackend + Clone + Send + Sync + 'static,
{
    if state.form.is_loading() {
        return;
    }
    state.notice = None;
    let Some(request) = state.form.begin() else {
        // Validation failed; the error is already in the form state
        state.reset_results();
        return;
    };
    state.reset_results();
    state.spinner_tick = 0;

    let backend = backend.clone();
    let tx = ui_tx.clone();
    tokio::spawn(async move {
        let outcome = backend.generate(&request).await;
        let _ = tx.send(UiEvent::Reply(outcome));
    });
}

// ── Input editing helpers ─────────────────────────────────────────────────────

/// Remove the character immediately before the cursor (UTF-8 safe).
fn input_backspace(input: &mut String, cursor: &mut usize) {
    if *cursor == 0 {
        return;
    }
    let prev = prev_char_boundary(input, *cursor);
    input.drain(prev..*cursor);
    *cursor = prev;
}

/// Delete the character at the cursor position.
fn input_delete_forward(input: &mut String, cursor: &mut usize) {
    if *cursor >= input.len() {
        return;
    }
    let next = next_char_boundary(input, *cursor);
    input.drain(*cursor..next);
}

/// Delete the word immediately before the cursor (stops at whitespace or a comma).
fn input_delete_word(input: &mut String, cursor: &mut usize) {
    if *cursor == 0 {
        return;
    }
    let start = word_left(input, *cursor);
    input.drain(start..*cursor);
    *cursor = start;
}

/// Previous UTF-8 char boundary before `pos`.
fn prev_char_boundary(s: &str, pos: usize) -> usize {
    if pos == 0 {
        return 0;
    }
    let mut p = pos - 1;
    while !s.is_char_boundary(p) {
        p -= 1;
    }
    p
}

/// Next UTF-8 char boundary after `pos`.
fn next_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let mut p = pos + 1;
    while p <= s.len() && !s.is_char_boundary(p) {
        p += 1;
    }
    p.min(s.len())
}

fn is_word_break(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b','
}

/// Jump to the start of the previous word (skip separators, then the word).
fn word_left(s: &str, mut pos: usize) -> usize {
    let bytes = s.as_bytes();
    while pos > 0 && is_word_break(bytes[pos - 1]) {
        pos -= 1;
    }
    while pos > 0 && !is_word_break(bytes[pos - 1]) {
        pos -= 1;
    }
    pos
}

/// Jump past the end of the next word to the right.
fn word_right(s: &str, mut pos: usize) -> usize {
    let bytes = s.as_bytes();
    let len = s.len();
    while pos < len && is_word_break(bytes[pos]) {
        pos += 1;
    }
    while pos < len && !is_word_break(bytes[pos]) {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::ClipboardError;
    use crate::form::UiState;
    use crate::menu::MenuRequest;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Clone)]
    struct NeverCalled;

    impl MenuBackend for NeverCalled {
        async fn generate(&self, _request: &MenuRequest) -> Result<Reply, TransportError> {
            panic!("no request expected");
        }
    }

    #[derive(Default)]
    struct CountingClipboard {
        writes: Vec<String>,
    }

    impl Clipboard for CountingClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.writes.push(text.to_string());
            Ok(())
        }
    }

    fn state() -> AppState {
        AppState::new(&ResolvedConfig {
            endpoint: "http://localhost:5000".to_string(),
            profile_name: "test".to_string(),
            request_timeout: None,
        })
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn state_with_menu() -> AppState {
        let mut s = state();
        s.form.input.ingredients = "egg".to_string();
        assert!(s.form.begin().is_some());
        s.apply_event(UiEvent::Reply(Ok(Reply {
            status: 200,
            body: Some(json!({
                "plan_without_budget": {
                    "dishes": [{"name": "Omelette", "steps": ["fry"], "calories": 300}],
                    "total_calories": 300,
                    "notes": "ok",
                    "shopping_list": ["milk", "bread"]
                },
                "plan_with_budget": {
                    "dishes": [{"name": "Stew", "calories": 500}],
                    "total_calories": 500,
                    "notes": "more",
                    "shopping_list": ["beef"]
                }
            })),
        })));
        s
    }

    fn send(s: &mut AppState, k: KeyEvent, cb: &mut CountingClipboard) -> bool {
        let (tx, _rx) = mpsc::unbounded_channel();
        handle_key(k, s, &NeverCalled, cb, &tx)
    }

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut s = state();
        let mut cb = CountingClipboard::default();
        for c in "卵, rice".chars() {
            send(&mut s, key(KeyCode::Char(c)), &mut cb);
        }
        send(&mut s, key(KeyCode::Tab), &mut cb);
        send(&mut s, key(KeyCode::Char('5')), &mut cb);
        assert_eq!(s.form.input.ingredients, "卵, rice");
        assert_eq!(s.form.input.budget, "5");
        assert_eq!(s.cursor(Field::Ingredients), "卵, rice".len());

        send(&mut s, key(KeyCode::BackTab), &mut cb);
        send(&mut s, key(KeyCode::Home), &mut cb);
        send(&mut s, key(KeyCode::Delete), &mut cb);
        assert_eq!(s.form.input.ingredients, ", rice");
    }

    #[test]
    fn test_enter_with_blank_ingredients_sets_validation_error() {
        let mut s = state();
        let mut cb = CountingClipboard::default();
        assert!(send(&mut s, key(KeyCode::Enter), &mut cb));
        assert_eq!(s.form.error(), Some("enter at least one ingredient"));
        assert!(!s.form.is_loading());
    }

    #[test]
    fn test_enter_while_loading_is_ignored() {
        let mut s = state();
        let mut cb = CountingClipboard::default();
        s.form.input.ingredients = "egg".to_string();
        assert!(s.form.begin().is_some());
        send(&mut s, key(KeyCode::Enter), &mut cb);
        assert_eq!(s.form.state(), &UiState::Loading);
    }

    #[test]
    fn test_escape_and_ctrl_c_quit() {
        let mut s = state();
        let mut cb = CountingClipboard::default();
        assert!(!send(&mut s, key(KeyCode::Esc), &mut cb));
        assert!(!send(&mut s, ctrl('c'), &mut cb));
    }

    #[test]
    fn test_reply_resets_copy_state() {
        let s = state_with_menu();
        assert_eq!(s.copy.len(), 2);
        assert_eq!(s.copyable_slots(), [0, 1]);
        assert_eq!(s.copy_focus, 0);
    }

    #[test]
    fn test_copy_focused_list_is_debounced() {
        let mut s = state_with_menu();
        let mut cb = CountingClipboard::default();
        let t0 = Instant::now();

        s.copy_focused(&mut cb, t0);
        s.copy_focused(&mut cb, t0 + Duration::from_millis(500));
        assert_eq!(cb.writes, ["milk\nbread"]);
        assert!(s.is_copied(0, t0));
        assert!(s.notice.as_deref().unwrap().contains("2 items"));

        assert!(s.expire_copies(t0 + Duration::from_millis(2000)));
        assert!(!s.is_copied(0, t0 + Duration::from_millis(2000)));
    }

    #[test]
    fn test_ctrl_n_cycles_copy_focus() {
        let mut s = state_with_menu();
        let mut cb = CountingClipboard::default();
        send(&mut s, ctrl('n'), &mut cb);
        assert_eq!(s.copy_focus, 1);
        send(&mut s, ctrl('y'), &mut cb);
        assert_eq!(cb.writes, ["beef"]);
        send(&mut s, ctrl('n'), &mut cb);
        assert_eq!(s.copy_focus, 0);
    }

    #[test]
    fn test_page_down_stops_at_last_line() {
        let mut s = state_with_menu();
        let mut cb = CountingClipboard::default();
        s.results_max_scroll = 25;
        for _ in 0..5 {
            send(&mut s, key(KeyCode::PageDown), &mut cb);
        }
        assert_eq!(s.scroll, 25);
        send(&mut s, key(KeyCode::PageUp), &mut cb);
        assert_eq!(s.scroll, 15);
    }

    #[test]
    fn test_draw_clamps_scroll_to_results() {
        let mut s = state_with_menu();
        s.scroll = 10_000;
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| render::draw(f, &mut s)).unwrap();
        assert!(s.results_max_scroll > 0);
        assert_eq!(s.scroll, s.results_max_scroll);
    }

    #[test]
    fn test_input_helpers_respect_utf8() {
        let mut text = "卵ご飯".to_string();
        let mut cursor = text.len();
        input_backspace(&mut text, &mut cursor);
        assert_eq!(text, "卵ご");
        assert_eq!(cursor, "卵ご".len());
        assert_eq!(prev_char_boundary(&text, cursor), "卵".len());
        assert_eq!(next_char_boundary(&text, 0), "卵".len());
    }

    #[test]
    fn test_delete_word_stops_at_comma() {
        let mut text = "egg, rice, onion".to_string();
        let mut cursor = text.len();
        input_delete_word(&mut text, &mut cursor);
        assert_eq!(text, "egg, rice, ");
        assert_eq!(word_right("egg, rice", 3), "egg, rice".len());
    }
}
