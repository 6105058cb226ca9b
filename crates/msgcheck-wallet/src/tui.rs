//! Terminal front end for the fee editor.
//!
//! Owns the alternate screen for one session, feeds key presses into
//! [`FeeEditor`] and draws each [`FeeView`]. All fee logic lives in the
//! resolver crate.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tracing::debug;

use msgcheck_core::{FeeUnit, MessagePrototype, TokenAmount};
use msgcheck_resolver::{EditorEvent, EditorKey, EditorOutcome, FeeAdjuster, FeeClass, FeeEditor, FeeView};

use crate::logging;

/// Visible width of the price field.
const FIELD_WIDTH: usize = 14;
const FIELD_LABEL: &str = "Current Maximum Fee: ";
const FIELD_ROW: u16 = 4;

#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Unit the price text is typed in.
    pub unit: FeeUnit,
    /// Redraw interval while no key arrives.
    pub tick: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            unit: FeeUnit::Fil,
            tick: Duration::from_millis(250),
        }
    }
}

// ── Terminal session ─────────────────────────────────────────────────────────

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        logging::set_stderr_enabled(false);
        if let Err(err) = enable_raw_mode() {
            logging::set_stderr_enabled(true);
            return Err(err);
        }
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            logging::set_stderr_enabled(true);
            return Err(err);
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, Show, LeaveAlternateScreen);
        logging::set_stderr_enabled(true);
    }
}

/// [`FeeAdjuster`] that runs the editor on the operator's terminal.
pub struct TerminalFeeEditor {
    config: EditorConfig,
}

impl TerminalFeeEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    fn run(&self, editor: &mut FeeEditor, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
        loop {
            let view = editor.view();
            terminal.draw(|frame| draw(frame, &view))?;

            let event = if event::poll(self.config.tick)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key),
                    _ => EditorEvent::Tick,
                }
            } else {
                EditorEvent::Tick
            };

            if editor.handle(event).is_terminal() {
                return Ok(());
            }
        }
    }
}

impl FeeAdjuster for TerminalFeeEditor {
    fn adjust(&mut self, proto: &MessagePrototype, base_fee: &TokenAmount) -> io::Result<EditorOutcome> {
        let mut editor = FeeEditor::new(proto, base_fee.clone(), self.config.unit);

        let guard = TerminalGuard::enter()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;
        let session = self.run(&mut editor, &mut terminal);
        drop(guard);
        session?;

        let outcome = editor.outcome();
        debug!(committed = outcome.committed, max_fee = %outcome.max_fee, "fee editor closed");
        Ok(outcome)
    }
}

/// Ctrl-C tears the session down. Characters pass through only unmodified
/// or shifted; other chords and unused keys just redraw.
fn map_key(key: KeyEvent) -> EditorEvent {
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        return EditorEvent::Teardown;
    }
    let plain = key.modifiers.difference(KeyModifiers::SHIFT).is_empty();
    let key = match key.code {
        KeyCode::Char(c) if plain => EditorKey::Char(c),
        KeyCode::Enter => EditorKey::Enter,
        KeyCode::Backspace => EditorKey::Backspace,
        KeyCode::Delete => EditorKey::Delete,
        KeyCode::Left => EditorKey::Left,
        KeyCode::Right => EditorKey::Right,
        KeyCode::Home => EditorKey::Home,
        KeyCode::End => EditorKey::End,
        _ => return EditorEvent::Tick,
    };
    EditorEvent::Key(key)
}

// ── Drawing ──────────────────────────────────────────────────────────────────

fn draw(frame: &mut Frame, view: &FeeView) {
    let area = frame.size();
    frame.render_widget(Paragraph::new(fee_lines(view)), area);

    let (_, cursor_col) = field_window(&view.price_text, view.cursor);
    let x = area.x + (FIELD_LABEL.len() + 1 + cursor_col) as u16;
    let y = area.y + FIELD_ROW;
    if x < area.right() && y < area.bottom() {
        frame.set_cursor(x, y);
    }
}

/// Slice of the price text that fits the field, padded to its width, and
/// the cursor column inside it.
fn field_window(text: &str, cursor: usize) -> (String, usize) {
    let start = (cursor + 1).saturating_sub(FIELD_WIDTH);
    let visible: String = text.chars().skip(start).take(FIELD_WIDTH).collect();
    (format!("{visible:<FIELD_WIDTH$}"), cursor - start)
}

fn class_span(class: &FeeClass) -> Span<'static> {
    let style = match class {
        FeeClass::Invalid => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        FeeClass::Safe => Style::default().fg(Color::Green),
        FeeClass::Low { .. } => Style::default().fg(Color::Yellow),
        FeeClass::TooLow => Style::default().fg(Color::LightRed),
    };
    let text = match class.over_text() {
        Some(over) => format!("{} {}", class.label(), over),
        None => class.label().to_string(),
    };
    Span::styled(text, style)
}

fn fee_lines(view: &FeeView) -> Vec<Line<'static>> {
    let unit = view.unit;
    let amount = |a: &TokenAmount| format!("{} {}", a.to_unitless(unit), unit.suffix());
    let (field, _) = field_window(&view.price_text, view.cursor);

    vec![
        Line::from("Fee of the message is too low."),
        Line::from(format!("Your configured maximum fee is: {}", amount(&view.original_max_fee))),
        Line::from(format!("Required maximum fee for the message: {}", amount(&view.required_fee))),
        Line::from(vec![
            Span::raw(format!("Safe maximum fee for the message: {}", amount(&view.safe_fee))),
            Span::styled("   Press S to use it", Style::default().add_modifier(Modifier::DIM)),
        ]),
        Line::from(vec![
            Span::raw(FIELD_LABEL),
            Span::raw("["),
            Span::styled(field, Style::default().fg(Color::White).bg(Color::Black)),
            Span::raw("] "),
            Span::raw(format!("{} ", unit.suffix())),
            class_span(&view.class),
        ]),
        Line::from(""),
        Line::from(format!("Current Base Fee is: {}", view.base_fee)),
        Line::from(format!("Resulting FeeCap is: {}", view.fee_cap_preview)),
        Line::from("You can use '+' and '-' to adjust the fee."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn proto() -> MessagePrototype {
        MessagePrototype {
            version: 0,
            to: "f01000".into(),
            from: "f01001".into(),
            nonce: 0,
            value: TokenAmount::zero(),
            gas_limit: 1_000_000,
            gas_fee_cap: TokenAmount::from(10),
            gas_premium: TokenAmount::from(1),
            method: 0,
            params: vec![],
        }
    }

    fn screen(view: &FeeView) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        terminal.draw(|frame| draw(frame, view)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(80)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>().trim_end().to_string())
            .collect()
    }

    #[test]
    fn maps_keys() {
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(map_key(press(KeyCode::Char('s'))), EditorEvent::Key(EditorKey::Char('s')));
        assert_eq!(map_key(press(KeyCode::Enter)), EditorEvent::Key(EditorKey::Enter));
        assert_eq!(map_key(press(KeyCode::Home)), EditorEvent::Key(EditorKey::Home));
        assert_eq!(map_key(press(KeyCode::Esc)), EditorEvent::Tick);
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            EditorEvent::Teardown
        );
    }

    #[test]
    fn modified_characters_do_not_edit() {
        let chord = |c, modifiers| map_key(KeyEvent::new(KeyCode::Char(c), modifiers));
        assert_eq!(chord('s', KeyModifiers::CONTROL), EditorEvent::Tick);
        assert_eq!(chord('s', KeyModifiers::ALT), EditorEvent::Tick);
        assert_eq!(chord('+', KeyModifiers::CONTROL | KeyModifiers::SHIFT), EditorEvent::Tick);
        assert_eq!(chord('S', KeyModifiers::SHIFT), EditorEvent::Key(EditorKey::Char('S')));
        assert_eq!(chord('+', KeyModifiers::SHIFT), EditorEvent::Key(EditorKey::Char('+')));
    }

    #[test]
    fn field_scrolls_with_cursor() {
        assert_eq!(field_window("12", 2), ("12            ".to_string(), 2));
        let long = "123456789012345678";
        let (visible, col) = field_window(long, 18);
        assert_eq!(visible, "6789012345678 ");
        assert_eq!(col, 13);
        let (visible, col) = field_window(long, 0);
        assert_eq!(visible, "12345678901234");
        assert_eq!(col, 0);
    }

    #[test]
    fn draws_editor_screen() {
        let editor = FeeEditor::new(&proto(), TokenAmount::from(100), FeeUnit::AttoFil);
        let rows = screen(&editor.view());

        assert_eq!(rows[0], "Fee of the message is too low.");
        assert_eq!(rows[1], "Your configured maximum fee is: 10000000 attoFIL");
        assert_eq!(rows[2], "Required maximum fee for the message: 100000000 attoFIL");
        assert_eq!(
            rows[3],
            "Safe maximum fee for the message: 1000000000 attoFIL   Press S to use it"
        );
        assert_eq!(rows[4], "Current Maximum Fee: [10000000      ] attoFIL too low");
        assert_eq!(rows[6], "Current Base Fee is: 0.0000000000000001 FIL");
        assert_eq!(rows[7], "Resulting FeeCap is: 0.00000000000000001 FIL");
        assert_eq!(rows[8], "You can use '+' and '-' to adjust the fee.");
    }

    #[test]
    fn low_fee_shows_margin() {
        let mut editor = FeeEditor::new(&proto(), TokenAmount::from(100), FeeUnit::AttoFil);
        editor.handle(EditorEvent::Key(EditorKey::Char('s')));
        for _ in 0..4 {
            editor.handle(EditorEvent::Key(EditorKey::Char('-')));
        }
        let view = editor.view();
        assert!(matches!(view.class, FeeClass::Low { .. }));
        let rows = screen(&view);
        assert!(rows[4].ends_with("attoFIL low 6.8x over the minimum"), "{}", rows[4]);
    }
}
