use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{App, PanelId};

/// Lines moved per PageUp/PageDown.
const PAGE_SCROLL: usize = 10;

impl App {
    /// Main entry point for handling keyboard events.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if self.handle_global_shortcuts(key) {
            return;
        }
        self.handle_input_key(key);
    }

    /// Handles global keyboard shortcuts.
    /// Returns `true` if a shortcut was handled, `false` otherwise.
    fn handle_global_shortcuts(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.cancel_all();
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.select(self.active.other());
                self.status_message = format!("Switched to {}", self.active_panel().tab_label());
            }
            KeyCode::F(1) => self.select(PanelId::PriceMonitoring),
            KeyCode::F(2) => self.select(PanelId::CompetitorGap),
            KeyCode::PageUp => self.active_panel_mut().transcript_mut().scroll_up(PAGE_SCROLL),
            KeyCode::PageDown => self
                .active_panel_mut()
                .transcript_mut()
                .scroll_down(PAGE_SCROLL),
            KeyCode::Up if ctrl => self.active_panel_mut().transcript_mut().scroll_up(1),
            KeyCode::Down if ctrl => self.active_panel_mut().transcript_mut().scroll_down(1),
            _ => return false,
        }
        true
    }

    /// Handles keys aimed at the active panel's input line.
    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_active(),
            KeyCode::Esc => {
                if !self.cancel_active() {
                    self.active_panel_mut().input_mut().clear();
                }
            }
            KeyCode::Backspace => self.active_panel_mut().input_mut().backspace(),
            KeyCode::Delete => self.active_panel_mut().input_mut().delete(),
            KeyCode::Left => self.active_panel_mut().input_mut().move_left(),
            KeyCode::Right => self.active_panel_mut().input_mut().move_right(),
            KeyCode::Home => self.active_panel_mut().input_mut().move_home(),
            KeyCode::End => self.active_panel_mut().input_mut().move_end(),
            KeyCode::Up => {
                self.active_panel_mut().input_mut().history_previous();
            }
            KeyCode::Down => {
                self.active_panel_mut().input_mut().history_next();
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.active_panel_mut().input_mut().insert_char(ch);
            }
            _ => {}
        }
    }

    /// Inserts pasted text into the active input line.
    pub fn handle_paste(&mut self, text: &str) {
        self.active_panel_mut().input_mut().insert_str(text);
    }
}
