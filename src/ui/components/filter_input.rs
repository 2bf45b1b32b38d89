use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by the filter input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
  /// New filter text for the current view, possibly empty
  Submitted(String),
}

/// Filter overlay for the current view.
///
/// The filter is part of the server query, so it is applied on Enter
/// rather than on every keystroke. Escape leaves the old filter in place.
#[derive(Debug, Clone, Default)]
pub struct FilterInput {
  input: TextInput,
  active: bool,
}

impl FilterInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the overlay, starting from the view's current filter
  pub fn activate(&mut self, current: &str) {
    self.active = true;
    self.input.set_value(current);
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FilterEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(text) => {
        self.active = false;
        KeyResult::Event(FilterEvent::Submitted(text.trim().to_string()))
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.clear();
        KeyResult::Handled
      }
      InputResult::Consumed => KeyResult::Handled,
      // Swallow everything else while open
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, 3u16.min(area.height));

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Filter summary ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let (before, after) = self.input.split_at_cursor();
    let line = Line::from(vec![
      Span::styled("/", Style::default().fg(Color::Yellow)),
      Span::raw(before),
      Span::styled("_", Style::default().fg(Color::Yellow)),
      Span::raw(after),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_inactive_passes_keys_through() {
    let mut filter = FilterInput::new();
    assert_eq!(filter.handle_key(key(KeyCode::Char('x'))), KeyResult::NotHandled);
  }

  #[test]
  fn test_submit_applies_trimmed_text() {
    let mut filter = FilterInput::new();
    filter.activate("log");
    filter.handle_key(key(KeyCode::Char('i')));
    filter.handle_key(key(KeyCode::Char('n')));
    filter.handle_key(key(KeyCode::Char(' ')));
    assert_eq!(
      filter.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FilterEvent::Submitted("login".to_string()))
    );
    assert!(!filter.is_active());
  }

  #[test]
  fn test_escape_emits_nothing() {
    let mut filter = FilterInput::new();
    filter.activate("login");
    assert_eq!(filter.handle_key(key(KeyCode::Esc)), KeyResult::Handled);
    assert!(!filter.is_active());
  }
}
