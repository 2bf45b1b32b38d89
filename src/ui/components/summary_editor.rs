use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
  Submitted { issue_key: String, summary: String },
  Cancelled,
}

/// Inline editor for an issue summary
#[derive(Debug, Clone, Default)]
pub struct SummaryEditor {
  issue_key: Option<String>,
  original: String,
  input: TextInput,
}

impl SummaryEditor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.issue_key.is_some()
  }

  pub fn show(&mut self, issue_key: &str, summary: &str) {
    self.issue_key = Some(issue_key.to_string());
    self.original = summary.to_string();
    self.input = TextInput::with_value(summary);
  }

  /// Unchanged or blank summaries are reported as a cancel
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<EditEvent> {
    let Some(issue_key) = self.issue_key.clone() else {
      return KeyResult::NotHandled;
    };

    match self.input.handle_key(key) {
      InputResult::Submitted(text) => {
        self.issue_key = None;
        let summary = text.trim().to_string();
        if summary.is_empty() || summary == self.original {
          KeyResult::Event(EditEvent::Cancelled)
        } else {
          KeyResult::Event(EditEvent::Submitted { issue_key, summary })
        }
      }
      InputResult::Cancelled => {
        self.issue_key = None;
        KeyResult::Event(EditEvent::Cancelled)
      }
      InputResult::Consumed | InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some(issue_key) = &self.issue_key else {
      return;
    };

    let width = area.width.saturating_sub(4).min(100);
    let overlay_area = Rect::new(
      area.x + 2,
      area.y + area.height.saturating_sub(3) / 2,
      width,
      3u16.min(area.height),
    );

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" Summary of {} ", issue_key));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let (before, after) = self.input.split_at_cursor();
    let line = Line::from(vec![
      Span::raw(before),
      Span::styled("_", Style::default().fg(Color::Yellow)),
      Span::raw(after),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
  }
}
