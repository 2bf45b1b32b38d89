use super::KeyResult;
use crate::jira::types::Transition;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Events emitted by status picker that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusPickerEvent {
  /// Move `issue_key` to the status with `status_id`
  Selected { issue_key: String, status_id: String },
  Cancelled,
}

/// Picker over the transitions available from an issue's current status
#[derive(Debug, Clone, Default)]
pub struct StatusPicker {
  issue_key: Option<String>,
  transitions: Vec<Transition>,
  selected: usize,
}

impl StatusPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.issue_key.is_some()
  }

  pub fn show(&mut self, issue_key: String, transitions: Vec<Transition>) {
    self.issue_key = Some(issue_key);
    self.transitions = transitions;
    self.selected = 0;
  }

  pub fn hide(&mut self) {
    self.issue_key = None;
    self.transitions.clear();
    self.selected = 0;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<StatusPickerEvent> {
    let Some(issue_key) = self.issue_key.clone() else {
      return KeyResult::NotHandled;
    };

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(StatusPickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let event = match self.transitions.get(self.selected) {
          Some(t) => StatusPickerEvent::Selected {
            issue_key,
            status_id: t.to_status_id.clone(),
          },
          None => StatusPickerEvent::Cancelled,
        };
        self.hide();
        KeyResult::Event(event)
      }
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.transitions.is_empty() {
          self.selected = (self.selected + 1) % self.transitions.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        let count = self.transitions.len();
        if count > 0 {
          self.selected = (self.selected + count - 1) % count;
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some(issue_key) = &self.issue_key else {
      return;
    };
    if self.transitions.is_empty() || area.width < 8 || area.height < 5 {
      return;
    }

    let labels: Vec<String> = self
      .transitions
      .iter()
      .map(|t| {
        if t.name == t.to_status_name {
          t.name.clone()
        } else {
          format!("{} → {}", t.name, t.to_status_name)
        }
      })
      .collect();

    let max_len = labels.iter().map(|l| l.chars().count()).max().unwrap_or(10);
    let width = (max_len as u16 + 6).max(24).min(area.width - 4);
    let height = (labels.len() as u16 + 2).max(3).min(area.height - 4);

    // Center the overlay
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" Move {} ", issue_key));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let items: Vec<ListItem> = labels
      .into_iter()
      .map(|label| ListItem::new(Span::styled(label, Style::default().fg(Color::Cyan))))
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, inner, &mut state);
  }
}
