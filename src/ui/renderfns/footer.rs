use crate::controller::{Notice, NoticeLevel};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

const HINTS: &[(&str, &str)] = &[
  ("j/k", "move"),
  ("enter", "expand"),
  ("z", "all"),
  ("r/R", "refresh"),
  ("H", "resolved"),
  ("t", "transition"),
  ("e", "edit"),
  ("/", "filter"),
  (":", "command"),
  ("q", "quit"),
];

/// Draw the footer: the latest notice if there is one, otherwise key hints
pub fn draw_footer(frame: &mut Frame, area: Rect, notice: Option<&Notice>) {
  let line = match notice {
    Some(notice) => {
      let color = match notice.level {
        NoticeLevel::Info => Color::Green,
        NoticeLevel::Error => Color::Red,
      };
      Line::from(Span::styled(
        format!(" {}", notice.message),
        Style::default().fg(color),
      ))
    }
    None => {
      let mut spans = Vec::with_capacity(HINTS.len() * 2);
      for (key, action) in HINTS {
        spans.push(Span::styled(format!(" <{}>", key), Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
          format!(" {} ", action),
          Style::default().fg(Color::DarkGray),
        ));
      }
      Line::from(spans)
    }
  };

  frame.render_widget(Paragraph::new(line), area);
}
