use crate::cache::CacheSource;
use chrono::{DateTime, Utc};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// What the header shows about the current view
pub struct HeaderInfo<'a> {
  pub domain: &'a str,
  pub view: String,
  pub filter: &'a str,
  pub hide_resolved: bool,
  pub loading: bool,
  pub source: Option<CacheSource>,
}

/// Draw the header bar with logo, view identity and data freshness
pub fn draw_header(frame: &mut Frame, area: Rect, info: &HeaderInfo, now: DateTime<Utc>) {
  let sep = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let mut spans = vec![
    Span::styled(" jtree ", Style::default().fg(Color::Cyan).bold()),
    sep(),
    Span::styled(format!(" {} ", info.domain), Style::default().fg(Color::White)),
    sep(),
    Span::styled(
      format!(" {} ", info.view),
      Style::default().fg(Color::Yellow).bold(),
    ),
  ];

  if !info.filter.is_empty() {
    spans.push(sep());
    spans.push(Span::styled(
      format!(" /{} ", info.filter),
      Style::default().fg(Color::Magenta),
    ));
  }

  if info.hide_resolved {
    spans.push(sep());
    spans.push(Span::styled(
      " unresolved only ",
      Style::default().fg(Color::DarkGray),
    ));
  }

  spans.push(sep());
  spans.push(if info.loading {
    Span::styled(" loading… ", Style::default().fg(Color::Yellow))
  } else {
    match info.source {
      Some(CacheSource::Network) => Span::styled(" live ", Style::default().fg(Color::Green)),
      Some(CacheSource::Cache(at)) => Span::styled(
        format!(" cached {} ", format_age(now - at)),
        Style::default().fg(Color::DarkGray),
      ),
      None => Span::raw(" "),
    }
  });

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Coarse age of a cache entry
fn format_age(age: chrono::Duration) -> String {
  let seconds = age.num_seconds().max(0);
  if seconds < 60 {
    "just now".to_string()
  } else if seconds < 3600 {
    format!("{}m ago", seconds / 60)
  } else if seconds < 86_400 {
    format!("{}h ago", seconds / 3600)
  } else {
    format!("{}d ago", seconds / 86_400)
  }
}
