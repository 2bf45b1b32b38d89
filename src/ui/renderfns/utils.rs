use crate::jira::types::StatusCategory;
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a status, by its workflow category
pub fn status_color(category: StatusCategory) -> Color {
  match category {
    StatusCategory::Done => Color::Green,
    StatusCategory::InProgress => Color::Yellow,
    StatusCategory::ToDo => Color::White,
    StatusCategory::Unknown => Color::Gray,
  }
}

/// Tracked seconds as working time, e.g. `1d 2h`, `3h 30m`, `45m`
pub fn format_duration(seconds: u64) -> String {
  const MINUTE: u64 = 60;
  const HOUR: u64 = 60 * MINUTE;
  const DAY: u64 = 8 * HOUR;

  if seconds < MINUTE {
    return if seconds == 0 {
      "0m".to_string()
    } else {
      "<1m".to_string()
    };
  }

  let days = seconds / DAY;
  let hours = (seconds % DAY) / HOUR;
  let minutes = (seconds % HOUR) / MINUTE;

  let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m")]
    .iter()
    .filter(|(value, _)| *value > 0)
    .map(|(value, unit)| format!("{}{}", value, unit))
    .take(2)
    .collect();
  parts.join(" ")
}

/// Progress fraction as a whole percentage; may exceed 100
pub fn format_progress(progress: f64) -> String {
  format!("{:.0}%", progress * 100.0)
}

/// Color for a progress value: over budget is red
pub fn progress_color(progress: f64) -> Color {
  if progress > 1.0 {
    Color::Red
  } else if progress >= 0.75 {
    Color::Yellow
  } else {
    Color::Cyan
  }
}

/// Story points without a trailing `.0`
pub fn format_points(points: f64) -> String {
  if points.fract() == 0.0 {
    format!("{:.0}", points)
  } else {
    format!("{:.1}", points)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_counts_characters() {
    assert_eq!(truncate("añadir día", 7), "añad...");
  }

  #[test]
  fn test_status_color_by_category() {
    assert_eq!(status_color(StatusCategory::Done), Color::Green);
    assert_eq!(status_color(StatusCategory::InProgress), Color::Yellow);
    assert_eq!(status_color(StatusCategory::ToDo), Color::White);
  }

  #[test]
  fn test_format_duration() {
    assert_eq!(format_duration(0), "0m");
    assert_eq!(format_duration(30), "<1m");
    assert_eq!(format_duration(45 * 60), "45m");
    assert_eq!(format_duration(3 * 3600 + 30 * 60), "3h 30m");
    assert_eq!(format_duration(8 * 3600 + 2 * 3600), "1d 2h");
    assert_eq!(format_duration(8 * 3600 + 5 * 60), "1d 5m");
  }

  #[test]
  fn test_format_progress_and_points() {
    assert_eq!(format_progress(0.5), "50%");
    assert_eq!(format_progress(1.25), "125%");
    assert_eq!(format_points(3.0), "3");
    assert_eq!(format_points(0.5), "0.5");
  }
}
