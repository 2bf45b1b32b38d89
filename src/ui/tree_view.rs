use crate::controller::{ViewController, ViewState};
use crate::tree::{Node, Row};
use crate::ui::renderfns::{
  format_duration, format_points, format_progress, progress_color, status_color, truncate,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

const SUMMARY_WIDTH: usize = 60;

/// Draw the visible rows of the current view's forest
pub fn draw_tree(
  frame: &mut Frame,
  area: Rect,
  controller: &ViewController,
  rows: &[Row],
  list_state: &mut ListState,
) {
  let key = controller.current_key();
  let loading = matches!(controller.state(), ViewState::Loading { .. });
  let title = tree_title(
    &key.target().label(),
    controller.forest().map(<[Node]>::len),
    loading,
  );

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if rows.is_empty() {
    let content = match (controller.forest(), controller.state()) {
      (_, ViewState::Loading { .. }) => "Loading…",
      (Some(_), _) => "No issues found.",
      (None, _) => "Nothing loaded. Press 'r' to retry.",
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let items: Vec<ListItem> = rows
    .iter()
    .filter_map(|row| controller.node_at(*row).map(|node| (row, node)))
    .map(|(row, node)| ListItem::new(row_line(node, row.depth())))
    .collect();

  let style = if loading {
    Style::default().add_modifier(Modifier::DIM)
  } else {
    Style::default()
  };
  let list = List::new(items)
    .block(block)
    .style(style)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  frame.render_stateful_widget(list, area, list_state);
}

/// Rows from an earlier fetch stay visible while a new one loads, so the
/// title says so
fn tree_title(label: &str, roots: Option<usize>, loading: bool) -> String {
  match (roots, loading) {
    (Some(roots), true) => format!(" {} ({}) loading… ", label, roots),
    (Some(roots), false) => format!(" {} ({}) ", label, roots),
    (None, _) => format!(" {} ", label),
  }
}

/// Expand marker of a top-level node, indent of a child
fn marker(node: &Node, depth: usize) -> &'static str {
  if depth > 0 {
    "  └ "
  } else if !node.has_children() {
    "    "
  } else if node.expanded {
    "▾   "
  } else {
    "▸   "
  }
}

fn row_line(node: &Node, depth: usize) -> Line<'static> {
  let issue = &node.issue;
  let mut spans = vec![
    Span::styled(marker(node, depth), Style::default().fg(Color::DarkGray)),
    Span::styled(format!("{:<12}", issue.key), Style::default().fg(Color::Cyan)),
    Span::raw(" "),
    Span::styled(
      format!("{:<9}", truncate(issue.issue_type.name(), 9)),
      Style::default().fg(Color::Magenta),
    ),
    Span::raw(" "),
    Span::styled(
      format!("{:<13}", truncate(&issue.status.name, 13)),
      Style::default().fg(status_color(issue.status.category)),
    ),
    Span::raw(" "),
    Span::raw(format!(
      "{:<width$}",
      truncate(&issue.summary, SUMMARY_WIDTH - depth * 2),
      width = SUMMARY_WIDTH - depth * 2
    )),
    Span::raw(" "),
    Span::styled(
      format!("{:<16}", truncate(issue.assignee_label(), 16)),
      Style::default().fg(Color::Gray),
    ),
  ];

  if depth == 0 {
    spans.extend(metrics(node));
  }

  Line::from(spans)
}

/// Story points and time-tracking progress of a top-level node
fn metrics(node: &Node) -> Vec<Span<'static>> {
  let aggregate = &node.aggregate;
  let mut spans = Vec::new();

  if let Some(points) = aggregate.story_points {
    spans.push(Span::styled(
      format!(" {}sp", format_points(points)),
      Style::default().fg(Color::LightBlue),
    ));
  }

  if let Some(progress) = aggregate.progress {
    spans.push(Span::styled(
      format!(" {}", format_progress(progress)),
      Style::default().fg(progress_color(progress)),
    ));
    spans.push(Span::styled(
      format!(
        " ({} / {})",
        format_duration(aggregate.total_time_spent),
        format_duration(aggregate.total_time_estimate)
      ),
      Style::default().fg(Color::DarkGray),
    ));
  }

  spans
}
