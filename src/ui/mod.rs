pub mod components;
pub mod renderfns;
mod tree_view;

use crate::cache::CacheSource;
use crate::controller::{Notice, ViewController};
use crate::tree::Row;
use components::{CommandInput, FilterInput, StatusPicker, SummaryEditor};
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use renderfns::{draw_footer, draw_header, HeaderInfo};

/// Everything one frame needs, borrowed from the app
pub struct Screen<'a> {
  pub controller: &'a ViewController,
  pub rows: &'a [Row],
  pub list_state: &'a mut ListState,
  pub domain: &'a str,
  pub loading: bool,
  pub source: Option<CacheSource>,
  pub notice: Option<&'a Notice>,
  pub filter: &'a FilterInput,
  pub command: &'a CommandInput,
  pub picker: &'a StatusPicker,
  pub editor: &'a SummaryEditor,
}

/// Main draw function
pub fn draw(frame: &mut Frame, screen: Screen) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Tree
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  let key = screen.controller.current_key();
  let header = HeaderInfo {
    domain: screen.domain,
    view: key.target().label(),
    filter: key.filter(),
    hide_resolved: key.hide_resolved(),
    loading: screen.loading,
    source: screen.source,
  };
  draw_header(frame, chunks[0], &header, chrono::Utc::now());

  tree_view::draw_tree(
    frame,
    chunks[1],
    screen.controller,
    screen.rows,
    screen.list_state,
  );

  draw_footer(frame, chunks[2], screen.notice);

  // Overlays, last drawn on top
  screen.filter.render_overlay(frame, chunks[1]);
  screen.command.render_overlay(frame, chunks[1]);
  screen.picker.render_overlay(frame, chunks[1]);
  screen.editor.render_overlay(frame, chunks[1]);
}
