use crate::commands::{self, ParsedCommand};
use crate::config::Config;
use crate::controller::{Notice, ViewController, ViewState};
use crate::event::{Event, EventHandler};
use crate::jira::types::CreateRequest;
use crate::tree::Row;
use crate::ui::components::{
  CommandEvent, CommandInput, EditEvent, FilterEvent, FilterInput, KeyResult, StatusPicker,
  StatusPickerEvent, SummaryEditor,
};
use crate::ui::{self, Screen};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use serde_json::{Map, Value};
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::info;

/// Main application state
pub struct App {
  controller: ViewController,
  config: Config,
  domain: String,

  /// Selected row of the tree
  list_state: ListState,

  filter: FilterInput,
  command: CommandInput,
  picker: StatusPicker,
  editor: SummaryEditor,

  /// Latest notice, shown in the footer until the next key press
  notice: Option<Notice>,

  should_quit: bool,
}

impl App {
  pub fn new(config: Config, controller: ViewController) -> Self {
    let domain = config.jira.domain();
    Self {
      controller,
      config,
      domain,
      list_state: ListState::default(),
      filter: FilterInput::new(),
      command: CommandInput::new(),
      picker: StatusPicker::new(),
      editor: SummaryEditor::new(),
      notice: None,
      should_quit: false,
    }
  }

  /// Run until quit. `initial_query` starts in an ad-hoc query view.
  pub async fn run(&mut self, initial_query: Option<String>) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(self.config.tick_rate_ms));

    match initial_query {
      Some(query) => self.controller.run_query(&query),
      None => self.controller.activate(),
    }
    self.absorb();

    let result = self.main_loop(&mut terminal, &mut events).await;

    // Restore the terminal even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn main_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => {
          if self.controller.poll() {
            self.absorb();
          }
        }
        Some(Event::Resize) => {}
        None => break,
      }
    }
    Ok(())
  }

  fn draw(&mut self, frame: &mut Frame) {
    let rows = self.controller.rows();
    let key = self.controller.current_key();
    let (loading, source) = match self.controller.state() {
      ViewState::Loading { .. } => (true, None),
      ViewState::Rendered { key: shown, source } if *shown == key => (false, Some(*source)),
      _ => (false, None),
    };

    ui::draw(
      frame,
      Screen {
        controller: &self.controller,
        rows: &rows,
        list_state: &mut self.list_state,
        domain: &self.domain,
        loading,
        source,
        notice: self.notice.as_ref(),
        filter: &self.filter,
        command: &self.command,
        picker: &self.picker,
        editor: &self.editor,
      },
    );
  }

  /// Pull notices and transition lists out of the controller after it acted
  fn absorb(&mut self) {
    if let Some(last) = self.controller.drain_notices().pop() {
      self.notice = Some(last);
    }

    if let Some((issue_key, transitions)) = self.controller.take_transitions() {
      self.picker.show(issue_key, transitions);
    }

    let len = self.controller.rows().len();
    match self.list_state.selected() {
      _ if len == 0 => self.list_state.select(None),
      Some(idx) if idx >= len => self.list_state.select(Some(len - 1)),
      None => self.list_state.select(Some(0)),
      _ => {}
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // Overlays get the key first, in stacking order
    match self.editor.handle_key(key) {
      KeyResult::Event(EditEvent::Submitted { issue_key, summary }) => {
        let mut fields = Map::new();
        fields.insert("summary".to_string(), Value::String(summary));
        self.controller.update_fields(&issue_key, fields);
        return;
      }
      KeyResult::Event(EditEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    match self.picker.handle_key(key) {
      KeyResult::Event(StatusPickerEvent::Selected {
        issue_key,
        status_id,
      }) => {
        self.controller.transition(&issue_key, &status_id);
        return;
      }
      KeyResult::Event(StatusPickerEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    match self.filter.handle_key(key) {
      KeyResult::Event(FilterEvent::Submitted(text)) => {
        self.controller.set_filter(&text);
        self.absorb();
        return;
      }
      KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    match self.command.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(line)) => {
        self.execute_command(&line);
        self.absorb();
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) => return,
      KeyResult::Handled => {
        self.notice = None;
        return;
      }
      KeyResult::NotHandled => {}
    }

    self.notice = None;
    self.handle_tree_key(key);
    self.absorb();
  }

  fn handle_tree_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,

      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.list_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.list_state.select_last(),

      KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
      KeyCode::Char('z') => self.controller.toggle_all(),

      KeyCode::Char('r') => self.controller.refresh(),
      KeyCode::Char('R') => self.controller.refresh_all(),
      KeyCode::Char('H') => self.controller.toggle_hide_resolved(),

      KeyCode::Char('t') => {
        if let Some(issue_key) = self.selected_key() {
          self.controller.load_transitions(&issue_key);
        }
      }
      KeyCode::Char('e') => {
        if let Some(node) = self.selected_row().and_then(|row| self.controller.node_at(row)) {
          self.editor.show(&node.issue.key, &node.issue.summary);
        }
      }
      KeyCode::Char('/') => {
        let current = self.controller.session().filter().to_string();
        self.filter.activate(&current);
      }
      _ => {}
    }
  }

  /// Toggle the top-level node of the selected row and keep it selected
  fn toggle_selected(&mut self) {
    let Some(row) = self.selected_row() else {
      return;
    };
    let top = Row {
      top: row.top,
      child: None,
    };
    let Some(key) = self.controller.node_at(top).map(|n| n.key().to_string()) else {
      return;
    };

    self.controller.toggle_node(&key);

    let rows = self.controller.rows();
    if let Some(idx) = rows.iter().position(|r| *r == top) {
      self.list_state.select(Some(idx));
    }
  }

  fn selected_row(&self) -> Option<Row> {
    let idx = self.list_state.selected()?;
    self.controller.rows().get(idx).copied()
  }

  fn selected_key(&self) -> Option<String> {
    let row = self.selected_row()?;
    self
      .controller
      .node_at(row)
      .map(|node| node.key().to_string())
  }

  fn execute_command(&mut self, line: &str) {
    let parsed = match commands::parse(line) {
      Ok(parsed) => parsed,
      Err(e) => {
        self.notice = Some(Notice::error(e.to_string()));
        return;
      }
    };
    info!(command = ?parsed, "command");

    match parsed {
      ParsedCommand::Mine => self.controller.open_my_issues(),
      ParsedCommand::Sprint(project) => self.controller.open_sprint(project.as_deref()),
      ParsedCommand::Backlog(project) => self.controller.open_backlog(project.as_deref()),
      ParsedCommand::Jql(query) => self.controller.run_query(&query),
      ParsedCommand::Projects(projects) => self.controller.set_project_scopes(projects),
      ParsedCommand::Create {
        issue_type,
        summary,
      } => {
        let project = self.controller.session().project().to_string();
        if project.is_empty() {
          self.notice = Some(Notice::error("No project selected"));
          return;
        }
        self.controller.create(CreateRequest {
          project,
          issue_type,
          summary,
          assign_to_self: self.config.assign_created_to_self,
        });
      }
      ParsedCommand::Resolved => self.controller.toggle_hide_resolved(),
      ParsedCommand::Quit => self.should_quit = true,
    }
  }
}
