//! Available commands, autocomplete and argument parsing

use color_eyre::{eyre::eyre, Result};

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "mine",
    aliases: &["m", "my"],
    usage: "mine",
    description: "Issues assigned to me",
  },
  Command {
    name: "sprint",
    aliases: &["s"],
    usage: "sprint [PROJECT]",
    description: "Open sprint of a project",
  },
  Command {
    name: "backlog",
    aliases: &["b"],
    usage: "backlog [PROJECT]",
    description: "Unplanned issues of a project",
  },
  Command {
    name: "jql",
    aliases: &["j", "query"],
    usage: "jql [QUERY]",
    description: "Run a query, or the last one",
  },
  Command {
    name: "projects",
    aliases: &["p", "scope"],
    usage: "projects A B ...",
    description: "Projects for \"mine\"",
  },
  Command {
    name: "create",
    aliases: &["c", "new"],
    usage: "create TYPE SUMMARY",
    description: "Create an issue here",
  },
  Command {
    name: "resolved",
    aliases: &["r"],
    usage: "resolved",
    description: "Show or hide resolved issues",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Exit jtree",
  },
];

/// A command line resolved to a command and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
  Mine,
  Sprint(Option<String>),
  Backlog(Option<String>),
  /// Empty text re-runs the last query
  Jql(String),
  Projects(Vec<String>),
  Create { issue_type: String, summary: String },
  Resolved,
  Quit,
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Resolve a command word. Only exact and prefix matches count here;
/// fuzzy matches are for the suggestion list, not for execution.
fn lookup(word: &str) -> Option<&'static Command> {
  let word = word.to_lowercase();
  COMMANDS
    .iter()
    .find(|c| c.name == word || c.aliases.contains(&word.as_str()))
    .or_else(|| COMMANDS.iter().find(|c| c.name.starts_with(&word)))
}

/// Parse a full command line such as `sprint PROJ` or `create Bug Login fails`
pub fn parse(input: &str) -> Result<ParsedCommand> {
  let input = input.trim();
  let (word, rest) = match input.split_once(char::is_whitespace) {
    Some((word, rest)) => (word, rest.trim()),
    None => (input, ""),
  };

  if word.is_empty() {
    return Err(eyre!("No command given"));
  }

  let cmd = lookup(word).ok_or_else(|| eyre!("Unknown command: {}", word))?;
  let project = || {
    rest
      .split_whitespace()
      .next()
      .map(|p| p.to_uppercase())
  };

  let parsed = match cmd.name {
    "mine" => ParsedCommand::Mine,
    "sprint" => ParsedCommand::Sprint(project()),
    "backlog" => ParsedCommand::Backlog(project()),
    "jql" => ParsedCommand::Jql(rest.to_string()),
    "projects" => ParsedCommand::Projects(
      rest
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_uppercase())
        .collect(),
    ),
    "create" => {
      let (issue_type, summary) = rest
        .split_once(char::is_whitespace)
        .map(|(t, s)| (t, s.trim()))
        .filter(|(_, s)| !s.is_empty())
        .ok_or_else(|| eyre!("Usage: {}", cmd.usage))?;
      ParsedCommand::Create {
        issue_type: issue_type.to_string(),
        summary: summary.to_string(),
      }
    }
    "resolved" => ParsedCommand::Resolved,
    "quit" => ParsedCommand::Quit,
    other => return Err(eyre!("Unknown command: {}", other)),
  };

  Ok(parsed)
}
