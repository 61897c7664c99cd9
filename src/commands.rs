/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Whether the command expects an argument after its name
  pub takes_arg: bool,
}

impl Command {
  const fn page(name: &'static str, aliases: &'static [&'static str], description: &'static str) -> Self {
    Self {
      name,
      aliases,
      description,
      takes_arg: false,
    }
  }
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command::page("videos", &["v", "video"], "Browse videos"),
  Command::page("groups", &["g", "group"], "Browse groups"),
  Command::page("competitions", &["c", "comp"], "Browse competitions"),
  Command::page("performances", &["perf"], "Browse performances"),
  Command::page("tags", &["tag"], "Browse tags"),
  Command::page("awards", &["a", "award"], "Browse awards"),
  Command::page("award-records", &["records"], "Browse award records"),
  Command {
    name: "open",
    aliases: &["o", "go"],
    description: "Open an address, e.g. videos?ordering=title",
    takes_arg: true,
  },
  Command::page("back", &["b"], "Go back in history"),
  Command::page("forward", &["f"], "Go forward in history"),
  Command::page("quit", &["q", "exit"], "Exit cosview"),
];

/// Split palette input into command word and argument
pub fn split_input(input: &str) -> (&str, &str) {
  let input = input.trim_start();
  match input.split_once(char::is_whitespace) {
    Some((name, rest)) => (name, rest.trim()),
    None => (input, ""),
  }
}

/// Get autocomplete suggestions for a given input
///
/// Only the first word is matched; anything after it is an argument.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let (word, _) = split_input(input);
  let input_lower = word.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    let priority = if cmd.name == input_lower {
      0
    } else if cmd.aliases.contains(&input_lower.as_str()) {
      1
    } else if cmd.name.starts_with(&input_lower) {
      2
    } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      3
    } else if cmd.name.contains(&input_lower) {
      4
    } else {
      continue;
    };
    matches.push((cmd, priority));
  }

  // Stable sort keeps declaration order within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
