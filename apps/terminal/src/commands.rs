//! Line commands typed at the terminal prompt.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Quit,
    Home,
    History,
    Help,
    /// Anything else: a repository reference on the entry view, a question
    /// in the conversation view.
    Text(String),
}

impl InputCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/quit" | "/exit" => Self::Quit,
            "/home" => Self::Home,
            "/history" => Self::History,
            "/help" => Self::Help,
            _ => Self::Text(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

pub const HELP: &str = "\
Commands:
  /home     leave the conversation and submit another repository
  /history  print the current transcript
  /help     show this message
  /quit     exit";

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
