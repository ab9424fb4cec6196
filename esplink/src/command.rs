//! Parsing of stdin lines into front-end commands.

use std::path::PathBuf;

pub const HELP: &str = "\
commands:
  <text>          send a chat line
  /image <path>   load and compress an image
  /send           upload the last compressed image
  /status         show the link state
  /help           show this help
  /quit           close the link and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank input; ignored.
    Empty,
    Text(String),
    Image(PathBuf),
    Send,
    Status,
    Help,
    Quit,
    /// A slash command that is not recognised, or is missing its argument.
    Invalid(String),
}

impl Command {
    /// Parse one input line. Surrounding whitespace is stripped, and
    /// `//` escapes a chat line that starts with a slash.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if let Some(escaped) = line.strip_prefix("//") {
            return Self::Text(format!("/{escaped}"));
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Text(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match (name, arg) {
            ("image", "") => Self::Invalid("usage: /image <path>".into()),
            ("image", path) => Self::Image(PathBuf::from(path)),
            ("send", _) => Self::Send,
            ("status", _) => Self::Status,
            ("help", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            (other, _) => Self::Invalid(format!("unknown command /{other}; try /help")),
        }
    }
}
