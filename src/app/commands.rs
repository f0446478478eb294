// src/app/commands.rs

use std::fmt;
use std::str::FromStr;

/// One line typed at the console prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Empty line: redraw the current exercise.
    Refresh,
    Next,
    /// Run the current exercise again without touching the file.
    Rerun,
    Reset,
    CheckAll,
    ToggleHint,
    List,
    /// Jump to an exercise by name, id or 1-based position.
    Select(String),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command {:?} (type `?` for help)", self.0)
    }
}

impl std::error::Error for UnknownCommand {}

impl FromStr for ConsoleCommand {
    type Err = UnknownCommand;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let cmd = match (head, rest) {
            ("", _) => ConsoleCommand::Refresh,
            ("n" | "next", "") => ConsoleCommand::Next,
            ("x" | "rerun", "") => ConsoleCommand::Rerun,
            ("r" | "reset", "") => ConsoleCommand::Reset,
            ("c" | "check", "") => ConsoleCommand::CheckAll,
            ("h" | "hint", "") => ConsoleCommand::ToggleHint,
            ("l" | "list", "") => ConsoleCommand::List,
            ("s" | "select", target) if !target.is_empty() => {
                ConsoleCommand::Select(target.to_string())
            }
            ("?" | "help", "") => ConsoleCommand::Help,
            ("q" | "quit" | "exit", "") => ConsoleCommand::Quit,
            _ => return Err(UnknownCommand(line.to_string())),
        };
        Ok(cmd)
    }
}
