//! Text commands typed at the prompt.

use crate::reducer::TallyAction;
use crate::types::SessionId;
use crate::view::View;
use thiserror::Error;

/// Command summary printed by `help`
pub const HELP: &str = "\
commands:
  <enter>, tap, +      count one
  dec, -               take one back (not below zero)
  reset, r             back to zero
  step <n>             set the custom step
  bump, ++             add the custom step
  name <text>          name the session (blank clears it)
  finish, done         archive the session
  delete, rm <id>      remove an archived session
  clear                remove every archived session
  counter, c           show the counter
  history, h, log      show the history
  help, ?              this text
  quit, q, exit        leave";

/// Errors from [`Intent::parse`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    /// The first word is not a command
    #[error("Unknown command `{0}`, type `help` for a list")]
    Unknown(String),

    /// The command needs an argument
    #[error("`{0}` needs a value")]
    MissingArgument(&'static str),

    /// The argument to `delete` is not a session id
    #[error("`{0}` is not a session id")]
    InvalidId(String),
}

/// What a line of input asks for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Send an action straight to the store
    Dispatch(TallyAction),
    /// Clear the history once the user confirms
    ClearHistory,
    /// Print the command summary
    Help,
    /// Leave the program
    Quit,
}

impl Intent {
    /// Parses one line of input
    ///
    /// An empty line counts one, like tapping the big button.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError`] for unknown commands and missing or invalid
    /// arguments.
    pub fn parse(line: &str) -> Result<Self, IntentError> {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(command, rest)| (command, rest.trim()));

        let action = match command.to_ascii_lowercase().as_str() {
            "" | "tap" | "+" => TallyAction::Increment,
            "dec" | "-" => TallyAction::Decrement,
            "reset" | "r" => TallyAction::Reset,
            "bump" | "++" => TallyAction::IncrementByStep,
            "finish" | "done" => TallyAction::FinishSession,
            "counter" | "c" => TallyAction::ShowView(View::Counter),
            "history" | "h" | "log" => TallyAction::ShowView(View::History),
            "step" => {
                if rest.is_empty() {
                    return Err(IntentError::MissingArgument("step"));
                }
                TallyAction::SetIncrementStep {
                    input: rest.to_string(),
                }
            },
            "name" => TallyAction::SetDraftName {
                name: rest.to_string(),
            },
            "delete" | "rm" => {
                if rest.is_empty() {
                    return Err(IntentError::MissingArgument("delete"));
                }
                let id = rest
                    .parse::<SessionId>()
                    .map_err(|_| IntentError::InvalidId(rest.to_string()))?;
                TallyAction::DeleteEntry { id }
            },
            "clear" => return Ok(Self::ClearHistory),
            "help" | "?" => return Ok(Self::Help),
            "quit" | "q" | "exit" => return Ok(Self::Quit),
            _ => return Err(IntentError::Unknown(command.to_string())),
        };

        Ok(Self::Dispatch(action))
    }

    /// Whether the user must confirm before this runs
    #[must_use]
    pub const fn requires_confirmation(&self) -> bool {
        matches!(self, Self::ClearHistory)
    }
}
