//! Command dispatch table.
//!
//! Command rules name their command with a string id and pass positional string arguments.
//! [`CommandId`] is the closed set of known ids; [`Command::parse`] resolves an id and coerces
//! its arguments into a typed [`Command`]. Unknown ids and arguments that do not coerce are
//! reported as [`DispatchError`] before anything touches the document.

use crate::config::EditorConfig;
use crate::document::{Arrow, EditorAction, Key};
use crate::operation::Op;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while resolving a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The command id is not in the table.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    /// A required argument is missing.
    #[error("{command}: missing argument {index}")]
    MissingArgument {
        /// Command being resolved.
        command: CommandId,
        /// Zero-based argument position.
        index: usize,
    },
    /// An argument could not be coerced to the parameter type.
    #[error("{command}: invalid argument {index} '{value}'")]
    InvalidArgument {
        /// Command being resolved.
        command: CommandId,
        /// Zero-based argument position.
        index: usize,
        /// The offending argument.
        value: String,
    },
    /// A pattern argument failed to compile.
    #[error("{command}: invalid pattern '{pattern}': {message}")]
    InvalidRegex {
        /// Command being resolved.
        command: CommandId,
        /// The pattern source.
        pattern: String,
        /// The compiler error message.
        message: String,
    },
}

macro_rules! command_ids {
    ($($variant:ident => $name:literal,)*) => {
        /// Known command ids.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(missing_docs)]
        pub enum CommandId {
            $($variant,)*
        }

        impl CommandId {
            /// Every command id, in table order.
            pub const ALL: &'static [CommandId] = &[$(CommandId::$variant,)*];

            /// The id as it appears in rules.
            pub fn name(self) -> &'static str {
                match self {
                    $(CommandId::$variant => $name,)*
                }
            }
        }
    };
}

command_ids! {
    Select => "select",
    SelectReBefore => "selectReBefore",
    SelectAll => "selectAll",
    ResetSel => "resetSel",
    Replace => "replace",
    ReplaceSel => "replaceSel",
    Delete => "delete",
    DeleteLeftWord => "deleteLeftWord",
    DeleteAll => "deleteAll",
    UcSel => "ucSel",
    LcSel => "lcSel",
    IncSel => "incSel",
    GoUp => "goUp",
    GoDown => "goDown",
    GoLeft => "goLeft",
    GoRight => "goRight",
    GoForward => "goForward",
    GoBackward => "goBackward",
    GoToCharacterPosition => "goToCharacterPosition",
    GoToEnd => "goToEnd",
    GoToPreviousField => "goToPreviousField",
    GoToNextField => "goToNextField",
    Cut => "cut",
    Copy => "copy",
    Paste => "paste",
    CutAll => "cutAll",
    CopyAll => "copyAll",
    AddSpace => "addSpace",
    AddNewline => "addNewline",
    KeyCode => "keyCode",
    KeyCodeStr => "keyCodeStr",
    ImeActionDone => "imeActionDone",
    ImeActionGo => "imeActionGo",
    ImeActionSearch => "imeActionSearch",
    ImeActionSend => "imeActionSend",
    Undo => "undo",
    Combine => "combine",
    Apply => "apply",
}

impl FromStr for CommandId {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandId::ALL
            .iter()
            .copied()
            .find(|id| id.name() == s)
            .ok_or_else(|| DispatchError::UnknownCommand(s.to_string()))
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved command.
#[derive(Debug, Clone)]
pub enum Command {
    /// A document operation.
    Op(Op),
    /// Undo this many entries.
    Undo(usize),
    /// Fuse this many remembered operations into one.
    Combine(usize),
    /// Re-run the last remembered operation this many times.
    Apply(usize),
}

impl Command {
    /// Resolve `id` with positional `args`.
    pub fn parse(id: &str, args: &[String], config: &EditorConfig) -> Result<Self, DispatchError> {
        let command: CommandId = id.parse()?;
        let args = Args { command, args };

        let op = match command {
            CommandId::Undo => return Ok(Command::Undo(args.count(0)?)),
            CommandId::Combine => return Ok(Command::Combine(args.count(0)?)),
            CommandId::Apply => return Ok(Command::Apply(args.count(0)?)),

            CommandId::Select => Op::Select {
                query: args.string(0)?,
            },
            CommandId::SelectReBefore => Op::SelectReBefore {
                pattern: args.regex(0)?,
            },
            CommandId::SelectAll => Op::SelectAll,
            CommandId::ResetSel => Op::ResetSelection,
            CommandId::Replace => Op::Replace {
                query: args.string(0)?,
                replacement: args.string(1)?,
            },
            CommandId::ReplaceSel => Op::ReplaceSelection {
                template: args.string(0)?,
            },
            CommandId::Delete => Op::Replace {
                query: args.string(0)?,
                replacement: String::new(),
            },
            CommandId::DeleteLeftWord => Op::DeleteLeftWord {
                max_context: config.max_deletable_context,
            },
            CommandId::DeleteAll => Op::DeleteAll,
            CommandId::UcSel => Op::UppercaseSelection,
            CommandId::LcSel => Op::LowercaseSelection,
            CommandId::IncSel => Op::IncrementSelection,
            CommandId::GoUp => Op::Arrow(Arrow::Up),
            CommandId::GoDown => Op::Arrow(Arrow::Down),
            CommandId::GoLeft => Op::Arrow(Arrow::Left),
            CommandId::GoRight => Op::Arrow(Arrow::Right),
            CommandId::GoForward => Op::Move {
                delta: args.count::<isize>(0)?,
            },
            CommandId::GoBackward => {
                let delta = args.count::<isize>(0)?;
                Op::Move {
                    delta: delta.checked_neg().ok_or_else(|| args.invalid(0))?,
                }
            }
            CommandId::GoToCharacterPosition => Op::GoToPosition {
                pos: args.parsed(0)?,
            },
            CommandId::GoToEnd => Op::GoToEnd,
            CommandId::GoToPreviousField => Op::EditorAction(EditorAction::PreviousField),
            CommandId::GoToNextField => Op::EditorAction(EditorAction::NextField),
            CommandId::Cut => Op::Cut,
            CommandId::Copy => Op::Copy,
            CommandId::Paste => Op::Paste,
            CommandId::CutAll => Op::CutAll,
            CommandId::CopyAll => Op::CopyAll,
            CommandId::AddSpace => Op::InsertText {
                text: " ".to_string(),
            },
            CommandId::AddNewline => Op::InsertText {
                text: "\n".to_string(),
            },
            CommandId::KeyCode => {
                let code: u32 = args.parsed(0)?;
                Op::Key(Key::from_code(code).ok_or_else(|| args.invalid(0))?)
            }
            CommandId::KeyCodeStr => {
                let name = args.string(0)?;
                Op::Key(Key::from_name(&name).ok_or_else(|| args.invalid(0))?)
            }
            CommandId::ImeActionDone => Op::EditorAction(EditorAction::Done),
            CommandId::ImeActionGo => Op::EditorAction(EditorAction::Go),
            CommandId::ImeActionSearch => Op::EditorAction(EditorAction::Search),
            CommandId::ImeActionSend => Op::EditorAction(EditorAction::Send),
        };
        Ok(Command::Op(op))
    }
}

/// Positional arguments of one command.
struct Args<'a> {
    command: CommandId,
    args: &'a [String],
}

impl Args<'_> {
    fn get(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    fn invalid(&self, index: usize) -> DispatchError {
        DispatchError::InvalidArgument {
            command: self.command,
            index,
            value: self.get(index).unwrap_or_default().to_string(),
        }
    }

    fn string(&self, index: usize) -> Result<String, DispatchError> {
        self.get(index)
            .map(str::to_string)
            .ok_or(DispatchError::MissingArgument {
                command: self.command,
                index,
            })
    }

    fn parsed<T: FromStr>(&self, index: usize) -> Result<T, DispatchError> {
        self.string(index)?
            .trim()
            .parse()
            .map_err(|_| self.invalid(index))
    }

    /// A repetition count; missing or blank means 1.
    fn count<T: FromStr + From<u8>>(&self, index: usize) -> Result<T, DispatchError> {
        match self.get(index) {
            Some(arg) if !arg.trim().is_empty() => self.parsed(index),
            _ => Ok(T::from(1)),
        }
    }

    fn regex(&self, index: usize) -> Result<Regex, DispatchError> {
        let pattern = self.string(index)?;
        Regex::new(&pattern).map_err(|err| DispatchError::InvalidRegex {
            command: self.command,
            pattern,
            message: err.to_string(),
        })
    }
}
