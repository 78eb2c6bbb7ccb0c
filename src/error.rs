//! Error types for every stage of the pipeline.
//!
//! Each variant's `Display` text is the message shown to the user, so the
//! wording here is part of the user-facing contract.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{DateTime, TaskField};

/// Usage strings quoted by several parse errors.
pub const DEADLINE_USAGE: &str = "Usage: deadline <description> /by yyyy-MM-dd HH:mm";
pub const EVENT_USAGE: &str =
    "Usage: event <description> /from yyyy-MM-dd HH:mm /to yyyy-MM-dd HH:mm";
pub const UPDATE_USAGE: &str = "Usage: update <index> /field <field> /with <value>";

/// Malformed command text. Never produces a command and never touches state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Please enter a command. Try: list")]
    EmptyInput,

    #[error("The text '{0}' is reserved for saving tasks. Please remove it from your input.")]
    ReservedDelimiter(String),

    #[error(
        "I don't recognize the command '{0}'. Try: list, todo, deadline, event, mark, unmark, \
         delete, find, update, bye."
    )]
    UnknownCommand(String),

    #[error("The '{0}' command does not take any arguments. Usage: {0}")]
    NoArguments(&'static str),

    #[error("The '{0}' command requires exactly one argument. Usage: {0} <index>")]
    ExactlyOneArgument(&'static str),

    #[error("Index must be a number, got '{value}'. Example: {command} 2")]
    NotANumber { command: &'static str, value: String },

    #[error("The 'todo' command needs a description. Usage: todo <description>")]
    MissingDescription,

    #[error("The 'find' command needs a keyword. Usage: find <keyword>")]
    MissingKeyword,

    #[error("The 'deadline' command requires a description and a due date. {}", DEADLINE_USAGE)]
    DeadlineShape,

    #[error(
        "The 'event' command requires a description, start time, and end time. {}", EVENT_USAGE
    )]
    EventShape,

    #[error("The '{command}' description cannot be empty. {usage}")]
    EmptyDescription {
        command: &'static str,
        usage: &'static str,
    },

    #[error("The 'update' command requires a task index, field, and new value. {}", UPDATE_USAGE)]
    UpdateShape,

    #[error("The 'update' command requires a task index. {}", UPDATE_USAGE)]
    UpdateMissingIndex,

    #[error("The 'update' command requires a field name. {}", UPDATE_USAGE)]
    UpdateMissingField,

    #[error("The 'update' command requires a new value. {}", UPDATE_USAGE)]
    UpdateMissingValue,

    #[error("Invalid date/time '{0}'. Use yyyy-MM-dd HH:mm (e.g. 2024-02-01 12:30).")]
    InvalidDateTime(String),
}

/// Failures raised while executing a command against the task list.
/// The list is never left partially modified when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Your task list is empty. Add a task first.")]
    EmptyList,

    #[error("Task index {index} is out of range. Please enter a number between 1 and {size}.")]
    OutOfRange { index: i64, size: usize },

    #[error("A task description cannot be empty.")]
    EmptyDescription,

    #[error(
        "An event must start before it ends (from: {}, to: {}).",
        crate::ui::display_datetime(.start),
        crate::ui::display_datetime(.end)
    )]
    EventOrder { start: DateTime, end: DateTime },

    #[error("Cannot update field '{field}' for a {kind} task. {hint}")]
    UnsupportedField {
        field: String,
        kind: &'static str,
        hint: &'static str,
    },

    #[error("Field '{0}' expects a date and time, not text.")]
    ExpectedDateTime(TaskField),
}

/// What exactly is wrong with a stored record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    #[error("too few fields for a task")]
    TooFewFields,

    #[error("invalid done status '{0}'")]
    InvalidDoneFlag(String),

    #[error("unknown task type '{0}'")]
    UnknownKind(String),

    #[error("expected {expected} fields for {kind}, found {found}")]
    WrongFieldCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid date/time '{0}'")]
    InvalidDateTime(String),

    #[error("{0}")]
    Invalid(TaskError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Found corrupted data at line {line} ({defect}).")]
    Corrupt { line: usize, defect: Corruption },

    #[error("Cannot save task '{description}': it contains the reserved text '{reserved}'.")]
    Unencodable {
        description: String,
        reserved: String,
    },

    #[error("Could not access {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Settings that would break the task file or the input guard.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("delimiter must contain at least one non-whitespace character")]
    BlankDelimiter,

    #[error("delimiter cannot contain line breaks")]
    DelimiterLineBreak,

    #[error("data_file cannot be empty")]
    EmptyDataFile,
}

/// Umbrella error for callers that drive the whole pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
