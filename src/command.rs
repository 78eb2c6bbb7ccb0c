//! Validated commands and their execution against a task list.

use serde::Serialize;

use crate::error::TaskError;
use crate::model::{DateTime, FieldValue, Task, TaskList};
use crate::ui::Ui;

/// One user request, fully validated by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Bye,
    List,
    Mark(i64),
    Unmark(i64),
    AddTodo {
        description: String,
    },
    AddDeadline {
        description: String,
        due: DateTime,
    },
    AddEvent {
        description: String,
        start: DateTime,
        end: DateTime,
    },
    Delete(i64),
    Find {
        keyword: String,
    },
    Update {
        index: i64,
        field: String,
        value: FieldValue,
    },
}

/// Everything a command may touch while it runs.
pub struct Context<'a> {
    pub tasks: &'a mut TaskList,
    pub ui: &'a Ui,
}

impl<'a> Context<'a> {
    pub fn new(tasks: &'a mut TaskList, ui: &'a Ui) -> Self {
        Self { tasks, ui }
    }
}

/// Outcome of running a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /** Caller should stop reading input */
    pub exit: bool,

    /** Task list changed and should be written back */
    pub should_persist: bool,

    /** Human-readable outcome */
    pub response: String,
}

impl ExecutionResult {
    /// Read-only outcome.
    pub fn reply(response: String) -> Self {
        Self {
            exit: false,
            should_persist: false,
            response,
        }
    }

    /// Outcome of a command that changed the task list.
    pub fn changed(response: String) -> Self {
        Self {
            exit: false,
            should_persist: true,
            response,
        }
    }

    pub fn exit(response: String) -> Self {
        Self {
            exit: true,
            should_persist: false,
            response,
        }
    }
}

impl Command {
    pub fn execute(&self, ctx: &mut Context<'_>) -> Result<ExecutionResult, TaskError> {
        let ui = ctx.ui;
        let tasks = &mut *ctx.tasks;

        let result = match self {
            Command::Bye => ExecutionResult::exit(ui.farewell()),
            Command::List => ExecutionResult::reply(ui.task_list(tasks)),
            Command::Mark(index) => ExecutionResult::changed(ui.marked(tasks.mark(*index)?)),
            Command::Unmark(index) => ExecutionResult::changed(ui.unmarked(tasks.unmark(*index)?)),
            Command::AddTodo { description } => add(ui, tasks, Task::todo(description.as_str())?),
            Command::AddDeadline { description, due } => {
                add(ui, tasks, Task::deadline(description.as_str(), *due)?)
            }
            Command::AddEvent {
                description,
                start,
                end,
            } => add(ui, tasks, Task::event(description.as_str(), *start, *end)?),
            Command::Delete(index) => {
                let removed = tasks.delete(*index)?;
                ExecutionResult::changed(ui.removed(&removed, tasks.len()))
            }
            Command::Find { keyword } => {
                ExecutionResult::reply(ui.matches(&tasks.find(keyword), keyword))
            }
            Command::Update {
                index,
                field,
                value,
            } => {
                let task = tasks.update(*index, field, value.clone())?;
                ExecutionResult::changed(ui.updated(task))
            }
        };
        Ok(result)
    }
}

fn add(ui: &Ui, tasks: &mut TaskList, task: Task) -> ExecutionResult {
    let response = ui.added(&task, tasks.len() + 1);
    tasks.add(task);
    ExecutionResult::changed(response)
}
