//! Response text for every command outcome.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::model::{DateTime, Task, TaskKind, TaskList};

/// How date-times are shown to the user, e.g. `Mar 10 2024, 9:00 AM`.
const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[month repr:short] [day] [year], [hour repr:12 padding:none]:[minute] [period]"
);

const INDENT: &str = "  ";

pub fn display_datetime(dt: &DateTime) -> String {
    dt.format(DISPLAY_FORMAT).unwrap_or_else(|_| dt.to_string())
}

/// Builds the human-readable `response` of an execution result.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ui;

impl Ui {
    pub fn new() -> Self {
        Self
    }

    /// One task, e.g. `[D][X] return book (by: Feb 01 2024, 12:30 PM)`.
    pub fn format_task(&self, task: &Task) -> String {
        let status = if task.is_done() { 'X' } else { ' ' };
        let mut line = format!(
            "[{}][{status}] {}",
            task.kind().code(),
            task.description()
        );
        match task.kind() {
            TaskKind::ToDo => {}
            TaskKind::Deadline { due } => {
                line.push_str(&format!(" (by: {})", display_datetime(due)));
            }
            TaskKind::Event { start, end } => {
                line.push_str(&format!(
                    " (from: {} to: {})",
                    display_datetime(start),
                    display_datetime(end)
                ));
            }
        }
        line
    }

    fn numbered<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> Vec<String> {
        tasks
            .into_iter()
            .enumerate()
            .map(|(i, t)| format!("{}. {}", i + 1, self.format_task(t)))
            .collect()
    }

    pub fn greet(&self, name: &str) -> String {
        format!("Hello! I am {name}, your personal chatbot.\nWhat can I do for you today?")
    }

    pub fn farewell(&self) -> String {
        "Goodbye! Hope to see you again soon!".to_string()
    }

    pub fn task_list(&self, tasks: &TaskList) -> String {
        if tasks.is_empty() {
            return "You currently don't have any tasks in your list.".to_string();
        }
        let mut lines = vec!["Here are your tasks:".to_string()];
        lines.extend(self.numbered(tasks));
        lines.join("\n")
    }

    pub fn matches(&self, tasks: &[&Task], keyword: &str) -> String {
        if tasks.is_empty() {
            return format!("There are no tasks matching the keyword: '{keyword}'");
        }
        let mut lines = vec!["Here are the matching tasks:".to_string()];
        lines.extend(self.numbered(tasks.iter().copied()));
        lines.join("\n")
    }

    pub fn added(&self, task: &Task, size: usize) -> String {
        format!(
            "Got it! I have added this task:\n{INDENT}{}\n{}",
            self.format_task(task),
            count_line(size)
        )
    }

    pub fn removed(&self, task: &Task, size: usize) -> String {
        format!(
            "Noted! I have removed this task:\n{INDENT}{}\n{}",
            self.format_task(task),
            count_line(size)
        )
    }

    pub fn marked(&self, task: &Task) -> String {
        format!(
            "Good job! I have marked this task as done!\n{INDENT}{}",
            self.format_task(task)
        )
    }

    pub fn unmarked(&self, task: &Task) -> String {
        format!(
            "Alright! I have marked this task as not done yet.\n{INDENT}{}",
            self.format_task(task)
        )
    }

    pub fn updated(&self, task: &Task) -> String {
        format!(
            "Alright! I have updated this task.\n{INDENT}{}",
            self.format_task(task)
        )
    }

    pub fn input_error(&self, message: &str, input: &str) -> String {
        format!(
            "Oops! We encountered a problem!\n{message}\n{INDENT}Received: \"{input}\"\n\
             Please check your command and try again."
        )
    }

    pub fn save_error(&self, message: &str) -> String {
        format!(
            "Oops! We encountered a problem!\n{message}\nYour task list could not be saved.\n\
             Please fix the issue and try again."
        )
    }
}

fn count_line(size: usize) -> String {
    let noun = if size == 1 { "task" } else { "tasks" };
    format!("Now you have {size} {noun} in the list.")
}
