use std::fmt;

use time::PrimitiveDateTime;

use crate::error::TaskError;

// Self documenting alias
pub type DateTime = PrimitiveDateTime;

// --- Task Kind ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    ToDo,
    Deadline { due: DateTime },
    Event { start: DateTime, end: DateTime },
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::ToDo => "ToDo",
            TaskKind::Deadline { .. } => "Deadline",
            TaskKind::Event { .. } => "Event",
        }
    }

    /// Single-letter code used both on disk and in list output.
    pub fn code(&self) -> char {
        match self {
            TaskKind::ToDo => 'T',
            TaskKind::Deadline { .. } => 'D',
            TaskKind::Event { .. } => 'E',
        }
    }

    fn field_hint(&self) -> &'static str {
        match self {
            TaskKind::ToDo => "Only 'description' can be updated.",
            TaskKind::Deadline { .. } => "Only 'description' and 'by' can be updated.",
            TaskKind::Event { .. } => "Only 'description', 'from' and 'to' can be updated.",
        }
    }
}

// --- Updatable fields ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Description,
    By,
    From,
    To,
}

impl TaskField {
    /// Case-insensitive lookup of a field name as typed by the user.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "description" => Some(TaskField::Description),
            "by" => Some(TaskField::By),
            "from" => Some(TaskField::From),
            "to" => Some(TaskField::To),
            _ => None,
        }
    }

    pub fn is_datetime(&self) -> bool {
        !matches!(self, TaskField::Description)
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskField::Description => "description",
            TaskField::By => "by",
            TaskField::From => "from",
            TaskField::To => "to",
        })
    }
}

/// New content for an `update`; date-time fields carry an already parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    DateTime(DateTime),
}

// --- Task Object ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /** Never empty */
    description: String,

    /** The one field that changes freely after construction */
    pub done: bool,

    /** Kind-specific time fields */
    kind: TaskKind,
}

impl Task {
    fn new(description: impl Into<String>, kind: TaskKind) -> Result<Self, TaskError> {
        let description = normalize(&description.into())?;
        Ok(Self {
            description,
            done: false,
            kind,
        })
    }

    pub fn todo(description: impl Into<String>) -> Result<Self, TaskError> {
        Self::new(description, TaskKind::ToDo)
    }

    pub fn deadline(description: impl Into<String>, due: DateTime) -> Result<Self, TaskError> {
        Self::new(description, TaskKind::Deadline { due })
    }

    /// Fails rather than swapping when `start` is not strictly before `end`.
    pub fn event(
        description: impl Into<String>,
        start: DateTime,
        end: DateTime,
    ) -> Result<Self, TaskError> {
        check_order(start, end)?;
        Self::new(description, TaskKind::Event { start, end })
    }

    /// Builder-style setter used when restoring a task from disk.
    pub fn with_done(mut self, done: bool) -> Self {
        self.done = done;
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Replace one field in place. The task is untouched when this fails.
    pub fn update(&mut self, field_name: &str, value: FieldValue) -> Result<(), TaskError> {
        let kind = self.kind;
        let unsupported = || TaskError::UnsupportedField {
            field: field_name.to_string(),
            kind: kind.name(),
            hint: kind.field_hint(),
        };
        let Some(field) = TaskField::from_name(field_name) else {
            return Err(unsupported());
        };

        let value = match (field.is_datetime(), value) {
            (true, FieldValue::DateTime(dt)) => dt,
            (true, FieldValue::Text(_)) => return Err(TaskError::ExpectedDateTime(field)),
            (false, FieldValue::Text(text)) => {
                self.description = normalize(&text)?;
                return Ok(());
            }
            (false, FieldValue::DateTime(_)) => return Err(unsupported()),
        };

        let next = match (kind, field) {
            (TaskKind::Deadline { .. }, TaskField::By) => TaskKind::Deadline { due: value },
            (TaskKind::Event { end, .. }, TaskField::From) => {
                check_order(value, end)?;
                TaskKind::Event { start: value, end }
            }
            (TaskKind::Event { start, .. }, TaskField::To) => {
                check_order(start, value)?;
                TaskKind::Event { start, end: value }
            }
            _ => return Err(unsupported()),
        };
        self.kind = next;
        Ok(())
    }
}

/// Descriptions are stored one per line, so whitespace runs (newlines
/// included) collapse to single spaces and the ends are trimmed.
fn normalize(description: &str) -> Result<String, TaskError> {
    let words: Vec<&str> = description.split_whitespace().collect();
    if words.is_empty() {
        return Err(TaskError::EmptyDescription);
    }
    Ok(words.join(" "))
}

fn check_order(start: DateTime, end: DateTime) -> Result<(), TaskError> {
    if start < end {
        Ok(())
    } else {
        Err(TaskError::EventOrder { start, end })
    }
}

// --- Task Collection ---
/// Ordered tasks addressed externally by 1-based position.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    /// Translate a 1-based index into a vector offset.
    fn position(&self, index: i64) -> Result<usize, TaskError> {
        let size = self.tasks.len();
        match usize::try_from(index) {
            Ok(i) if (1..=size).contains(&i) => Ok(i - 1),
            _ if size == 0 => Err(TaskError::EmptyList),
            _ => Err(TaskError::OutOfRange { index, size }),
        }
    }

    pub fn get(&self, index: i64) -> Result<&Task, TaskError> {
        let pos = self.position(index)?;
        Ok(&self.tasks[pos])
    }

    pub fn get_mut(&mut self, index: i64) -> Result<&mut Task, TaskError> {
        let pos = self.position(index)?;
        Ok(&mut self.tasks[pos])
    }

    pub fn mark(&mut self, index: i64) -> Result<&Task, TaskError> {
        self.set_done(index, true)
    }

    pub fn unmark(&mut self, index: i64) -> Result<&Task, TaskError> {
        self.set_done(index, false)
    }

    fn set_done(&mut self, index: i64, done: bool) -> Result<&Task, TaskError> {
        let task = self.get_mut(index)?;
        task.done = done;
        Ok(task)
    }

    /// Remove and return the task at `index`.
    pub fn delete(&mut self, index: i64) -> Result<Task, TaskError> {
        let pos = self.position(index)?;
        Ok(self.tasks.remove(pos))
    }

    /// Tasks whose description contains `keyword` (case-sensitive), in list order.
    pub fn find(&self, keyword: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.description.contains(keyword))
            .collect()
    }

    pub fn update(
        &mut self,
        index: i64,
        field_name: &str,
        value: FieldValue,
    ) -> Result<&Task, TaskError> {
        let task = self.get_mut(index)?;
        task.update(field_name, value)?;
        Ok(task)
    }
}

impl FromIterator<Task> for TaskList {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
