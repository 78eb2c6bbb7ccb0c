pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod parser;
pub mod storage;
pub mod ui;

use log::debug;

pub use crate::{
    command::{Command, Context, ExecutionResult},
    config::Config,
    error::{ConfigError, Error, ParseError, Result, StorageError, TaskError},
    model::{DateTime, FieldValue, Task, TaskKind, TaskList},
    parser::Parser,
    storage::Storage,
    ui::Ui,
};

pub const NAME: &str = "Elyra";

/// Parser, task list, storage and response sink wired together.
///
/// Each input line runs parse -> execute -> save (when the list changed).
pub struct Session {
    parser: Parser,
    storage: Storage,
    tasks: TaskList,
    ui: Ui,
}

impl Session {
    /// Check `config` and load the task file it names. Corruption aborts the load.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let storage = Storage::new(&config.data_file, config.delimiter.as_str());
        let tasks = storage.load()?;
        Ok(Self::with_tasks(
            Parser::new(&config.delimiter),
            storage,
            tasks,
        ))
    }

    pub fn with_tasks(parser: Parser, storage: Storage, tasks: TaskList) -> Self {
        Self {
            parser,
            storage,
            tasks,
            ui: Ui::new(),
        }
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn greeting(&self) -> String {
        self.ui.greet(NAME)
    }

    fn run(&mut self, input: &str) -> Result<ExecutionResult> {
        let command = self.parser.parse(input)?;
        let result = command.execute(&mut Context::new(&mut self.tasks, &self.ui))?;
        Ok(result)
    }

    /// Parse and run one line, saving afterwards if the task list changed.
    /// Errors are returned untouched; the list stays usable after any of them.
    pub fn handle(&mut self, input: &str) -> Result<ExecutionResult> {
        let result = self.run(input)?;
        if result.should_persist {
            self.storage.save(&self.tasks)?;
        }
        Ok(result)
    }

    /// Like [`Session::handle`], but every error becomes a displayable response.
    pub fn respond(&mut self, input: &str) -> ExecutionResult {
        let mut result = match self.run(input) {
            Ok(result) => result,
            Err(e) => {
                debug!("rejected input {input:?}: {e}");
                return ExecutionResult::reply(self.ui.input_error(&e.to_string(), input.trim()));
            }
        };
        if result.should_persist {
            // The command already ran; only the write failed.
            if let Err(e) = self.storage.save(&self.tasks) {
                result.response = format!(
                    "{}\n{}",
                    result.response,
                    self.ui.save_error(&e.to_string())
                );
            }
        }
        result
    }
}
