// --- Line-oriented task persistence ---
//
// One record per line, fields joined by the configured delimiter:
//
//   T ||| <0|1> ||| <description>
//   D ||| <0|1> ||| <description> ||| <due>
//   E ||| <0|1> ||| <description> ||| <start> ||| <end>

use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use fs4::fs_std::FileExt;
use log::{info, warn};
use tempfile::NamedTempFile; // For atomic writes
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::{
    error::{Corruption, StorageError},
    model::{DateTime, Task, TaskKind, TaskList},
};

/// Written on save; seconds are always included.
const STORED_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Also accepted on load.
const STORED_FORMAT_SHORT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");

pub const DEFAULT_DELIMITER: &str = " ||| ";

#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
    delimiter: String,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>, delimiter: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delimiter: delimiter.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the task list. A missing file is an empty list, not an error.
    ///
    /// Reads under a shared lock on the same sidecar `save` locks exclusively,
    /// so a load never overlaps a save from another process.
    pub fn load(&self) -> Result<TaskList, StorageError> {
        if !self.path.exists() {
            info!("no task file at {}, starting empty", self.path.display());
            return Ok(TaskList::new());
        }
        let _lock = lock_file(&lock_path(&self.path), Lock::Shared)?;

        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no task file at {}, starting empty", self.path.display());
                return Ok(TaskList::new());
            }
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let tasks = self.decode(&text).inspect_err(|e| warn!("{e}"))?;
        info!("loaded {} tasks from {}", tasks.len(), self.path.display());
        Ok(tasks)
    }

    /// Replace the file with the full task list, creating parent directories first.
    ///
    /// The new content goes to a temp file in the same directory which is then
    /// renamed over the destination, so readers only ever see a complete file.
    pub fn save(&self, tasks: &TaskList) -> Result<(), StorageError> {
        let path = self.path.as_path();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        self.check_encodable(tasks)?;
        fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;

        // Held until the end of this function.
        let _lock = lock_file(&lock_path(path), Lock::Exclusive)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(dir, e))?;
        tmp.write_all(self.encode(tasks).as_bytes())
            .and_then(|()| tmp.flush())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StorageError::io(tmp.path(), e))?;

        tmp.persist(path)
            .map_err(|e| StorageError::io(path, e.error))?;

        info!("saved {} tasks to {}", tasks.len(), path.display());
        Ok(())
    }

    /// A description holding the delimiter text would split into extra fields on load.
    fn check_encodable(&self, tasks: &TaskList) -> Result<(), StorageError> {
        let reserved = self.delimiter.trim();
        match tasks.iter().find(|t| t.description().contains(reserved)) {
            Some(task) => Err(StorageError::Unencodable {
                description: task.description().to_string(),
                reserved: reserved.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Whole-file text for `tasks`, newline terminated.
    pub fn encode(&self, tasks: &TaskList) -> String {
        tasks
            .iter()
            .map(|t| self.encode_line(t) + "\n")
            .collect()
    }

    /// Parse a whole file. Blank lines are skipped; the first bad line aborts.
    pub fn decode(&self, text: &str) -> Result<TaskList, StorageError> {
        text.lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(line, record)| {
                self.decode_line(record)
                    .map_err(|defect| StorageError::Corrupt { line, defect })
            })
            .collect()
    }

    pub fn encode_line(&self, task: &Task) -> String {
        let code = task.kind().code().to_string();
        let done = if task.is_done() { "1" } else { "0" };
        let mut fields = vec![code, done.to_string(), task.description().to_string()];
        match task.kind() {
            TaskKind::ToDo => {}
            TaskKind::Deadline { due } => fields.push(format_stored(due)),
            TaskKind::Event { start, end } => {
                fields.push(format_stored(start));
                fields.push(format_stored(end));
            }
        }
        fields.join(&self.delimiter)
    }

    pub fn decode_line(&self, record: &str) -> Result<Task, Corruption> {
        let fields: Vec<&str> = record.split(self.delimiter.as_str()).collect();
        let [code, done, description, rest @ ..] = fields.as_slice() else {
            return Err(Corruption::TooFewFields);
        };
        let done = match *done {
            "1" => true,
            "0" => false,
            other => return Err(Corruption::InvalidDoneFlag(other.to_string())),
        };

        let task = match *code {
            "T" => {
                expect_fields("ToDo", 0, rest)?;
                Task::todo(*description)
            }
            "D" => {
                expect_fields("Deadline", 1, rest)?;
                Task::deadline(*description, parse_stored(rest[0])?)
            }
            "E" => {
                expect_fields("Event", 2, rest)?;
                Task::event(*description, parse_stored(rest[0])?, parse_stored(rest[1])?)
            }
            other => return Err(Corruption::UnknownKind(other.to_string())),
        };
        Ok(task.map_err(Corruption::Invalid)?.with_done(done))
    }
}

fn expect_fields(kind: &'static str, extra: usize, rest: &[&str]) -> Result<(), Corruption> {
    if rest.len() == extra {
        Ok(())
    } else {
        Err(Corruption::WrongFieldCount {
            kind,
            expected: extra + 3,
            found: rest.len() + 3,
        })
    }
}

fn format_stored(dt: &DateTime) -> String {
    // Every PrimitiveDateTime fits this format, so the fallback is never taken.
    dt.format(STORED_FORMAT).unwrap_or_else(|_| dt.to_string())
}

fn parse_stored(text: &str) -> Result<DateTime, Corruption> {
    let invalid = || Corruption::InvalidDateTime(text.to_string());
    // `[year]` also takes a leading `+` or `-`.
    if !text.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid());
    }
    DateTime::parse(text, STORED_FORMAT)
        .or_else(|_| DateTime::parse(text, STORED_FORMAT_SHORT))
        .map_err(|_| invalid())
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

// --- Internal Helper: advisory locking ---
#[derive(Debug, Clone, Copy)]
enum Lock {
    Shared,
    Exclusive,
}

/// Blocks until the lock is granted; released when the returned file drops.
fn lock_file(path: &Path, lock: Lock) -> Result<File, StorageError> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(|e| StorageError::io(path, e))?;
    match lock {
        Lock::Shared => FileExt::lock_shared(&file),
        Lock::Exclusive => FileExt::lock_exclusive(&file),
    }
    .map_err(|e| StorageError::io(path, e))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn codec() -> Storage {
        Storage::new("unused.txt", DEFAULT_DELIMITER)
    }

    #[test]
    fn encodes_each_kind() {
        let storage = codec();
        let todo = Task::todo("read book").unwrap().with_done(true);
        assert_eq!(storage.encode_line(&todo), "T ||| 1 ||| read book");

        let deadline = Task::deadline("return book", datetime!(2024-02-01 12:30)).unwrap();
        assert_eq!(
            storage.encode_line(&deadline),
            "D ||| 0 ||| return book ||| 2024-02-01T12:30:00"
        );

        let event = Task::event(
            "meeting",
            datetime!(2024-03-10 09:00),
            datetime!(2024-03-10 10:30),
        )
        .unwrap();
        assert_eq!(
            storage.encode_line(&event),
            "E ||| 0 ||| meeting ||| 2024-03-10T09:00:00 ||| 2024-03-10T10:30:00"
        );
    }

    #[test]
    fn decode_accepts_minutes_only() {
        let task = codec()
            .decode_line("D ||| 0 ||| return book ||| 2024-02-01T12:30")
            .unwrap();
        assert_eq!(
            task.kind(),
            &TaskKind::Deadline {
                due: datetime!(2024-02-01 12:30)
            }
        );
    }

    #[test]
    fn decode_round_trips_encode() {
        let storage = codec();
        let tasks: TaskList = [
            Task::todo("read | book").unwrap(),
            Task::deadline("return book", datetime!(2024-02-01 12:30))
                .unwrap()
                .with_done(true),
            Task::event(
                "meeting",
                datetime!(2024-03-10 09:00:15),
                datetime!(2024-03-10 10:30:59),
            )
            .unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(storage.decode(&storage.encode(&tasks)).unwrap(), tasks);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = "\nT ||| 0 ||| a\n   \n\nT ||| 1 ||| b\n";
        let tasks = codec().decode(text).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.get(2).unwrap().is_done());
    }

    fn corruption(text: &str) -> (usize, Corruption) {
        match codec().decode(text) {
            Err(StorageError::Corrupt { line, defect }) => (line, defect),
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn reports_line_and_defect() {
        let good = "T ||| 0 ||| fine\n";
        let cases = [
            ("T ||| 0", Corruption::TooFewFields),
            ("T ||| 2 ||| x", Corruption::InvalidDoneFlag("2".into())),
            ("T ||| yes ||| x", Corruption::InvalidDoneFlag("yes".into())),
            ("X ||| 0 ||| x", Corruption::UnknownKind("X".into())),
            (
                "T ||| 0 ||| x ||| 2024-02-01T12:30:00",
                Corruption::WrongFieldCount {
                    kind: "ToDo",
                    expected: 3,
                    found: 4,
                },
            ),
            (
                "D ||| 0 ||| x",
                Corruption::WrongFieldCount {
                    kind: "Deadline",
                    expected: 4,
                    found: 3,
                },
            ),
            (
                "E ||| 0 ||| x ||| 2024-02-01T12:30:00",
                Corruption::WrongFieldCount {
                    kind: "Event",
                    expected: 5,
                    found: 4,
                },
            ),
            (
                "D ||| 0 ||| x ||| 2024-02-30T12:30:00",
                Corruption::InvalidDateTime("2024-02-30T12:30:00".into()),
            ),
            (
                "D ||| 0 ||| x ||| +2024-02-01T12:30:00",
                Corruption::InvalidDateTime("+2024-02-01T12:30:00".into()),
            ),
            (
                "E ||| 0 ||| x ||| -2024-02-01T12:30 ||| 2024-02-01T13:30",
                Corruption::InvalidDateTime("-2024-02-01T12:30".into()),
            ),
            (
                "D ||| 0 ||| x ||| tomorrow",
                Corruption::InvalidDateTime("tomorrow".into()),
            ),
        ];
        for (bad, expected) in cases {
            let text = format!("{good}\n{good}{bad}\n{good}");
            assert_eq!(corruption(&text), (4, expected), "record: {bad:?}");
        }
    }

    #[test]
    fn invariants_are_rechecked_on_load() {
        let (line, defect) =
            corruption("E ||| 0 ||| x ||| 2024-03-10T10:00:00 ||| 2024-03-10T09:00:00");
        assert_eq!(line, 1);
        assert!(matches!(defect, Corruption::Invalid(_)));
    }

    #[test]
    fn corruption_message_names_line() {
        let err = codec().decode("T ||| 0 ||| a\nQ ||| 0 ||| b").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Found corrupted data at line 2 (unknown task type 'Q')."
        );
    }

    #[test]
    fn custom_delimiter_is_used() {
        let storage = Storage::new("unused.txt", ";");
        let task = Task::todo("a b").unwrap();
        assert_eq!(storage.encode_line(&task), "T;0;a b");
        assert_eq!(storage.decode_line("T;0;a b").unwrap(), task);
    }

    #[test]
    fn missing_file_is_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("nope.txt"), DEFAULT_DELIMITER);
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn load_reads_under_the_save_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.txt");
        fs::write(&path, "T ||| 1 ||| a\n").unwrap();
        let storage = Storage::new(&path, DEFAULT_DELIMITER);

        // Other readers may hold the lock at the same time.
        let reader = lock_file(&lock_path(&path), Lock::Shared).unwrap();
        let tasks = storage.load().unwrap();
        drop(reader);

        assert_eq!(tasks.len(), 1);
        assert!(lock_path(&path).exists());
        storage.save(&tasks).unwrap();
        assert_eq!(storage.load().unwrap(), tasks);
    }

    #[test]
    fn programmatic_tasks_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("tasks.txt"), DEFAULT_DELIMITER);
        let tasks: TaskList = [Task::todo(" a ").unwrap(), Task::todo("b\nc").unwrap()]
            .into_iter()
            .collect();
        storage.save(&tasks).unwrap();
        assert_eq!(storage.load().unwrap(), tasks);
    }

    #[test]
    fn save_refuses_descriptions_holding_the_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.txt");
        let storage = Storage::new(&path, DEFAULT_DELIMITER);
        let tasks: TaskList = [Task::todo("a ||| b").unwrap()].into_iter().collect();
        assert!(matches!(
            storage.save(&tasks),
            Err(StorageError::Unencodable { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn save_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("tasks.txt");
        let storage = Storage::new(&path, DEFAULT_DELIMITER);

        let mut tasks: TaskList = [Task::todo("a").unwrap(), Task::todo("b").unwrap()]
            .into_iter()
            .collect();
        storage.save(&tasks).unwrap();
        tasks.delete(1).unwrap();
        storage.save(&tasks).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "T ||| 0 ||| b\n");
        assert_eq!(storage.load().unwrap(), tasks);
    }
}
