//! Turns one line of user text into a validated [`Command`].
//!
//! All grammar and argument checks live here. Range checks and task
//! invariants (event ordering, which fields a kind accepts) are left to
//! execution, so a successful parse can still fail when the command runs.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::command::Command;
use crate::error::{DEADLINE_USAGE, EVENT_USAGE, ParseError};
use crate::model::{DateTime, FieldValue, TaskField};

/// The only accepted input shape for dates: `yyyy-MM-dd HH:mm`.
pub const INPUT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Strictly parse a `yyyy-MM-dd HH:mm` date-time.
///
/// Both padding and calendar validity are enforced: `2024-2-1 9:00` and
/// `2023-02-29 10:00` are rejected instead of being normalised.
pub fn parse_datetime(text: &str) -> Result<DateTime, ParseError> {
    let invalid = || ParseError::InvalidDateTime(text.to_string());
    // `[year]` also takes a leading `+` or `-`.
    if !text.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid());
    }
    DateTime::parse(text, INPUT_FORMAT).map_err(|_| invalid())
}

#[derive(Debug, Clone)]
pub struct Parser {
    /// Delimiter text with surrounding whitespace removed; input containing it is refused.
    reserved: String,
}

impl Parser {
    /// `delimiter` is the storage delimiter whose text may never appear in input.
    pub fn new(delimiter: &str) -> Self {
        Self {
            reserved: delimiter.trim().to_string(),
        }
    }

    pub fn parse(&self, raw: &str) -> Result<Command, ParseError> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        if !self.reserved.is_empty() && input.contains(self.reserved.as_str()) {
            return Err(ParseError::ReservedDelimiter(self.reserved.clone()));
        }

        let tokens: Vec<&str> = input.split_whitespace().collect();
        let (word, args) = tokens.split_first().ok_or(ParseError::EmptyInput)?;

        match word.to_lowercase().as_str() {
            "bye" => no_arguments("bye", args).map(|()| Command::Bye),
            "list" => no_arguments("list", args).map(|()| Command::List),
            "mark" => single_index("mark", args).map(Command::Mark),
            "unmark" => single_index("unmark", args).map(Command::Unmark),
            "delete" => single_index("delete", args).map(Command::Delete),
            "todo" => parse_todo(args),
            "deadline" => parse_deadline(&args.join(" ")),
            "event" => parse_event(&args.join(" ")),
            "find" => parse_find(args),
            "update" => parse_update(&args.join(" ")),
            _ => Err(ParseError::UnknownCommand((*word).to_string())),
        }
    }
}

fn no_arguments(command: &'static str, args: &[&str]) -> Result<(), ParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ParseError::NoArguments(command))
    }
}

fn single_index(command: &'static str, args: &[&str]) -> Result<i64, ParseError> {
    let [value] = args else {
        return Err(ParseError::ExactlyOneArgument(command));
    };
    parse_index(command, value)
}

fn parse_index(command: &'static str, value: &str) -> Result<i64, ParseError> {
    value.parse().map_err(|_| ParseError::NotANumber {
        command,
        value: value.to_string(),
    })
}

fn parse_todo(args: &[&str]) -> Result<Command, ParseError> {
    if args.is_empty() {
        return Err(ParseError::MissingDescription);
    }
    Ok(Command::AddTodo {
        description: args.join(" "),
    })
}

fn parse_find(args: &[&str]) -> Result<Command, ParseError> {
    if args.is_empty() {
        return Err(ParseError::MissingKeyword);
    }
    Ok(Command::Find {
        keyword: args.join(" "),
    })
}

fn parse_deadline(argument: &str) -> Result<Command, ParseError> {
    let parts: Vec<&str> = argument.split("/by").collect();
    let [description, due] = parts.as_slice() else {
        return Err(ParseError::DeadlineShape);
    };
    let description = description.trim();
    if description.is_empty() {
        return Err(ParseError::EmptyDescription {
            command: "deadline",
            usage: DEADLINE_USAGE,
        });
    }
    Ok(Command::AddDeadline {
        description: description.to_string(),
        due: parse_datetime(due.trim())?,
    })
}

fn parse_event(argument: &str) -> Result<Command, ParseError> {
    let [description, start, end] =
        split_markers(argument, "/from", "/to").ok_or(ParseError::EventShape)?;
    if description.is_empty() {
        return Err(ParseError::EmptyDescription {
            command: "event",
            usage: EVENT_USAGE,
        });
    }
    Ok(Command::AddEvent {
        description: description.to_string(),
        start: parse_datetime(start)?,
        end: parse_datetime(end)?,
    })
}

fn parse_update(argument: &str) -> Result<Command, ParseError> {
    let [index, field, value] =
        split_markers(argument, "/field", "/with").ok_or(ParseError::UpdateShape)?;
    if index.is_empty() {
        return Err(ParseError::UpdateMissingIndex);
    }
    if field.is_empty() {
        return Err(ParseError::UpdateMissingField);
    }
    if value.is_empty() {
        return Err(ParseError::UpdateMissingValue);
    }
    let index = parse_index("update", index)?;

    let value = match TaskField::from_name(field) {
        Some(f) if f.is_datetime() => FieldValue::DateTime(parse_datetime(value)?),
        _ => FieldValue::Text(value.to_string()),
    };
    Ok(Command::Update {
        index,
        field: field.to_string(),
        value,
    })
}

/// Split `text` into `[head, between, tail]` around exactly one `first`
/// marker followed by exactly one `second` marker. Pieces are trimmed.
fn split_markers<'a>(text: &'a str, first: &str, second: &str) -> Option<[&'a str; 3]> {
    if text.matches(first).count() != 1 || text.matches(second).count() != 1 {
        return None;
    }
    let (head, rest) = text.split_once(first)?;
    let (between, tail) = rest.split_once(second)?;
    Some([head.trim(), between.trim(), tail.trim()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn parse(input: &str) -> Result<Command, ParseError> {
        Parser::new(" ||| ").parse(input)
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse("bye"), Ok(Command::Bye));
        assert_eq!(parse("LiSt"), Ok(Command::List));
        assert_eq!(parse("mark 2"), Ok(Command::Mark(2)));
        assert_eq!(parse("unmark 3"), Ok(Command::Unmark(3)));
        assert_eq!(parse("delete 4"), Ok(Command::Delete(4)));
        assert_eq!(parse("   mark    5   "), Ok(Command::Mark(5)));
    }

    #[test]
    fn index_range_is_not_checked_here() {
        assert_eq!(parse("mark 0"), Ok(Command::Mark(0)));
        assert_eq!(parse("delete -3"), Ok(Command::Delete(-3)));
    }

    #[test]
    fn todo_and_find_join_words() {
        assert_eq!(
            parse("ToDo read   book"),
            Ok(Command::AddTodo {
                description: "read book".into()
            })
        );
        assert_eq!(
            parse("find read book"),
            Ok(Command::Find {
                keyword: "read book".into()
            })
        );
    }

    #[test]
    fn parses_deadline_and_event() {
        assert_eq!(
            parse("deadline submit report /by 2024-02-01 12:30"),
            Ok(Command::AddDeadline {
                description: "submit report".into(),
                due: datetime!(2024-02-01 12:30),
            })
        );
        assert_eq!(
            parse("EvenT meeting /from 2024-03-10 09:00 /to 2024-03-10 10:30"),
            Ok(Command::AddEvent {
                description: "meeting".into(),
                start: datetime!(2024-03-10 09:00),
                end: datetime!(2024-03-10 10:30),
            })
        );
    }

    #[test]
    fn event_order_is_left_to_execution() {
        assert!(matches!(
            parse("event x /from 2024-03-10 11:00 /to 2024-03-10 10:00"),
            Ok(Command::AddEvent { .. })
        ));
    }

    #[test]
    fn parses_update_values_by_field() {
        assert_eq!(
            parse("update 2 /field description /with new title"),
            Ok(Command::Update {
                index: 2,
                field: "description".into(),
                value: FieldValue::Text("new title".into()),
            })
        );
        assert_eq!(
            parse("update 3 /field BY /with 2024-02-01 12:30"),
            Ok(Command::Update {
                index: 3,
                field: "BY".into(),
                value: FieldValue::DateTime(datetime!(2024-02-01 12:30)),
            })
        );
        // Unknown names pass through; the task decides at execution time.
        assert!(matches!(
            parse("update 1 /field priority /with high"),
            Ok(Command::Update {
                value: FieldValue::Text(_),
                ..
            })
        ));
    }

    #[test]
    fn rejects_grammar_violations() {
        let cases = [
            ("", ParseError::EmptyInput),
            ("   ", ParseError::EmptyInput),
            ("unknown", ParseError::UnknownCommand("unknown".into())),
            ("bye now", ParseError::NoArguments("bye")),
            ("list all", ParseError::NoArguments("list")),
            ("mark", ParseError::ExactlyOneArgument("mark")),
            ("unmark 1 2", ParseError::ExactlyOneArgument("unmark")),
            ("delete", ParseError::ExactlyOneArgument("delete")),
            ("todo", ParseError::MissingDescription),
            ("find", ParseError::MissingKeyword),
            ("deadline read book", ParseError::DeadlineShape),
            ("event meeting /from 2024-03-10 09:00", ParseError::EventShape),
            (
                "event a /to 2024-03-10 09:00 /from 2024-03-10 10:00",
                ParseError::EventShape,
            ),
            ("update 1 /field description", ParseError::UpdateShape),
            ("update /field description /with x", ParseError::UpdateMissingIndex),
            ("update 1 /field /with x", ParseError::UpdateMissingField),
            ("update 1 /field description /with", ParseError::UpdateMissingValue),
        ];
        for (input, expected) in cases {
            assert_eq!(parse(input), Err(expected), "input: {input:?}");
        }
    }

    #[test]
    fn rejects_non_numeric_index() {
        assert!(matches!(
            parse("mark two"),
            Err(ParseError::NotANumber { command: "mark", .. })
        ));
        assert!(matches!(
            parse("update one /field description /with new title"),
            Err(ParseError::NotANumber {
                command: "update",
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_descriptions() {
        assert!(matches!(
            parse("deadline /by 2024-02-01 12:30"),
            Err(ParseError::EmptyDescription {
                command: "deadline",
                ..
            })
        ));
        assert!(matches!(
            parse("event /from 2024-03-10 09:00 /to 2024-03-10 10:30"),
            Err(ParseError::EmptyDescription { command: "event", .. })
        ));
    }

    #[test]
    fn reserved_delimiter_wins_over_command_word() {
        let err = parse("todo use ||| here").unwrap_err();
        assert_eq!(err, ParseError::ReservedDelimiter("|||".into()));
        assert!(parse("nonsense |||").is_err());
        assert!(Parser::new(" ;; ").parse("todo a ||| b").is_ok());
    }

    #[test]
    fn datetime_parsing_is_strict() {
        assert_eq!(
            parse_datetime("2024-02-29 23:59"),
            Ok(datetime!(2024-02-29 23:59))
        );
        for bad in [
            "2024/02/18 10:00",
            "2023-02-29 10:00",
            "2024-04-31 10:00",
            "2024-2-1 10:00",
            "2024-02-01 9:00",
            "2024-02-01 24:00",
            "2024-02-01T10:00",
            "2024-02-01 10:00 extra",
            "2024-02-01",
            "+2024-02-01 10:00",
            "-2024-02-01 10:00",
            " 2024-02-01 10:00",
        ] {
            assert!(parse_datetime(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn bad_dates_surface_through_commands() {
        assert_eq!(
            parse("deadline x /by +2024-02-01 10:00"),
            Err(ParseError::InvalidDateTime("+2024-02-01 10:00".into()))
        );
        assert!(matches!(
            parse("deadline read book /by 2024/02/18 10:00"),
            Err(ParseError::InvalidDateTime(_))
        ));
        assert!(matches!(
            parse("update 1 /field by /with 2024/02/18 10:00"),
            Err(ParseError::InvalidDateTime(_))
        ));
    }
}
