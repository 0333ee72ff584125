use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use shared::{
    domain::{Priority, TaskId},
    protocol::{parse_timestamp, TaskPatch},
};

pub const HELP: &str = "\
Commands:
  add <text>                      create a task from free-form text
  list                            show tasks grouped by priority
  show <id>                       fetch one task from the server
  edit <id> [name=..] [assignee=..] [due=YYYY-MM-DDTHH:MM] [priority=P1..P4]
  delete <id>                     delete a task (asks first)
  refresh                         reload every task from the server
  help                            show this text
  quit                            exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    List,
    Show(TaskId),
    Edit(TaskId, TaskPatch),
    Delete(TaskId),
    Refresh,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> anyhow::Result<Command> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));

    match verb.to_ascii_lowercase().as_str() {
        // Blank text is passed through; the sync client rejects it.
        "add" | "new" => Ok(Command::Add(rest.to_string())),
        "list" | "ls" | "" => Ok(Command::List),
        "show" => Ok(Command::Show(task_id(rest)?)),
        "edit" => {
            let (id, fields) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("usage: edit <id> field=value ..."))?;
            Ok(Command::Edit(task_id(id)?, parse_patch(fields)?))
        }
        "delete" | "rm" => Ok(Command::Delete(task_id(rest)?)),
        "refresh" => Ok(Command::Refresh),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => bail!("unknown command '{other}'; type 'help'"),
    }
}

fn task_id(raw: &str) -> anyhow::Result<TaskId> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains(char::is_whitespace) {
        bail!("expected a single task id");
    }
    Ok(TaskId::from(raw))
}

/// `key=value` pairs; a value runs until the next recognised `key=`.
pub fn parse_patch(raw: &str) -> anyhow::Result<TaskPatch> {
    let mut fields: Vec<(Field, String)> = Vec::new();
    for token in raw.split_whitespace() {
        match token
            .split_once('=')
            .and_then(|(key, value)| Some((Field::from_key(key)?, value)))
        {
            Some((field, value)) => fields.push((field, value.to_string())),
            _ => match fields.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(token);
                }
                None => bail!("expected field=value, got '{token}'"),
            },
        }
    }

    let mut patch = TaskPatch::default();
    for (field, value) in fields {
        let value = value.trim().to_string();
        match field {
            Field::Name => patch.task_name = Some(value),
            // An empty assignee is left out of the patch, not sent as "".
            Field::Assignee => patch.assignee = (!value.is_empty()).then_some(value),
            Field::Due => patch.due_date_time = Some(parse_due(&value)?),
            Field::Priority => patch.priority = Some(value.parse::<Priority>()?),
        }
    }
    Ok(patch)
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Name,
    Assignee,
    Due,
    Priority,
}

impl Field {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "name" => Some(Self::Name),
            "assignee" => Some(Self::Assignee),
            "due" => Some(Self::Due),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }
}

/// RFC 3339 is taken as-is; minute-precision input is local wall-clock time.
pub fn parse_due(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return naive
                .and_local_timezone(Local)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .with_context(|| format!("'{raw}' does not exist in the local time zone"));
        }
    }
    parse_timestamp(raw).with_context(|| format!("unrecognised due date '{raw}'"))
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
