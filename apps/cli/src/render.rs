use std::fmt::{Display, Write};

use chrono::{DateTime, TimeZone, Utc};
use client_core::{Connectivity, Notification, NotificationKind, TaskView};
use shared::protocol::Task;

const DUE_FORMAT: &str = "%a, %b %-d, %Y %I:%M %p";

pub fn render_view<Tz>(view: &TaskView, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = format!("Your Tasks ({})\n", view.total);
    if view.is_empty() {
        out.push_str("  No tasks yet. Add one with 'add <text>'.\n");
        return out;
    }
    for group in &view.groups {
        let _ = writeln!(out, "  {} ({})", group.label(), group.tasks.len());
        for task in &group.tasks {
            let _ = writeln!(
                out,
                "    [{}] {}  | {} | {}",
                task.id,
                task.task_name,
                task.assignee.as_deref().unwrap_or("Unassigned"),
                format_due(task.due_date_time, now),
            );
        }
    }
    out
}

/// Due date in the viewer's zone, with an "(Overdue)", "(Today)" or
/// "(Tomorrow)" hint relative to `now`.
pub fn format_due<Tz>(due: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(due) = due else {
        return "No due date".to_string();
    };
    let local = due.with_timezone(&now.timezone());
    let today = now.date_naive();

    let hint = if due < now.with_timezone(&Utc) {
        Some("Overdue")
    } else if local.date_naive() == today {
        Some("Today")
    } else if today.succ_opt() == Some(local.date_naive()) {
        Some("Tomorrow")
    } else {
        None
    };

    let formatted = local.format(DUE_FORMAT).to_string();
    match hint {
        Some(hint) => format!("{formatted} ({hint})"),
        None => formatted,
    }
}

pub fn render_banner(notification: &Notification) -> Option<String> {
    notification.banner().map(|banner| {
        let tag = match banner.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
        };
        format!("[{tag}] {}", banner.message)
    })
}

pub fn render_connectivity(state: Connectivity) -> String {
    format!("* {}", state.label())
}

pub fn render_task_detail<Tz>(task: &Task, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", task.task_name, task.id);
    let _ = writeln!(out, "  Priority: {}", task.priority.label());
    let _ = writeln!(
        out,
        "  Assignee: {}",
        task.assignee.as_deref().unwrap_or("Unassigned")
    );
    let _ = writeln!(out, "  Due:      {}", format_due(task.due_date_time, now));
    if let Some(text) = &task.original_text {
        let _ = writeln!(out, "  Original: \"{text}\"");
    }
    let _ = writeln!(
        out,
        "  Created:  {}",
        task.created_at.with_timezone(&now.timezone()).format(DUE_FORMAT)
    );
    let _ = writeln!(
        out,
        "  Updated:  {}",
        task.updated_at.with_timezone(&now.timezone()).format(DUE_FORMAT)
    );
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
