//! Display ordering: priority groups, each sorted by due date then recency.

use std::cmp::Ordering;

use shared::{domain::Priority, protocol::Task};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityGroup {
    pub priority: Priority,
    pub tasks: Vec<Task>,
}

impl PriorityGroup {
    pub fn label(&self) -> &'static str {
        self.priority.label()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskView {
    pub total: usize,
    pub groups: Vec<PriorityGroup>,
}

impl TaskView {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        Self {
            total: tasks.len(),
            groups: arrange(tasks),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.groups.iter().flat_map(|group| group.tasks.iter())
    }
}

/// P1 first; then earliest due date, with undated tasks last; then newest
/// `created_at` first.
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| match (a.due_date_time, b.due_date_time) {
            (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

pub fn arrange(tasks: &[Task]) -> Vec<PriorityGroup> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(compare_tasks);

    Priority::ALL
        .into_iter()
        .filter_map(|priority| {
            let members: Vec<Task> = sorted
                .iter()
                .filter(|task| task.priority == priority)
                .cloned()
                .collect();
            (!members.is_empty()).then_some(PriorityGroup {
                priority,
                tasks: members,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/ordering_tests.rs"]
mod tests;
