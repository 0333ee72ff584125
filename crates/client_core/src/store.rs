//! Local mirror of the server-side task collection.

use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
};

use shared::{domain::TaskId, protocol::Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    ReplacedExisting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced,
    Missing,
    /// Incoming `updated_at` is older than the stored one; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    Missing,
}

/// Local mutation counter. A listing requested at revision `r` predates every
/// local change recorded after `r`.
pub type Revision = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Written,
    Removed,
}

#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    revision: Revision,
    changes: HashMap<TaskId, (Revision, Change)>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Server listing requested at `since`. Local changes recorded after
    /// `since` win over it; later duplicates of an id are dropped.
    pub fn hydrate(&mut self, tasks: Vec<Task>, since: Revision) -> usize {
        let mut previous: HashMap<TaskId, Task> = self
            .tasks
            .drain(..)
            .map(|task| (task.id.clone(), task))
            .collect();
        let changed_since = |id: &TaskId, change: Change| {
            self.changes
                .get(id)
                .is_some_and(|(revision, recorded)| *revision > since && *recorded == change)
        };

        let mut seen = HashSet::with_capacity(tasks.len());
        let mut listed = Vec::with_capacity(tasks.len());
        for incoming in tasks {
            if !seen.insert(incoming.id.clone()) || changed_since(&incoming.id, Change::Removed) {
                continue;
            }
            match previous.remove(&incoming.id) {
                Some(mirrored) if mirrored.updated_at > incoming.updated_at => listed.push(mirrored),
                _ => listed.push(incoming),
            }
        }

        let mut kept: Vec<Task> = previous
            .into_values()
            .filter(|task| changed_since(&task.id, Change::Written))
            .collect();
        kept.sort_by_key(|task| {
            Reverse(self.changes.get(&task.id).map(|(revision, _)| *revision))
        });

        kept.extend(listed);
        self.tasks = kept;
        self.changes.retain(|_, (revision, _)| *revision > since);
        self.len()
    }

    #[must_use]
    pub fn insert(&mut self, task: Task) -> InsertOutcome {
        if let Some(existing) = self.position(&task.id) {
            self.record(&task.id, Change::Written);
            self.tasks[existing] = task;
            return InsertOutcome::ReplacedExisting;
        }
        self.record(&task.id, Change::Written);
        self.tasks.insert(0, task);
        InsertOutcome::Inserted
    }

    #[must_use]
    pub fn replace(&mut self, id: &TaskId, task: Task) -> ReplaceOutcome {
        let Some(index) = self.position(id) else {
            return ReplaceOutcome::Missing;
        };
        if task.updated_at < self.tasks[index].updated_at {
            return ReplaceOutcome::Stale;
        }
        self.record(id, Change::Written);
        self.tasks[index] = task;
        ReplaceOutcome::Replaced
    }

    #[must_use]
    pub fn remove(&mut self, id: &TaskId) -> RemoveOutcome {
        match self.position(id) {
            Some(index) => {
                self.record(id, Change::Removed);
                self.tasks.remove(index);
                RemoveOutcome::Removed
            }
            None => RemoveOutcome::Missing,
        }
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn record(&mut self, id: &TaskId, change: Change) {
        self.revision += 1;
        self.changes.insert(id.clone(), (self.revision, change));
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
