use std::str::FromStr;

use anyhow::anyhow;
use tracing::{debug, info};

use crate::kv::KeyValueStore;
use crate::store::TaskStore;
use crate::task::{TaskId, TaskPatch};

/// Fields that can be edited in place. Status goes through a discrete
/// selector and the deadline is fixed after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditField {
    Description,
}

/// What committing a draft that trims to nothing does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyDraftPolicy {
    /// Store the empty string.
    #[default]
    Keep,
    /// Drop the edit and leave the task as it was.
    Revert,
}

impl FromStr for EmptyDraftPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" | "allow" | "clear" => Ok(Self::Keep),
            "revert" | "discard" | "ignore" => Ok(Self::Revert),
            other => Err(anyhow!("invalid empty-draft policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub task_id: TaskId,
    pub field: EditField,
    pub draft: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Saved { task_id: TaskId, value: String },
    Reverted { task_id: TaskId },
    /// The task went away while the edit was open; nothing changed.
    Missing { task_id: TaskId },
}

/// Holds at most one in-progress inline edit.
#[derive(Debug, Clone, Default)]
pub struct InlineEditor {
    session: Option<EditSession>,
    empty_policy: EmptyDraftPolicy,
}

impl InlineEditor {
    pub fn new(empty_policy: EmptyDraftPolicy) -> Self {
        Self {
            session: None,
            empty_policy,
        }
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn is_editing(&self, task_id: &TaskId, field: EditField) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| &session.task_id == task_id && session.field == field)
    }

    /// Opens a session, replacing any session already open.
    pub fn start(&mut self, task_id: TaskId, field: EditField, initial: impl Into<String>) {
        if let Some(previous) = &self.session {
            debug!(task_id = %previous.task_id, "discarding previous edit session");
        }
        self.session = Some(EditSession {
            task_id,
            field,
            draft: initial.into(),
        });
    }

    pub fn change_draft(&mut self, value: impl Into<String>) {
        if let Some(session) = self.session.as_mut() {
            session.draft = value.into();
        }
    }

    /// Writes the trimmed draft to the store and closes the session.
    /// Returns `None` when no session was open.
    #[tracing::instrument(skip(self, store))]
    pub fn commit<S: KeyValueStore>(&mut self, store: &mut TaskStore<S>) -> Option<CommitOutcome> {
        let session = self.session.take()?;
        let value = session.draft.trim().to_string();

        if value.is_empty() && self.empty_policy == EmptyDraftPolicy::Revert {
            info!(task_id = %session.task_id, "empty draft reverted");
            return Some(CommitOutcome::Reverted {
                task_id: session.task_id,
            });
        }

        let patch = match session.field {
            EditField::Description => TaskPatch::description(value.clone()),
        };
        if !store.update(&session.task_id, &patch) {
            info!(task_id = %session.task_id, "edited task no longer exists");
            return Some(CommitOutcome::Missing {
                task_id: session.task_id,
            });
        }

        Some(CommitOutcome::Saved {
            task_id: session.task_id,
            value,
        })
    }

    pub fn cancel(&mut self) {
        self.session = None;
    }
}
