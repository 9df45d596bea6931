use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::CanonicalDate;
use crate::locale::Locale;

/// Task identifier. Stored data may carry either numbers (the seed list) or
/// strings (everything created at runtime). Any JSON number is accepted,
/// negative and fractional ones included; equality follows the written form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(serde_json::Number),
    Text(String),
}

impl TaskId {
    pub fn generate() -> Self {
        TaskId::Text(Uuid::new_v4().simple().to_string())
    }
}

impl PartialEq for TaskId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TaskId::Number(a), TaskId::Number(b)) => a.to_string() == b.to_string(),
            (TaskId::Text(a), TaskId::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TaskId {}

impl Hash for TaskId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            TaskId::Number(value) => {
                0u8.hash(state);
                value.to_string().hash(state);
            }
            TaskId::Text(value) => {
                1u8.hash(state);
                value.hash(state);
            }
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Number(value) => write!(f, "{value}"),
            TaskId::Text(value) => f.write_str(value),
        }
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        TaskId::Number(value.into())
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        TaskId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Active,
    Done,
    Canceled,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Active, Status::Done, Status::Canceled];

    pub fn label(self, locale: Locale) -> &'static str {
        locale.status_label(self)
    }

    /// Accepts a label from any known locale, or the bare variant name.
    pub fn from_label(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        for status in Status::ALL {
            if Locale::ALL
                .iter()
                .any(|locale| locale.status_label(status) == trimmed)
            {
                return Some(status);
            }
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "active" => Some(Status::Active),
            "done" | "completed" => Some(Status::Done),
            "canceled" | "cancelled" => Some(Status::Canceled),
            _ => None,
        }
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::from_label(s).ok_or_else(|| anyhow!("unknown status: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub status: Status,
    pub deadline: Option<CanonicalDate>,
}

impl Task {
    /// Overdue highlighting only applies to tasks that are still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == Status::Active
            && self
                .deadline
                .map(|deadline| deadline.as_naive() < today)
                .unwrap_or(false)
    }
}

/// A draft that already passed validation. Only `validate::admit` builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub(crate) description: String,
    pub(crate) status: Status,
    pub(crate) deadline: CanonicalDate,
}

impl NewTask {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn deadline(&self) -> CanonicalDate {
        self.deadline
    }

    pub(crate) fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            description: self.description,
            status: self.status,
            deadline: Some(self.deadline),
        }
    }
}

/// Fields to replace on an existing task; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub status: Option<Status>,
    pub deadline: Option<Option<CanonicalDate>>,
}

impl TaskPatch {
    pub fn description(value: impl Into<String>) -> Self {
        Self {
            description: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn status(value: Status) -> Self {
        Self {
            status: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.status.is_none() && self.deadline.is_none()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
    }
}

pub fn seed_tasks() -> Vec<Task> {
    let seed = |id: u64, description: &str, status: Status, (y, m, d): (i32, u32, u32)| Task {
        id: TaskId::from(id),
        description: description.to_string(),
        status,
        deadline: CanonicalDate::from_ymd(y, m, d),
    };

    vec![
        seed(1, "Выполнить ЛР7", Status::Active, (2025, 2, 18)),
        seed(2, "Сдать курсач по БД", Status::Done, (2026, 2, 27)),
        seed(3, "Найти работу", Status::Done, (2026, 2, 27)),
    ]
}
