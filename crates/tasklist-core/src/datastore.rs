use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::datetime::parse_canonical_date;
use crate::kv::KeyValueStore;
use crate::locale::Locale;
use crate::task::{Status, Task, TaskId};

pub const DEFAULT_STORAGE_KEY: &str = "todo_vite_tasks_v1_Ustimenko";

/// On-disk shape of one task inside the stored JSON array.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskRecord {
    id: TaskId,
    description: String,
    status: String,
    #[serde(rename = "deadlineIso", default)]
    deadline_iso: Option<String>,
}

impl TaskRecord {
    fn from_task(task: &Task, locale: Locale) -> Self {
        Self {
            id: task.id.clone(),
            description: task.description.clone(),
            status: task.status.label(locale).to_string(),
            deadline_iso: task.deadline.map(|date| date.to_string()),
        }
    }

    fn into_task(self) -> Option<Task> {
        let Some(status) = Status::from_label(&self.status) else {
            warn!(id = %self.id, status = %self.status, "skipping record with unknown status");
            return None;
        };

        let deadline = match self.deadline_iso.as_deref() {
            None => None,
            Some(raw) => {
                let parsed = parse_canonical_date(raw);
                if parsed.is_none() {
                    warn!(id = %self.id, deadline = %raw, "dropping invalid stored deadline");
                }
                parsed
            }
        };

        Some(Task {
            id: self.id,
            description: self.description,
            status,
            deadline,
        })
    }
}

/// Loads and saves the whole task list as one JSON blob under a fixed key.
/// Storage problems never leave this type: loads degrade to `None`, saves
/// are logged and dropped. Array elements that cannot be read as tasks are
/// held on to after [`Persistence::restore`] and written back behind the
/// tasks on every save.
#[derive(Debug)]
pub struct Persistence<S> {
    backend: S,
    key: String,
    locale: Locale,
    unreadable: Vec<Value>,
}

struct StoredList {
    tasks: Vec<Task>,
    unreadable: Vec<Value>,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(backend: S, key: impl Into<String>, locale: Locale) -> Self {
        Self {
            backend,
            key: key.into(),
            locale,
            unreadable: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    /// Stored elements kept aside because they could not be read as tasks.
    pub fn unreadable(&self) -> &[Value] {
        &self.unreadable
    }

    /// `None` means "nothing usable stored"; callers fall back to defaults.
    pub fn load(&self) -> Option<Vec<Task>> {
        self.read().map(|stored| stored.tasks)
    }

    /// Like [`Persistence::load`], but also remembers the elements it had to
    /// skip so the next save keeps them.
    pub fn restore(&mut self) -> Option<Vec<Task>> {
        let stored = self.read()?;
        if !stored.unreadable.is_empty() {
            info!(count = stored.unreadable.len(), "keeping unreadable task records");
        }
        self.unreadable = stored.unreadable;
        Some(stored.tasks)
    }

    #[tracing::instrument(skip(self), fields(key = %self.key))]
    fn read(&self) -> Option<StoredList> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => {
                debug!("no saved tasks");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "failed reading saved tasks");
                return None;
            }
        };

        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(other) => {
                warn!(kind = json_kind(&other), "saved tasks are not an array; ignoring");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "saved tasks are not valid JSON; ignoring");
                return None;
            }
        };

        let total = items.len();
        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(total);
        let mut unreadable = Vec::new();
        for (idx, item) in items.into_iter().enumerate() {
            let record = match serde_json::from_value::<TaskRecord>(item.clone()) {
                Ok(record) => record,
                Err(err) => {
                    warn!(index = idx, error = %err, "skipping malformed task record");
                    unreadable.push(item);
                    continue;
                }
            };
            let Some(task) = record.into_task() else {
                unreadable.push(item);
                continue;
            };
            if !seen.insert(task.id.clone()) {
                warn!(id = %task.id, "skipping duplicate task id");
                unreadable.push(item);
                continue;
            }
            tasks.push(task);
        }

        debug!(total, loaded = tasks.len(), "loaded saved tasks");
        Some(StoredList { tasks, unreadable })
    }

    #[tracing::instrument(skip(self, tasks), fields(key = %self.key, count = tasks.len()))]
    pub fn save(&mut self, tasks: &[Task]) {
        let mut items = Vec::with_capacity(tasks.len() + self.unreadable.len());
        for task in tasks {
            match serde_json::to_value(TaskRecord::from_task(task, self.locale)) {
                Ok(value) => items.push(value),
                Err(err) => {
                    error!(id = %task.id, error = %err, "failed serializing task");
                    return;
                }
            }
        }
        items.extend(self.unreadable.iter().cloned());

        let payload = match serde_json::to_string(&items) {
            Ok(payload) => payload,
            Err(err) => {
                error!(error = %err, "failed serializing tasks");
                return;
            }
        };

        if let Err(err) = self.backend.set(&self.key, &payload) {
            error!(error = %err, "failed saving tasks");
            return;
        }
        debug!(bytes = payload.len(), "saved tasks");
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
