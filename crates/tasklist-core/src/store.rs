use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::datastore::Persistence;
use crate::kv::KeyValueStore;
use crate::task::{NewTask, Task, TaskId, TaskPatch, seed_tasks};

/// What to start from when nothing usable is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Seed {
    #[default]
    SampleTasks,
    Empty,
}

/// Owns the task list. Every mutation swaps in a fresh collection and then
/// writes it through the persistence adapter, so a snapshot taken earlier
/// never changes underneath its holder.
#[derive(Debug)]
pub struct TaskStore<S> {
    tasks: Arc<[Task]>,
    persistence: Persistence<S>,
}

impl<S: KeyValueStore> TaskStore<S> {
    #[tracing::instrument(skip(persistence))]
    pub fn open(mut persistence: Persistence<S>, seed: Seed) -> Self {
        let tasks = match persistence.restore() {
            Some(tasks) => tasks,
            None => {
                info!(?seed, "no saved tasks; starting from defaults");
                match seed {
                    Seed::SampleTasks => seed_tasks(),
                    Seed::Empty => Vec::new(),
                }
            }
        };
        Self::with_tasks(persistence, tasks)
    }

    /// Starts from `tasks` (newest first) and writes them out. Later
    /// duplicates of an id are dropped.
    pub fn with_tasks(persistence: Persistence<S>, tasks: Vec<Task>) -> Self {
        let mut seen = HashSet::new();
        let tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|task| {
                let fresh = seen.insert(task.id.clone());
                if !fresh {
                    warn!(id = %task.id, "dropping duplicate task id");
                }
                fresh
            })
            .collect();

        let mut store = Self {
            tasks: Arc::from(Vec::<Task>::new()),
            persistence,
        };
        store.replace(tasks);
        store
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn snapshot(&self) -> Arc<[Task]> {
        Arc::clone(&self.tasks)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Looks a task up by the textual form of its id, as typed by a user.
    pub fn find_by_key(&self, key: &str) -> Option<&Task> {
        let key = key.trim();
        self.tasks.iter().find(|task| task.id.to_string() == key)
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    #[tracing::instrument(skip(self, new_task))]
    pub fn create(&mut self, new_task: NewTask) -> Task {
        let mut id = TaskId::generate();
        while self.get(&id).is_some() {
            id = TaskId::generate();
        }

        let task = new_task.into_task(id);
        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.push(task.clone());
        next.extend(self.tasks.iter().cloned());
        self.replace(next);

        info!(id = %task.id, "created task");
        task
    }

    /// Returns whether a task was removed; a missing id is not an error.
    #[tracing::instrument(skip(self, id), fields(id = %id))]
    pub fn remove(&mut self, id: &TaskId) -> bool {
        let before = self.tasks.len();
        let next: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| &task.id != id)
            .cloned()
            .collect();
        let removed = next.len() != before;
        self.replace(next);

        debug!(removed, "remove task");
        removed
    }

    /// Returns whether a task matched; a missing id is not an error.
    #[tracing::instrument(skip(self, id, patch), fields(id = %id))]
    pub fn update(&mut self, id: &TaskId, patch: &TaskPatch) -> bool {
        let mut matched = false;
        let next: Vec<Task> = self
            .tasks
            .iter()
            .map(|task| {
                let mut task = task.clone();
                if &task.id == id {
                    patch.apply(&mut task);
                    matched = true;
                }
                task
            })
            .collect();
        self.replace(next);

        debug!(matched, ?patch, "update task");
        matched
    }

    fn replace(&mut self, next: Vec<Task>) {
        self.tasks = Arc::from(next);
        self.persistence.save(&self.tasks);
    }
}

#[cfg(test)]
mod tests {
    use super::{Seed, TaskStore};
    use crate::datastore::{DEFAULT_STORAGE_KEY, Persistence};
    use crate::kv::{KeyValueStore, MemoryKvStore};
    use crate::locale::Locale;
    use crate::task::{Status, TaskId, TaskPatch};
    use crate::validate::{TaskDraft, admit};

    fn empty_store() -> TaskStore<MemoryKvStore> {
        let persistence = Persistence::new(MemoryKvStore::new(), DEFAULT_STORAGE_KEY, Locale::En);
        TaskStore::open(persistence, Seed::Empty)
    }

    fn create(store: &mut TaskStore<MemoryKvStore>, description: &str) -> TaskId {
        let draft = TaskDraft::new(description, Some(Status::Active), "01.01.2030");
        store.create(admit(&draft).expect("valid draft")).id
    }

    #[test]
    fn open_falls_back_to_seed_tasks() {
        let persistence = Persistence::new(MemoryKvStore::new(), DEFAULT_STORAGE_KEY, Locale::Ru);
        let store = TaskStore::open(persistence, Seed::SampleTasks);

        assert_eq!(store.len(), 3);
        assert!(store.get(&TaskId::from(1)).is_some());
    }

    #[test]
    fn open_keeps_records_it_cannot_read() {
        let raw = serde_json::json!([
            {"id": -1, "description": "negative", "status": "Active", "deadlineIso": null},
            {"id": 1.5, "description": "fractional", "status": "Done", "deadlineIso": null},
            {"id": 2, "description": "ok", "status": "Active", "deadlineIso": null},
            {"id": 3, "description": "odd status", "status": "Someday", "deadlineIso": null},
        ]);
        let mut backend = MemoryKvStore::new();
        backend
            .set(DEFAULT_STORAGE_KEY, &raw.to_string())
            .expect("seed backend");

        let mut store = TaskStore::open(
            Persistence::new(backend, DEFAULT_STORAGE_KEY, Locale::En),
            Seed::SampleTasks,
        );
        assert_eq!(store.len(), 3);
        assert_eq!(store.find_by_key("-1").map(|t| t.description.as_str()), Some("negative"));
        assert_eq!(store.find_by_key("1.5").map(|t| t.description.as_str()), Some("fractional"));

        store.remove(&TaskId::from(2));

        let stored: serde_json::Value = serde_json::from_str(
            &store
                .persistence()
                .backend()
                .get(DEFAULT_STORAGE_KEY)
                .expect("get")
                .expect("stored"),
        )
        .expect("json");
        assert_eq!(
            stored,
            serde_json::json!([
                {"id": -1, "description": "negative", "status": "Active", "deadlineIso": null},
                {"id": 1.5, "description": "fractional", "status": "Done", "deadlineIso": null},
                {"id": 3, "description": "odd status", "status": "Someday", "deadlineIso": null},
            ])
        );
    }

    #[test]
    fn create_prepends() {
        let mut store = empty_store();
        create(&mut store, "first");
        let last = create(&mut store, "second");

        assert_eq!(store.list()[0].id, last);
        assert_eq!(store.list()[1].description, "first");
    }

    #[test]
    fn remove_missing_id_is_noop() {
        let mut store = empty_store();
        create(&mut store, "keep me");

        assert!(!store.remove(&TaskId::from("nope")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_merges_named_fields() {
        let mut store = empty_store();
        let id = create(&mut store, "draft");

        assert!(store.update(&id, &TaskPatch::status(Status::Canceled)));

        let task = store.get(&id).expect("task exists");
        assert_eq!(task.status, Status::Canceled);
        assert_eq!(task.description, "draft");
        assert!(!store.update(&TaskId::from(404), &TaskPatch::description("x")));
    }

    #[test]
    fn snapshots_are_not_affected_by_later_mutations() {
        let mut store = empty_store();
        let id = create(&mut store, "before");
        let snapshot = store.snapshot();

        store.update(&id, &TaskPatch::description("after"));
        store.remove(&id);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].description, "before");
        assert!(store.is_empty());
    }

    #[test]
    fn every_mutation_is_saved() {
        let mut store = empty_store();
        let id = create(&mut store, "persist me");
        assert_eq!(store.persistence().load().map(|tasks| tasks.len()), Some(1));

        store.update(&id, &TaskPatch::status(Status::Done));
        let saved = store.persistence().load().expect("saved");
        assert_eq!(saved[0].status, Status::Done);

        store.remove(&id);
        assert_eq!(store.persistence().load(), Some(vec![]));
    }

    #[test]
    fn reopen_reads_saved_list() {
        let mut store = empty_store();
        create(&mut store, "survives restart");
        let backend = store.persistence.into_backend();
        assert!(backend.get(DEFAULT_STORAGE_KEY).expect("get").is_some());

        let reopened = TaskStore::open(
            Persistence::new(backend, DEFAULT_STORAGE_KEY, Locale::En),
            Seed::SampleTasks,
        );
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.list()[0].description, "survives restart");
    }

    #[test]
    fn find_by_key_matches_numeric_and_text_ids() {
        let persistence = Persistence::new(MemoryKvStore::new(), DEFAULT_STORAGE_KEY, Locale::Ru);
        let mut store = TaskStore::open(persistence, Seed::SampleTasks);
        let id = create(&mut store, "text id");

        assert_eq!(store.find_by_key("2").map(|t| t.status), Some(Status::Done));
        assert_eq!(store.find_by_key(&id.to_string()).map(|t| &t.id), Some(&id));
        assert!(store.find_by_key("99").is_none());
    }
}
