use std::io::Write;

use anyhow::anyhow;
use chrono::NaiveDate;
use tasklist_core::config::Config;
use tasklist_core::kv::KeyValueStore;
use tasklist_core::{
    CommitOutcome, EditField, InlineEditor, Status, TaskDraft, TaskFilter, TaskId, TaskPatch,
    TaskStore, admit, filter_tasks,
};
use tracing::{debug, info, instrument};

use crate::cli::Command;
use crate::render::Renderer;

#[instrument(skip(store, cfg, renderer, out, command, today))]
pub fn dispatch<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    cfg: &Config,
    renderer: &Renderer,
    out: &mut W,
    command: Command,
    today: NaiveDate,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    match command {
        Command::List { filter } => cmd_list(store, renderer, out, filter, today),
        Command::Add {
            description,
            status,
            deadline,
        } => cmd_add(store, renderer, out, description, status, deadline),
        Command::Edit { id, text } => cmd_edit(store, cfg, out, &id, text),
        Command::Status { id, status } => cmd_status(store, renderer, out, &id, status),
        Command::Remove { id } => cmd_remove(store, out, &id),
        Command::Show { id } => {
            let task = store
                .find_by_key(&id)
                .ok_or_else(|| anyhow!("no task with id {id}"))?;
            renderer.print_task_info(out, task)
        }
    }
}

fn resolve_id<S: KeyValueStore>(store: &TaskStore<S>, key: &str) -> anyhow::Result<TaskId> {
    store
        .find_by_key(key)
        .map(|task| task.id.clone())
        .ok_or_else(|| anyhow!("no task with id {key}"))
}

fn cmd_list<S: KeyValueStore, W: Write>(
    store: &TaskStore<S>,
    renderer: &Renderer,
    out: &mut W,
    filter: TaskFilter,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let visible = filter_tasks(store.list(), filter);
    renderer.print_task_table(out, filter, &visible, today)
}

fn cmd_add<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    renderer: &Renderer,
    out: &mut W,
    description: String,
    status: Option<String>,
    deadline: String,
) -> anyhow::Result<()> {
    info!("command add");

    let status = match status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<Status>()?),
    };
    let draft = TaskDraft::new(description, status, deadline);

    match admit(&draft) {
        Ok(new_task) => {
            let task = store.create(new_task);
            writeln!(out, "Created task {}.", task.id)?;
            Ok(())
        }
        Err(errors) => {
            for (field, error) in &errors {
                writeln!(out, "{}: {}", field.name(), error.message(renderer.locale()))?;
            }
            Err(anyhow!("task not created: {} invalid field(s)", errors.len()))
        }
    }
}

fn cmd_edit<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    cfg: &Config,
    out: &mut W,
    key: &str,
    text: String,
) -> anyhow::Result<()> {
    info!("command edit");

    let id = resolve_id(store, key)?;
    let current = store
        .get(&id)
        .map(|task| task.description.clone())
        .unwrap_or_default();

    let mut editor = InlineEditor::new(cfg.empty_draft_policy()?);
    editor.start(id, EditField::Description, current);
    editor.change_draft(text);

    match editor.commit(store) {
        Some(CommitOutcome::Saved { task_id, .. }) => {
            writeln!(out, "Updated task {task_id}.")?;
        }
        Some(CommitOutcome::Reverted { task_id }) => {
            writeln!(out, "Task {task_id} left unchanged.")?;
        }
        Some(CommitOutcome::Missing { task_id }) => {
            writeln!(out, "No task with id {task_id}.")?;
        }
        None => {}
    }
    Ok(())
}

fn cmd_status<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    renderer: &Renderer,
    out: &mut W,
    key: &str,
    status: Status,
) -> anyhow::Result<()> {
    info!("command status");

    let id = resolve_id(store, key)?;
    store.update(&id, &TaskPatch::status(status));
    writeln!(out, "Task {id}: {}.", status.label(renderer.locale()))?;
    Ok(())
}

fn cmd_remove<S: KeyValueStore, W: Write>(
    store: &mut TaskStore<S>,
    out: &mut W,
    key: &str,
) -> anyhow::Result<()> {
    info!("command remove");

    let removed = match store.find_by_key(key).map(|task| task.id.clone()) {
        Some(id) => store.remove(&id),
        None => false,
    };
    if removed {
        writeln!(out, "Removed task {}.", key.trim())?;
    } else {
        writeln!(out, "No task with id {}.", key.trim())?;
    }
    Ok(())
}
