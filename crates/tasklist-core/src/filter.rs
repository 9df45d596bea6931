use std::str::FromStr;

use anyhow::anyhow;
use tracing::trace;

use crate::task::{
  Status,
  Task
};

/// Which slice of the list the view
/// shows. `Done` covers both finished
/// and canceled tasks.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum TaskFilter {
  #[default]
  All,
  Active,
  Done
}

impl TaskFilter {
  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | TaskFilter::All => true,
      | TaskFilter::Active => {
        task.status == Status::Active
      }
      | TaskFilter::Done => matches!(
        task.status,
        Status::Done | Status::Canceled
      )
    }
  }
}

impl FromStr for TaskFilter {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(TaskFilter::All),
      | "active" => {
        Ok(TaskFilter::Active)
      }
      | "done" | "completed"
      | "closed" => Ok(TaskFilter::Done),
      | other => Err(anyhow!(
        "unknown filter: {other}"
      ))
    }
  }
}

/// Returns the tasks the filter keeps,
/// in their original order.
#[tracing::instrument(skip(tasks))]
pub fn filter_tasks(
  tasks: &[Task],
  filter: TaskFilter
) -> Vec<Task> {
  let kept: Vec<Task> = tasks
    .iter()
    .filter(|task| filter.matches(task))
    .cloned()
    .collect();
  trace!(
    total = tasks.len(),
    kept = kept.len(),
    "filtered tasks"
  );
  kept
}

#[cfg(test)]
mod tests {
  use super::{
    TaskFilter,
    filter_tasks
  };
  use crate::task::{
    Status,
    Task,
    TaskId
  };

  fn task(
    id: u64,
    status: Status
  ) -> Task {
    Task {
      id: TaskId::from(id),
      description: format!(
        "task {id}"
      ),
      status,
      deadline: None
    }
  }

  fn sample() -> Vec<Task> {
    vec![
      task(1, Status::Done),
      task(2, Status::Active),
      task(3, Status::Canceled),
      task(4, Status::Active),
    ]
  }

  fn ids(tasks: &[Task]) -> Vec<String> {
    tasks
      .iter()
      .map(|task| task.id.to_string())
      .collect()
  }

  #[test]
  fn all_returns_input_unchanged() {
    let tasks = sample();
    assert_eq!(
      filter_tasks(
        &tasks,
        TaskFilter::All
      ),
      tasks
    );
  }

  #[test]
  fn active_keeps_order() {
    let tasks = sample();
    assert_eq!(
      ids(&filter_tasks(
        &tasks,
        TaskFilter::Active
      )),
      vec!["2", "4"]
    );
  }

  #[test]
  fn done_includes_canceled() {
    let tasks = sample();
    assert_eq!(
      ids(&filter_tasks(
        &tasks,
        TaskFilter::Done
      )),
      vec!["1", "3"]
    );
  }

  #[test]
  fn parses_filter_names() {
    assert_eq!(
      "Active"
        .parse::<TaskFilter>()
        .expect("parse"),
      TaskFilter::Active
    );
    assert!(
      "pending"
        .parse::<TaskFilter>()
        .is_err()
    );
  }
}
