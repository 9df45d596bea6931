use std::str::FromStr;

use anyhow::anyhow;

use crate::filter::TaskFilter;
use crate::task::Status;

/// Language used for user-facing labels and for the status strings written
/// into the persisted blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Ru, Locale::En];

    pub fn status_label(self, status: Status) -> &'static str {
        match (self, status) {
            (Locale::Ru, Status::Active) => "Активная задача",
            (Locale::Ru, Status::Done) => "Задача выполнена",
            (Locale::Ru, Status::Canceled) => "Задача отменена",
            (Locale::En, Status::Active) => "Active",
            (Locale::En, Status::Done) => "Done",
            (Locale::En, Status::Canceled) => "Canceled",
        }
    }

    pub fn filter_label(self, filter: TaskFilter) -> &'static str {
        match (self, filter) {
            (Locale::Ru, TaskFilter::All) => "Все задачи",
            (Locale::Ru, TaskFilter::Active) => "Активные задачи",
            (Locale::Ru, TaskFilter::Done) => "Выполненные задачи",
            (Locale::En, TaskFilter::All) => "All tasks",
            (Locale::En, TaskFilter::Active) => "Active tasks",
            (Locale::En, TaskFilter::Done) => "Completed tasks",
        }
    }

    pub fn empty_list_text(self) -> &'static str {
        match self {
            Locale::Ru => "Нет задач",
            Locale::En => "No tasks",
        }
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ru" | "ru-ru" | "russian" => Ok(Locale::Ru),
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::En),
            other => Err(anyhow!("unsupported locale: {other}")),
        }
    }
}
