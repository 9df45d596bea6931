use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use tasklist_core::config::Config;
use tasklist_core::locale::Locale;
use tasklist_core::{Status, Task, TaskFilter};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    locale: Locale,
}

impl Renderer {
    pub fn new(cfg: &Config, locale: Locale) -> Self {
        Self {
            color: wants_color(cfg) && io::stdout().is_terminal(),
            locale,
        }
    }

    pub fn plain(locale: Locale) -> Self {
        Self {
            color: false,
            locale,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    #[tracing::instrument(skip(self, out, tasks, today))]
    pub fn print_task_table<W: Write>(
        &self,
        mut out: W,
        filter: TaskFilter,
        tasks: &[Task],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.locale.filter_label(filter))?;

        if tasks.is_empty() {
            writeln!(out, "{}", self.locale.empty_list_text())?;
            return Ok(());
        }

        let headers = self.headers().iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::with_capacity(tasks.len());

        for task in tasks {
            let deadline = task
                .deadline
                .map(|date| date.to_display())
                .unwrap_or_default();
            let deadline = if task.is_overdue(today) {
                self.paint(&deadline, "31")
            } else {
                deadline
            };

            rows.push(vec![
                self.paint(&task.id.to_string(), "33"),
                task.description.clone(),
                self.paint(task.status.label(self.locale), status_color(task.status)),
                deadline,
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, out, task))]
    pub fn print_task_info<W: Write>(&self, mut out: W, task: &Task) -> anyhow::Result<()> {
        let [id, description, status, deadline] = self.headers();
        let deadline_text = task
            .deadline
            .map(|date| format!("{} ({date})", date.to_display()))
            .unwrap_or_default();

        let rows = [
            (id, task.id.to_string()),
            (description, task.description.clone()),
            (status, task.status.label(self.locale).to_string()),
            (deadline, deadline_text),
        ];
        let width = rows
            .iter()
            .map(|(label, _)| UnicodeWidthStr::width(*label))
            .max()
            .unwrap_or(0);

        for (label, value) in rows {
            let padding = width.saturating_sub(UnicodeWidthStr::width(label));
            writeln!(out, "{label}{}  {value}", " ".repeat(padding))?;
        }

        Ok(())
    }

    fn headers(&self) -> [&'static str; 4] {
        match self.locale {
            Locale::Ru => ["ID", "Описание", "Статус", "Дедлайн"],
            Locale::En => ["ID", "Description", "Status", "Deadline"],
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn wants_color(cfg: &Config) -> bool {
    cfg.get_bool("color").unwrap_or(true)
}

fn status_color(status: Status) -> &'static str {
    match status {
        Status::Active => "35",
        Status::Done => "32",
        Status::Canceled => "33",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        let padding = widths[idx].saturating_sub(UnicodeWidthStr::width(headers[idx].as_str()));
        write!(writer, "{}{} ", headers[idx], " ".repeat(padding))?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
