use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::datetime::parse_display_date;
use crate::locale::Locale;
use crate::task::{NewTask, Status};

/// Form fields that can carry an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Description,
    Status,
    Deadline,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Description => "description",
            Field::Status => "status",
            Field::Deadline => "deadline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingDescription,
    MissingStatus,
    MissingDeadline,
    InvalidDeadlineFormat,
}

impl ValidationError {
    pub fn field(self) -> Field {
        match self {
            Self::MissingDescription => Field::Description,
            Self::MissingStatus => Field::Status,
            Self::MissingDeadline | Self::InvalidDeadlineFormat => Field::Deadline,
        }
    }

    pub fn message(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::Ru, Self::MissingDescription) => "Укажите описание",
            (Locale::Ru, Self::MissingStatus) => "Укажите статус",
            (Locale::Ru, Self::MissingDeadline) => "Укажите дедлайн",
            (Locale::Ru, Self::InvalidDeadlineFormat) => "Введите дату в формате ДД.ММ.ГГГГ",
            (Locale::En, Self::MissingDescription) => "Enter a description",
            (Locale::En, Self::MissingStatus) => "Choose a status",
            (Locale::En, Self::MissingDeadline) => "Enter a deadline",
            (Locale::En, Self::InvalidDeadlineFormat) => "Enter the date as DD.MM.YYYY",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field().name(), self.message(Locale::En))
    }
}

impl std::error::Error for ValidationError {}

pub type FieldErrors = BTreeMap<Field, ValidationError>;

/// The add-task form as the user filled it in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub description: String,
    pub status: Option<Status>,
    pub deadline_text: String,
}

impl TaskDraft {
    pub fn new(
        description: impl Into<String>,
        status: Option<Status>,
        deadline_text: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            status,
            deadline_text: deadline_text.into(),
        }
    }
}

/// Checks every field independently; an empty map means the draft is
/// admissible.
#[tracing::instrument(skip(draft))]
pub fn validate(draft: &TaskDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if draft.description.trim().is_empty() {
        errors.insert(Field::Description, ValidationError::MissingDescription);
    }

    if draft.status.is_none() {
        errors.insert(Field::Status, ValidationError::MissingStatus);
    }

    if draft.deadline_text.trim().is_empty() {
        errors.insert(Field::Deadline, ValidationError::MissingDeadline);
    } else if parse_display_date(&draft.deadline_text).is_none() {
        errors.insert(Field::Deadline, ValidationError::InvalidDeadlineFormat);
    }

    debug!(error_count = errors.len(), "validated task draft");
    errors
}

/// Turns a draft into a `NewTask` ready for the store, or returns every
/// field error.
pub fn admit(draft: &TaskDraft) -> Result<NewTask, FieldErrors> {
    let errors = validate(draft);
    if !errors.is_empty() {
        return Err(errors);
    }

    match (draft.status, parse_display_date(&draft.deadline_text)) {
        (Some(status), Some(deadline)) => Ok(NewTask {
            description: draft.description.trim().to_string(),
            status,
            deadline,
        }),
        // validate() already reported both of these
        (status, _) => {
            let mut errors = FieldErrors::new();
            if status.is_none() {
                errors.insert(Field::Status, ValidationError::MissingStatus);
            } else {
                errors.insert(Field::Deadline, ValidationError::InvalidDeadlineFormat);
            }
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Field, TaskDraft, ValidationError, admit, validate};
    use crate::locale::Locale;
    use crate::task::Status;

    #[test]
    fn blank_description_is_the_only_error() {
        let draft = TaskDraft::new("", Some(Status::Active), "18.02.2025");
        let errors = validate(&draft);

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(&Field::Description),
            Some(&ValidationError::MissingDescription)
        );
    }

    #[test]
    fn every_field_reports_its_own_error() {
        let draft = TaskDraft::new("   ", None, "");
        let errors = validate(&draft);

        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.get(&Field::Deadline),
            Some(&ValidationError::MissingDeadline)
        );
        assert_eq!(
            errors.get(&Field::Status),
            Some(&ValidationError::MissingStatus)
        );
    }

    #[test]
    fn malformed_deadline_gets_format_error() {
        for text in ["18-02-2025", "31.02.2025", "1.2.2025"] {
            let draft = TaskDraft::new("ok", Some(Status::Done), text);
            assert_eq!(
                validate(&draft).get(&Field::Deadline),
                Some(&ValidationError::InvalidDeadlineFormat),
                "{text}"
            );
        }
    }

    #[test]
    fn admit_trims_and_canonicalizes() {
        let draft = TaskDraft::new("  buy milk ", Some(Status::Active), "05.03.2026");
        let admitted = admit(&draft).expect("draft should be admitted");

        assert_eq!(admitted.description(), "buy milk");
        assert_eq!(admitted.status(), Status::Active);
        assert_eq!(admitted.deadline().to_string(), "2026-03-05");
    }

    #[test]
    fn admit_returns_all_errors() {
        let draft = TaskDraft::new("", None, "tomorrow");
        let errors = admit(&draft).expect_err("draft should be rejected");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn messages_follow_locale() {
        assert_eq!(
            ValidationError::InvalidDeadlineFormat.message(Locale::Ru),
            "Введите дату в формате ДД.ММ.ГГГГ"
        );
        assert_eq!(
            ValidationError::MissingDescription.to_string(),
            "description: Enter a description"
        );
    }
}
