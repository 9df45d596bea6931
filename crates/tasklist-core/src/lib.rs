pub mod config;
pub mod datastore;
pub mod datetime;
pub mod edit;
pub mod filter;
pub mod kv;
pub mod locale;
pub mod store;
pub mod task;
pub mod validate;

pub use datetime::{CanonicalDate, format_canonical_date, is_overdue, parse_display_date};
pub use edit::{CommitOutcome, EditField, EmptyDraftPolicy, InlineEditor};
pub use filter::{TaskFilter, filter_tasks};
pub use store::{Seed, TaskStore};
pub use task::{NewTask, Status, Task, TaskId, TaskPatch};
pub use validate::{Field, FieldErrors, TaskDraft, ValidationError, admit, validate};
