use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One assignment deadline, tied to a content block of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDateRecord {
    pub course_id: String,
    /// Identifier of the first component block of the assignment; may be empty.
    pub first_block_id: String,
    pub due_at: DateTime<Utc>,
    pub title: String,
    pub learner_has_access: bool,
    /// True when the deadline is self-paced and can be shifted forward.
    pub is_relative: bool,
    pub course_name: String,
    /// Completion is reported by the data source, never derived from `due_at`.
    pub is_complete: bool,
}

/// One page of due dates as returned by the remote source.
#[derive(Debug, Clone)]
pub struct PagedResult {
    pub records: Vec<DueDateRecord>,
    pub has_more: bool,
}
