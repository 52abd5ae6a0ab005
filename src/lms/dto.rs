use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::DueDateRecord;

#[derive(Debug, Deserialize)]
pub struct UserDatesResponse {
    pub count: u32,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<DueDateRow>,
}

#[derive(Debug, Deserialize)]
pub struct DueDateRow {
    pub course_id: String,
    #[serde(default)]
    pub first_component_block_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assignment_title: Option<String>,
    #[serde(default)]
    pub learner_has_access: Option<bool>,
    #[serde(default)]
    pub relative: Option<bool>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub complete: Option<bool>,
}

impl DueDateRow {
    /// Maps a wire row to the domain. Rows without a parseable due date are
    /// dropped by returning `None`.
    pub fn into_domain(self) -> Option<DueDateRecord> {
        let due_at = self
            .due_date
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))?;

        Some(DueDateRecord {
            course_id: self.course_id,
            first_block_id: self.first_component_block_id.unwrap_or_default(),
            due_at,
            title: self.assignment_title.unwrap_or_default(),
            learner_has_access: self.learner_has_access.unwrap_or(false),
            is_relative: self.relative.unwrap_or(false),
            course_name: self.course_name.unwrap_or_default(),
            is_complete: self.complete.unwrap_or(false),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ShiftDueDatesBody {
    pub course_keys: Vec<String>,
}
