use serde::{Deserialize, Serialize};

/// Temporal bucket a due date falls into, declared in display-priority order
/// so a `BTreeMap` keyed by it iterates sections the way they are shown.
///
/// A pure tag: labels and colors live in whatever layer renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueDateSection {
    PastDue,
    Today,
    ThisWeek,
    NextWeek,
    Upcoming,
    Completed,
}
