pub mod due_date;
pub mod section;

pub use due_date::{DueDateRecord, PagedResult};
pub use section::DueDateSection;
